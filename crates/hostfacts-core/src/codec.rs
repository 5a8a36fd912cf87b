//! Reversible key escaping for fact payloads.
//!
//! Document-oriented storage reserves the field-path separator (`.`) and
//! the query-operator sigil (`$`) in field names, but gatherers produce
//! payloads whose keys may contain either — dotted interface names,
//! `$schema` markers, and the like. The codec substitutes each reserved
//! character with a visually similar fullwidth code point on the way in
//! and restores it on the way out, so callers only ever see the original
//! keys.

use serde_json::Value;

use crate::{Error, Result};

/// The conventional substitution table: `.` ↔ U+FF0E and `$` ↔ U+FF04.
pub const DEFAULT_SUBSTITUTIONS: [(char, char); 2] =
  [('.', '\u{FF0E}'), ('$', '\u{FF04}')];

/// Bidirectional key transform applied to every payload on write and read,
/// and to field paths in query filters.
///
/// The substitution table is instance state, not process-global: a store
/// carries exactly one codec and applies it consistently.
#[derive(Debug, Clone)]
pub struct KeyCodec {
  /// `(reserved, substitute)` pairs.
  substitutions: Vec<(char, char)>,
}

impl Default for KeyCodec {
  fn default() -> Self { Self::new(DEFAULT_SUBSTITUTIONS.to_vec()) }
}

impl KeyCodec {
  pub fn new(substitutions: Vec<(char, char)>) -> Self {
    Self { substitutions }
  }

  /// Rewrite every map key in `value`, descending through nested maps and
  /// through maps found inside sequences. Scalar values and sequence order
  /// are never touched.
  ///
  /// Fails with [`Error::ReservedKey`] if a key already contains one of
  /// the substitute code points; encoding such a payload would not be
  /// reversible.
  pub fn encode(&self, value: &Value) -> Result<Value> {
    Ok(match value {
      Value::Object(map) => {
        let mut out = serde_json::Map::with_capacity(map.len());
        for (key, inner) in map {
          out.insert(self.encode_key(key)?, self.encode(inner)?);
        }
        Value::Object(out)
      }
      Value::Array(items) => Value::Array(
        items.iter().map(|v| self.encode(v)).collect::<Result<_>>()?,
      ),
      scalar => scalar.clone(),
    })
  }

  /// Exact inverse of [`encode`](Self::encode). Infallible: substitute
  /// code points simply map back to the characters they stand for.
  pub fn decode(&self, value: &Value) -> Value {
    match value {
      Value::Object(map) => Value::Object(
        map
          .iter()
          .map(|(k, v)| (self.decode_key(k), self.decode(v)))
          .collect(),
      ),
      Value::Array(items) => {
        Value::Array(items.iter().map(|v| self.decode(v)).collect())
      }
      scalar => scalar.clone(),
    }
  }

  /// Split a dot-style field path into segments and encode each one, so an
  /// equality filter addresses the stored (encoded) field names.
  pub fn encode_query_path(&self, path: &str) -> Result<Vec<String>> {
    path.split('.').map(|segment| self.encode_key(segment)).collect()
  }

  fn encode_key(&self, key: &str) -> Result<String> {
    for &(_, substitute) in &self.substitutions {
      if key.contains(substitute) {
        return Err(Error::ReservedKey { key: key.to_owned(), substitute });
      }
    }
    let mut out = key.to_owned();
    for &(reserved, substitute) in &self.substitutions {
      out = out.replace(reserved, &substitute.to_string());
    }
    Ok(out)
  }

  fn decode_key(&self, key: &str) -> String {
    let mut out = key.to_owned();
    for &(reserved, substitute) in &self.substitutions {
      out = out.replace(substitute, &reserved.to_string());
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn encode_substitutes_reserved_characters_in_keys() {
    let codec = KeyCodec::default();

    let encoded = codec
      .encode(&json!({ "config.path": "/etc/app", "$schema": 2 }))
      .unwrap();

    let map = encoded.as_object().unwrap();
    assert!(map.contains_key("config\u{FF0E}path"));
    assert!(map.contains_key("\u{FF04}schema"));
    // Values are untouched, even when they contain reserved characters.
    assert_eq!(map["config\u{FF0E}path"], json!("/etc/app"));
  }

  #[test]
  fn roundtrip_nested_maps_and_sequences() {
    let codec = KeyCodec::default();
    let original = json!({
      "mounts": [
        { "device": "/dev/sda1", "opts.rw": true },
        { "device": "/dev/sdb1", "opts.rw": false },
      ],
      "pkg": { "openssl.version": "3.0.2", "price$": null },
      "count": 7,
    });

    let encoded = codec.encode(&original).unwrap();
    assert_ne!(encoded, original);
    assert_eq!(codec.decode(&encoded), original);
  }

  #[test]
  fn scalars_pass_through_unchanged() {
    let codec = KeyCodec::default();
    for scalar in [json!("a.b$c"), json!(3.5), json!(true), json!(null)] {
      assert_eq!(codec.encode(&scalar).unwrap(), scalar);
      assert_eq!(codec.decode(&scalar), scalar);
    }
  }

  #[test]
  fn key_containing_substitute_code_point_errors() {
    let codec = KeyCodec::default();
    let err = codec
      .encode(&json!({ "already\u{FF0E}encoded": 1 }))
      .unwrap_err();
    assert!(matches!(err, Error::ReservedKey { substitute, .. } if substitute == '\u{FF0E}'));
  }

  #[test]
  fn custom_substitution_pairs_are_honored() {
    let codec = KeyCodec::new(vec![('.', '_'), ('$', '#')]);

    let encoded = codec.encode(&json!({ "a.b": { "$c": 1 } })).unwrap();
    assert_eq!(encoded, json!({ "a_b": { "#c": 1 } }));
    assert_eq!(codec.decode(&encoded), json!({ "a.b": { "$c": 1 } }));
  }

  #[test]
  fn encode_query_path_encodes_each_segment() {
    let codec = KeyCodec::default();
    let path = codec.encode_query_path("network.gateway$v4").unwrap();
    assert_eq!(path, vec!["network".to_owned(), "gateway\u{FF04}v4".to_owned()]);
  }
}
