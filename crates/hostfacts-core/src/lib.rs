//! Core types and trait definitions for the hostfacts snapshot store.
//!
//! This crate is deliberately free of database dependencies. Storage
//! backends implement [`store::FactStore`]; the gatherer and web layers
//! depend on this abstraction alone.

pub mod codec;
pub mod error;
pub mod fact;
pub mod host;
pub mod store;

pub use error::{Error, Result};
