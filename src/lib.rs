//! Acronym CLI Library
//!
//! Resolves acronyms to their expansions, preferring a local cache over the
//! remote acronym server. The modules are exposed for the binary and for
//! integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod render;
pub mod resolver;
pub mod sanitize;
pub mod worker;
