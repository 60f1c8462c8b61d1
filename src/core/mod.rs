//! Catalog, engine, and everything that runs on top of the content model.

pub mod analysis;
pub mod builtin;
pub mod catalog;
pub mod config;
pub mod content;
pub mod engine;
pub mod playthrough;
pub mod session;
pub mod validate;
pub mod variant;
