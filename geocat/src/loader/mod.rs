//! Parallel bulk loading of a catalog from a directory of entity files.

mod config;
mod directory_loader;

pub use config::*;
pub use directory_loader::*;
