//! Catalog entities, their kinds and the queryable type table.

mod catalog_info;
mod kind;

pub use catalog_info::*;
pub use kind::*;
