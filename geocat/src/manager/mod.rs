//! The catalog facade routing writes and hybrid structural/full-text
//! queries to the typed lookups and the full-text mirror.

mod lookup_manager;
mod query;

pub use lookup_manager::*;
pub use query::{limit_to, order_by, CatalogStream, Query};
