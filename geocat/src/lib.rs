//! # Geocat - In-memory catalog lookup and indexing
//!
//! Geocat holds the configuration catalog of a geospatial server in memory:
//! workspaces, namespaces, stores, resources, layers, layer groups and
//! styles. Every entity is reachable by id and by composite name, through
//! any registered secondary index, and optionally through a full-text mirror
//! kept consistent with the primary store.
//!
//! ## Quick Start
//!
//! ```rust
//! use geocat::filter::{field, full_text_search};
//! use geocat::manager::{CatalogInfoLookupManager, Query};
//! use geocat::model::{BaseType, CatalogInfo, InfoKind, InfoType, QualifiedName};
//!
//! # fn main() -> Result<(), geocat::errors::CatalogError> {
//! let catalog = CatalogInfoLookupManager::new(None);
//!
//! let ws = catalog.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build())?;
//! catalog.add(
//!     CatalogInfo::builder(InfoKind::DataStore, "states")
//!         .workspace(ws.id())
//!         .property("description", "US state boundaries")
//!         .build(),
//! )?;
//!
//! let store = catalog.find_by_name(&QualifiedName::scoped(ws.id(), "states"), BaseType::Store.into());
//! assert!(store.is_some());
//!
//! let filter = field("workspace.id").eq(ws.id().as_str()).and(full_text_search("boundaries"));
//! assert_eq!(catalog.count(InfoType::Any, &filter)?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`model`] - Catalog entities, ids, kinds and the type table
//! - [`common`] - Property values and sort orders
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Filters, the fluent filter API and filter rewriting
//! - [`lookup`] - Indexed per-type registries and combined views
//! - [`fulltext`] - The seam to a full-text index implementation
//! - [`manager`] - The catalog facade routing writes and hybrid queries
//! - [`loader`] - Parallel bulk loading from a directory tree

use std::thread::available_parallelism;

pub mod common;
pub mod errors;
pub mod filter;
pub mod fulltext;
pub mod loader;
pub mod lookup;
pub mod manager;
pub mod model;

/// Returns the number of available CPU cores.
///
/// Falls back to 1 when the platform cannot tell.
///
/// # Examples
///
/// ```rust
/// use geocat::get_cpu_count;
///
/// assert!(get_cpu_count() > 0);
/// ```
pub fn get_cpu_count() -> usize {
    available_parallelism()
        .map(|p| p.get())
        .unwrap_or_else(|err| {
            log::warn!("Failed to detect available parallelism: {}. Defaulting to single thread.", err);
            1
        })
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
