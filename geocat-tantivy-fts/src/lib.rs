//! # Geocat Tantivy FTS - Full-text mirror of the catalog
//!
//! This crate provides [`CatalogInfoLookupFullTextIndex`], an implementation
//! of [`geocat::fulltext::FullTextSearch`] backed by a tantivy index in a
//! temporary directory. Plug it into a
//! [`CatalogInfoLookupManager`](geocat::manager::CatalogInfoLookupManager)
//! to answer `full_text_search` filters from the index instead of scanning
//! every entity.
//!
//! ## Features
//!
//! - **Wildcard terms**: `*` and `?` match inside single words, case-insensitively
//! - **Type scoping**: searches are restricted to the kinds covered by a type
//! - **Asynchronous writes**: a bounded queue drained by one writer thread
//! - **Autocommit**: pending writes are committed periodically
//! - **Sorting and paging**: applied inside the index for sortable properties
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use geocat::filter::full_text_search;
//! use geocat::manager::CatalogInfoLookupManager;
//! use geocat::model::{CatalogInfo, InfoKind, InfoType};
//! use geocat_tantivy_fts::{CatalogInfoLookupFullTextIndex, DocumentMapping, FtsConfig};
//!
//! # fn main() -> Result<(), geocat::errors::CatalogError> {
//! let index = CatalogInfoLookupFullTextIndex::with_config(
//!     FtsConfig::new().with_num_threads(1).with_index_writer_heap_size(15_000_000),
//!     DocumentMapping::new(),
//! )?;
//! index.open()?;
//!
//! let catalog = CatalogInfoLookupManager::new(Some(Arc::new(index.clone())));
//! catalog.add(
//!     CatalogInfo::builder(InfoKind::FeatureType, "roads")
//!         .property("title", "Main roads")
//!         .build(),
//! )?;
//! catalog.commit()?;
//!
//! assert_eq!(catalog.count(InfoType::Any, &full_text_search("*road*"))?, 1);
//! index.dispose()?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;

use geocat::errors::{CatalogError, ErrorKind};

mod autocommit;
pub mod config;
pub mod document;
pub mod index;
mod query;

pub use config::{DocumentMapping, FtsConfig};
pub use document::{full_text_of, sort_key, FULL_TEXT_FIELD, ID_FIELD, TYPE_FIELD};
pub use index::CatalogInfoLookupFullTextIndex;

/// Error kind tag of failures raised by the tantivy layer.
pub const FTS_ERROR: &str = "FTS";

pub(crate) fn fts_error<E: Display>(context: &str, cause: E) -> CatalogError {
    CatalogError::new(
        &format!("{}: {}", context, cause),
        ErrorKind::Extension(FTS_ERROR.to_string()),
    )
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
