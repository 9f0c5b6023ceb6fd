//! Indexed in-memory registries of catalog entities.
//!
//! A [`CatalogInfoLookup`] holds every entity of one base type, partitioned
//! by concrete kind and indexed by id, composite name and any registered
//! [`IndexDefinition`]. A [`CombinedLookup`] unions several lookups into a
//! read-only view of an abstract type.

mod catalog_info_lookup;
mod combined;
mod index;
mod partition;
mod stream;

pub use catalog_info_lookup::*;
pub use combined::*;
pub use index::{IndexDefinition, IndexKey, ID_INDEX, NAME_INDEX};
pub use stream::InfoStream;

use crate::errors::CatalogResult;
use crate::filter::Filter;
use crate::model::{CatalogInfo, InfoId, InfoType, InfoUpdate, QualifiedName};
use std::sync::Arc;

/// Read and write access to a registry of catalog entities.
///
/// Point lookups return `None` when nothing matches; they never fail.
/// Types are possibly abstract: a query for a base type or `Published`
/// covers every concrete kind it includes.
pub trait InfoLookup: Send + Sync {
    /// Whether this lookup may hold entities of `info_type`.
    fn covers(&self, info_type: InfoType) -> bool;

    fn add(&self, info: CatalogInfo) -> CatalogResult<Arc<CatalogInfo>>;

    fn update(&self, update: InfoUpdate) -> CatalogResult<Arc<CatalogInfo>>;

    /// Removes the entity with `info`'s id, returning the stored value.
    fn remove(&self, info: &CatalogInfo) -> CatalogResult<Option<Arc<CatalogInfo>>>;

    fn clear(&self) -> CatalogResult<()>;

    fn find_by_id(&self, id: &InfoId, info_type: InfoType) -> Option<Arc<CatalogInfo>>;

    fn find_by_name(&self, name: &QualifiedName, info_type: InfoType) -> Option<Arc<CatalogInfo>>;

    /// Lazily yields the entities of `info_type` accepted by `filter`, in id
    /// order within each concrete kind.
    fn stream(&self, info_type: InfoType, filter: &Filter) -> InfoStream;

    /// Number of entities of `info_type`, without evaluating any filter.
    fn size(&self, info_type: InfoType) -> usize;

    fn count(&self, info_type: InfoType, filter: &Filter) -> usize {
        if filter.is_include() {
            return self.size(info_type);
        }
        self.stream(info_type, filter).count()
    }

    fn list(&self, info_type: InfoType, filter: &Filter) -> Vec<Arc<CatalogInfo>> {
        self.stream(info_type, filter).collect()
    }

    fn find_first(&self, info_type: InfoType, filter: &Filter) -> Option<Arc<CatalogInfo>> {
        self.stream(info_type, filter).next()
    }
}
