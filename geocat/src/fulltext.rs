//! The seam between the lookup manager and a full-text index.

use crate::common::SortBy;
use crate::errors::CatalogResult;
use crate::model::{CatalogInfo, InfoId, InfoType};

/// A lazy sequence of matching entity ids.
pub type IdStream = Box<dyn Iterator<Item = CatalogResult<InfoId>> + Send>;

/// A wildcard search over the full-text mirror.
///
/// Terms are OR-ed; each one uses `*` and `?` wildcards and matches
/// case-insensitively against the words of an entity's text. `offset` and
/// `limit` are applied after sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    info_type: InfoType,
    terms: Vec<String>,
    sort_by: Vec<SortBy>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl TextQuery {
    pub fn new(info_type: InfoType, terms: Vec<String>) -> Self {
        TextQuery {
            info_type,
            terms,
            sort_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn sort_by(mut self, sort_by: Vec<SortBy>) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn offset(mut self, offset: Option<usize>) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_type(&self, info_type: InfoType) -> Self {
        TextQuery {
            info_type,
            ..self.clone()
        }
    }

    pub fn info_type(&self) -> InfoType {
        self.info_type
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn sorting(&self) -> &[SortBy] {
        &self.sort_by
    }

    pub fn get_offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    #[inline]
    pub fn is_paged(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}

/// The result of a [`TextQuery`].
pub struct TextHits {
    ids: IdStream,
    arranged: bool,
}

impl TextHits {
    /// `arranged` tells whether `ids` already follow the query's sort order
    /// and offset/limit window.
    pub fn new(ids: IdStream, arranged: bool) -> Self {
        TextHits { ids, arranged }
    }

    pub fn empty() -> Self {
        TextHits {
            ids: Box::new(std::iter::empty()),
            arranged: true,
        }
    }

    #[inline]
    pub fn is_arranged(&self) -> bool {
        self.arranged
    }

    pub fn into_ids(self) -> IdStream {
        self.ids
    }
}

/// A full-text mirror of the catalog, kept eventually consistent with the
/// primary lookups.
///
/// Writes are queued and become searchable after the next commit. An index
/// that cannot sort by the requested properties returns unarranged hits
/// and leaves sorting and paging to the caller.
pub trait FullTextSearch: Send + Sync {
    fn add(&self, info: &CatalogInfo) -> CatalogResult<()>;

    fn update(&self, info: &CatalogInfo) -> CatalogResult<()>;

    fn remove(&self, info: &CatalogInfo) -> CatalogResult<()>;

    /// Drops every document.
    fn clear(&self) -> CatalogResult<()>;

    /// Blocks until every previously queued write is searchable.
    fn commit(&self) -> CatalogResult<()>;

    fn search(&self, query: &TextQuery) -> CatalogResult<TextHits>;

    fn count(&self, query: &TextQuery) -> CatalogResult<usize>;

    fn is_open(&self) -> bool;
}
