use crate::common::{SortBy, SortOrder};
use crate::errors::CatalogResult;
use crate::model::CatalogInfo;
use std::cmp::Ordering;
use std::sync::Arc;

/// A lazy sequence of entities, failing only when the full-text index does.
pub type CatalogStream = Box<dyn Iterator<Item = CatalogResult<Arc<CatalogInfo>>> + Send>;

/// Paging and ordering of a stream query.
///
/// # Examples
///
/// ```rust
/// use geocat::manager::Query;
/// use geocat::common::SortOrder;
///
/// // entities 11-30 by descending title, then name
/// let query = Query::new()
///     .sort("title", SortOrder::Descending)
///     .sort("name", SortOrder::Ascending)
///     .offset(10)
///     .limit(20);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub(crate) offset: Option<usize>,
    pub(crate) limit: Option<usize>,
    pub(crate) sort_by: Vec<SortBy>,
}

/// A query sorted by one property.
pub fn order_by(property: &str, order: SortOrder) -> Query {
    Query::new().sort(property, order)
}

/// A query returning at most `limit` entities.
pub fn limit_to(limit: usize) -> Query {
    Query::new().limit(limit)
}

impl Query {
    /// Everything, in natural order.
    pub fn new() -> Self {
        Query::default()
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort key with lower precedence than the ones already added.
    pub fn sort(mut self, property: &str, order: SortOrder) -> Self {
        self.sort_by.push(SortBy::new(property, order));
        self
    }

    pub fn get_offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn sort_by(&self) -> &[SortBy] {
        &self.sort_by
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        !self.sort_by.is_empty()
    }

    #[inline]
    pub fn is_paged(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }

    /// Applies the offset/limit window to `stream`.
    pub(crate) fn page_stream(&self, stream: CatalogStream) -> CatalogStream {
        let stream: CatalogStream = match self.offset {
            Some(offset) if offset > 0 => Box::new(stream.skip(offset)),
            _ => stream,
        };
        match self.limit {
            Some(limit) => Box::new(stream.take(limit)),
            None => stream,
        }
    }

    /// Sorts `stream` in memory. The first error ends the stream.
    pub(crate) fn sort_stream(&self, stream: CatalogStream) -> CatalogStream {
        if self.sort_by.is_empty() {
            return stream;
        }
        match stream.collect::<CatalogResult<Vec<_>>>() {
            Ok(mut infos) => {
                infos.sort_by(|a, b| compare(a, b, &self.sort_by));
                Box::new(infos.into_iter().map(Ok))
            }
            Err(e) => {
                log::error!("Failed to collect entities for sorting: {}", e);
                Box::new(std::iter::once(Err(e)))
            }
        }
    }
}

/// Orders two entities by `sort_by`; nulls sort first ascending.
pub(crate) fn compare(a: &CatalogInfo, b: &CatalogInfo, sort_by: &[SortBy]) -> Ordering {
    for sort in sort_by {
        let ordering = a.property(sort.property()).cmp(&b.property(sort.property()));
        let ordering = if sort.is_descending() {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
