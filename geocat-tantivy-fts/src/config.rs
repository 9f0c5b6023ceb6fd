//! Full-text index configuration.
//!
//! [`FtsConfig`] tunes the tantivy writer, the command queue and the
//! autocommit task. [`DocumentMapping`] decides which entity properties end
//! up in the searchable text and which ones can be sorted on inside the index.

use geocat::model::{props, BaseType};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default index writer heap size: 50 MB
pub const DEFAULT_INDEX_WRITER_HEAP_MB: usize = 50;

/// Default number of indexing threads: 0 (let tantivy decide)
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Default capacity of the command queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Default autocommit period: 1 second
pub const DEFAULT_COMMIT_INTERVAL_MS: u64 = 1_000;

/// Number of documents fetched per page by unbounded searches
pub const DEFAULT_PAGE_SIZE: usize = 1_000;

/// A cloneable, thread-safe configuration of a
/// [`CatalogInfoLookupFullTextIndex`](crate::CatalogInfoLookupFullTextIndex).
///
/// Settings are read when the index opens; changing them afterwards takes
/// effect on the next open.
///
/// # Example
///
/// ```rust
/// use geocat_tantivy_fts::FtsConfig;
/// use std::time::Duration;
///
/// let config = FtsConfig::new()
///     .with_index_writer_heap_size(100 * 1024 * 1024)
///     .with_num_threads(2)
///     .with_commit_interval(Duration::from_millis(250));
/// assert_eq!(config.num_threads(), 2);
/// ```
#[derive(Clone)]
pub struct FtsConfig {
    inner: Arc<FtsConfigInner>,
}

struct FtsConfigInner {
    /// Memory budget for the index writer in bytes.
    index_writer_heap_size: AtomicUsize,

    /// Number of indexing threads (0 = tantivy default).
    num_threads: AtomicUsize,

    /// Maximum number of queued commands before writers block.
    queue_capacity: AtomicUsize,

    autocommit: AtomicBool,

    commit_interval_ms: AtomicU64,

    /// Page size of unbounded searches.
    page_size: AtomicUsize,
}

impl FtsConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - Index writer heap: 50 MB
    /// - Num threads: 0 (tantivy default)
    /// - Queue capacity: 10,000 commands
    /// - Autocommit: enabled, every second
    /// - Page size: 1,000 documents
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FtsConfigInner::new()),
        }
    }

    #[inline]
    pub fn index_writer_heap_size(&self) -> usize {
        self.inner.index_writer_heap_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_index_writer_heap_size(&self, size: usize) {
        self.inner
            .index_writer_heap_size
            .store(size, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_index_writer_heap_size(self, size: usize) -> Self {
        self.set_index_writer_heap_size(size);
        self
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.inner.num_threads.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_num_threads(&self, n: usize) {
        self.inner.num_threads.store(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_num_threads(self, n: usize) -> Self {
        self.set_num_threads(n);
        self
    }

    /// Capacity of the command queue, never less than 1.
    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.inner.queue_capacity.load(Ordering::Relaxed).max(1)
    }

    #[inline]
    pub fn set_queue_capacity(&self, capacity: usize) {
        self.inner.queue_capacity.store(capacity, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_queue_capacity(self, capacity: usize) -> Self {
        self.set_queue_capacity(capacity);
        self
    }

    /// Whether uncommitted writes are committed periodically.
    #[inline]
    pub fn autocommit(&self) -> bool {
        self.inner.autocommit.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_autocommit(&self, enabled: bool) {
        self.inner.autocommit.store(enabled, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_autocommit(self, enabled: bool) -> Self {
        self.set_autocommit(enabled);
        self
    }

    #[inline]
    pub fn commit_interval(&self) -> Duration {
        Duration::from_millis(self.inner.commit_interval_ms.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_commit_interval(&self, interval: Duration) {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.inner
            .commit_interval_ms
            .store(millis, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_commit_interval(self, interval: Duration) -> Self {
        self.set_commit_interval(interval);
        self
    }

    /// Page size of unbounded searches, never less than 1.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.inner.page_size.load(Ordering::Relaxed).max(1)
    }

    #[inline]
    pub fn set_page_size(&self, size: usize) {
        self.inner.page_size.store(size, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_page_size(self, size: usize) -> Self {
        self.set_page_size(size);
        self
    }
}

impl Default for FtsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FtsConfigInner {
    fn new() -> Self {
        Self {
            index_writer_heap_size: AtomicUsize::new(DEFAULT_INDEX_WRITER_HEAP_MB * 1024 * 1024),
            num_threads: AtomicUsize::new(DEFAULT_NUM_THREADS),
            queue_capacity: AtomicUsize::new(DEFAULT_QUEUE_CAPACITY),
            autocommit: AtomicBool::new(true),
            commit_interval_ms: AtomicU64::new(DEFAULT_COMMIT_INTERVAL_MS),
            page_size: AtomicUsize::new(DEFAULT_PAGE_SIZE),
        }
    }
}

/// Which properties of an entity are indexed, per base type.
///
/// The searchable text of an entity is its name plus the configured
/// full-text properties of its base type. Sortable properties are shared by
/// all types so that a search across types can still be sorted inside the
/// index; sorting by any other property falls back to the caller.
///
/// # Example
///
/// ```rust
/// use geocat::model::BaseType;
/// use geocat_tantivy_fts::DocumentMapping;
///
/// let mapping = DocumentMapping::new()
///     .with_full_text_properties(BaseType::Style, &["filename"])
///     .with_sortable_properties(&["name", "title", "enabled"]);
/// assert_eq!(mapping.full_text_properties(BaseType::Style), vec!["filename".to_string()]);
/// assert!(mapping.is_sortable("enabled"));
/// ```
#[derive(Clone)]
pub struct DocumentMapping {
    inner: Arc<DocumentMappingInner>,
}

struct DocumentMappingInner {
    full_text: RwLock<IndexMap<BaseType, Vec<String>>>,
    sortable: RwLock<Vec<String>>,
}

impl DocumentMapping {
    /// Titles, abstracts, descriptions and keywords for every type, plus the
    /// uri of namespaces. `name` and `title` are sortable.
    pub fn new() -> Self {
        let descriptive = [props::TITLE, props::ABSTRACT, props::DESCRIPTION, props::KEYWORDS];
        let mut full_text = IndexMap::new();
        for base in BaseType::ALL {
            let mut properties: Vec<String> = descriptive.iter().map(|p| p.to_string()).collect();
            if base == BaseType::Namespace {
                properties.push(props::URI.to_string());
            }
            full_text.insert(base, properties);
        }

        DocumentMapping {
            inner: Arc::new(DocumentMappingInner {
                full_text: RwLock::new(full_text),
                sortable: RwLock::new(vec![props::NAME.to_string(), props::TITLE.to_string()]),
            }),
        }
    }

    pub fn full_text_properties(&self, base: BaseType) -> Vec<String> {
        self.inner
            .full_text
            .read()
            .get(&base)
            .cloned()
            .unwrap_or_default()
    }

    /// Replaces the full-text properties of one base type.
    pub fn set_full_text_properties(&self, base: BaseType, properties: &[&str]) {
        let properties = properties.iter().map(|p| p.to_string()).collect();
        self.inner.full_text.write().insert(base, properties);
    }

    pub fn with_full_text_properties(self, base: BaseType, properties: &[&str]) -> Self {
        self.set_full_text_properties(base, properties);
        self
    }

    pub fn sortable_properties(&self) -> Vec<String> {
        self.inner.sortable.read().clone()
    }

    /// Replaces the sortable properties. Duplicates are dropped.
    pub fn set_sortable_properties(&self, properties: &[&str]) {
        let mut sortable: Vec<String> = Vec::with_capacity(properties.len());
        for property in properties {
            if !sortable.iter().any(|p| p == property) {
                sortable.push(property.to_string());
            }
        }
        *self.inner.sortable.write() = sortable;
    }

    pub fn with_sortable_properties(self, properties: &[&str]) -> Self {
        self.set_sortable_properties(properties);
        self
    }

    #[inline]
    pub fn is_sortable(&self, property: &str) -> bool {
        self.inner.sortable.read().iter().any(|p| p == property)
    }
}

impl Default for DocumentMapping {
    fn default() -> Self {
        Self::new()
    }
}
