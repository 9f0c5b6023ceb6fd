//! The tantivy-backed full-text mirror of the catalog.

use std::cmp::Ordering as CmpOrdering;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use geocat::errors::{CatalogError, CatalogResult, ErrorKind};
use geocat::fulltext::{FullTextSearch, TextHits, TextQuery};
use geocat::model::{CatalogInfo, InfoId};
use parking_lot::{Mutex, RwLock};
use tantivy::collector::Count;
use tantivy::directory::MmapDirectory;
use tantivy::query::{EnableScoring, Query, Scorer, Weight};
use tantivy::schema::Field;
use tantivy::{
    DocAddress, DocSet, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument,
    Term, TERMINATED,
};
use tempfile::TempDir;

use crate::autocommit::AutoCommit;
use crate::config::{DocumentMapping, FtsConfig};
use crate::document::{build_schema, stored_id, stored_sort_key, to_document, IndexFields};
use crate::fts_error;
use crate::query::build_query;

/// A command for the writer thread. Commands apply in submission order.
pub(crate) enum IndexCommand {
    Add(TantivyDocument),
    Update(InfoId, TantivyDocument),
    Delete(InfoId),
    Clear,
    /// Commits and reloads the reader, then reports on the optional channel.
    Commit(Option<Sender<CatalogResult<()>>>),
    End,
}

/// A full-text mirror of the catalog backed by a tantivy index in a
/// temporary directory.
///
/// Writes are queued on a bounded channel and applied by a single writer
/// thread that owns the [`IndexWriter`]. They become searchable once a
/// commit queued after them has been processed, either through
/// [`commit`](FullTextSearch::commit) or the autocommit task.
///
/// The index starts closed. Every operation on a closed index fails with
/// [`ErrorKind::IndexNotRunning`]. Clones share the same index.
///
/// # Example
///
/// ```rust
/// use geocat::fulltext::{FullTextSearch, TextQuery};
/// use geocat::model::{CatalogInfo, InfoKind, InfoType};
/// use geocat_tantivy_fts::CatalogInfoLookupFullTextIndex;
///
/// # fn main() -> Result<(), geocat::errors::CatalogError> {
/// let index = CatalogInfoLookupFullTextIndex::new()?;
/// index.open()?;
///
/// let roads = CatalogInfo::builder(InfoKind::FeatureType, "roads")
///     .property("title", "Main roads")
///     .build();
/// index.add(&roads)?;
/// index.commit()?;
///
/// let ids = index.search_ids(&TextQuery::new(InfoType::Any, vec!["*road*".to_string()]))?;
/// assert_eq!(ids, vec![roads.id().clone()]);
///
/// index.dispose()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CatalogInfoLookupFullTextIndex {
    inner: Arc<FullTextIndexInner>,
}

struct FullTextIndexInner {
    config: FtsConfig,
    mapping: DocumentMapping,
    path: PathBuf,
    directory: Mutex<Option<TempDir>>,
    running: RwLock<Option<RunningIndex>>,
    /// Writes queued but not yet committed.
    pending: Arc<AtomicUsize>,
}

struct RunningIndex {
    fields: Arc<IndexFields>,
    reader: IndexReader,
    sender: Sender<IndexCommand>,
    worker: JoinHandle<()>,
    autocommit: Option<AutoCommit>,
}

impl CatalogInfoLookupFullTextIndex {
    /// Creates a closed index with the default configuration and mapping.
    pub fn new() -> CatalogResult<Self> {
        Self::with_config(FtsConfig::default(), DocumentMapping::default())
    }

    /// Creates a closed index in a fresh temporary directory.
    pub fn with_config(config: FtsConfig, mapping: DocumentMapping) -> CatalogResult<Self> {
        let directory = tempfile::Builder::new().prefix("geocat-fts-").tempdir()?;
        let path = directory.path().to_path_buf();
        log::debug!("Full-text index directory {}", path.display());

        Ok(CatalogInfoLookupFullTextIndex {
            inner: Arc::new(FullTextIndexInner {
                config,
                mapping,
                path,
                directory: Mutex::new(Some(directory)),
                running: RwLock::new(None),
                pending: Arc::new(AtomicUsize::new(0)),
            }),
        })
    }

    pub fn config(&self) -> &FtsConfig {
        &self.inner.config
    }

    pub fn mapping(&self) -> &DocumentMapping {
        &self.inner.mapping
    }

    /// The directory holding the index files.
    pub fn directory(&self) -> &Path {
        &self.inner.path
    }

    /// Number of writes queued since the last processed commit.
    pub fn pending_operations(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Opens the index and starts the writer thread. Does nothing when
    /// already open.
    ///
    /// Reopening after [`close`](Self::close) keeps the committed documents.
    /// Fails once the index has been disposed.
    pub fn open(&self) -> CatalogResult<()> {
        let mut running = self.inner.running.write();
        if running.is_some() {
            return Ok(());
        }
        if self.inner.directory.lock().is_none() {
            return Err(CatalogError::new(
                "Full-text index has been disposed",
                ErrorKind::IndexNotRunning,
            ));
        }

        *running = Some(self.inner.start()?);
        log::info!("Full-text index opened at {}", self.inner.path.display());
        Ok(())
    }

    /// Commits the queued writes, stops the writer thread and releases the
    /// writer. Does nothing when already closed.
    ///
    /// A write racing with `close` may be accepted and then dropped
    /// unapplied; the writer logs how many commands it discarded.
    pub fn close(&self) -> CatalogResult<()> {
        let mut running = self.inner.running.write();
        match running.take() {
            Some(index) => {
                let result = shutdown(index, &self.inner.pending);
                log::info!("Full-text index closed");
                result
            }
            None => Ok(()),
        }
    }

    /// Closes the index and deletes its directory.
    pub fn dispose(&self) -> CatalogResult<()> {
        let closed = self.close();
        if let Some(directory) = self.inner.directory.lock().take() {
            directory.close()?;
            log::info!("Full-text index directory {} deleted", self.inner.path.display());
        }
        closed
    }

    /// Runs `query` and collects the matching ids.
    pub fn search_ids(&self, query: &TextQuery) -> CatalogResult<Vec<InfoId>> {
        self.search(query)?.into_ids().collect()
    }
}

impl FullTextSearch for CatalogInfoLookupFullTextIndex {
    fn add(&self, info: &CatalogInfo) -> CatalogResult<()> {
        let (sender, fields) = self.inner.channel()?;
        let doc = to_document(info, &fields, &self.inner.mapping);
        self.inner.enqueue(&sender, IndexCommand::Add(doc))
    }

    fn update(&self, info: &CatalogInfo) -> CatalogResult<()> {
        let (sender, fields) = self.inner.channel()?;
        let doc = to_document(info, &fields, &self.inner.mapping);
        self.inner
            .enqueue(&sender, IndexCommand::Update(info.id().clone(), doc))
    }

    fn remove(&self, info: &CatalogInfo) -> CatalogResult<()> {
        let (sender, _) = self.inner.channel()?;
        self.inner
            .enqueue(&sender, IndexCommand::Delete(info.id().clone()))
    }

    fn clear(&self) -> CatalogResult<()> {
        let (sender, _) = self.inner.channel()?;
        self.inner.enqueue(&sender, IndexCommand::Clear)
    }

    fn commit(&self) -> CatalogResult<()> {
        let (sender, _) = self.inner.channel()?;
        commit_through(&sender)
    }

    fn search(&self, query: &TextQuery) -> CatalogResult<TextHits> {
        let (searcher, fields) = self.inner.searcher()?;
        let tantivy_query = build_query(query, &fields)?;
        let page_size = self.inner.config.page_size();
        let offset = query.get_offset().unwrap_or(0);

        if query.get_limit() == Some(0) {
            return Ok(TextHits::empty());
        }

        let sort_fields: Option<Vec<(Field, bool)>> = query
            .sorting()
            .iter()
            .map(|sort| {
                fields
                    .sort_field(sort.property())
                    .map(|field| (field, sort.is_descending()))
            })
            .collect();

        match sort_fields {
            None => {
                log::debug!(
                    "Cannot sort {:?} inside the full-text index, returning unarranged hits",
                    query.sorting()
                );
                let hits = HitPager::new(searcher, &*tantivy_query, fields, page_size, 0)?;
                Ok(TextHits::new(Box::new(hits), false))
            }
            Some(sort) if !sort.is_empty() => {
                let ids = sorted_ids(searcher, tantivy_query, fields, page_size, &sort)?;
                let window = ids
                    .into_iter()
                    .skip(offset)
                    .take(query.get_limit().unwrap_or(usize::MAX))
                    .map(Ok::<InfoId, CatalogError>);
                Ok(TextHits::new(Box::new(window), true))
            }
            Some(_) => {
                let hits = HitPager::new(searcher, &*tantivy_query, fields, page_size, offset)?;
                match query.get_limit() {
                    Some(limit) => Ok(TextHits::new(Box::new(hits.take(limit)), true)),
                    None => Ok(TextHits::new(Box::new(hits), true)),
                }
            }
        }
    }

    fn count(&self, query: &TextQuery) -> CatalogResult<usize> {
        let (searcher, fields) = self.inner.searcher()?;
        let tantivy_query = build_query(query, &fields)?;
        let total = searcher
            .search(&*tantivy_query, &Count)
            .map_err(|e| fts_error("Failed to count full-text hits", e))?;

        let remaining = total.saturating_sub(query.get_offset().unwrap_or(0));
        Ok(query
            .get_limit()
            .map_or(remaining, |limit| remaining.min(limit)))
    }

    fn is_open(&self) -> bool {
        self.inner.running.read().is_some()
    }
}

impl FullTextIndexInner {
    fn start(&self) -> CatalogResult<RunningIndex> {
        let (schema, fields) = build_schema(&self.mapping);
        let directory = MmapDirectory::open(&self.path)
            .map_err(|e| fts_error("Failed to open full-text index directory", e))?;
        let index = Index::open_or_create(directory, schema)
            .map_err(|e| fts_error("Failed to open full-text index", e))?;

        let heap_size = self.config.index_writer_heap_size();
        let num_threads = self.config.num_threads();
        let mut writer: IndexWriter = if num_threads > 0 {
            index.writer_with_num_threads(num_threads, heap_size)
        } else {
            index.writer(heap_size)
        }
        .map_err(|e| fts_error("Failed to create full-text index writer", e))?;

        // a reader needs at least one commit on a fresh directory
        writer
            .commit()
            .map_err(|e| fts_error("Failed to commit empty full-text index", e))?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| fts_error("Failed to create full-text reader", e))?;

        let (sender, receiver) = bounded(self.config.queue_capacity());
        let worker = {
            let reader = reader.clone();
            let pending = self.pending.clone();
            let id_field = fields.id;
            std::thread::Builder::new()
                .name("catalog-fts-writer".to_string())
                .spawn(move || run_worker(writer, reader, receiver, id_field, pending))?
        };

        let autocommit = if self.config.autocommit() {
            AutoCommit::start(self.config.commit_interval(), sender.clone(), self.pending.clone())
        } else {
            None
        };

        Ok(RunningIndex {
            fields: Arc::new(fields),
            reader,
            sender,
            worker,
            autocommit,
        })
    }

    fn channel(&self) -> CatalogResult<(Sender<IndexCommand>, Arc<IndexFields>)> {
        match self.running.read().as_ref() {
            Some(index) => Ok((index.sender.clone(), index.fields.clone())),
            None => Err(not_running()),
        }
    }

    fn searcher(&self) -> CatalogResult<(Searcher, Arc<IndexFields>)> {
        match self.running.read().as_ref() {
            Some(index) => Ok((index.reader.searcher(), index.fields.clone())),
            None => Err(not_running()),
        }
    }

    /// Queues a write, blocking while the queue is full.
    fn enqueue(&self, sender: &Sender<IndexCommand>, command: IndexCommand) -> CatalogResult<()> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        sender.send(command).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            not_running()
        })
    }
}

impl Drop for FullTextIndexInner {
    fn drop(&mut self) {
        if let Some(index) = self.running.get_mut().take() {
            if let Err(e) = shutdown(index, &self.pending) {
                log::warn!("Full-text index did not shut down cleanly: {}", e);
            }
        }
    }
}

/// Queues a commit and waits until the writer has processed it.
fn commit_through(sender: &Sender<IndexCommand>) -> CatalogResult<()> {
    let (ack, done) = bounded(1);
    sender
        .send(IndexCommand::Commit(Some(ack)))
        .map_err(|_| not_running())?;
    done.recv().map_err(|_| not_running())?
}

fn shutdown(index: RunningIndex, pending: &AtomicUsize) -> CatalogResult<()> {
    let RunningIndex {
        sender,
        worker,
        autocommit,
        ..
    } = index;
    drop(autocommit);

    let committed = commit_through(&sender);
    if sender.send(IndexCommand::End).is_err() {
        log::debug!("Full-text writer already stopped");
    }
    drop(sender);

    if worker.join().is_err() {
        log::error!("Full-text writer thread panicked");
    }
    let lost = pending.swap(0, Ordering::AcqRel);
    if lost > 0 {
        log::warn!("{} full-text writes were not committed before close", lost);
    }
    committed
}

fn run_worker(
    mut writer: IndexWriter,
    reader: IndexReader,
    receiver: Receiver<IndexCommand>,
    id_field: Field,
    pending: Arc<AtomicUsize>,
) {
    log::debug!("Full-text writer started");
    let mut applied = 0usize;
    loop {
        let command = match receiver.recv() {
            Ok(command) => command,
            Err(_) => {
                log::error!(
                    "Full-text command queue disconnected with {} uncommitted writes",
                    pending.load(Ordering::Acquire)
                );
                break;
            }
        };

        match command {
            IndexCommand::Add(doc) => {
                applied += 1;
                if let Err(e) = writer.add_document(doc) {
                    log::error!("Failed to add full-text document: {}", e);
                }
            }
            IndexCommand::Update(id, doc) => {
                applied += 1;
                writer.delete_term(Term::from_field_text(id_field, id.as_str()));
                if let Err(e) = writer.add_document(doc) {
                    log::error!("Failed to update full-text document {}: {}", id, e);
                }
            }
            IndexCommand::Delete(id) => {
                applied += 1;
                writer.delete_term(Term::from_field_text(id_field, id.as_str()));
            }
            IndexCommand::Clear => {
                applied += 1;
                if let Err(e) = writer.delete_all_documents() {
                    log::error!("Failed to clear full-text index: {}", e);
                }
            }
            IndexCommand::Commit(ack) => {
                pending.fetch_sub(applied, Ordering::AcqRel);
                applied = 0;
                let result = commit_and_reload(&mut writer, &reader);
                if let Err(e) = &result {
                    log::error!("{}", e);
                }
                if let Some(ack) = ack {
                    // the caller may have given up waiting
                    let _ = ack.send(result);
                }
            }
            IndexCommand::End => break,
        }
    }

    // writers that raced with close may still have queued commands
    let dropped = receiver.try_iter().count();
    if dropped > 0 {
        log::warn!("Dropped {} full-text commands queued after close", dropped);
    }

    if let Err(e) = writer.wait_merging_threads() {
        log::warn!("Full-text merge threads failed: {}", e);
    }
    log::debug!("Full-text writer stopped");
}

fn commit_and_reload(writer: &mut IndexWriter, reader: &IndexReader) -> CatalogResult<()> {
    writer
        .commit()
        .map_err(|e| fts_error("Failed to commit full-text index", e))?;
    reader
        .reload()
        .map_err(|e| fts_error("Failed to reload full-text reader", e))
}

fn not_running() -> CatalogError {
    CatalogError::new("Full-text index is not running", ErrorKind::IndexNotRunning)
}

fn resolve(searcher: &Searcher, address: DocAddress) -> CatalogResult<TantivyDocument> {
    searcher
        .doc::<TantivyDocument>(address)
        .map_err(|e| fts_error("Failed to retrieve full-text document", e))
}

/// Every hit sorted by the stored sort keys, ties kept in document order.
fn sorted_ids(
    searcher: Searcher,
    query: Box<dyn Query>,
    fields: Arc<IndexFields>,
    page_size: usize,
    sort: &[(Field, bool)],
) -> CatalogResult<Vec<InfoId>> {
    let mut keyed: Vec<(Vec<Vec<u8>>, InfoId)> = Vec::new();
    let mut pager = HitPager::new(searcher.clone(), &*query, fields.clone(), page_size, 0)?;
    while let Some(address) = pager.next_address() {
        let doc = resolve(&searcher, address?)?;
        let keys = sort
            .iter()
            .map(|(field, _)| stored_sort_key(&doc, *field))
            .collect();
        keyed.push((keys, stored_id(&doc, &fields)?));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        for (i, (_, descending)) in sort.iter().enumerate() {
            let ordering = a[i].cmp(&b[i]);
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != CmpOrdering::Equal {
                return ordering;
            }
        }
        CmpOrdering::Equal
    });
    Ok(keyed.into_iter().map(|(_, id)| id).collect())
}

/// Lazily walks every hit of a query one page at a time, in document order.
///
/// The cursor resumes each segment's scorer where the previous page
/// stopped, so no hit is collected twice. Every query is constant-scored,
/// so document order is also score order.
struct HitPager {
    searcher: Searcher,
    weight: Box<dyn Weight>,
    fields: Arc<IndexFields>,
    page_size: usize,
    skip: usize,
    next_segment: u32,
    cursor: Option<(u32, Box<dyn Scorer>)>,
    buffer: VecDeque<DocAddress>,
    exhausted: bool,
}

impl HitPager {
    fn new(
        searcher: Searcher,
        query: &dyn Query,
        fields: Arc<IndexFields>,
        page_size: usize,
        offset: usize,
    ) -> CatalogResult<Self> {
        let weight = query
            .weight(EnableScoring::disabled_from_searcher(&searcher))
            .map_err(|e| fts_error("Failed to prepare full-text query", e))?;
        Ok(HitPager {
            searcher,
            weight,
            fields,
            page_size,
            skip: offset,
            next_segment: 0,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        })
    }

    fn next_address(&mut self) -> Option<CatalogResult<DocAddress>> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }

    fn fetch_page(&mut self) -> CatalogResult<()> {
        while self.buffer.len() < self.page_size {
            let Some((segment, scorer)) = self.cursor.as_mut() else {
                if self.next_segment as usize >= self.searcher.segment_readers().len() {
                    self.exhausted = true;
                    break;
                }
                let reader = self.searcher.segment_reader(self.next_segment);
                let scorer = self
                    .weight
                    .scorer(reader, 1.0)
                    .map_err(|e| fts_error("Failed to search full-text index", e))?;
                self.cursor = Some((self.next_segment, scorer));
                self.next_segment += 1;
                continue;
            };

            let doc = scorer.doc();
            if doc == TERMINATED {
                self.cursor = None;
                continue;
            }
            let segment = *segment;
            scorer.advance();

            let alive = self
                .searcher
                .segment_reader(segment)
                .alive_bitset()
                .map_or(true, |alive| alive.is_alive(doc));
            if !alive {
                continue;
            }
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            self.buffer.push_back(DocAddress::new(segment, doc));
        }
        Ok(())
    }
}

impl Iterator for HitPager {
    type Item = CatalogResult<InfoId>;

    fn next(&mut self) -> Option<Self::Item> {
        let address = match self.next_address()? {
            Ok(address) => address,
            Err(e) => return Some(Err(e)),
        };
        Some(resolve(&self.searcher, address).and_then(|doc| stored_id(&doc, &self.fields)))
    }
}
