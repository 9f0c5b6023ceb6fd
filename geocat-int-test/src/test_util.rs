use geocat::errors::{CatalogError, CatalogResult, ErrorKind};
use geocat::manager::CatalogInfoLookupManager;
use geocat::model::{CatalogInfo, InfoId, InfoKind};
use geocat_tantivy_fts::{CatalogInfoLookupFullTextIndex, DocumentMapping, FtsConfig};
use std::backtrace::Backtrace;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Runs a test with retry logic and error handling.
/// Tests run on the current thread to avoid thread exhaustion when running many tests in parallel.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> CatalogResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> CatalogResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> CatalogResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();
        let error = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                if !bt.is_empty() && !bt.contains("disabled") {
                    eprintln!("Backtrace:\n{}", bt);
                }
                e
            }
            Err(panic_err) => {
                if let Some(s) = panic_err.downcast_ref::<&str>() {
                    format!("Panic: {}", s)
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    format!("Panic: {}", s)
                } else {
                    "Panic: unknown payload".to_string()
                }
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("Error: {}", error);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(error);
    }

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    manager: Arc<CatalogInfoLookupManager>,
    index: Option<CatalogInfoLookupFullTextIndex>,
}

impl TestContext {
    pub fn new(manager: CatalogInfoLookupManager, index: Option<CatalogInfoLookupFullTextIndex>) -> Self {
        Self {
            manager: Arc::new(manager),
            index,
        }
    }

    pub fn manager(&self) -> Arc<CatalogInfoLookupManager> {
        self.manager.clone()
    }

    /// The full-text index of the context; fails for plain contexts.
    pub fn index(&self) -> CatalogResult<CatalogInfoLookupFullTextIndex> {
        self.index.clone().ok_or_else(|| {
            CatalogError::new("Test context has no full-text index", ErrorKind::InternalError)
        })
    }
}

/// A catalog without a full-text mirror.
pub fn create_test_context() -> CatalogResult<TestContext> {
    Ok(TestContext::new(CatalogInfoLookupManager::new(None), None))
}

/// Small writer settings keep parallel test runs from exhausting memory and
/// threads. Autocommit is off so visibility only follows explicit commits.
pub fn fts_test_config() -> FtsConfig {
    FtsConfig::new()
        .with_index_writer_heap_size(15_000_000)
        .with_num_threads(1)
        .with_autocommit(false)
}

/// A catalog mirrored into an open full-text index.
pub fn create_fts_test_context() -> CatalogResult<TestContext> {
    create_fts_test_context_with(fts_test_config(), DocumentMapping::new())
}

pub fn create_fts_test_context_with(
    config: FtsConfig,
    mapping: DocumentMapping,
) -> CatalogResult<TestContext> {
    let index = CatalogInfoLookupFullTextIndex::with_config(config, mapping)?;
    index.open()?;
    let manager = CatalogInfoLookupManager::new(Some(Arc::new(index.clone())));
    Ok(TestContext::new(manager, Some(index)))
}

pub fn cleanup(ctx: TestContext) -> CatalogResult<()> {
    if let Some(index) = &ctx.index {
        index.dispose()?;
    }
    Ok(())
}

pub fn random_name(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Shape of a generated catalog tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeShape {
    pub workspaces: usize,
    pub stores_per_workspace: usize,
    pub resources_per_store: usize,
}

impl TreeShape {
    /// Entities the tree holds: a workspace and a namespace per workspace,
    /// a store per store directory, a resource and a layer per resource,
    /// one style and one layer group per workspace.
    pub fn entity_count(&self) -> usize {
        let resources = self.workspaces * self.stores_per_workspace * self.resources_per_store;
        self.workspaces * 4 + self.workspaces * self.stores_per_workspace + resources * 2
    }
}

/// Writes a catalog tree in the layout read by the directory loader.
///
/// Workspace `i` is named `ws<i>`; every resource title contains the word
/// `roads` for even resources and `rivers` for odd ones.
pub fn write_catalog_tree(root: &Path, shape: TreeShape) -> CatalogResult<()> {
    let workspaces = root.join(geocat::loader::WORKSPACES_DIR);
    for w in 0..shape.workspaces {
        let ws_name = format!("ws{}", w);
        let ws_dir = workspaces.join(&ws_name);
        let ws_id = InfoId::new(&format!("ws-{}", w));
        let ns_id = InfoId::new(&format!("ns-{}", w));

        write_info(
            &ws_dir.join("workspace.json"),
            &CatalogInfo::builder(InfoKind::Workspace, &ws_name)
                .id(ws_id.as_str())
                .build(),
        )?;
        write_info(
            &ws_dir.join("namespace.json"),
            &CatalogInfo::builder(InfoKind::Namespace, &ws_name)
                .id(ns_id.as_str())
                .property("uri", format!("http://{}.example.org", ws_name))
                .build(),
        )?;
        write_info(
            &ws_dir.join(geocat::loader::STYLES_DIR).join("line.json"),
            &CatalogInfo::builder(InfoKind::Style, "line")
                .id(&format!("style-{}", w))
                .workspace(&ws_id)
                .build(),
        )?;
        write_info(
            &ws_dir.join(geocat::loader::LAYER_GROUPS_DIR).join("basemap.json"),
            &CatalogInfo::builder(InfoKind::LayerGroup, "basemap")
                .id(&format!("lg-{}", w))
                .workspace(&ws_id)
                .property("title", "Base map")
                .build(),
        )?;

        for s in 0..shape.stores_per_workspace {
            let store_name = format!("store{}", s);
            let store_dir = ws_dir.join(&store_name);
            let store_id = InfoId::new(&format!("store-{}-{}", w, s));
            write_info(
                &store_dir.join("datastore.json"),
                &CatalogInfo::builder(InfoKind::DataStore, &store_name)
                    .id(store_id.as_str())
                    .workspace(&ws_id)
                    .build(),
            )?;

            for r in 0..shape.resources_per_store {
                let resource_name = format!("ft{}_{}", s, r);
                let resource_dir = store_dir.join(&resource_name);
                let resource_id = InfoId::new(&format!("ft-{}-{}-{}", w, s, r));
                let title = if r % 2 == 0 { "Main roads" } else { "Major rivers" };
                write_info(
                    &resource_dir.join("featuretype.json"),
                    &CatalogInfo::builder(InfoKind::FeatureType, &resource_name)
                        .id(resource_id.as_str())
                        .namespace(&ns_id)
                        .store(&store_id)
                        .property("title", title)
                        .build(),
                )?;
                write_info(
                    &resource_dir.join("layer.json"),
                    &CatalogInfo::builder(InfoKind::Layer, &resource_name)
                        .id(&format!("layer-{}-{}-{}", w, s, r))
                        .namespace(&ns_id)
                        .resource(&resource_id)
                        .property("title", title)
                        .build(),
                )?;
            }
        }
    }
    Ok(())
}

pub fn write_info(path: &Path, info: &CatalogInfo) -> CatalogResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(info)?)?;
    Ok(())
}

/// A fresh temporary directory removed when the guard drops.
pub fn temp_catalog_dir() -> CatalogResult<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::Builder::new().prefix("geocat-catalog-").tempdir()?;
    let path = dir.path().to_path_buf();
    Ok((dir, path))
}
