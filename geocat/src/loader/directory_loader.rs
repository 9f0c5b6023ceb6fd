use super::LoaderConfig;
use crate::errors::{CatalogError, CatalogResult, ErrorKind};
use crate::manager::CatalogInfoLookupManager;
use crate::model::{BaseType, CatalogInfo, InfoKind};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Directory holding one sub-directory per workspace.
pub const WORKSPACES_DIR: &str = "workspaces";
/// Directory holding style files, global or per workspace.
pub const STYLES_DIR: &str = "styles";
/// Directory holding layer group files, global or per workspace.
pub const LAYER_GROUPS_DIR: &str = "layergroups";

const JSON_EXTENSION: &str = "json";

/// The outcome of one load.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    loaded: usize,
    failures: Vec<(PathBuf, String)>,
    elapsed: Duration,
}

impl LoadSummary {
    /// Entities added to the catalog.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Files that could not be loaded.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Each failed file with the reason it failed.
    pub fn failures(&self) -> &[(PathBuf, String)] {
        &self.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Default)]
struct Progress {
    loaded: AtomicUsize,
    failures: Mutex<Vec<(PathBuf, String)>>,
}

impl Progress {
    fn record(&self, path: &Path, result: CatalogResult<Arc<CatalogInfo>>) -> Option<Arc<CatalogInfo>> {
        match result {
            Ok(info) => {
                self.loaded.fetch_add(1, Ordering::Relaxed);
                Some(info)
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                self.failures.lock().push((path.to_path_buf(), e.to_string()));
                None
            }
        }
    }

    fn into_summary(self, elapsed: Duration) -> LoadSummary {
        let mut failures = self.failures.into_inner();
        failures.sort();
        LoadSummary {
            loaded: self.loaded.into_inner(),
            failures,
            elapsed,
        }
    }
}

/// Bulk-populates a catalog from a tree of JSON entity files.
///
/// The tree looks like
///
/// ```text
/// <root>/
///   styles/*.json
///   layergroups/*.json
///   workspaces/<ws>/workspace.json
///   workspaces/<ws>/namespace.json
///   workspaces/<ws>/styles/*.json
///   workspaces/<ws>/layergroups/*.json
///   workspaces/<ws>/<store>/<datastore|coveragestore|wmsstore|wmtsstore>.json
///   workspaces/<ws>/<store>/<resource>/<featuretype|coverage|wmslayer|wmtslayer>.json
///   workspaces/<ws>/<store>/<resource>/layer.json
/// ```
///
/// Loading runs in phases on a dedicated thread pool: workspaces and
/// namespaces, then styles and stores, then each resource followed by its
/// layer, then layer groups. A file that fails is logged and skipped.
pub struct DirectoryLoader {
    manager: Arc<CatalogInfoLookupManager>,
    config: LoaderConfig,
}

impl DirectoryLoader {
    pub fn new(manager: Arc<CatalogInfoLookupManager>, config: LoaderConfig) -> Self {
        DirectoryLoader { manager, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads every entity under `root` into the catalog.
    ///
    /// Fails only when `root` is not a directory, the pool cannot start or
    /// the final commit fails; per-file failures end up in the summary.
    pub fn load(&self, root: &Path) -> CatalogResult<LoadSummary> {
        if !root.is_dir() {
            log::error!("Catalog directory {} does not exist", root.display());
            return Err(CatalogError::new(
                &format!("{} is not a directory", root.display()),
                ErrorKind::IOError,
            ));
        }

        let started = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism())
            .thread_name(|i| format!("catalog-loader-{}", i))
            .build()
            .map_err(|e| {
                log::error!("Failed to start loader pool: {}", e);
                CatalogError::new(
                    &format!("Failed to start loader pool: {}", e),
                    ErrorKind::InternalError,
                )
            })?;

        let progress = Progress::default();
        pool.install(|| self.load_phases(root, &progress));
        drop(pool);

        if self.config.commit_on_finish() {
            self.manager.commit()?;
        }

        let summary = progress.into_summary(started.elapsed());
        log::info!(
            "Loaded {} catalog entities from {} in {:?} ({} failed)",
            summary.loaded(),
            root.display(),
            summary.elapsed(),
            summary.failed()
        );
        Ok(summary)
    }

    fn load_phases(&self, root: &Path, progress: &Progress) {
        let workspaces = sub_dirs(&root.join(WORKSPACES_DIR));

        workspaces.par_iter().for_each(|ws| {
            for kind in [InfoKind::Workspace, InfoKind::Namespace] {
                let file = ws.join(kind.file_stem()).with_extension(JSON_EXTENSION);
                progress.record(&file, self.load_file(&file, kind));
            }
        });

        let mut styles = json_files(&root.join(STYLES_DIR));
        let mut groups = json_files(&root.join(LAYER_GROUPS_DIR));
        let mut stores = Vec::new();
        for ws in &workspaces {
            styles.extend(json_files(&ws.join(STYLES_DIR)));
            groups.extend(json_files(&ws.join(LAYER_GROUPS_DIR)));
            stores.extend(
                sub_dirs(ws)
                    .into_iter()
                    .filter(|dir| !is_named(dir, STYLES_DIR) && !is_named(dir, LAYER_GROUPS_DIR)),
            );
        }

        rayon::join(
            || {
                styles.par_iter().for_each(|file| {
                    progress.record(file, self.load_file(file, InfoKind::Style));
                })
            },
            || {
                stores.par_iter().for_each(|store| {
                    for (file, kind) in entity_files(store, BaseType::Store) {
                        progress.record(&file, self.load_file(&file, kind));
                    }
                })
            },
        );

        let resources: Vec<PathBuf> = stores.iter().flat_map(|store| sub_dirs(store)).collect();
        resources
            .par_iter()
            .for_each(|resource| self.load_resource(resource, progress));

        groups.par_iter().for_each(|file| {
            progress.record(file, self.load_file(file, InfoKind::LayerGroup));
        });
    }

    /// Loads a resource and then the layer publishing it.
    fn load_resource(&self, dir: &Path, progress: &Progress) {
        let mut loaded = false;
        for (file, kind) in entity_files(dir, BaseType::Resource) {
            loaded |= progress.record(&file, self.load_file(&file, kind)).is_some();
        }

        let layer = dir
            .join(InfoKind::Layer.file_stem())
            .with_extension(JSON_EXTENSION);
        if !layer.is_file() {
            return;
        }
        if loaded {
            progress.record(&layer, self.load_file(&layer, InfoKind::Layer));
        } else {
            log::warn!("Skipping {}, its resource did not load", layer.display());
            progress.record(
                &layer,
                Err(CatalogError::new(
                    "The published resource did not load",
                    ErrorKind::NotFound,
                )),
            );
        }
    }

    fn load_file(&self, path: &Path, expected: InfoKind) -> CatalogResult<Arc<CatalogInfo>> {
        let content = fs::read_to_string(path)?;
        let info: CatalogInfo = serde_json::from_str(&content)?;
        if info.kind() != expected {
            return Err(CatalogError::new(
                &format!("Expected a {} but found a {}", expected, info.kind()),
                ErrorKind::EncodingError,
            ));
        }
        log::trace!("Loading {} {} from {}", info.kind(), info.id(), path.display());
        self.manager.add(info)
    }
}

fn is_named(path: &Path, name: &str) -> bool {
    path.file_name().map(|n| n == name).unwrap_or(false)
}

fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if dir.exists() {
                log::warn!("Cannot list {}: {}", dir.display(), e);
            }
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| keep(path))
        .collect();
    paths.sort();
    paths
}

fn sub_dirs(dir: &Path) -> Vec<PathBuf> {
    sorted_entries(dir, |path| path.is_dir())
}

fn json_files(dir: &Path) -> Vec<PathBuf> {
    sorted_entries(dir, |path| {
        path.is_file() && path.extension().map(|e| e == JSON_EXTENSION).unwrap_or(false)
    })
}

/// JSON files in `dir` named after a kind of `base`.
fn entity_files(dir: &Path, base: BaseType) -> Vec<(PathBuf, InfoKind)> {
    json_files(dir)
        .into_iter()
        .filter_map(|file| {
            let stem = file.file_stem()?.to_str()?;
            let kind = InfoKind::from_file_stem(stem).filter(|k| k.base_type() == base)?;
            Some((file, kind))
        })
        .collect()
}
