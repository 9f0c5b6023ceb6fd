use super::index::{IndexData, IndexDefinition, IndexKey};
use crate::errors::{CatalogError, CatalogResult, ErrorKind};
use crate::model::{CatalogInfo, InfoId, InfoKind, QualifiedName};
use im::OrdMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::Arc;

/// One generation of every index of a concrete kind.
///
/// Snapshots are never mutated once published; a write clones the current
/// snapshot (structural sharing keeps that cheap), edits the copy and swaps
/// it in as a whole.
#[derive(Clone, Default)]
pub(crate) struct Partition {
    pub(crate) by_id: OrdMap<InfoId, Arc<CatalogInfo>>,
    pub(crate) indices: Vec<IndexData>,
}

impl Partition {
    pub(crate) fn empty(definitions: &[IndexDefinition]) -> Self {
        Partition {
            by_id: OrdMap::new(),
            indices: definitions.iter().map(IndexData::for_definition).collect(),
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: &InfoId) -> Option<&Arc<CatalogInfo>> {
        self.by_id.get(id)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Rejects `keys` when a unique index already maps one of them to
    /// another entity.
    fn check_unique(
        &self,
        definitions: &[IndexDefinition],
        keys: &[Option<IndexKey>],
        id: &InfoId,
    ) -> CatalogResult<()> {
        for ((definition, data), key) in definitions.iter().zip(&self.indices).zip(keys) {
            if let Some(key) = key {
                if let Some(owner) = data.conflicting(key, id) {
                    log::error!(
                        "Key {:?} of {} already taken by {} in index {}",
                        key,
                        id,
                        owner,
                        definition.name()
                    );
                    return Err(CatalogError::new(
                        &format!(
                            "Unique key constraint violation in index {} for {}",
                            definition.name(),
                            id
                        ),
                        ErrorKind::DuplicateKey,
                    ));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn with_added(
        &self,
        definitions: &[IndexDefinition],
        info: Arc<CatalogInfo>,
    ) -> CatalogResult<Partition> {
        if self.by_id.contains_key(info.id()) {
            log::error!("{} {} is already registered", info.kind(), info.id());
            return Err(CatalogError::new(
                &format!("Unique key constraint violation in index id for {}", info.id()),
                ErrorKind::DuplicateKey,
            ));
        }

        let keys = keys_of(definitions, &info);
        self.check_unique(definitions, &keys, info.id())?;

        let mut next = self.clone();
        for (data, key) in next.indices.iter_mut().zip(keys) {
            if let Some(key) = key {
                data.insert(key, info.id().clone());
            }
        }
        next.by_id.insert(info.id().clone(), info);
        Ok(next)
    }

    /// Replaces the value stored under `info.id()` and remaps every key that
    /// changed. `old_name` is the composite name the caller saw before the
    /// change; the name index (always the first secondary index) is remapped
    /// from it.
    pub(crate) fn with_updated(
        &self,
        definitions: &[IndexDefinition],
        old_name: &QualifiedName,
        info: Arc<CatalogInfo>,
    ) -> CatalogResult<Partition> {
        let current = self.get(info.id()).cloned().ok_or_else(|| {
            log::error!("Cannot update unknown {} {}", info.kind(), info.id());
            CatalogError::new(
                &format!("No {} found with id {}", info.kind(), info.id()),
                ErrorKind::NotFound,
            )
        })?;

        let mut old_keys = keys_of(definitions, &current);
        if let Some(stored) = self.indices.first() {
            let stale = IndexKey::Name(old_name.clone());
            if stored.holds(&stale, info.id()) {
                old_keys[0] = Some(stale);
            } else {
                log::warn!(
                    "Stale name {} does not map to {}, remapping from stored value",
                    old_name,
                    info.id()
                );
            }
        }
        let new_keys = keys_of(definitions, &info);
        self.check_unique(definitions, &new_keys, info.id())?;

        let mut next = self.clone();
        for ((data, old_key), new_key) in next.indices.iter_mut().zip(old_keys).zip(new_keys) {
            if old_key == new_key {
                continue;
            }
            if let Some(old_key) = old_key {
                data.remove(&old_key, info.id());
            }
            if let Some(new_key) = new_key {
                data.insert(new_key, info.id().clone());
            }
        }
        next.by_id.insert(info.id().clone(), info);
        Ok(next)
    }

    /// Returns the snapshot without `id` and the value it held.
    pub(crate) fn with_removed(
        &self,
        definitions: &[IndexDefinition],
        id: &InfoId,
    ) -> Option<(Partition, Arc<CatalogInfo>)> {
        let current = self.get(id)?.clone();
        let mut next = self.clone();
        for (data, key) in next.indices.iter_mut().zip(keys_of(definitions, &current)) {
            if let Some(key) = key {
                data.remove(&key, id);
            }
        }
        next.by_id.remove(id);
        Some((next, current))
    }

    /// Adds an index for `definition` populated from every stored value.
    pub(crate) fn with_index(&self, definition: &IndexDefinition) -> CatalogResult<Partition> {
        let mut data = IndexData::for_definition(definition);
        for (id, info) in self.by_id.iter() {
            if let Some(key) = definition.key_of(info) {
                if let Some(owner) = data.conflicting(&key, id) {
                    return Err(CatalogError::new(
                        &format!(
                            "Cannot build unique index {}, {} and {} share key {:?}",
                            definition.name(),
                            owner,
                            id,
                            key
                        ),
                        ErrorKind::DuplicateKey,
                    ));
                }
                data.insert(key, id.clone());
            }
        }
        let mut next = self.clone();
        next.indices.push(data);
        Ok(next)
    }
}

fn keys_of(definitions: &[IndexDefinition], info: &CatalogInfo) -> Vec<Option<IndexKey>> {
    definitions.iter().map(|d| d.key_of(info)).collect()
}

/// The published snapshot of one concrete kind plus the lock serializing
/// its writers.
pub(crate) struct PartitionCell {
    kind: InfoKind,
    writer: Mutex<()>,
    current: RwLock<Arc<Partition>>,
}

impl PartitionCell {
    pub(crate) fn new(kind: InfoKind, definitions: &[IndexDefinition]) -> Self {
        PartitionCell {
            kind,
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(Partition::empty(definitions))),
        }
    }

    #[inline]
    pub(crate) fn kind(&self) -> InfoKind {
        self.kind
    }

    #[inline]
    pub(crate) fn snapshot(&self) -> Arc<Partition> {
        self.current.read().clone()
    }

    /// Locks out other writers of this partition until the guard drops.
    #[inline]
    pub(crate) fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock()
    }

    /// Publishes `next`; callers hold the writer lock.
    #[inline]
    pub(crate) fn publish(&self, next: Partition) {
        *self.current.write() = Arc::new(next);
    }
}
