use super::index::{IndexDefinition, IndexKey, ID_INDEX, NAME_INDEX};
use super::partition::{Partition, PartitionCell};
use super::stream::{InfoStream, SnapshotStream};
use super::InfoLookup;
use crate::errors::{CatalogError, CatalogResult, ErrorKind};
use crate::filter::Filter;
use crate::model::{BaseType, CatalogInfo, InfoId, InfoKind, InfoType, InfoUpdate, QualifiedName};
use parking_lot::RwLock;
use std::sync::Arc;

/// The in-memory registry of every entity of one base type.
///
/// Entities live in one partition per concrete kind. Each partition carries
/// the id index, the composite-name index and any index registered later,
/// all published together as one immutable snapshot. A write builds the
/// next snapshot under the partition's writer lock and swaps it in, so a
/// reader sees either all or none of the entries of one write.
///
/// # Examples
///
/// ```rust
/// use geocat::lookup::{CatalogInfoLookup, InfoLookup};
/// use geocat::model::{BaseType, CatalogInfo, InfoKind, InfoType, QualifiedName};
///
/// let lookup = CatalogInfoLookup::new(BaseType::Workspace);
/// let ws = lookup.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build()).unwrap();
///
/// let found = lookup.find_by_name(&QualifiedName::global("topp"), InfoKind::Workspace.into());
/// assert_eq!(found.map(|w| w.id().clone()), Some(ws.id().clone()));
/// ```
pub struct CatalogInfoLookup {
    base_type: BaseType,
    definitions: RwLock<Vec<IndexDefinition>>,
    partitions: Vec<PartitionCell>,
}

impl CatalogInfoLookup {
    pub fn new(base_type: BaseType) -> Self {
        let definitions = vec![IndexDefinition::name_index()];
        let partitions = base_type
            .kinds()
            .iter()
            .map(|kind| PartitionCell::new(*kind, &definitions))
            .collect();
        CatalogInfoLookup {
            base_type,
            definitions: RwLock::new(definitions),
            partitions,
        }
    }

    pub fn base_type(&self) -> BaseType {
        self.base_type
    }

    /// Names of every index, the id index first.
    pub fn index_names(&self) -> Vec<String> {
        let mut names = vec![ID_INDEX.to_string()];
        names.extend(self.definitions.read().iter().map(|d| d.name().to_string()));
        names
    }

    pub fn has_index(&self, name: &str) -> bool {
        name == ID_INDEX || self.definitions.read().iter().any(|d| d.name() == name)
    }

    /// Registers a secondary index and fills it from the current content.
    ///
    /// Fails with `IndexAlreadyExists` when the name is taken, and with
    /// `DuplicateKey` when a unique index cannot hold the current content;
    /// nothing changes in either case.
    pub fn register_index(&self, definition: IndexDefinition) -> CatalogResult<()> {
        // all writers stay out while the index is back-filled
        let _guards: Vec<_> = self.partitions.iter().map(|p| p.lock_writer()).collect();
        let mut definitions = self.definitions.write();
        if definition.name() == ID_INDEX || definitions.iter().any(|d| d.name() == definition.name())
        {
            log::error!("Index {} already exists on {}", definition.name(), self.base_type);
            return Err(CatalogError::new(
                &format!("Index {} already exists on {}", definition.name(), self.base_type),
                ErrorKind::IndexAlreadyExists,
            ));
        }

        let mut rebuilt = Vec::with_capacity(self.partitions.len());
        for cell in &self.partitions {
            rebuilt.push(cell.snapshot().with_index(&definition)?);
        }
        for (cell, partition) in self.partitions.iter().zip(rebuilt) {
            cell.publish(partition);
        }
        log::debug!("Registered index {} on {}", definition.name(), self.base_type);
        definitions.push(definition);
        Ok(())
    }

    /// Entities stored under `key` in the index called `index_name`.
    pub fn find_all_by_index(
        &self,
        index_name: &str,
        key: &IndexKey,
        info_type: InfoType,
    ) -> CatalogResult<Vec<Arc<CatalogInfo>>> {
        if index_name == ID_INDEX {
            return match key {
                IndexKey::Id(id) => Ok(self.find_by_id(id, info_type).into_iter().collect()),
                _ => Err(CatalogError::new(
                    "The id index is keyed by InfoId",
                    ErrorKind::IllegalArgument,
                )),
            };
        }

        let position = self
            .definitions
            .read()
            .iter()
            .position(|d| d.name() == index_name)
            .ok_or_else(|| {
                CatalogError::new(
                    &format!("No index {} on {}", index_name, self.base_type),
                    ErrorKind::IndexNotFound,
                )
            })?;

        let mut result = Vec::new();
        for partition in self.snapshots(info_type) {
            if let Some(data) = partition.indices.get(position) {
                result.extend(data.ids(key).iter().filter_map(|id| partition.get(id).cloned()));
            }
        }
        Ok(result)
    }

    fn cell(&self, kind: InfoKind) -> CatalogResult<&PartitionCell> {
        self.partitions
            .iter()
            .find(|cell| cell.kind() == kind)
            .ok_or_else(|| {
                log::error!("{} does not belong to the {} lookup", kind, self.base_type);
                CatalogError::new(
                    &format!("{} is not a {}", kind, self.base_type.type_name()),
                    ErrorKind::IllegalArgument,
                )
            })
    }

    /// Current snapshots of every partition covered by `info_type`.
    fn snapshots(&self, info_type: InfoType) -> Vec<Arc<Partition>> {
        self.partitions
            .iter()
            .filter(|cell| info_type.includes(cell.kind()))
            .map(|cell| cell.snapshot())
            .collect()
    }
}

impl InfoLookup for CatalogInfoLookup {
    fn covers(&self, info_type: InfoType) -> bool {
        self.base_type.kinds().iter().any(|kind| info_type.includes(*kind))
    }

    fn add(&self, info: CatalogInfo) -> CatalogResult<Arc<CatalogInfo>> {
        let cell = self.cell(info.kind())?;
        let info = Arc::new(info);

        // ids are unique across every kind of the lookup
        let _writers: Vec<_> = self.partitions.iter().map(|p| p.lock_writer()).collect();
        let taken = self
            .partitions
            .iter()
            .filter(|other| other.kind() != info.kind())
            .find_map(|other| other.snapshot().get(info.id()).map(|owner| owner.kind()));
        if let Some(owner) = taken {
            log::error!("{} {} is already registered as a {}", info.kind(), info.id(), owner);
            return Err(CatalogError::new(
                &format!("Unique key constraint violation in index id for {}", info.id()),
                ErrorKind::DuplicateKey,
            ));
        }

        let definitions = self.definitions.read();
        let next = cell.snapshot().with_added(&definitions, info.clone())?;
        cell.publish(next);
        log::debug!("Added {} {} ({})", info.kind(), info.id(), info.name());
        Ok(info)
    }

    fn update(&self, update: InfoUpdate) -> CatalogResult<Arc<CatalogInfo>> {
        let cell = self.cell(update.info().kind())?;
        let old_name = update.old_name().clone();
        let info = Arc::new(update.into_info());

        let _writer = cell.lock_writer();
        let definitions = self.definitions.read();
        let next = cell
            .snapshot()
            .with_updated(&definitions, &old_name, info.clone())?;
        cell.publish(next);
        log::debug!("Updated {} {} ({} -> {})", info.kind(), info.id(), old_name, info.name());
        Ok(info)
    }

    fn remove(&self, info: &CatalogInfo) -> CatalogResult<Option<Arc<CatalogInfo>>> {
        let cell = self.cell(info.kind())?;

        let _writer = cell.lock_writer();
        let definitions = self.definitions.read();
        match cell.snapshot().with_removed(&definitions, info.id()) {
            Some((next, removed)) => {
                cell.publish(next);
                log::debug!("Removed {} {}", removed.kind(), removed.id());
                Ok(Some(removed))
            }
            None => Ok(None),
        }
    }

    fn clear(&self) -> CatalogResult<()> {
        for cell in &self.partitions {
            let _writer = cell.lock_writer();
            let definitions = self.definitions.read();
            cell.publish(Partition::empty(&definitions));
        }
        log::debug!("Cleared {} lookup", self.base_type);
        Ok(())
    }

    fn find_by_id(&self, id: &InfoId, info_type: InfoType) -> Option<Arc<CatalogInfo>> {
        self.partitions
            .iter()
            .filter(|cell| info_type.includes(cell.kind()))
            .find_map(|cell| cell.snapshot().get(id).cloned())
    }

    fn find_by_name(&self, name: &QualifiedName, info_type: InfoType) -> Option<Arc<CatalogInfo>> {
        let key = IndexKey::Name(name.clone());
        let position = self
            .definitions
            .read()
            .iter()
            .position(|d| d.name() == NAME_INDEX)?;

        self.snapshots(info_type).into_iter().find_map(|partition| {
            let data = partition.indices.get(position)?;
            data.ids(&key).first().and_then(|id| partition.get(id).cloned())
        })
    }

    fn stream(&self, info_type: InfoType, filter: &Filter) -> InfoStream {
        if filter.is_exclude() {
            return Box::new(std::iter::empty());
        }
        Box::new(SnapshotStream::new(self.snapshots(info_type), filter.clone()))
    }

    fn size(&self, info_type: InfoType) -> usize {
        self.partitions
            .iter()
            .filter(|cell| info_type.includes(cell.kind()))
            .map(|cell| cell.snapshot().len())
            .sum()
    }
}
