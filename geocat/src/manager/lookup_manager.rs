use super::query::{limit_to, CatalogStream, Query};
use crate::errors::{CatalogError, CatalogResult, ErrorKind};
use crate::filter::{Filter, FullTextExtractor, FullTextSplit};
use crate::fulltext::{FullTextSearch, TextQuery};
use crate::lookup::{CatalogInfoLookup, CombinedLookup, IndexDefinition, IndexKey, InfoLookup};
use crate::model::{
    props, BaseType, CatalogInfo, InfoId, InfoKind, InfoType, InfoUpdate, QualifiedName,
};
use crate::common::Value;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Index of namespaces by URI.
pub const URI_INDEX: &str = "uri";
/// Index of stores, styles and layer groups by workspace id.
pub const WORKSPACE_INDEX: &str = "workspace";
/// Index of resources by namespace id.
pub const NAMESPACE_INDEX: &str = "namespace";
/// Index of resources by store id.
pub const STORE_INDEX: &str = "store";
/// Index of layers by resource id.
pub const RESOURCE_INDEX: &str = "resource";

/// The entry point to the in-memory catalog.
///
/// Owns one [`CatalogInfoLookup`] per base type and, optionally, a full-text
/// mirror. Writes go to the typed lookup first and then to the mirror.
/// Reads split their filter into full-text terms, answered by the mirror,
/// and a structural residual, answered in memory.
///
/// # Examples
///
/// ```rust
/// use geocat::filter::field;
/// use geocat::manager::{CatalogInfoLookupManager, Query};
/// use geocat::model::{CatalogInfo, InfoKind, InfoType};
///
/// let manager = CatalogInfoLookupManager::new(None);
/// let ws = manager.add(CatalogInfo::builder(InfoKind::Workspace, "topp").build()).unwrap();
/// manager.add(CatalogInfo::builder(InfoKind::DataStore, "states").workspace(ws.id()).build()).unwrap();
///
/// let stores = manager
///     .list(InfoType::Base(geocat::model::BaseType::Store), &field("workspace.id").eq(ws.id().as_str()), &Query::new())
///     .unwrap();
/// assert_eq!(stores.len(), 1);
/// ```
pub struct CatalogInfoLookupManager {
    lookups: IndexMap<BaseType, Arc<CatalogInfoLookup>>,
    published: Arc<CombinedLookup>,
    everything: Arc<CombinedLookup>,
    full_text: Option<Arc<dyn FullTextSearch>>,
    /// Ids of every entity across all lookups.
    ids: Mutex<HashSet<InfoId>>,
}

impl CatalogInfoLookupManager {
    /// Creates an empty catalog, mirrored into `full_text` when given.
    pub fn new(full_text: Option<Arc<dyn FullTextSearch>>) -> Self {
        let lookups: IndexMap<BaseType, Arc<CatalogInfoLookup>> = BaseType::ALL
            .iter()
            .map(|base| (*base, Arc::new(Self::create_lookup(*base))))
            .collect();

        let as_dyn = |base: BaseType| -> Vec<Arc<dyn InfoLookup>> {
            lookups
                .iter()
                .filter(|(b, _)| **b == base)
                .map(|(_, lookup)| lookup.clone() as Arc<dyn InfoLookup>)
                .collect()
        };
        let mut published_lookups = as_dyn(BaseType::Layer);
        published_lookups.extend(as_dyn(BaseType::LayerGroup));
        let published = Arc::new(CombinedLookup::combine_as_immutable(
            InfoType::Published,
            published_lookups,
        ));
        let everything = Arc::new(CombinedLookup::combine_as_immutable(
            InfoType::Any,
            lookups
                .values()
                .map(|lookup| lookup.clone() as Arc<dyn InfoLookup>)
                .collect(),
        ));

        CatalogInfoLookupManager {
            lookups,
            published,
            everything,
            full_text,
            ids: Mutex::new(HashSet::new()),
        }
    }

    fn create_lookup(base: BaseType) -> CatalogInfoLookup {
        fn by_id(name: &str, id: fn(&CatalogInfo) -> Option<&InfoId>) -> IndexDefinition {
            IndexDefinition::non_unique(name, move |info| id(info).cloned().map(IndexKey::Id))
        }

        let lookup = CatalogInfoLookup::new(base);
        let definitions = match base {
            BaseType::Namespace => vec![IndexDefinition::on_property(URI_INDEX, props::URI, false)],
            BaseType::Store | BaseType::Style | BaseType::LayerGroup => {
                vec![by_id(WORKSPACE_INDEX, CatalogInfo::workspace)]
            }
            BaseType::Resource => vec![
                by_id(NAMESPACE_INDEX, CatalogInfo::namespace),
                by_id(STORE_INDEX, CatalogInfo::store),
            ],
            BaseType::Layer => vec![by_id(RESOURCE_INDEX, CatalogInfo::resource)],
            BaseType::Workspace => vec![],
        };
        for definition in definitions {
            // the lookup is empty and the names are distinct
            if let Err(e) = lookup.register_index(definition) {
                log::error!("Failed to register index on {}: {}", base, e);
            }
        }
        lookup
    }

    /// The lookup owning entities of `base`.
    pub fn lookup(&self, base: BaseType) -> CatalogResult<Arc<CatalogInfoLookup>> {
        self.lookups.get(&base).cloned().ok_or_else(|| {
            CatalogError::new(
                &format!("No lookup registered for {}", base),
                ErrorKind::InternalError,
            )
        })
    }

    /// A read view covering `info_type`.
    pub fn lookup_for(&self, info_type: InfoType) -> CatalogResult<Arc<dyn InfoLookup>> {
        match info_type {
            InfoType::Published => Ok(self.published.clone()),
            InfoType::Any => Ok(self.everything.clone()),
            InfoType::Kind(kind) => Ok(self.lookup(kind.base_type())?),
            InfoType::Base(base) => Ok(self.lookup(base)?),
        }
    }

    pub fn full_text(&self) -> Option<&Arc<dyn FullTextSearch>> {
        self.full_text.as_ref()
    }

    /// Adds `info` to its lookup and the mirror.
    ///
    /// Fails with `DuplicateKey` when any entity, of any type, already
    /// uses the id.
    pub fn add(&self, info: CatalogInfo) -> CatalogResult<Arc<CatalogInfo>> {
        let lookup = self.lookup(info.base_type())?;
        let id = info.id().clone();
        if !self.ids.lock().insert(id.clone()) {
            log::error!("Id {} is already used in the catalog", id);
            return Err(CatalogError::new(
                &format!("Unique key constraint violation in index id for {}", id),
                ErrorKind::DuplicateKey,
            ));
        }
        let added = lookup.add(info).map_err(|e| {
            self.ids.lock().remove(&id);
            e
        })?;
        if let Some(full_text) = &self.full_text {
            full_text.add(&added).map_err(|e| {
                log::error!("Added {} but failed to index it: {}", added.id(), e);
                e
            })?;
        }
        Ok(added)
    }

    pub fn update(&self, update: InfoUpdate) -> CatalogResult<Arc<CatalogInfo>> {
        let updated = self.lookup(update.info().base_type())?.update(update)?;
        if let Some(full_text) = &self.full_text {
            full_text.update(&updated).map_err(|e| {
                log::error!("Updated {} but failed to reindex it: {}", updated.id(), e);
                e
            })?;
        }
        Ok(updated)
    }

    /// Removes `info`, returning the stored value when there was one.
    pub fn remove(&self, info: &CatalogInfo) -> CatalogResult<Option<Arc<CatalogInfo>>> {
        let removed = self.lookup(info.base_type())?.remove(info)?;
        if let Some(removed) = &removed {
            self.ids.lock().remove(removed.id());
        }
        if let (Some(full_text), Some(removed)) = (&self.full_text, &removed) {
            full_text.remove(removed).map_err(|e| {
                log::error!("Removed {} but failed to unindex it: {}", removed.id(), e);
                e
            })?;
        }
        Ok(removed)
    }

    /// Makes every queued full-text write searchable.
    pub fn commit(&self) -> CatalogResult<()> {
        match &self.full_text {
            Some(full_text) => full_text.commit(),
            None => Ok(()),
        }
    }

    /// Drops every entity and every full-text document.
    pub fn clear(&self) -> CatalogResult<()> {
        for lookup in self.lookups.values() {
            lookup.clear()?;
        }
        self.ids.lock().clear();
        if let Some(full_text) = &self.full_text {
            full_text.clear()?;
            full_text.commit()?;
        }
        Ok(())
    }

    /// Rebuilds the full-text mirror from the lookups and commits it.
    ///
    /// Returns the number of entities indexed.
    pub fn reindex(&self) -> CatalogResult<usize> {
        let Some(full_text) = &self.full_text else {
            return Ok(0);
        };
        full_text.clear()?;
        let mut indexed = 0;
        for info in self.everything.stream(InfoType::Any, &Filter::Include) {
            full_text.add(&info)?;
            indexed += 1;
        }
        full_text.commit()?;
        log::info!("Reindexed {} catalog entities", indexed);
        Ok(indexed)
    }

    pub fn find_by_id(&self, id: &InfoId, info_type: InfoType) -> Option<Arc<CatalogInfo>> {
        self.lookup_for(info_type).ok()?.find_by_id(id, info_type)
    }

    pub fn find_by_name(&self, name: &QualifiedName, info_type: InfoType) -> Option<Arc<CatalogInfo>> {
        self.lookup_for(info_type).ok()?.find_by_name(name, info_type)
    }

    /// Looks up a namespace by its URI.
    pub fn namespace_by_uri(&self, uri: &str) -> CatalogResult<Option<Arc<CatalogInfo>>> {
        let found = self.find_all_by_index(
            InfoKind::Namespace.into(),
            URI_INDEX,
            &IndexKey::Value(Value::from(uri)),
        )?;
        Ok(found.into_iter().next())
    }

    /// Entities of a single-base-type `info_type` stored under `key` in a
    /// secondary index.
    pub fn find_all_by_index(
        &self,
        info_type: InfoType,
        index_name: &str,
        key: &IndexKey,
    ) -> CatalogResult<Vec<Arc<CatalogInfo>>> {
        let base = info_type.base_type().ok_or_else(|| {
            CatalogError::new(
                &format!("{} spans several lookups, index queries need one", info_type),
                ErrorKind::IllegalArgument,
            )
        })?;
        self.lookup(base)?.find_all_by_index(index_name, key, info_type)
    }

    pub fn find_first(
        &self,
        info_type: InfoType,
        filter: &Filter,
    ) -> CatalogResult<Option<Arc<CatalogInfo>>> {
        self.stream(info_type, filter, &limit_to(1))?.next().transpose()
    }

    /// Counts the entities of `info_type` accepted by `filter`.
    ///
    /// Accept-all filters are answered from the lookup sizes and pure
    /// full-text filters by the mirror, without touching any entity.
    pub fn count(&self, info_type: InfoType, filter: &Filter) -> CatalogResult<usize> {
        filter.validate()?;
        let lookup = self.lookup_for(info_type)?;
        if filter.is_include() {
            return Ok(lookup.size(info_type));
        }

        if let Some(full_text) = self.text_search_for(filter) {
            let split = FullTextExtractor::split(filter);
            if split.is_text_only() {
                return full_text.count(&TextQuery::new(info_type, split.terms().to_vec()));
            }
            if split.has_terms() {
                let mut count = 0;
                for info in self.text_stream(full_text, lookup, info_type, split, &Query::new())? {
                    info?;
                    count += 1;
                }
                return Ok(count);
            }
        }
        Ok(lookup.count(info_type, filter))
    }

    /// Streams the entities of `info_type` accepted by `filter`, sorted and
    /// paged by `query`.
    pub fn stream(
        &self,
        info_type: InfoType,
        filter: &Filter,
        query: &Query,
    ) -> CatalogResult<CatalogStream> {
        filter.validate()?;
        let lookup = self.lookup_for(info_type)?;

        if let Some(full_text) = self.text_search_for(filter) {
            let split = FullTextExtractor::split(filter);
            if split.has_terms() {
                return self.text_stream(full_text, lookup, info_type, split, query);
            }
        }

        let stream: CatalogStream = Box::new(lookup.stream(info_type, filter).map(Ok));
        Ok(query.page_stream(query.sort_stream(stream)))
    }

    pub fn list(
        &self,
        info_type: InfoType,
        filter: &Filter,
        query: &Query,
    ) -> CatalogResult<Vec<Arc<CatalogInfo>>> {
        self.stream(info_type, filter, query)?.collect()
    }

    fn text_search_for(&self, filter: &Filter) -> Option<&Arc<dyn FullTextSearch>> {
        self.full_text
            .as_ref()
            .filter(|_| filter.has_full_text())
    }

    /// Resolves full-text hits through the id index and re-checks them
    /// against the residual filter.
    ///
    /// The mirror sorts and pages only when the residual accepts every hit;
    /// otherwise the window is applied here, after filtering.
    fn text_stream(
        &self,
        full_text: &Arc<dyn FullTextSearch>,
        lookup: Arc<dyn InfoLookup>,
        info_type: InfoType,
        split: FullTextSplit,
        query: &Query,
    ) -> CatalogResult<CatalogStream> {
        let exact = split.is_text_only();
        let mut text_query =
            TextQuery::new(info_type, split.terms().to_vec()).sort_by(query.sort_by.clone());
        if exact {
            text_query = text_query.offset(query.offset).limit(query.limit);
        }

        let hits = full_text.search(&text_query)?;
        let arranged = hits.is_arranged();
        let residual = split.residual().clone();
        let resolved: CatalogStream = Box::new(hits.into_ids().filter_map(move |hit| match hit {
            Ok(id) => match lookup.find_by_id(&id, info_type) {
                Some(info) if residual.apply(&info) => Some(Ok(info)),
                Some(_) => None,
                None => {
                    log::debug!("Skipping full-text hit {} missing from the catalog", id);
                    None
                }
            },
            Err(e) => Some(Err(e)),
        }));

        match (arranged, exact) {
            (true, true) => Ok(resolved),
            (true, false) => Ok(query.page_stream(resolved)),
            (false, _) => Ok(query.page_stream(query.sort_stream(resolved))),
        }
    }
}
