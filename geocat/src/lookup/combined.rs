use super::stream::{InfoStream, UnionStream};
use super::InfoLookup;
use crate::errors::{CatalogError, CatalogResult, ErrorKind};
use crate::filter::Filter;
use crate::model::{CatalogInfo, InfoId, InfoType, InfoUpdate, QualifiedName};
use std::sync::Arc;

/// A read-only union of several lookups queried as one abstract type.
///
/// Used for types that span more than one base type, e.g. `Published`
/// (layers and layer groups). Every read fans out to the underlying
/// lookups in order; writes are rejected.
pub struct CombinedLookup {
    info_type: InfoType,
    lookups: Vec<Arc<dyn InfoLookup>>,
}

impl CombinedLookup {
    /// Combines `lookups` into an immutable view of `info_type`.
    pub fn combine_as_immutable(info_type: InfoType, lookups: Vec<Arc<dyn InfoLookup>>) -> Self {
        CombinedLookup { info_type, lookups }
    }

    pub fn info_type(&self) -> InfoType {
        self.info_type
    }

    fn read_only<T>(&self, operation: &str) -> CatalogResult<T> {
        log::error!("Cannot {} through the combined {} lookup", operation, self.info_type);
        Err(CatalogError::new(
            &format!("The combined {} lookup is read-only", self.info_type),
            ErrorKind::UnsupportedOperation,
        ))
    }

    /// Restricts a query type to this view's type; `None` when they do not
    /// overlap.
    fn narrow(&self, info_type: InfoType) -> Option<InfoType> {
        let overlaps = info_type
            .kinds()
            .iter()
            .any(|kind| self.info_type.includes(*kind));
        overlaps.then_some(info_type)
    }

    fn members(&self, info_type: InfoType) -> impl Iterator<Item = &Arc<dyn InfoLookup>> {
        let narrowed = self.narrow(info_type);
        self.lookups
            .iter()
            .filter(move |lookup| narrowed.map(|t| lookup.covers(t)).unwrap_or(false))
    }
}

impl InfoLookup for CombinedLookup {
    fn covers(&self, info_type: InfoType) -> bool {
        self.members(info_type).next().is_some()
    }

    fn add(&self, _info: CatalogInfo) -> CatalogResult<Arc<CatalogInfo>> {
        self.read_only("add")
    }

    fn update(&self, _update: InfoUpdate) -> CatalogResult<Arc<CatalogInfo>> {
        self.read_only("update")
    }

    fn remove(&self, _info: &CatalogInfo) -> CatalogResult<Option<Arc<CatalogInfo>>> {
        self.read_only("remove")
    }

    fn clear(&self) -> CatalogResult<()> {
        self.read_only("clear")
    }

    fn find_by_id(&self, id: &InfoId, info_type: InfoType) -> Option<Arc<CatalogInfo>> {
        self.members(info_type)
            .find_map(|lookup| lookup.find_by_id(id, info_type))
    }

    fn find_by_name(&self, name: &QualifiedName, info_type: InfoType) -> Option<Arc<CatalogInfo>> {
        self.members(info_type)
            .find_map(|lookup| lookup.find_by_name(name, info_type))
    }

    fn stream(&self, info_type: InfoType, filter: &Filter) -> InfoStream {
        let streams = self
            .members(info_type)
            .map(|lookup| lookup.stream(info_type, filter))
            .collect();
        Box::new(UnionStream::new(streams))
    }

    fn size(&self, info_type: InfoType) -> usize {
        self.members(info_type)
            .map(|lookup| lookup.size(info_type))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{all, field};
    use crate::lookup::CatalogInfoLookup;
    use crate::model::{BaseType, InfoKind};

    fn published() -> (Arc<CatalogInfoLookup>, Arc<CatalogInfoLookup>, CombinedLookup) {
        let layers = Arc::new(CatalogInfoLookup::new(BaseType::Layer));
        let groups = Arc::new(CatalogInfoLookup::new(BaseType::LayerGroup));
        let combined = CombinedLookup::combine_as_immutable(
            InfoType::Published,
            vec![
                layers.clone() as Arc<dyn InfoLookup>,
                groups.clone() as Arc<dyn InfoLookup>,
            ],
        );
        (layers, groups, combined)
    }

    #[test]
    fn test_reads_fan_out() {
        let (layers, groups, combined) = published();
        let layer = layers
            .add(CatalogInfo::builder(InfoKind::Layer, "roads").build())
            .unwrap();
        let group = groups
            .add(CatalogInfo::builder(InfoKind::LayerGroup, "base").build())
            .unwrap();

        assert_eq!(combined.size(InfoType::Published), 2);
        assert_eq!(combined.count(InfoType::Published, &all()), 2);
        assert_eq!(combined.size(InfoKind::Layer.into()), 1);
        assert!(combined.find_by_id(layer.id(), InfoType::Published).is_some());
        assert!(combined.find_by_id(group.id(), InfoType::Published).is_some());
        assert!(combined.find_by_id(group.id(), InfoKind::Layer.into()).is_none());
        assert_eq!(
            combined
                .find_first(InfoType::Published, &field("name").eq("base"))
                .unwrap()
                .id(),
            group.id()
        );
    }

    #[test]
    fn test_foreign_type_is_empty() {
        let (layers, _groups, combined) = published();
        layers
            .add(CatalogInfo::builder(InfoKind::Layer, "roads").build())
            .unwrap();
        assert!(!combined.covers(InfoKind::Style.into()));
        assert_eq!(combined.size(InfoKind::Style.into()), 0);
        assert_eq!(combined.stream(InfoKind::Style.into(), &all()).count(), 0);
    }

    #[test]
    fn test_writes_are_rejected() {
        let (_layers, _groups, combined) = published();
        let layer = CatalogInfo::builder(InfoKind::Layer, "roads").build();
        assert_eq!(
            combined.add(layer.clone()).err().unwrap().kind(),
            &ErrorKind::UnsupportedOperation
        );
        assert_eq!(
            combined.remove(&layer).err().unwrap().kind(),
            &ErrorKind::UnsupportedOperation
        );
        assert_eq!(
            combined.update(layer.modify().build()).err().unwrap().kind(),
            &ErrorKind::UnsupportedOperation
        );
        assert_eq!(
            combined.clear().err().unwrap().kind(),
            &ErrorKind::UnsupportedOperation
        );
    }
}
