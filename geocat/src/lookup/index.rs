use crate::common::Value;
use crate::model::{CatalogInfo, InfoId, QualifiedName};
use im::{OrdMap, OrdSet};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Name of the primary index, keyed by entity id.
pub const ID_INDEX: &str = "id";
/// Name of the composite-name index.
pub const NAME_INDEX: &str = "name";

/// A key in one of the lookup's indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Id(InfoId),
    Name(QualifiedName),
    Value(Value),
}

impl From<QualifiedName> for IndexKey {
    fn from(name: QualifiedName) -> Self {
        IndexKey::Name(name)
    }
}

impl From<InfoId> for IndexKey {
    fn from(id: InfoId) -> Self {
        IndexKey::Id(id)
    }
}

impl From<Value> for IndexKey {
    fn from(value: Value) -> Self {
        IndexKey::Value(value)
    }
}

type KeyMapper = Arc<dyn Fn(&CatalogInfo) -> Option<IndexKey> + Send + Sync>;

/// A named projection `key -> entity` registered on a lookup.
///
/// The mapper returns `None` for entities that have no key for this index
/// (e.g. a null property); such entities are simply absent from it.
#[derive(Clone)]
pub struct IndexDefinition {
    name: String,
    unique: bool,
    mapper: KeyMapper,
}

impl IndexDefinition {
    /// An index rejecting two entities with the same key.
    pub fn unique<F>(name: &str, mapper: F) -> Self
    where
        F: Fn(&CatalogInfo) -> Option<IndexKey> + Send + Sync + 'static,
    {
        IndexDefinition {
            name: name.to_string(),
            unique: true,
            mapper: Arc::new(mapper),
        }
    }

    /// An index allowing any number of entities per key.
    pub fn non_unique<F>(name: &str, mapper: F) -> Self
    where
        F: Fn(&CatalogInfo) -> Option<IndexKey> + Send + Sync + 'static,
    {
        IndexDefinition {
            name: name.to_string(),
            unique: false,
            mapper: Arc::new(mapper),
        }
    }

    /// An index over the value of one property; null values are not indexed.
    pub fn on_property(name: &str, property: &str, unique: bool) -> Self {
        let property = property.to_string();
        let mapper = move |info: &CatalogInfo| {
            let value = info.property(&property);
            (!value.is_null()).then_some(IndexKey::Value(value))
        };
        if unique {
            IndexDefinition::unique(name, mapper)
        } else {
            IndexDefinition::non_unique(name, mapper)
        }
    }

    /// The composite-name index every lookup carries.
    pub(crate) fn name_index() -> Self {
        IndexDefinition::unique(NAME_INDEX, |info| Some(IndexKey::Name(info.qualified_name())))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    #[inline]
    pub fn key_of(&self, info: &CatalogInfo) -> Option<IndexKey> {
        (self.mapper)(info)
    }
}

impl Debug for IndexDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDefinition")
            .field("name", &self.name)
            .field("unique", &self.unique)
            .finish()
    }
}

/// The entries of one secondary index inside a partition snapshot.
#[derive(Clone)]
pub(crate) enum IndexData {
    Unique(OrdMap<IndexKey, InfoId>),
    NonUnique(OrdMap<IndexKey, OrdSet<InfoId>>),
}

impl IndexData {
    pub(crate) fn for_definition(definition: &IndexDefinition) -> Self {
        if definition.is_unique() {
            IndexData::Unique(OrdMap::new())
        } else {
            IndexData::NonUnique(OrdMap::new())
        }
    }

    /// The id holding `key` in a unique index, other than `except`.
    pub(crate) fn conflicting(&self, key: &IndexKey, except: &InfoId) -> Option<&InfoId> {
        match self {
            IndexData::Unique(map) => map.get(key).filter(|id| *id != except),
            IndexData::NonUnique(_) => None,
        }
    }

    pub(crate) fn insert(&mut self, key: IndexKey, id: InfoId) {
        match self {
            IndexData::Unique(map) => {
                map.insert(key, id);
            }
            IndexData::NonUnique(map) => {
                let mut ids = map.get(&key).cloned().unwrap_or_default();
                ids.insert(id);
                map.insert(key, ids);
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &IndexKey, id: &InfoId) {
        match self {
            IndexData::Unique(map) => {
                if map.get(key) == Some(id) {
                    map.remove(key);
                }
            }
            IndexData::NonUnique(map) => {
                if let Some(ids) = map.get(key) {
                    let remaining = ids.without(id);
                    if remaining.is_empty() {
                        map.remove(key);
                    } else {
                        map.insert(key.clone(), remaining);
                    }
                }
            }
        }
    }

    /// Ids stored under `key`, in id order.
    pub(crate) fn ids(&self, key: &IndexKey) -> Vec<InfoId> {
        match self {
            IndexData::Unique(map) => map.get(key).cloned().into_iter().collect(),
            IndexData::NonUnique(map) => map
                .get(key)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn holds(&self, key: &IndexKey, id: &InfoId) -> bool {
        match self {
            IndexData::Unique(map) => map.get(key) == Some(id),
            IndexData::NonUnique(map) => map.get(key).map(|ids| ids.contains(id)).unwrap_or(false),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            IndexData::Unique(map) => map.len(),
            IndexData::NonUnique(map) => map.values().map(|ids| ids.len()).sum(),
        }
    }
}
