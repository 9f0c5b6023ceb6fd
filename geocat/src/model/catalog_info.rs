use super::{BaseType, InfoKind};
use crate::common::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Globally unique, immutable identifier of a catalog entity.
///
/// Ids are assigned once, at creation, and never reused. The loader passes
/// persisted ids explicitly; everything else lets the builder generate one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfoId(String);

impl InfoId {
    pub fn new(id: &str) -> Self {
        InfoId(id.to_string())
    }

    /// Generates a fresh id for an entity of `kind`.
    pub fn generate(kind: InfoKind) -> Self {
        InfoId(format!("{}-{}", kind.id_prefix(), uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InfoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InfoId {
    fn from(id: &str) -> Self {
        InfoId::new(id)
    }
}

/// Composite name of an entity: its local name qualified by the id of the
/// parent that scopes its uniqueness.
///
/// Keys hold the parent's id, never the parent's name, so renaming a
/// workspace does not change the key of anything inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    scope: Option<InfoId>,
    local: String,
}

impl QualifiedName {
    pub fn new(scope: Option<InfoId>, local: &str) -> Self {
        QualifiedName {
            scope,
            local: local.to_string(),
        }
    }

    /// A name with no scope, as used by workspaces, namespaces and global
    /// styles or layer groups.
    pub fn global(local: &str) -> Self {
        QualifiedName::new(None, local)
    }

    pub fn scoped(scope: &InfoId, local: &str) -> Self {
        QualifiedName::new(Some(scope.clone()), local)
    }

    pub fn scope(&self) -> Option<&InfoId> {
        self.scope.as_ref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", scope, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Well-known property paths resolvable on every entity.
pub mod props {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const WORKSPACE_ID: &str = "workspace.id";
    pub const NAMESPACE_ID: &str = "namespace.id";
    pub const STORE_ID: &str = "store.id";
    pub const RESOURCE_ID: &str = "resource.id";
    pub const TITLE: &str = "title";
    pub const ABSTRACT: &str = "abstract";
    pub const DESCRIPTION: &str = "description";
    pub const KEYWORDS: &str = "keywords";
    pub const ENABLED: &str = "enabled";
    pub const TYPE: &str = "type";
    pub const URI: &str = "uri";
}

/// An immutable catalog entity.
///
/// The identity (`id`, `kind`) never changes. Everything else is changed by
/// producing an [`InfoUpdate`] through [`CatalogInfo::modify`], which keeps the
/// stale composite name so indices can be remapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogInfo {
    id: InfoId,
    kind: InfoKind,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workspace: Option<InfoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<InfoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store: Option<InfoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource: Option<InfoId>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    properties: IndexMap<String, Value>,
}

impl CatalogInfo {
    /// Starts building a new entity of `kind` named `name`.
    pub fn builder(kind: InfoKind, name: &str) -> InfoBuilder {
        InfoBuilder {
            id: None,
            info: CatalogInfo {
                id: InfoId::new(""),
                kind,
                name: name.to_string(),
                workspace: None,
                namespace: None,
                store: None,
                resource: None,
                properties: IndexMap::new(),
            },
        }
    }

    pub fn id(&self) -> &InfoId {
        &self.id
    }

    pub fn kind(&self) -> InfoKind {
        self.kind
    }

    pub fn base_type(&self) -> BaseType {
        self.kind.base_type()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workspace(&self) -> Option<&InfoId> {
        self.workspace.as_ref()
    }

    pub fn namespace(&self) -> Option<&InfoId> {
        self.namespace.as_ref()
    }

    pub fn store(&self) -> Option<&InfoId> {
        self.store.as_ref()
    }

    pub fn resource(&self) -> Option<&InfoId> {
        self.resource.as_ref()
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// The composite name key of this entity.
    ///
    /// Stores, styles and layer groups are scoped by workspace; resources and
    /// layers by namespace; workspaces and namespaces are global.
    pub fn qualified_name(&self) -> QualifiedName {
        let scope = match self.base_type() {
            BaseType::Workspace | BaseType::Namespace => None,
            BaseType::Store | BaseType::Style | BaseType::LayerGroup => self.workspace.clone(),
            BaseType::Resource | BaseType::Layer => self.namespace.clone(),
        };
        QualifiedName {
            scope,
            local: self.name.clone(),
        }
    }

    /// Resolves a property path to a value, `Value::Null` when unset.
    pub fn property(&self, path: &str) -> Value {
        fn id_value(id: &Option<InfoId>) -> Value {
            id.as_ref()
                .map(|id| Value::String(id.to_string()))
                .unwrap_or(Value::Null)
        }

        match path {
            props::ID => Value::String(self.id.to_string()),
            props::NAME => Value::String(self.name.clone()),
            props::WORKSPACE_ID => id_value(&self.workspace),
            props::NAMESPACE_ID => id_value(&self.namespace),
            props::STORE_ID => id_value(&self.store),
            props::RESOURCE_ID => id_value(&self.resource),
            _ => self.properties.get(path).cloned().unwrap_or(Value::Null),
        }
    }

    /// Starts a change set against this entity.
    pub fn modify(&self) -> InfoModifier {
        InfoModifier {
            old_name: self.qualified_name(),
            info: self.clone(),
        }
    }
}

/// Builder for new entities. Generates an id unless one is given.
pub struct InfoBuilder {
    id: Option<InfoId>,
    info: CatalogInfo,
}

impl InfoBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(InfoId::new(id));
        self
    }

    pub fn workspace(mut self, workspace: &InfoId) -> Self {
        self.info.workspace = Some(workspace.clone());
        self
    }

    pub fn namespace(mut self, namespace: &InfoId) -> Self {
        self.info.namespace = Some(namespace.clone());
        self
    }

    pub fn store(mut self, store: &InfoId) -> Self {
        self.info.store = Some(store.clone());
        self
    }

    pub fn resource(mut self, resource: &InfoId) -> Self {
        self.info.resource = Some(resource.clone());
        self
    }

    pub fn property<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.info.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> CatalogInfo {
        let mut info = self.info;
        info.id = self.id.unwrap_or_else(|| InfoId::generate(info.kind));
        info
    }
}

/// A pending change to one entity.
///
/// Carries the name key the entity had before the change so the lookup can
/// find and remap the old entry.
pub struct InfoModifier {
    old_name: QualifiedName,
    info: CatalogInfo,
}

impl InfoModifier {
    pub fn name(mut self, name: &str) -> Self {
        self.info.name = name.to_string();
        self
    }

    pub fn workspace(mut self, workspace: Option<&InfoId>) -> Self {
        self.info.workspace = workspace.cloned();
        self
    }

    pub fn namespace(mut self, namespace: Option<&InfoId>) -> Self {
        self.info.namespace = namespace.cloned();
        self
    }

    pub fn store(mut self, store: Option<&InfoId>) -> Self {
        self.info.store = store.cloned();
        self
    }

    pub fn property<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.info.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn remove_property(mut self, name: &str) -> Self {
        self.info.properties.shift_remove(name);
        self
    }

    pub fn build(self) -> InfoUpdate {
        InfoUpdate {
            old_name: self.old_name,
            info: self.info,
        }
    }
}

/// The before/after pair handed to `update`.
#[derive(Debug, Clone)]
pub struct InfoUpdate {
    old_name: QualifiedName,
    info: CatalogInfo,
}

impl InfoUpdate {
    /// Builds an update from a stale and a fresh copy of the same entity.
    pub fn between(before: &CatalogInfo, after: CatalogInfo) -> Self {
        InfoUpdate {
            old_name: before.qualified_name(),
            info: after,
        }
    }

    pub fn old_name(&self) -> &QualifiedName {
        &self.old_name
    }

    pub fn new_name(&self) -> QualifiedName {
        self.info.qualified_name()
    }

    pub fn info(&self) -> &CatalogInfo {
        &self.info
    }

    #[inline]
    pub fn is_rename(&self) -> bool {
        self.old_name != self.info.qualified_name()
    }

    pub fn into_info(self) -> CatalogInfo {
        self.info
    }
}
