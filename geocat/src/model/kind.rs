use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The concrete kind of a catalog entity.
///
/// Every entity has exactly one kind for its whole lifetime. Lookups are
/// partitioned by kind so that abstract queries can fan out over the kinds
/// they cover without inspecting entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InfoKind {
    Workspace,
    Namespace,
    DataStore,
    CoverageStore,
    WmsStore,
    WmtsStore,
    FeatureType,
    Coverage,
    WmsLayer,
    WmtsLayer,
    Layer,
    LayerGroup,
    Style,
}

impl InfoKind {
    pub const ALL: [InfoKind; 13] = [
        InfoKind::Workspace,
        InfoKind::Namespace,
        InfoKind::DataStore,
        InfoKind::CoverageStore,
        InfoKind::WmsStore,
        InfoKind::WmtsStore,
        InfoKind::FeatureType,
        InfoKind::Coverage,
        InfoKind::WmsLayer,
        InfoKind::WmtsLayer,
        InfoKind::Layer,
        InfoKind::LayerGroup,
        InfoKind::Style,
    ];

    /// The base type whose lookup stores entities of this kind.
    pub fn base_type(&self) -> BaseType {
        match self {
            InfoKind::Workspace => BaseType::Workspace,
            InfoKind::Namespace => BaseType::Namespace,
            InfoKind::DataStore
            | InfoKind::CoverageStore
            | InfoKind::WmsStore
            | InfoKind::WmtsStore => BaseType::Store,
            InfoKind::FeatureType
            | InfoKind::Coverage
            | InfoKind::WmsLayer
            | InfoKind::WmtsLayer => BaseType::Resource,
            InfoKind::Layer => BaseType::Layer,
            InfoKind::LayerGroup => BaseType::LayerGroup,
            InfoKind::Style => BaseType::Style,
        }
    }

    /// Name used in persisted files and in the full-text `type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            InfoKind::Workspace => "WorkspaceInfo",
            InfoKind::Namespace => "NamespaceInfo",
            InfoKind::DataStore => "DataStoreInfo",
            InfoKind::CoverageStore => "CoverageStoreInfo",
            InfoKind::WmsStore => "WMSStoreInfo",
            InfoKind::WmtsStore => "WMTSStoreInfo",
            InfoKind::FeatureType => "FeatureTypeInfo",
            InfoKind::Coverage => "CoverageInfo",
            InfoKind::WmsLayer => "WMSLayerInfo",
            InfoKind::WmtsLayer => "WMTSLayerInfo",
            InfoKind::Layer => "LayerInfo",
            InfoKind::LayerGroup => "LayerGroupInfo",
            InfoKind::Style => "StyleInfo",
        }
    }

    /// Every queryable type name that covers this kind, most specific first.
    ///
    /// The full-text mirror stores all of them so a search scoped to an
    /// abstract type matches every concrete kind below it.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names = vec![self.type_name()];
        let base = self.base_type();
        if base.type_name() != self.type_name() {
            names.push(base.type_name());
        }
        if base.is_published() {
            names.push(InfoType::Published.type_name());
        }
        names
    }

    /// File stem used by the directory loader for this kind.
    pub fn file_stem(&self) -> &'static str {
        match self {
            InfoKind::Workspace => "workspace",
            InfoKind::Namespace => "namespace",
            InfoKind::DataStore => "datastore",
            InfoKind::CoverageStore => "coveragestore",
            InfoKind::WmsStore => "wmsstore",
            InfoKind::WmtsStore => "wmtsstore",
            InfoKind::FeatureType => "featuretype",
            InfoKind::Coverage => "coverage",
            InfoKind::WmsLayer => "wmslayer",
            InfoKind::WmtsLayer => "wmtslayer",
            InfoKind::Layer => "layer",
            InfoKind::LayerGroup => "layergroup",
            InfoKind::Style => "style",
        }
    }

    pub fn from_file_stem(stem: &str) -> Option<InfoKind> {
        InfoKind::ALL.iter().copied().find(|kind| kind.file_stem() == stem)
    }

    /// Prefix of generated ids, e.g. `WorkspaceInfoImpl-<uuid>`.
    pub(crate) fn id_prefix(&self) -> String {
        format!("{}Impl", self.type_name())
    }
}

impl Display for InfoKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// The base type owning one `CatalogInfoLookup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Workspace,
    Namespace,
    Store,
    Resource,
    Layer,
    LayerGroup,
    Style,
}

impl BaseType {
    pub const ALL: [BaseType; 7] = [
        BaseType::Workspace,
        BaseType::Namespace,
        BaseType::Store,
        BaseType::Resource,
        BaseType::Layer,
        BaseType::LayerGroup,
        BaseType::Style,
    ];

    /// Concrete kinds stored under this base type.
    pub fn kinds(&self) -> &'static [InfoKind] {
        match self {
            BaseType::Workspace => &[InfoKind::Workspace],
            BaseType::Namespace => &[InfoKind::Namespace],
            BaseType::Store => &[
                InfoKind::DataStore,
                InfoKind::CoverageStore,
                InfoKind::WmsStore,
                InfoKind::WmtsStore,
            ],
            BaseType::Resource => &[
                InfoKind::FeatureType,
                InfoKind::Coverage,
                InfoKind::WmsLayer,
                InfoKind::WmtsLayer,
            ],
            BaseType::Layer => &[InfoKind::Layer],
            BaseType::LayerGroup => &[InfoKind::LayerGroup],
            BaseType::Style => &[InfoKind::Style],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            BaseType::Workspace => "WorkspaceInfo",
            BaseType::Namespace => "NamespaceInfo",
            BaseType::Store => "StoreInfo",
            BaseType::Resource => "ResourceInfo",
            BaseType::Layer => "LayerInfo",
            BaseType::LayerGroup => "LayerGroupInfo",
            BaseType::Style => "StyleInfo",
        }
    }

    #[inline]
    pub fn is_published(&self) -> bool {
        matches!(self, BaseType::Layer | BaseType::LayerGroup)
    }
}

impl Display for BaseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A queryable catalog type: a concrete kind, a base type, the union of
/// layers and layer groups, or any entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoType {
    Kind(InfoKind),
    Base(BaseType),
    Published,
    Any,
}

impl InfoType {
    /// Whether entities of `kind` are instances of this type.
    pub fn includes(&self, kind: InfoKind) -> bool {
        match self {
            InfoType::Kind(k) => *k == kind,
            InfoType::Base(base) => kind.base_type() == *base,
            InfoType::Published => kind.base_type().is_published(),
            InfoType::Any => true,
        }
    }

    /// Concrete kinds covered by this type.
    pub fn kinds(&self) -> Vec<InfoKind> {
        InfoKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.includes(*kind))
            .collect()
    }

    /// The single base type covering this type, if there is one.
    ///
    /// `Published` and `Any` span several lookups and return `None`.
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            InfoType::Kind(kind) => Some(kind.base_type()),
            InfoType::Base(base) => Some(*base),
            InfoType::Published | InfoType::Any => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            InfoType::Kind(kind) => kind.type_name(),
            InfoType::Base(base) => base.type_name(),
            InfoType::Published => "PublishedInfo",
            InfoType::Any => "CatalogInfo",
        }
    }
}

impl From<InfoKind> for InfoType {
    fn from(kind: InfoKind) -> Self {
        InfoType::Kind(kind)
    }
}

impl From<BaseType> for InfoType {
    fn from(base: BaseType) -> Self {
        InfoType::Base(base)
    }
}

impl Display for InfoType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
