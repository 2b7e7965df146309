//! Association storage strategies
//!
//! Two independent settings decide how a document store lays out
//! associations:
//! - [`AssociationStorageType`]: rows embedded in the owning entity's document,
//!   or kept in a dedicated association document
//! - [`MapStorageType`]: rows of map-typed associations keyed by the map key,
//!   or kept as a list of entries
//!
//! Each setting can be given per property (collection role), per entity
//! (owning table) and globally. The most specific level that is set wins;
//! the datastore default applies when none is. Settings a store cannot honour
//! are silently downgraded to a layout it can.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tessera_core::{AssociationKeyMetadata, ValueKind};

/// Where association rows are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationStorageType {
    /// Embedded in the owning entity's document under the collection role
    #[default]
    InEntity,
    /// In a dedicated document per association
    AssociationDocument,
}

/// How rows of map-typed associations are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStorageType {
    /// As an object keyed by the map key
    #[default]
    ByKey,
    /// As a list of entries holding the key as a regular column
    AsList,
}

/// Pick the first setting present in `levels` (most specific first), else `default`
pub fn resolve<T: Copy>(levels: &[Option<T>], default: T) -> T {
    levels.iter().flatten().copied().next().unwrap_or(default)
}

/// Resolve where association rows are stored.
///
/// `InEntity` requires a store able to nest structures; otherwise rows go to
/// a dedicated association document.
pub fn resolve_association_storage(
    levels: &[Option<AssociationStorageType>],
    default: AssociationStorageType,
    supports_nesting: bool,
) -> AssociationStorageType {
    match resolve(levels, default) {
        AssociationStorageType::InEntity if !supports_nesting => {
            AssociationStorageType::AssociationDocument
        }
        resolved => resolved,
    }
}

/// Resolve how the rows of a map-typed association are stored.
///
/// `ByKey` requires exactly one key column of a string-like kind; any other
/// shape is stored `AsList`.
pub fn resolve_map_storage(
    levels: &[Option<MapStorageType>],
    default: MapStorageType,
    key_column_kinds: &[ValueKind],
) -> MapStorageType {
    match resolve(levels, default) {
        MapStorageType::ByKey if !is_single_string_key(key_column_kinds) => MapStorageType::AsList,
        resolved => resolved,
    }
}

fn is_single_string_key(kinds: &[ValueKind]) -> bool {
    matches!(kinds, [kind] if kind.is_string_like())
}

/// Settings given at one level; unset fields defer to the next level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where association rows are stored
    pub association_storage: Option<AssociationStorageType>,
    /// How rows of map-typed associations are stored
    pub map_storage: Option<MapStorageType>,
}

impl StorageSettings {
    /// Set the association storage
    pub fn with_association_storage(mut self, storage: AssociationStorageType) -> Self {
        self.association_storage = Some(storage);
        self
    }

    /// Set the map storage
    pub fn with_map_storage(mut self, storage: MapStorageType) -> Self {
        self.map_storage = Some(storage);
        self
    }
}

/// Storage settings at every level, plus the datastore defaults
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    global: StorageSettings,
    // owning table -> settings
    entities: FxHashMap<String, StorageSettings>,
    // collection role -> settings
    properties: FxHashMap<String, StorageSettings>,
    defaults: (AssociationStorageType, MapStorageType),
}

impl StorageOptions {
    /// Options with the given global settings
    pub fn new(global: StorageSettings) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    /// Replace the datastore defaults
    pub fn with_defaults(
        mut self,
        association: AssociationStorageType,
        map: MapStorageType,
    ) -> Self {
        self.defaults = (association, map);
        self
    }

    /// Set the settings of every association owned by entities of `table`
    pub fn set_entity(&mut self, table: impl Into<String>, settings: StorageSettings) {
        self.entities.insert(table.into(), settings);
    }

    /// Set the settings of the association with the given collection role
    pub fn set_property(&mut self, collection_role: impl Into<String>, settings: StorageSettings) {
        self.properties.insert(collection_role.into(), settings);
    }

    /// Global settings
    pub fn global(&self) -> &StorageSettings {
        &self.global
    }

    fn levels(&self, metadata: &AssociationKeyMetadata, owner_table: &str) -> [StorageSettings; 3] {
        let property = metadata
            .collection_role()
            .and_then(|role| self.properties.get(role))
            .copied()
            .unwrap_or_default();
        let entity = self.entities.get(owner_table).copied().unwrap_or_default();
        [property, entity, self.global]
    }

    /// Association storage of the association described by `metadata`
    /// owned by an entity of `owner_table`
    pub fn association_storage(
        &self,
        metadata: &AssociationKeyMetadata,
        owner_table: &str,
        supports_nesting: bool,
    ) -> AssociationStorageType {
        let levels = self.levels(metadata, owner_table).map(|s| s.association_storage);
        resolve_association_storage(&levels, self.defaults.0, supports_nesting)
    }

    /// Map storage of the association described by `metadata` owned by an
    /// entity of `owner_table`, whose map key columns have the given kinds
    pub fn map_storage(
        &self,
        metadata: &AssociationKeyMetadata,
        owner_table: &str,
        key_column_kinds: &[ValueKind],
    ) -> MapStorageType {
        let levels = self.levels(metadata, owner_table).map(|s| s.map_storage);
        resolve_map_storage(&levels, self.defaults.1, key_column_kinds)
    }
}
