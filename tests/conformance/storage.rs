//! Association and map storage resolution

use std::sync::Arc;
use tessera::{
    resolve_association_storage, resolve_map_storage, AssociatedEntityKeyMetadata,
    AssociationKeyMetadata, AssociationStorageType, EntityKeyMetadata, MapStorageType,
    StorageOptions, StorageSettings, ValueKind,
};

use tessera::AssociationStorageType::{AssociationDocument, InEntity};
use tessera::MapStorageType::{AsList, ByKey};

fn addresses() -> AssociationKeyMetadata {
    let target = AssociatedEntityKeyMetadata::new(
        ["addresses_id"],
        Arc::new(EntityKeyMetadata::new("Address", ["id"])),
    )
    .unwrap();
    AssociationKeyMetadata::builder("User_Address", ["user_id"], target)
        .row_key_index_column_names(["addressType"])
        .collection_role("addresses")
        .build()
}

fn association(setting: AssociationStorageType) -> StorageSettings {
    StorageSettings::default().with_association_storage(setting)
}

#[test]
fn test_property_wins_over_entity_global_and_default() {
    let mut options = StorageOptions::new(association(InEntity)).with_defaults(InEntity, ByKey);
    options.set_entity("User", association(InEntity));
    options.set_property("addresses", association(AssociationDocument));
    assert_eq!(options.association_storage(&addresses(), "User", true), AssociationDocument);
}

#[test]
fn test_entity_wins_over_global() {
    let mut options = StorageOptions::new(association(AssociationDocument));
    options.set_entity("User", association(InEntity));
    assert_eq!(options.association_storage(&addresses(), "User", true), InEntity);
    assert_eq!(
        options.association_storage(&addresses(), "Company", true),
        AssociationDocument
    );
}

#[test]
fn test_default_applies_when_nothing_is_set() {
    assert_eq!(resolve_association_storage(&[None, None, None], InEntity, true), InEntity);
    assert_eq!(
        resolve_association_storage(&[None, None, None], AssociationDocument, true),
        AssociationDocument
    );
}

#[test]
fn test_in_entity_without_nesting_falls_back() {
    assert_eq!(
        resolve_association_storage(&[Some(InEntity), None, None], InEntity, false),
        AssociationDocument
    );
}

#[test]
fn test_two_key_map_resolves_as_list_even_when_by_key_requested() {
    let kinds = [ValueKind::String, ValueKind::String];
    assert_eq!(resolve_map_storage(&[Some(ByKey), None, None], ByKey, &kinds), AsList);

    let options = StorageOptions::new(StorageSettings::default().with_map_storage(ByKey));
    assert_eq!(options.map_storage(&addresses(), "User", &kinds), AsList);
}

#[test]
fn test_by_key_needs_a_string_like_key() {
    assert_eq!(resolve_map_storage(&[Some(ByKey)], AsList, &[ValueKind::String]), ByKey);
    assert_eq!(resolve_map_storage(&[Some(ByKey)], AsList, &[ValueKind::Int]), AsList);
    assert_eq!(resolve_map_storage(&[None], AsList, &[ValueKind::String]), AsList);
}

#[test]
fn test_resolution_is_deterministic() {
    let options = StorageOptions::default();
    let first = options.map_storage(&addresses(), "User", &[ValueKind::String]);
    for _ in 0..10 {
        assert_eq!(options.map_storage(&addresses(), "User", &[ValueKind::String]), first);
    }
    assert_eq!(first, MapStorageType::ByKey);
}
