use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = TenantId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = AccountId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_ids_are_unique() {
    let first = JournalEntryId::new();
    let second = JournalEntryId::new();
    assert_ne!(first, second);
    assert_eq!(first.into_inner().get_version_num(), 7);
}

#[test]
fn test_typed_id_display_and_parse() {
    let uuid = Uuid::new_v4();
    let id = SourceId::from_uuid(uuid);
    assert_eq!(id.to_string(), uuid.to_string());
    assert_eq!(SourceId::from_str(&uuid.to_string()).unwrap(), id);
    assert!(TaxRuleId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_typed_id_serde_transparent() {
    let uuid = Uuid::new_v4();
    let id = TenantId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
