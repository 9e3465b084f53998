// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn item_id_format() {
    let id = ItemId::generate();
    let s = id.as_str();
    assert!(s.starts_with("ITEM-"), "unexpected prefix: {}", s);
    let suffix = &s["ITEM-".len()..];
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
}

#[test]
fn item_ids_are_unique() {
    let a = ItemId::generate();
    let b = ItemId::generate();
    assert_ne!(a, b);
}

#[test]
fn event_id_format() {
    let id = EventId::generate();
    assert!(id.as_str().starts_with("evt-"));
    assert_eq!(id.as_str().len(), "evt-".len() + 19);
}

#[test]
fn rand_suffix_is_lowercase_alnum() {
    let s = rand_suffix(6);
    assert_eq!(s.len(), 6);
    assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[test]
fn item_id_serde_is_transparent() {
    let id = ItemId::new("ITEM-ABC12345");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"ITEM-ABC12345\"");
    let back: ItemId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn ids_compare_with_str() {
    let id = EventId::new("evt-x");
    assert_eq!(id, *"evt-x");
}
