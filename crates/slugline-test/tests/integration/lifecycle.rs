#![allow(clippy::expect_used)]
//! Slug lifecycle across create, update, soft delete and restore.

use pretty_assertions::assert_eq;

use slugline_core::types::DocumentId;
use slugline_service::ServiceError;
use slugline_service::slug::LookupOptions;
use slugline_test::fixtures;

use super::helpers::{create_titled, history, memory_engine};

#[test_log::test(tokio::test)]
async fn test_create_assigns_slug_and_param() {
    let engine = memory_engine();
    let doc = create_titled(&engine, "page", 1, "Hello, World!").await;
    assert_eq!(doc.current_slug(), Some("hello-world"));
    assert_eq!(doc.to_param(), "hello-world");
    assert!(!doc.is_new_record());
}

#[test_log::test(tokio::test)]
async fn test_saving_unchanged_document_keeps_slug() {
    let engine = memory_engine();
    let mut doc = create_titled(&engine, "note", 1, "Stable").await;
    for _ in 0..3 {
        engine.save(&mut doc).await.expect("save");
    }
    assert_eq!(history(&doc), ["stable"]);

    doc.set_field("body", "unrelated edit");
    engine.save(&mut doc).await.expect("save");
    assert_eq!(history(&doc), ["stable"]);
}

#[test_log::test(tokio::test)]
async fn test_history_keeps_old_slugs_resolvable() {
    let engine = memory_engine();
    let mut doc = create_titled(&engine, "note", 1, "First Draft").await;
    doc.set_field("title", "Final Title");
    engine.update(&mut doc).await.expect("update");
    assert_eq!(history(&doc), ["first-draft", "final-title"]);

    let found = engine
        .find_one("note", "first-draft", &LookupOptions::default())
        .await
        .expect("old slug still resolves");
    assert_eq!(found.id, doc.id);
    assert_eq!(found.to_param(), "final-title");

    // Returning to an older title moves it to the end instead of suffixing.
    doc.set_field("title", "First Draft");
    engine.update(&mut doc).await.expect("update");
    assert_eq!(history(&doc), ["final-title", "first-draft"]);
}

#[test_log::test(tokio::test)]
async fn test_without_history_old_slug_is_freed() {
    let engine = memory_engine();
    let mut doc = create_titled(&engine, "page", 1, "Old Name").await;
    doc.set_field("title", "New Name");
    engine.update(&mut doc).await.expect("update");
    assert_eq!(history(&doc), ["new-name"]);

    let other = create_titled(&engine, "page", 2, "Old Name").await;
    assert_eq!(other.current_slug(), Some("old-name"));
}

#[test_log::test(tokio::test)]
async fn test_requested_slug_overrides_fields() {
    let engine = memory_engine();
    let mut doc = fixtures::titled(&engine, "page", 1, "Generated").expect("page");
    doc.request_slug("Hand Picked");
    engine.create(&mut doc).await.expect("create");
    assert_eq!(doc.current_slug(), Some("hand-picked"));
    assert_eq!(doc.requested_slug, None);

    // Requesting the current slug again is a no-op.
    doc.request_slug("hand-picked");
    engine.update(&mut doc).await.expect("update");
    assert_eq!(history(&doc), ["hand-picked"]);
}

#[test_log::test(tokio::test)]
async fn test_empty_candidate_assigns_no_slug() {
    let engine = memory_engine();
    let doc = create_titled(&engine, "page", 7, "!!! ???").await;
    assert_eq!(doc.current_slug(), None);
    assert_eq!(doc.to_param(), "7");

    let found = engine
        .find_one("page", 7_i64, &LookupOptions::default())
        .await
        .expect("identifier lookup");
    assert_eq!(found.id, DocumentId::Integer(7));
}

#[test_log::test(tokio::test)]
async fn test_custom_builder() {
    let engine = memory_engine();
    let mut doc = engine
        .registry()
        .build("person", DocumentId::Integer(1))
        .expect("person")
        .with_field("first", "Ada")
        .with_field("last", "Lovelace");
    engine.create(&mut doc).await.expect("create");
    assert_eq!(doc.current_slug(), Some("lovelace-ada"));

    doc.set_field("first", "Augusta");
    engine.update(&mut doc).await.expect("update");
    assert_eq!(doc.current_slug(), Some("lovelace-augusta"));
}

#[test_log::test(tokio::test)]
async fn test_permanent_slug_survives_edits() {
    let engine = memory_engine();
    let mut doc = engine
        .registry()
        .build("ticket", DocumentId::Integer(1))
        .expect("ticket")
        .with_field("subject", "Printer on fire");
    engine.create(&mut doc).await.expect("create");
    assert_eq!(doc.current_slug(), Some("printer-on-fire"));

    doc.set_field("subject", "Printer fixed");
    engine.update(&mut doc).await.expect("update");
    assert_eq!(history(&doc), ["printer-on-fire"]);
}

#[test_log::test(tokio::test)]
async fn test_soft_delete_frees_slug_and_restore_suffixes() {
    let engine = memory_engine();
    let mut original = create_titled(&engine, "page", 1, "Slug").await;
    engine.soft_delete(&mut original).await.expect("soft delete");
    assert!(original.is_deleted());
    assert!(original.slug_history.is_empty());

    let err = engine
        .find_one("page", "slug", &LookupOptions::default())
        .await
        .expect_err("deleted documents have no slug");
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let replacement = create_titled(&engine, "page", 2, "Slug").await;
    assert_eq!(replacement.current_slug(), Some("slug"));

    engine.restore(&mut original).await.expect("restore");
    assert!(!original.is_deleted());
    assert_eq!(original.current_slug(), Some("slug-1"));
}

#[test_log::test(tokio::test)]
async fn test_deleted_documents_are_found_only_on_request() {
    let engine = memory_engine();
    let mut doc = create_titled(&engine, "page", 3, "Gone").await;
    engine.soft_delete(&mut doc).await.expect("soft delete");

    assert!(
        engine
            .find_one("page", 3_i64, &LookupOptions::default())
            .await
            .is_err()
    );
    let found = engine
        .find_one("page", 3_i64, &LookupOptions::default().with_deleted(true))
        .await
        .expect("included on request");
    assert!(found.is_deleted());
}

#[test_log::test(tokio::test)]
async fn test_create_twice_is_rejected() {
    let engine = memory_engine();
    let mut doc = create_titled(&engine, "page", 1, "Once").await;
    let err = engine
        .create(&mut doc)
        .await
        .expect_err("already persisted");
    assert!(matches!(err, ServiceError::CoreError(_)));

    let mut copy = fixtures::titled(&engine, "page", 1, "Once").expect("page");
    let err = engine
        .create(&mut copy)
        .await
        .expect_err("same key");
    assert!(matches!(err, ServiceError::StoreError(_)));
}
