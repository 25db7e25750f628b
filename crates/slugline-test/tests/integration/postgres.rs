#![allow(clippy::expect_used)]
//! Engine flows against `PostgreSQL`.
//!
//! Every test is skipped when `TEST_DATABASE_URL` is unset.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use slugline_core::error::StoreError;
use slugline_core::store::DocumentStore;
use slugline_core::types::DocumentId;
use slugline_service::ServiceError;
use slugline_service::slug::{LookupArg, LookupOptions};
use slugline_test::fixtures;

use super::helpers::{PgEngine, TestDb, create_titled, history};

async fn stored(engine: &PgEngine, collection: &str, id: i64) -> slugline_core::model::Document {
    engine
        .store()
        .get(collection, &DocumentId::Integer(id))
        .await
        .expect("query")
        .expect("stored")
}

#[test_log::test(tokio::test)]
async fn test_pg_suffixing_and_lookup() {
    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let first = create_titled(&engine, "page", 1, "Hello World").await;
    let second = create_titled(&engine, "page", 2, "Hello World").await;
    let reserved = create_titled(&engine, "page", 3, "Admin").await;
    assert_eq!(first.current_slug(), Some("hello-world"));
    assert_eq!(second.current_slug(), Some("hello-world-1"));
    assert_eq!(reserved.current_slug(), Some("admin-1"));

    let found = engine
        .find(
            "page",
            &[LookupArg::from("hello-world-1"), LookupArg::from("hello-world")],
            &LookupOptions::default(),
        )
        .await
        .expect("slug lookup");
    let ids: Vec<_> = found.iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, [DocumentId::Integer(2), DocumentId::Integer(1)]);
    assert_eq!(found[1].field_text("title").as_deref(), Some("Hello World"));

    let by_id = engine
        .find_one("page", "3", &LookupOptions::default())
        .await
        .expect("identifier lookup");
    assert_eq!(by_id.to_param(), "admin-1");

    db.cleanup().await.expect("cleanup");
}

#[test_log::test(tokio::test)]
async fn test_pg_reclaims_stale_history() {
    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let mut first = fixtures::titled(&engine, "article", 1, "Home")
        .expect("article")
        .with_field("site_id", 1);
    engine.create(&mut first).await.expect("create");
    first.set_field("title", "Welcome");
    engine.update(&mut first).await.expect("update");

    let mut second = fixtures::titled(&engine, "article", 2, "Home")
        .expect("article")
        .with_field("site_id", 1);
    engine.create(&mut second).await.expect("create");
    assert_eq!(second.current_slug(), Some("home"));
    assert_eq!(history(&stored(&engine, "article", 1).await), ["welcome"]);

    // Another site keeps its own namespace.
    let mut elsewhere = fixtures::titled(&engine, "article", 3, "Home")
        .expect("article")
        .with_field("site_id", 2);
    engine.create(&mut elsewhere).await.expect("create");
    assert_eq!(elsewhere.current_slug(), Some("home"));

    db.cleanup().await.expect("cleanup");
}

#[test_log::test(tokio::test)]
async fn test_pg_soft_delete_and_restore() {
    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let mut original = create_titled(&engine, "page", 1, "Slug").await;
    engine.soft_delete(&mut original).await.expect("soft delete");
    let replacement = create_titled(&engine, "page", 2, "Slug").await;
    assert_eq!(replacement.current_slug(), Some("slug"));

    engine.restore(&mut original).await.expect("restore");
    assert_eq!(original.current_slug(), Some("slug-1"));

    let reloaded = stored(&engine, "page", 1).await;
    assert!(!reloaded.is_deleted());
    assert_eq!(history(&reloaded), ["slug-1"]);

    db.cleanup().await.expect("cleanup");
}

#[test_log::test(tokio::test)]
async fn test_pg_field_and_embedded_scopes() {
    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let mut params = Vec::new();
    for city in [Some("paris"), Some("rome"), None, None] {
        let mut doc = engine
            .registry()
            .build_generated("listing")
            .expect("listing")
            .with_field("name", "Cafe");
        if let Some(city) = city {
            doc.set_field("city", city);
        }
        engine.create(&mut doc).await.expect("create");
        params.push(doc.to_param());
    }
    assert_eq!(params, ["cafe", "cafe", "cafe", "cafe-1"]);

    let mut params = Vec::new();
    for (id, parent) in [(1, 10), (2, 20), (3, 10)] {
        let mut doc = engine
            .registry()
            .build("comment", DocumentId::Integer(id))
            .expect("comment")
            .with_field("title", "Nice")
            .embedded(DocumentId::Integer(parent), "comments");
        engine.create(&mut doc).await.expect("create");
        params.push(doc.to_param());
    }
    assert_eq!(params, ["nice", "nice", "nice-1"]);

    db.cleanup().await.expect("cleanup");
}

#[test_log::test(tokio::test)]
async fn test_pg_field_scope_compares_json_values() {
    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let mut params = Vec::new();
    for city in [None, Some(json!("")), Some(json!(1)), Some(json!("1")), Some(Value::Null)] {
        let mut doc = engine
            .registry()
            .build_generated("listing")
            .expect("listing")
            .with_field("name", "Cafe");
        if let Some(city) = city {
            doc.set_field("city", city);
        }
        engine.create(&mut doc).await.expect("create");
        params.push(doc.to_param());
    }
    assert_eq!(params, ["cafe", "cafe", "cafe", "cafe", "cafe-1"]);

    db.cleanup().await.expect("cleanup");
}

#[test_log::test(tokio::test)]
async fn test_pg_lost_races_keep_slug_state_clean() {
    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let mut slow = fixtures::titled(&engine, "note", 1, "Title").expect("note");
    slow.request_slug("Chosen Path");
    engine.generate_slug(&mut slow).await.expect("generate");
    create_titled(&engine, "note", 2, "Chosen Path").await;
    engine
        .store()
        .insert(&slow)
        .await
        .expect_err("unique index rejects the write");

    engine.create(&mut slow).await.expect("retry create");
    assert_eq!(history(&slow), ["chosen-path-1"]);
    assert_eq!(history(&stored(&engine, "note", 1).await), ["chosen-path-1"]);

    slow.set_field("title", "Taken");
    engine.generate_slug(&mut slow).await.expect("generate");
    create_titled(&engine, "note", 3, "Taken").await;
    let err = engine
        .store()
        .update(&slow)
        .await
        .expect_err("unique index rejects the write");
    assert!(ServiceError::from(err).is_retryable());

    engine.update(&mut slow).await.expect("retry update");
    assert_eq!(history(&slow), ["chosen-path-1", "taken-1"]);
    assert_eq!(
        history(&stored(&engine, "note", 1).await),
        ["chosen-path-1", "taken-1"]
    );

    db.cleanup().await.expect("cleanup");
}

#[test_log::test(tokio::test)]
async fn test_pg_unique_index_rejects_stale_writer() {
    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let mut slow = fixtures::titled(&engine, "page", 1, "Race").expect("page");
    engine.generate_slug(&mut slow).await.expect("generate");
    create_titled(&engine, "page", 2, "Race").await;

    let err = engine
        .store()
        .insert(&slow)
        .await
        .expect_err("unique index rejects the write");
    assert!(matches!(
        err,
        StoreError::UniquenessViolation { ref slug, .. } if slug == "race"
    ));
    assert!(
        engine
            .store()
            .get("page", &DocumentId::Integer(1))
            .await
            .expect("query")
            .is_none(),
        "failed insert is rolled back"
    );

    engine.create(&mut slow).await.expect("retry");
    assert_eq!(slow.current_slug(), Some("race-1"));

    db.cleanup().await.expect("cleanup");
}

#[test_log::test(tokio::test)]
async fn test_pg_concurrent_creates_retry_to_distinct_slugs() {
    const WRITERS: i64 = 5;

    let Some(db) = TestDb::new().await.expect("test database") else {
        return;
    };
    let engine = db.engine();

    let writers = (1..=WRITERS).map(|id| {
        let engine = &engine;
        async move {
            let mut doc = fixtures::titled(engine, "page", id, "Busy").expect("page");
            loop {
                match engine.create(&mut doc).await {
                    Ok(()) => return doc,
                    Err(err) if err.is_retryable() => {
                        tracing::debug!(id, error = %err, "Retrying create");
                    }
                    Err(err) => panic!("create failed: {err}"),
                }
            }
        }
    });
    let docs = futures::future::join_all(writers).await;

    let slugs: BTreeSet<String> = docs.iter().map(|d| d.to_param()).collect();
    let expected: BTreeSet<String> = ["busy", "busy-1", "busy-2", "busy-3", "busy-4"]
        .into_iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(slugs, expected);

    let err = engine
        .update(&mut fixtures::titled(&engine, "page", 99, "Ghost").expect("page"))
        .await
        .expect_err("never inserted");
    assert!(matches!(err, ServiceError::StoreError(StoreError::DocumentNotFound { .. })));

    db.cleanup().await.expect("cleanup");
}
