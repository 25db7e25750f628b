#![allow(clippy::expect_used)]
//! Lookup routing between identifiers and slugs.

use pretty_assertions::assert_eq;

use slugline_core::model::Document;
use slugline_core::types::DocumentId;
use slugline_service::ServiceError;
use slugline_service::slug::{LookupArg, LookupOptions};

use super::helpers::{MemoryEngine, create_titled, memory_engine};

fn ids(docs: &[Document]) -> Vec<DocumentId> {
    docs.iter().map(|d| d.id.clone()).collect()
}

async fn seeded() -> MemoryEngine {
    let engine = memory_engine();
    create_titled(&engine, "page", 1, "Alpha").await;
    create_titled(&engine, "page", 2, "Beta").await;
    engine
}

#[test_log::test(tokio::test)]
async fn test_identifier_lookup_keeps_argument_order() {
    let engine = seeded().await;
    let by_int = engine
        .find(
            "page",
            &[LookupArg::Integer(2), LookupArg::Integer(1)],
            &LookupOptions::default(),
        )
        .await
        .expect("lookup");
    assert_eq!(ids(&by_int), [DocumentId::Integer(2), DocumentId::Integer(1)]);

    let by_text = engine
        .find(
            "page",
            &[LookupArg::from("1"), LookupArg::from("2")],
            &LookupOptions::default(),
        )
        .await
        .expect("lookup");
    assert_eq!(ids(&by_text), [DocumentId::Integer(1), DocumentId::Integer(2)]);
}

#[test_log::test(tokio::test)]
async fn test_slug_lookup() {
    let engine = seeded().await;
    let found = engine
        .find(
            "page",
            &[LookupArg::from("beta"), LookupArg::from("alpha")],
            &LookupOptions::default(),
        )
        .await
        .expect("lookup");
    assert_eq!(ids(&found), [DocumentId::Integer(2), DocumentId::Integer(1)]);
}

#[test_log::test(tokio::test)]
async fn test_mixed_arguments_need_an_override() {
    let engine = seeded().await;
    let args = [LookupArg::Integer(1), LookupArg::from("alpha")];

    let err = engine
        .find("page", &args, &LookupOptions::default())
        .await
        .expect_err("ambiguous");
    assert!(matches!(err, ServiceError::AmbiguousLookup { .. }));

    let err = engine
        .find("page", &args, &LookupOptions::force_identifier())
        .await
        .expect_err("alpha is not an identifier");
    assert!(matches!(
        err,
        ServiceError::NotFound { ref missing, .. } if missing == &["alpha".to_string()]
    ));

    let err = engine
        .find("page", &args, &LookupOptions::force_slug())
        .await
        .expect_err("no page has the slug 1");
    assert!(matches!(
        err,
        ServiceError::NotFound { ref missing, .. } if missing == &["1".to_string()]
    ));
}

#[test_log::test(tokio::test)]
async fn test_every_missing_argument_is_reported() {
    let engine = seeded().await;
    let err = engine
        .find(
            "page",
            &[
                LookupArg::from("alpha"),
                LookupArg::from("nope"),
                LookupArg::from("nada"),
            ],
            &LookupOptions::default(),
        )
        .await
        .expect_err("two slugs are unknown");
    let ServiceError::NotFound { missing, .. } = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(missing, ["nope", "nada"]);
}

#[test_log::test(tokio::test)]
async fn test_results_are_deduplicated() {
    let engine = memory_engine();
    let mut doc = create_titled(&engine, "note", 1, "First Draft").await;
    doc.set_field("title", "Final Title");
    engine.update(&mut doc).await.expect("update");

    let found = engine
        .find(
            "note",
            &[
                LookupArg::from("first-draft"),
                LookupArg::from("final-title"),
            ],
            &LookupOptions::default(),
        )
        .await
        .expect("lookup");
    assert_eq!(ids(&found), [DocumentId::Integer(1)]);
}

#[test_log::test(tokio::test)]
async fn test_empty_arguments_and_unknown_types() {
    let engine = seeded().await;
    let found = engine
        .find("page", &[], &LookupOptions::default())
        .await
        .expect("lookup");
    assert!(found.is_empty());

    let err = engine
        .find("widget", &[LookupArg::from("alpha")], &LookupOptions::default())
        .await
        .expect_err("unknown type");
    assert!(matches!(err, ServiceError::UnknownType(_)));
}

#[test_log::test(tokio::test)]
async fn test_uuid_and_object_id_lookup() {
    let engine = memory_engine();
    let mut post = engine
        .registry()
        .build_generated("post")
        .expect("post")
        .with_field("title", "Hello");
    engine.create(&mut post).await.expect("create");
    let DocumentId::Uuid(uuid) = post.id else {
        panic!("posts use uuid identifiers");
    };

    for arg in [LookupArg::from(uuid), LookupArg::from(uuid.to_string())] {
        let found = engine
            .find_one("post", arg, &LookupOptions::default())
            .await
            .expect("uuid lookup");
        assert_eq!(found.id, post.id);
    }

    let mut listing = engine
        .registry()
        .build_generated("listing")
        .expect("listing")
        .with_field("name", "Bakery");
    engine.create(&mut listing).await.expect("create");
    let found = engine
        .find_one("listing", &listing.id, &LookupOptions::default())
        .await
        .expect("object id lookup");
    assert_eq!(found.to_param(), "bakery");
}
