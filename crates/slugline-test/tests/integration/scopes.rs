#![allow(clippy::expect_used)]
//! Uniqueness scopes: associations, plain fields, embedding and inheritance.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use slugline_core::model::Document;
use slugline_core::types::DocumentId;
use slugline_service::ServiceError;
use slugline_service::slug::{LookupArg, LookupOptions};

use super::helpers::{MemoryEngine, create_titled, history, memory_engine};

async fn post(engine: &MemoryEngine, author: Option<i64>, title: &str) -> Document {
    let mut doc = engine
        .registry()
        .build_generated("post")
        .expect("post")
        .with_field("title", title);
    if let Some(author) = author {
        doc.set_field("author_id", author);
    }
    engine.create(&mut doc).await.expect("create");
    doc
}

async fn listing(engine: &MemoryEngine, city: Option<&str>, name: &str) -> Document {
    let mut doc = engine
        .registry()
        .build_generated("listing")
        .expect("listing")
        .with_field("name", name);
    if let Some(city) = city {
        doc.set_field("city", city);
    }
    engine.create(&mut doc).await.expect("create");
    doc
}

async fn comment(engine: &MemoryEngine, id: i64, parent: i64, title: &str) -> Document {
    let mut doc = engine
        .registry()
        .build("comment", DocumentId::Integer(id))
        .expect("comment")
        .with_field("title", title)
        .embedded(DocumentId::Integer(parent), "comments");
    engine.create(&mut doc).await.expect("create");
    doc
}

#[test_log::test(tokio::test)]
async fn test_association_scope() {
    let engine = memory_engine();
    let a = post(&engine, Some(1), "Intro").await;
    let b = post(&engine, Some(2), "Intro").await;
    let a2 = post(&engine, Some(1), "Intro").await;
    assert_eq!(a.current_slug(), Some("intro"));
    assert_eq!(b.current_slug(), Some("intro"));
    assert_eq!(a2.current_slug(), Some("intro-1"));

    let scope = engine
        .scope_of(&a)
        .expect("registered")
        .expect("slugged type");
    let found = engine
        .find(
            "post",
            &[LookupArg::from("intro")],
            &LookupOptions::default().within(scope.siblings),
        )
        .await
        .expect("scoped lookup");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, a.id);

    let everywhere = engine
        .find("post", &[LookupArg::from("intro")], &LookupOptions::default())
        .await
        .expect("unscoped lookup");
    assert_eq!(everywhere.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_moving_to_another_parent_restarts_history() {
    let engine = memory_engine();
    post(&engine, Some(2), "Intro").await;
    let mut moved = post(&engine, Some(1), "Intro").await;
    assert_eq!(moved.current_slug(), Some("intro"));

    moved.set_field("author_id", 2);
    engine.update(&mut moved).await.expect("update");
    assert_eq!(history(&moved), ["intro-1"]);

    // The old parent's scope no longer holds the value.
    let fresh = post(&engine, Some(1), "Intro").await;
    assert_eq!(fresh.current_slug(), Some("intro"));
}

#[test_log::test(tokio::test)]
async fn test_association_without_parent_uses_root_scope() {
    let engine = memory_engine();
    let first = post(&engine, None, "Orphan").await;
    let second = post(&engine, None, "Orphan").await;
    assert_eq!(first.current_slug(), Some("orphan"));
    assert_eq!(second.current_slug(), Some("orphan-1"));
}

#[test_log::test(tokio::test)]
async fn test_field_scope() {
    let engine = memory_engine();
    let paris = listing(&engine, Some("paris"), "Cafe").await;
    let rome = listing(&engine, Some("rome"), "Cafe").await;
    let paris2 = listing(&engine, Some("paris"), "Cafe").await;
    assert_eq!(paris.current_slug(), Some("cafe"));
    assert_eq!(rome.current_slug(), Some("cafe"));
    assert_eq!(paris2.current_slug(), Some("cafe-1"));

    // A missing scope field groups with other missing values.
    let nowhere = listing(&engine, None, "Cafe").await;
    let nowhere2 = listing(&engine, None, "Cafe").await;
    assert_eq!(nowhere.current_slug(), Some("cafe"));
    assert_eq!(nowhere2.current_slug(), Some("cafe-1"));
}

#[test_log::test(tokio::test)]
async fn test_field_scope_compares_json_values() {
    let engine = memory_engine();
    let cities = [
        None,
        Some(json!("")),
        Some(json!(1)),
        Some(json!("1")),
        Some(Value::Null),
        Some(json!("")),
        Some(json!(1)),
    ];
    let mut params = Vec::new();
    for city in cities {
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
    // Null shares a scope with a missing field; "" and "1" do not.
    assert_eq!(params, ["cafe", "cafe", "cafe", "cafe", "cafe-1", "cafe-1", "cafe-1"]);
}

#[test_log::test(tokio::test)]
async fn test_embedded_scope() {
    let engine = memory_engine();
    let first = comment(&engine, 1, 10, "Nice").await;
    let other_parent = comment(&engine, 2, 20, "Nice").await;
    let same_parent = comment(&engine, 3, 10, "Nice").await;
    assert_eq!(first.current_slug(), Some("nice"));
    assert_eq!(other_parent.current_slug(), Some("nice"));
    assert_eq!(same_parent.current_slug(), Some("nice-1"));
}

#[test_log::test(tokio::test)]
async fn test_embedded_scope_with_field() {
    let engine = memory_engine();
    let mut slugs = Vec::new();
    for (id, lang) in [(1, "en"), (2, "fr"), (3, "en")] {
        let mut doc = engine
            .registry()
            .build("section", DocumentId::Integer(id))
            .expect("section")
            .with_field("title", "Intro")
            .with_field("lang", lang)
            .embedded(DocumentId::Integer(1), "sections");
        engine.create(&mut doc).await.expect("create");
        slugs.push(doc.to_param());
    }
    assert_eq!(slugs, ["intro", "intro", "intro-1"]);
}

#[test_log::test(tokio::test)]
async fn test_subtypes_share_one_domain() {
    let engine = memory_engine();
    let landing = create_titled(&engine, "landing", 1, "About").await;
    let blog = create_titled(&engine, "blog", 2, "About").await;
    assert_eq!(landing.collection, "content");
    assert_eq!(landing.current_slug(), Some("about"));
    assert_eq!(blog.current_slug(), Some("about-1"));

    let both = engine
        .find(
            "content",
            &[LookupArg::from("about"), LookupArg::from("about-1")],
            &LookupOptions::default(),
        )
        .await
        .expect("base type sees subtypes");
    let ids: Vec<_> = both.iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, [DocumentId::Integer(1), DocumentId::Integer(2)]);

    let err = engine
        .find_one("landing", "about-1", &LookupOptions::default())
        .await
        .expect_err("sibling subtype is not a landing page");
    assert!(matches!(
        err,
        ServiceError::NotFound { ref missing, .. } if missing == &["about-1".to_string()]
    ));
}
