//! Relation resolution and lazy materialization.

mod common;

use armature_core::error::OrmError;
use armature_core::models::{resolve, Resolution};
use serde_json::json;

async fn visible_article(
    registry: &armature_core::ModelRegistry,
    executor: &common::MemoryExecutor,
    id: i64,
) -> armature_core::Record {
    registry
        .query("article")
        .unwrap()
        .with_deleted()
        .with_unpublished()
        .where_eq("id", json!(id))
        .find(executor)
        .await
        .unwrap()
        .expect("fixture article exists")
}

#[tokio::test]
async fn belongs_to_fetches_the_parent() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut article = visible_article(&registry, &executor, 1).await;
    let author = article
        .related_one(&registry, &executor, "author")
        .await
        .unwrap()
        .expect("author 1 exists");
    assert_eq!(author.get("name"), Some(&json!("Alexei")));
}

#[tokio::test]
async fn belongs_to_is_memoized_until_key_reassignment() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut article = visible_article(&registry, &executor, 1).await;
    let first = article
        .related_one(&registry, &executor, "author")
        .await
        .unwrap()
        .unwrap();

    // mutate the underlying row behind the memo's back; the cached record
    // keeps answering until the foreign key changes
    let mut rename = armature_core::Row::new();
    rename.insert("name".to_string(), json!("Renamed"));
    registry
        .query("author")
        .unwrap()
        .where_eq("id", json!(1))
        .update_all(&executor, rename)
        .await
        .unwrap();

    let cached = article
        .related_one(&registry, &executor, "author")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.get("name"), first.get("name"));

    article.set("author_id", json!(2)).unwrap();
    let fresh = article
        .related_one(&registry, &executor, "author")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fresh.get("name"), Some(&json!("Marina")));
}

#[tokio::test]
async fn null_foreign_key_short_circuits_to_no_record() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut article = visible_article(&registry, &executor, 1).await;
    article.set("author_id", json!(null)).unwrap();

    let resolution = resolve(&registry, &article, "author").unwrap();
    assert!(resolution.is_empty());

    let related = article
        .related_one(&registry, &executor, "author")
        .await
        .unwrap();
    assert!(related.is_none());
}

#[tokio::test]
async fn has_many_resolves_to_a_scoped_builder() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let article = visible_article(&registry, &executor, 1).await;
    let comments = article
        .related_query(&registry)
        .named("comments")
        .unwrap()
        .find_all(&executor)
        .await
        .unwrap();
    // the soft-deleted spam comment stays hidden
    assert_eq!(comments.len(), 2);
}

#[tokio::test]
async fn has_many_through_joins_the_link_table() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let article = visible_article(&registry, &executor, 1).await;
    let resolution = resolve(&registry, &article, "tags").unwrap();
    let Resolution::Query {
        predicates, join, ..
    } = resolution
    else {
        panic!("expected a query resolution");
    };
    let join = join.expect("through resolution carries a join");
    assert_eq!(join.to_sql(), "INNER JOIN article_tags ON article_tags.tag_id = tags.id");
    assert_eq!(predicates.to_sql(), "article_tags.article_id = 1");

    let tags = article
        .related_query(&registry)
        .named("tags")
        .unwrap()
        .find_all(&executor)
        .await
        .unwrap();
    assert_eq!(tags.len(), 2);
    let names: Vec<_> = tags.iter().map(|t| t.get("name").cloned().unwrap()).collect();
    assert!(names.contains(&json!("rust")));
    assert!(names.contains(&json!("travel")));
}

#[tokio::test]
async fn polymorphic_has_many_filters_by_type_and_id() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let article = visible_article(&registry, &executor, 1).await;
    let resolution = resolve(&registry, &article, "images").unwrap();
    let Resolution::Query { predicates, .. } = resolution else {
        panic!("expected a query resolution");
    };
    assert_eq!(
        predicates.to_sql(),
        "images.imageable_id = 1 AND images.imageable_type = 'article'"
    );

    let images = article
        .related_query(&registry)
        .named("images")
        .unwrap()
        .find_all(&executor)
        .await
        .unwrap();
    assert_eq!(images.len(), 2);
}

#[tokio::test]
async fn polymorphic_belongs_to_resolves_target_from_type_column() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut image = registry
        .query("image")
        .unwrap()
        .where_eq("id", json!(1))
        .find(&executor)
        .await
        .unwrap()
        .unwrap();

    let owner = image
        .related_one(&registry, &executor, "imageable")
        .await
        .unwrap()
        .expect("image 1 belongs to article 1");
    assert_eq!(owner.model().name, "article");
    assert_eq!(owner.get("id"), Some(&json!(1)));
}

#[tokio::test]
async fn polymorphic_belongs_to_with_null_type_is_empty() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut image = registry
        .query("image")
        .unwrap()
        .where_eq("id", json!(1))
        .find(&executor)
        .await
        .unwrap()
        .unwrap();
    image.set("imageable_type", json!(null)).unwrap();

    let related = image
        .related_one(&registry, &executor, "imageable")
        .await
        .unwrap();
    assert!(related.is_none());
}

#[tokio::test]
async fn unknown_relation_is_an_explicit_error() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let article = visible_article(&registry, &executor, 1).await;
    let err = resolve(&registry, &article, "reviews").unwrap_err();
    assert!(matches!(
        err,
        OrmError::UnknownRelation { relation, .. } if relation == "reviews"
    ));
    // plain column access still works for non-relation names
    assert_eq!(article.get("status"), Some(&json!("active")));
}

#[tokio::test]
async fn build_related_prefills_foreign_keys() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let article = visible_article(&registry, &executor, 1).await;

    let mut values = armature_core::Row::new();
    values.insert("body".to_string(), json!("drafted"));
    let comment = article
        .build_related(&registry, "comments", values)
        .unwrap();
    assert_eq!(comment.get("article_id"), Some(&json!(1)));
    assert_eq!(comment.get("body"), Some(&json!("drafted")));
    assert!(comment.is_new());

    let mut values = armature_core::Row::new();
    values.insert("path".to_string(), json!("new.jpg"));
    let image = article.build_related(&registry, "images", values).unwrap();
    assert_eq!(image.get("imageable_id"), Some(&json!(1)));
    assert_eq!(image.get("imageable_type"), Some(&json!("article")));
}

#[tokio::test]
async fn new_record_has_empty_related_sets() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let article = armature_core::Record::new(registry.get("article").unwrap());
    let comments = article
        .related_query(&registry)
        .named("comments")
        .unwrap()
        .find_all(&executor)
        .await
        .unwrap();
    assert!(comments.is_empty());
}
