//! Soft-delete and publish-window visibility against the in-memory executor.

mod common;

use armature_core::error::OrmError;
use serde_json::json;

#[tokio::test]
async fn default_find_all_hides_deleted_and_unpublished() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let records = registry
        .query("article")
        .unwrap()
        .find_all(&executor)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("id"), Some(&json!(1)));
}

#[tokio::test]
async fn with_deleted_reveals_soft_deleted_rows() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let records = registry
        .query("article")
        .unwrap()
        .with_deleted()
        .with_unpublished()
        .find_all(&executor)
        .await
        .unwrap();
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn only_deleted_returns_the_complement() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let records = registry
        .query("article")
        .unwrap()
        .only_deleted()
        .with_unpublished()
        .find_all(&executor)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("id"), Some(&json!(4)));
}

#[tokio::test]
async fn only_unpublished_returns_rows_with_no_timestamp() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let records = registry
        .query("article")
        .unwrap()
        .only_unpublished()
        .find_all(&executor)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("id"), Some(&json!(2)));
}

#[tokio::test]
async fn future_publish_timestamps_stay_hidden() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let records = registry
        .query("article")
        .unwrap()
        .where_eq("city", json!("Omsk"))
        .find_all(&executor)
        .await
        .unwrap();
    // article 3 is future-published, article 4 deleted
    assert!(records.is_empty());
}

#[tokio::test]
async fn soft_delete_round_trip() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut article = registry
        .query("article")
        .unwrap()
        .where_eq("id", json!(1))
        .find(&executor)
        .await
        .unwrap()
        .expect("article 1 is visible");

    article.delete(&registry, &executor).await.unwrap();
    assert_eq!(article.is_deleted(), Some(true));

    // row still exists, hidden from default reads
    assert!(executor.row_by_id("articles", 1).is_some());
    let visible = registry
        .query("article")
        .unwrap()
        .find_all(&executor)
        .await
        .unwrap();
    assert!(visible.is_empty());

    article.restore(&registry, &executor).await.unwrap();
    assert_eq!(article.is_deleted(), Some(false));
    let visible = registry
        .query("article")
        .unwrap()
        .find_all(&executor)
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
}

#[tokio::test]
async fn force_delete_removes_the_row() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut article = registry
        .query("article")
        .unwrap()
        .where_eq("id", json!(1))
        .find(&executor)
        .await
        .unwrap()
        .unwrap();

    article.force_delete(&registry, &executor).await.unwrap();
    assert!(article.is_new());
    assert!(executor.row_by_id("articles", 1).is_none());
}

#[tokio::test]
async fn delete_on_unloaded_record_fails() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut record = armature_core::Record::new(registry.get("article").unwrap());
    let err = record.delete(&registry, &executor).await.unwrap_err();
    assert!(matches!(err, OrmError::NotLoaded { action: "delete", .. }));
}

#[tokio::test]
async fn publish_and_unpublish_stamp_the_column() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut article = registry
        .query("article")
        .unwrap()
        .only_unpublished()
        .find(&executor)
        .await
        .unwrap()
        .expect("article 2 is unpublished");

    article.publish(&registry, &executor).await.unwrap();
    assert_eq!(article.is_published(), Some(true));
    let row = executor.row_by_id("articles", 2).unwrap();
    assert!(!row["published_at"].is_null());

    article.unpublish(&registry, &executor).await.unwrap();
    assert_eq!(article.is_published(), Some(false));
    let row = executor.row_by_id("articles", 2).unwrap();
    assert!(row["published_at"].is_null());
}

#[tokio::test]
async fn delete_all_soft_deletes_matching_rows() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let affected = registry
        .query("article")
        .unwrap()
        .where_eq("city", json!("Irkutsk"))
        .delete_all(&executor)
        .await
        .unwrap();
    assert_eq!(affected, 2);

    // rows remain, stamped rather than removed
    assert!(executor.row_by_id("articles", 1).is_some());
    assert!(!executor.row_by_id("articles", 1).unwrap()["deleted_at"].is_null());
    assert!(!executor.row_by_id("articles", 2).unwrap()["deleted_at"].is_null());
}

#[tokio::test]
async fn update_all_applies_assignments_to_matches() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut assignments = armature_core::Row::new();
    assignments.insert("status".to_string(), json!("archived"));
    let affected = registry
        .query("article")
        .unwrap()
        .where_eq("city", json!("Omsk"))
        .update_all(&executor, assignments)
        .await
        .unwrap();
    assert_eq!(affected, 2);
    assert_eq!(executor.row_by_id("articles", 3).unwrap()["status"], json!("archived"));
}

#[tokio::test]
async fn soft_delete_bypasses_validation() {
    let registry = common::registry();
    let executor = common::seeded_executor();

    let mut article = registry
        .query("article")
        .unwrap()
        .where_eq("id", json!(1))
        .find(&executor)
        .await
        .unwrap()
        .unwrap();

    // delete takes no validation service at all; a failing validator on
    // update does not block the soft-delete path
    article.delete(&registry, &executor).await.unwrap();
    assert_eq!(article.is_deleted(), Some(true));
}
