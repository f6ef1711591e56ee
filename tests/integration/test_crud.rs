//! Create, read, update and delete across the entity kinds.

use serde_json::json;

use omnigraph::model::{MonitoringSourceData, OrganizationData, SourceData, WebsiteData};
use omnigraph::MonitorAccessLayer;

use crate::helpers::{event, person, relation, stack};

#[tokio::test]
async fn test_create_then_get_each_kind() {
    let stack = stack().await;
    let dal = &stack.entities;

    let created = dal.create_person(&person("Ada"), "u1").await.unwrap();
    assert_eq!(dal.get_person(&created.meta.id).await.unwrap().unwrap(), created);

    let org = OrganizationData {
        name: "ACME".to_string(),
        org_type: "company".to_string(),
        ..Default::default()
    };
    let created = dal.create_organization(&org, "u1").await.unwrap();
    let fetched = dal.get_organization(&created.meta.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.data.org_type, "company");

    let website = WebsiteData {
        url: "https://example.org".to_string(),
        title: "Example".to_string(),
        ..Default::default()
    };
    let created = dal.create_website(&website, "u1").await.unwrap();
    assert_eq!(dal.get_website(&created.meta.id).await.unwrap().unwrap(), created);

    let source = SourceData {
        url: "https://feed.example.org".to_string(),
        source_type: "rss".to_string(),
        ..Default::default()
    };
    let created = dal.create_source(&source, "u1").await.unwrap();
    assert_eq!(dal.get_source(&created.meta.id).await.unwrap().unwrap(), created);

    let created = dal.create_event(&event("Summit", "US", 1000), "u1").await.unwrap();
    assert_eq!(dal.get_event(&created.meta.id).await.unwrap().unwrap(), created);
}

#[tokio::test]
async fn test_create_assigns_owner_and_empty_grants() {
    let stack = stack().await;
    let created = stack
        .entities
        .create_person(&person("Ada"), "analyst-7")
        .await
        .unwrap();
    assert_eq!(created.acl.owner, "analyst-7");
    assert!(created.acl.read.is_empty());
    assert!(created.acl.write.is_empty());
    assert!(created.meta.id.starts_with("person/"));
}

#[tokio::test]
async fn test_create_relation_lands_in_derived_edge_collection() {
    let stack = stack().await;
    let dal = &stack.entities;

    let ada = dal.create_person(&person("Ada"), "u1").await.unwrap();
    let acme = dal
        .create_organization(
            &OrganizationData {
                name: "ACME".to_string(),
                ..Default::default()
            },
            "u1",
        )
        .await
        .unwrap();

    let created = dal
        .create_relation(&relation("works_at", &ada.meta.id, &acme.meta.id), "u1")
        .await
        .unwrap();
    assert!(created.meta.id.starts_with("person_works_at_organization/"));
    assert_eq!(created.data.from_id, ada.meta.id);
    assert_eq!(created.data.to_id, acme.meta.id);

    let fetched = dal.get_relation(&created.meta.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_update_merges_and_bumps_revision() {
    let stack = stack().await;
    let dal = &stack.entities;

    let created = dal
        .create_person(
            &omnigraph::model::PersonData {
                name: "Ada".to_string(),
                role: "engineer".to_string(),
                ..Default::default()
            },
            "u1",
        )
        .await
        .unwrap();

    let updated = dal
        .update_person(&created.meta.id, json!({"role": "director"}))
        .await
        .unwrap();
    assert_eq!(updated.data.name, "Ada");
    assert_eq!(updated.data.role, "director");
    assert_ne!(updated.meta.rev, created.meta.rev);
    assert_eq!(updated.meta.id, created.meta.id);

    // The merged document was written through the cache, so the get that
    // follows never reaches the store.
    let before = stack.store.fetch_count();
    assert_eq!(dal.get_person(&created.meta.id).await.unwrap().unwrap(), updated);
    assert_eq!(stack.store.fetch_count(), before);
}

#[tokio::test]
async fn test_reads_after_write_are_served_from_cache() {
    let stack = stack().await;
    let created = stack
        .entities
        .create_person(&person("Ada"), "u1")
        .await
        .unwrap();

    let before = stack.store.fetch_count();
    for _ in 0..3 {
        stack
            .entities
            .get_person(&created.meta.id)
            .await
            .unwrap()
            .unwrap();
    }
    assert_eq!(stack.store.fetch_count(), before);

    // After the cached copy is gone, exactly one fetch repopulates it.
    stack.cache.expel(&created.meta.id).await;
    stack
        .entities
        .get_person(&created.meta.id)
        .await
        .unwrap()
        .unwrap();
    stack
        .entities
        .get_person(&created.meta.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stack.store.fetch_count(), before + 1);
}

#[tokio::test]
async fn test_delete_then_get_absent() {
    let stack = stack().await;
    let dal = &stack.entities;

    let created = dal.create_person(&person("Ada"), "u1").await.unwrap();
    assert!(dal.delete(&created.meta.id).await.unwrap());
    assert!(dal.get_person(&created.meta.id).await.unwrap().is_none());

    // Deleting again reports that nothing was there.
    assert!(!dal.delete(&created.meta.id).await.unwrap());
    // As does deleting in a collection that was never provisioned.
    assert!(!dal.delete("ghost/42").await.unwrap());
}

#[tokio::test]
async fn test_mixed_case_ids_share_one_cache_entry() {
    let stack = stack().await;
    let dal = &stack.entities;

    let created = dal.create_person(&person("Ada"), "u1").await.unwrap();
    let mixed = format!("Person/{}", created.meta.key);

    // A read under the mixed-case spelling lands in the same cache entry,
    // so deleting under the canonical id leaves nothing stale behind.
    assert!(dal.get_person(&mixed).await.unwrap().is_some());
    assert!(dal.delete(&created.meta.id).await.unwrap());
    assert!(dal.get_person(&mixed).await.unwrap().is_none());
    assert!(dal.get_person(&created.meta.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_unknown_collection_is_none() {
    let stack = stack().await;
    assert!(stack.entities.get_document("ghost/42").await.unwrap().is_none());
}

#[tokio::test]
async fn test_monitoring_sources_per_user() {
    let stack = stack().await;
    let monitors = MonitorAccessLayer::new(
        stack.client.clone(),
        stack.cache.clone(),
        stack.embedder.clone(),
    )
    .await
    .unwrap();

    let data = MonitoringSourceData {
        name: "acme feed".to_string(),
        source_type: "rss".to_string(),
        url: "https://acme.example/feed".to_string(),
        user_id: "u1".to_string(),
        enabled: true,
        ..Default::default()
    };
    let created = monitors.create(&data, "u1").await.unwrap();
    assert_eq!(monitors.get(&created.meta.id).await.unwrap().unwrap(), created);

    let other = MonitoringSourceData {
        name: "other feed".to_string(),
        user_id: "u2".to_string(),
        ..Default::default()
    };
    monitors.create(&other, "u2").await.unwrap();

    let mine = monitors.list_by_user("u1").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].data.name, "acme feed");

    let updated = monitors
        .update(&created.meta.id, json!({"enabled": false}))
        .await
        .unwrap();
    assert!(!updated.data.enabled);

    assert!(monitors.delete(&created.meta.id).await.unwrap());
    assert!(monitors.list_by_user("u1").await.unwrap().is_empty());
}
