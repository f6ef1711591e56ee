//! Views: config mutation, referential checks, membership edges.

use std::sync::Arc;

use serde_json::json;

use omnigraph::error::OmnigraphError;
use omnigraph::model::{Record, ViewConfig, ViewData};
use omnigraph::ViewAccessLayer;

use crate::helpers::{person, stack, Stack};

async fn view_layer(stack: &Stack) -> ViewAccessLayer {
    ViewAccessLayer::new(stack.entities.clone(), stack.embedder.clone())
        .await
        .unwrap()
}

fn view_data(name: &str) -> ViewData {
    ViewData {
        name: name.to_string(),
        description: format!("{name} description"),
        configs: Vec::new(),
    }
}

#[tokio::test]
async fn test_view_crud() {
    let stack = stack().await;
    let views = view_layer(&stack).await;

    let created = views.create_view(&view_data("watchlist"), "u1").await.unwrap();
    assert_eq!(created.acl.owner, "u1");
    assert_eq!(
        views.get_view(&created.meta.id).await.unwrap().unwrap(),
        created
    );

    let updated = views
        .update_view(&created.meta.id, json!({"description": "updated"}))
        .await
        .unwrap();
    assert_eq!(updated.data.description, "updated");
    assert_eq!(updated.data.name, "watchlist");

    assert!(views.delete_view(&created.meta.id).await.unwrap());
    assert!(views.get_view(&created.meta.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_add_config_appends_after_verification() {
    let stack = stack().await;
    let views = view_layer(&stack).await;

    let ada = stack.entities.create_person(&person("Ada"), "u1").await.unwrap();
    let view = views.create_view(&view_data("watchlist"), "u1").await.unwrap();

    let config = ViewConfig {
        entities: vec![ada.meta.id.clone()],
        ..Default::default()
    };
    let updated = views.add_config(&view.meta.id, &config).await.unwrap();
    assert_eq!(updated.data.configs.len(), 1);
    assert_eq!(updated.data.configs[0].entities, vec![ada.meta.id.clone()]);

    // The cached copy reflects the mutation.
    let fetched = views.get_view(&view.meta.id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_add_config_with_missing_entity_aborts() {
    let stack = stack().await;
    let views = view_layer(&stack).await;

    let ada = stack.entities.create_person(&person("Ada"), "u1").await.unwrap();
    let view = views.create_view(&view_data("watchlist"), "u1").await.unwrap();

    let config = ViewConfig {
        entities: vec![ada.meta.id.clone(), "person/absent".to_string()],
        ..Default::default()
    };
    let err = views.add_config(&view.meta.id, &config).await.unwrap_err();
    assert!(matches!(
        err,
        OmnigraphError::ReferentialViolation { ref id } if id == "person/absent"
    ));

    // The view was not touched.
    let fetched = views.get_view(&view.meta.id).await.unwrap().unwrap();
    assert!(fetched.data.configs.is_empty());
}

#[tokio::test]
async fn test_update_replacing_configs_verifies_references() {
    let stack = stack().await;
    let views = view_layer(&stack).await;

    let ada = stack.entities.create_person(&person("Ada"), "u1").await.unwrap();
    let view = views.create_view(&view_data("watchlist"), "u1").await.unwrap();

    let err = views
        .update_view(
            &view.meta.id,
            json!({"configs": [{"entities": ["person/absent"]}]}),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OmnigraphError::ReferentialViolation { ref id } if id == "person/absent"
    ));

    // The rejected patch left the view untouched.
    let fetched = views.get_view(&view.meta.id).await.unwrap().unwrap();
    assert!(fetched.data.configs.is_empty());

    // Resolvable references go through.
    let updated = views
        .update_view(
            &view.meta.id,
            json!({"configs": [{"entities": [ada.meta.id.clone()]}]}),
        )
        .await
        .unwrap();
    assert_eq!(updated.data.configs[0].entities, vec![ada.meta.id.clone()]);
}

#[tokio::test]
async fn test_verification_reads_the_store_not_the_cache() {
    let stack = stack().await;
    let views = view_layer(&stack).await;

    let ada = stack.entities.create_person(&person("Ada"), "u1").await.unwrap();
    let view = views.create_view(&view_data("watchlist"), "u1").await.unwrap();

    // Delete directly in the store, leaving the cached copy in place.
    let store = stack.client.store();
    store.remove("person", &ada.meta.key).await.unwrap();
    assert!(stack.cache.get(&ada.meta.id).await.is_some());

    let config = ViewConfig {
        entities: vec![ada.meta.id.clone()],
        ..Default::default()
    };
    let err = views.add_config(&view.meta.id, &config).await.unwrap_err();
    assert!(matches!(err, OmnigraphError::ReferentialViolation { .. }));
}

#[tokio::test]
async fn test_connect_entity_into_config() {
    let stack = stack().await;
    let views = view_layer(&stack).await;

    let ada = stack.entities.create_person(&person("Ada"), "u1").await.unwrap();
    let bob = stack.entities.create_person(&person("Bob"), "u1").await.unwrap();

    let view = views
        .create_view(
            &ViewData {
                name: "watchlist".to_string(),
                configs: vec![ViewConfig {
                    entities: vec![ada.meta.id.clone()],
                    ..Default::default()
                }],
                ..Default::default()
            },
            "u1",
        )
        .await
        .unwrap();

    views
        .connect_entity_to_view(&view.meta.id, &bob.meta.id, Some(0))
        .await
        .unwrap();

    let fetched = views.get_view(&view.meta.id).await.unwrap().unwrap();
    assert_eq!(
        fetched.data.configs[0].entities,
        vec![ada.meta.id.clone(), bob.meta.id.clone()]
    );
}

#[tokio::test]
async fn test_connect_entity_by_edge_and_traverse() {
    let stack = stack().await;
    let views = view_layer(&stack).await;

    let ada = stack.entities.create_person(&person("Ada"), "u1").await.unwrap();
    let view = views.create_view(&view_data("watchlist"), "u1").await.unwrap();

    views
        .connect_entity_to_view(&view.meta.id, &ada.meta.id, None)
        .await
        .unwrap();

    let members = views.get_entities(&view.meta.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert!(matches!(&members[0], Record::Person(p) if p.meta.id == ada.meta.id));
}

#[tokio::test]
async fn test_connect_missing_entity_is_rejected() {
    let stack = stack().await;
    let views = view_layer(&stack).await;
    let view = views.create_view(&view_data("watchlist"), "u1").await.unwrap();

    let err = views
        .connect_entity_to_view(&view.meta.id, "person/absent", None)
        .await
        .unwrap_err();
    assert!(matches!(err, OmnigraphError::ReferentialViolation { .. }));
}

#[tokio::test]
async fn test_query_views_by_text_and_owner() {
    let stack = stack().await;
    let views = Arc::new(view_layer(&stack).await);

    views
        .create_view(
            &ViewData {
                name: "Berlin watchlist".to_string(),
                description: "people of interest".to_string(),
                ..Default::default()
            },
            "u1",
        )
        .await
        .unwrap();
    views
        .create_view(
            &ViewData {
                name: "Archive".to_string(),
                description: "old berlin material".to_string(),
                ..Default::default()
            },
            "u1",
        )
        .await
        .unwrap();
    views
        .create_view(
            &ViewData {
                name: "Berlin backup".to_string(),
                ..Default::default()
            },
            "u2",
        )
        .await
        .unwrap();

    // Match on name or description, owner-scoped, case-insensitive.
    let mine = views.query_views("berlin", "u1", 10).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|v| v.acl.owner == "u1"));

    let limited = views.query_views("berlin", "u1", 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    assert!(views.query_views("tokyo", "u1", 10).await.unwrap().is_empty());
}
