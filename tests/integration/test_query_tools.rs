//! Event search and neighborhood queries.

use std::sync::Arc;

use omnigraph::model::Record;
use omnigraph::query::{EventSearchParams, QueryTools};

use crate::helpers::{event, person, relation, stack, stack_with, StubEmbedder};

#[tokio::test]
async fn test_country_filter_with_relations_riding_along() {
    let stack = stack().await;
    let dal = &stack.entities;

    let e1 = dal.create_event(&event("march", "US", 1000), "u1").await.unwrap();
    let e2 = dal.create_event(&event("arrest", "US", 2000), "u1").await.unwrap();
    let e3 = dal.create_event(&event("summit", "UK", 3000), "u1").await.unwrap();
    dal.create_relation(&relation("led_to", &e1.meta.id, &e2.meta.id), "u1")
        .await
        .unwrap();
    dal.create_relation(&relation("led_to", &e2.meta.id, &e3.meta.id), "u1")
        .await
        .unwrap();

    let tools = QueryTools::new(stack.entities.clone());
    let params = EventSearchParams {
        country_code: Some("US".to_string()),
        ..Default::default()
    };
    let results = tools.search_events(&params).await.unwrap();

    let events: Vec<_> = results.iter().filter_map(Record::as_event).collect();
    let ids: Vec<_> = events.iter().map(|e| e.meta.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&e1.meta.id.as_str()));
    assert!(ids.contains(&e2.meta.id.as_str()));
    // Newest first without query text.
    assert_eq!(events[0].meta.id, e2.meta.id);

    // Only the relation between the two selected events comes along; the
    // edge into the filtered-out UK event does not.
    let relations: Vec<_> = results.iter().filter_map(Record::as_relation).collect();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].data.from_id, e1.meta.id);
    assert_eq!(relations[0].data.to_id, e2.meta.id);
}

#[tokio::test]
async fn test_self_relation_on_single_selected_event_rides_along() {
    let stack = stack().await;
    let dal = &stack.entities;

    let e1 = dal.create_event(&event("standoff", "US", 1000), "u1").await.unwrap();
    dal.create_event(&event("summit", "UK", 2000), "u1").await.unwrap();
    dal.create_relation(&relation("follow_up", &e1.meta.id, &e1.meta.id), "u1")
        .await
        .unwrap();

    let tools = QueryTools::new(stack.entities.clone());
    let params = EventSearchParams {
        country_code: Some("US".to_string()),
        ..Default::default()
    };
    let results = tools.search_events(&params).await.unwrap();

    assert_eq!(results.iter().filter_map(Record::as_event).count(), 1);
    let relations: Vec<_> = results.iter().filter_map(Record::as_relation).collect();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].data.from_id, e1.meta.id);
    assert_eq!(relations[0].data.to_id, e1.meta.id);
}

#[tokio::test]
async fn test_date_range_bounds_are_inclusive() {
    let stack = stack().await;
    let dal = &stack.entities;

    for (title, at) in [("a", 1000), ("b", 2000), ("c", 3000)] {
        dal.create_event(&event(title, "US", at), "u1").await.unwrap();
    }

    let tools = QueryTools::new(stack.entities.clone());
    let params = EventSearchParams {
        date_range: Some((Some(1500), Some(2500))),
        ..Default::default()
    };
    let results = tools.search_events(&params).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_event().unwrap().data.title, "b");

    // No relations exist among the selected events.
    assert!(results.iter().all(|r| r.as_relation().is_none()));

    let open_ended = EventSearchParams {
        date_range: Some((Some(2000), None)),
        ..Default::default()
    };
    let results = tools.search_events(&open_ended).await.unwrap();
    let titles: Vec<_> = results
        .iter()
        .filter_map(Record::as_event)
        .map(|e| e.data.title.as_str())
        .collect();
    assert_eq!(titles, vec!["c", "b"]);
}

#[tokio::test]
async fn test_text_search_ranks_by_similarity() {
    let stack = stack_with(Arc::new(StubEmbedder)).await;
    let dal = &stack.entities;

    dal.create_event(&event("warehouse fire downtown", "US", 1000), "u1")
        .await
        .unwrap();
    dal.create_event(&event("election rally", "US", 2000), "u1")
        .await
        .unwrap();
    dal.create_event(&event("solar eclipse observed", "UK", 3000), "u1")
        .await
        .unwrap();

    let tools = QueryTools::new(stack.entities.clone());
    let params = EventSearchParams {
        text: Some("solar eclipse".to_string()),
        limit: 2,
        ..Default::default()
    };
    let results = tools.search_events(&params).await.unwrap();

    let first = results[0].as_event().unwrap();
    assert_eq!(first.data.title, "solar eclipse observed");
    assert_eq!(results.iter().filter_map(Record::as_event).count(), 2);
}

#[tokio::test]
async fn test_text_search_degrades_to_recency_without_embedder() {
    let stack = stack().await;
    let dal = &stack.entities;

    dal.create_event(&event("old", "US", 1000), "u1").await.unwrap();
    dal.create_event(&event("new", "US", 2000), "u1").await.unwrap();

    let tools = QueryTools::new(stack.entities.clone());
    let params = EventSearchParams {
        text: Some("anything".to_string()),
        ..Default::default()
    };
    let results = tools.search_events(&params).await.unwrap();
    let first = results[0].as_event().unwrap();
    assert_eq!(first.data.title, "new");
}

#[tokio::test]
async fn test_neighborhood_is_symmetric_and_includes_edges() {
    let stack = stack().await;
    let dal = &stack.entities;

    let ada = dal.create_person(&person("Ada"), "u1").await.unwrap();
    let march = dal.create_event(&event("march", "US", 1000), "u1").await.unwrap();
    let edge = dal
        .create_relation(&relation("attended", &ada.meta.id, &march.meta.id), "u1")
        .await
        .unwrap();

    let tools = QueryTools::new(stack.entities.clone());

    let from_person = tools
        .search_entity_neighborhood(&ada.meta.id, 10)
        .await
        .unwrap();
    assert!(from_person
        .iter()
        .any(|r| matches!(r, Record::Event(e) if e.meta.id == march.meta.id)));
    assert!(from_person
        .iter()
        .any(|r| matches!(r, Record::Relation(rel) if rel.meta.id == edge.meta.id)));

    let from_event = tools
        .search_entity_neighborhood(&march.meta.id, 10)
        .await
        .unwrap();
    assert!(from_event
        .iter()
        .any(|r| matches!(r, Record::Person(p) if p.meta.id == ada.meta.id)));
}
