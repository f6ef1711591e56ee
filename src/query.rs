//! Higher-level query tools built on the declarative query layer.

use std::sync::Arc;

use serde_json::json;

use crate::dal::EntityAccessLayer;
use crate::error::Result;
use crate::model::{collections, Record, EVENT_RELATED_GRAPH, EVENT_VIEW};
use crate::store::{Direction, Filter, GraphQuery, Sort};

/// Parameters for an event search.
///
/// With `text` set, events are ranked by vector distance to the query
/// text; without it (or when embedding is unavailable) they are returned
/// newest first.
#[derive(Debug, Clone)]
pub struct EventSearchParams {
    pub text: Option<String>,
    /// Inclusive `happened_at` bounds, epoch milliseconds.
    pub date_range: Option<(Option<i64>, Option<i64>)>,
    pub country_code: Option<String>,
    pub limit: usize,
}

impl Default for EventSearchParams {
    fn default() -> Self {
        Self {
            text: None,
            date_range: None,
            country_code: None,
            limit: 50,
        }
    }
}

pub struct QueryTools {
    entities: Arc<EntityAccessLayer>,
}

impl QueryTools {
    pub fn new(entities: Arc<EntityAccessLayer>) -> Self {
        Self { entities }
    }

    /// Search events, then pull in the relations among the selected
    /// events so callers get a connected result set in one call.
    pub async fn search_events(&self, params: &EventSearchParams) -> Result<Vec<Record>> {
        let mut query = GraphQuery::over_collection(collections::EVENT);

        if let Some(country) = &params.country_code {
            query = query.filter(Filter::eq("location.country_code", json!(country)));
        }
        if let Some((since, until)) = params.date_range {
            if let Some(since) = since {
                query = query.filter(Filter::ge("happened_at", json!(since)));
            }
            if let Some(until) = until {
                query = query.filter(Filter::le("happened_at", json!(until)));
            }
        }

        let sort = match &params.text {
            Some(text) => match self.entities.embed_text(text).await {
                Some(vector) => Sort::Distance {
                    path: "embedding".to_string(),
                    query: vector,
                },
                None => newest_first(),
            },
            None => newest_first(),
        };
        query = query.sort(sort).take(params.limit);

        let mut results = self.entities.query(&query).await?;

        let event_ids: Vec<serde_json::Value> = results
            .iter()
            .filter_map(Record::as_event)
            .map(|event| json!(event.meta.id))
            .collect();
        if !event_ids.is_empty() {
            let relations = GraphQuery::over_view(EVENT_VIEW)
                .filter(Filter::is_in("_from", event_ids.clone()))
                .filter(Filter::is_in("_to", event_ids));
            results.extend(self.entities.query(&relations).await?);
        }

        Ok(results)
    }

    /// The one-hop neighborhood of an entity in the relation graph, edges
    /// included.
    pub async fn search_entity_neighborhood(
        &self,
        entity_id: &str,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let query =
            GraphQuery::traversal(entity_id, EVENT_RELATED_GRAPH, Direction::Any, 1, true)
                .take(limit);
        self.entities.query(&query).await
    }
}

fn newest_first() -> Sort {
    Sort::Field {
        path: "happened_at".to_string(),
        descending: true,
    }
}
