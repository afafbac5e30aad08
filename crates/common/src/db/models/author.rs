//! Author entity

use crate::models::{Author, HistoryEvent};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub org: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub gid: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub oid: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub orgid: Option<String>,

    /// NULL until the h-index job has visited the author
    pub h_index: Option<i32>,

    /// Array of authored paper ids
    #[sea_orm(column_type = "JsonBinary")]
    pub papers: Json,

    /// Object of paper id -> embedding vector
    #[sea_orm(column_type = "JsonBinary")]
    pub vectorized_papers: Json,

    /// Append-only array of history events
    #[sea_orm(column_type = "JsonBinary")]
    pub history: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Author {
    fn from(model: Model) -> Self {
        let papers = decode_papers(&model.id, model.papers);
        let vectorized_papers = decode_vectors(&model.id, model.vectorized_papers);
        let history = decode_history(&model.id, model.history);

        Author {
            id: model.id,
            name: model.name,
            org: model.org,
            gid: model.gid,
            oid: model.oid,
            orgid: model.orgid,
            h_index: model.h_index.and_then(|h| u32::try_from(h).ok()),
            papers,
            vectorized_papers,
            history,
        }
    }
}

fn decode_papers(author_id: &str, value: Json) -> Vec<String> {
    let Json::Array(ids) = value else {
        return Vec::new();
    };
    ids.into_iter()
        .filter_map(|id| match id {
            Json::String(id) => Some(id),
            other => {
                warn!(author_id, paper_id = %other, "Skipping non-string paper id");
                None
            }
        })
        .collect()
}

fn decode_vectors(author_id: &str, value: Json) -> BTreeMap<String, Vec<f32>> {
    let Json::Object(entries) = value else {
        return BTreeMap::new();
    };
    entries
        .into_iter()
        .filter_map(|(paper_id, vector)| match serde_json::from_value::<Vec<f32>>(vector) {
            Ok(vector) => Some((paper_id, vector)),
            Err(e) => {
                warn!(author_id, paper_id = %paper_id, error = %e, "Skipping malformed paper vector");
                None
            }
        })
        .collect()
}

fn decode_history(author_id: &str, value: Json) -> Vec<HistoryEvent> {
    let Json::Array(events) = value else {
        return Vec::new();
    };
    events
        .into_iter()
        .filter_map(|event| match serde_json::from_value::<HistoryEvent>(event) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(author_id, error = %e, "Skipping malformed history event");
                None
            }
        })
        .collect()
}
