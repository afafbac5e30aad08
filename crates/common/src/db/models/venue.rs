//! Venue entity

use crate::models::Venue;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "venues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub name_d: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub raw: Option<String>,

    #[sea_orm(column_name = "type")]
    pub venue_type: Option<i32>,

    pub papers_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::paper::Entity")]
    Papers,
}

impl Related<super::paper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Papers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Venue {
    fn from(model: Model) -> Self {
        Venue {
            id: model.id,
            name: model.name_d,
            raw: model.raw,
            venue_type: model.venue_type,
            papers_count: model.papers_count.max(0) as u64,
        }
    }
}
