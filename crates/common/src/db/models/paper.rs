//! Paper entity

use crate::models::{AuthorRef, Paper};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,

    #[sea_orm(column_name = "abstract", column_type = "Text", nullable)]
    pub abstract_text: Option<String>,

    pub year: Option<i32>,

    pub n_citation: Option<i64>,

    #[sea_orm(column_type = "Text", nullable)]
    pub venue: Option<String>,

    /// Author list exactly as ingested: ids or embedded author records
    #[sea_orm(column_type = "JsonBinary")]
    pub authors: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::venue::Entity",
        from = "Column::Venue",
        to = "super::venue::Column::Id"
    )]
    Venue,
}

impl Related<super::venue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venue.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Paper {
    fn from(model: Model) -> Self {
        Paper {
            authors: AuthorRef::ids_from_value(&model.authors),
            id: model.id,
            title: model.title,
            abstract_text: model.abstract_text,
            year: model.year,
            n_citation: model.n_citation,
            venue: model.venue,
        }
    }
}
