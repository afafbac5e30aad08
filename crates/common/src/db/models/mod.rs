//! SeaORM entity models
//!
//! Database entities for the citation corpus

mod author;
mod paper;
mod venue;

pub use paper::{
    Entity as PaperEntity,
    Model as PaperModel,
    ActiveModel as PaperActiveModel,
    Column as PaperColumn,
};

pub use author::{
    Entity as AuthorEntity,
    Model as AuthorModel,
    ActiveModel as AuthorActiveModel,
    Column as AuthorColumn,
};

pub use venue::{
    Entity as VenueEntity,
    Model as VenueModel,
    ActiveModel as VenueActiveModel,
    Column as VenueColumn,
};
