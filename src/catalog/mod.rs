//! Media catalog: the durable record collection behind the admin gallery.

mod models;
mod schema;
mod store;

pub use models::{
    AudioDetails, Category, MediaFileType, MediaRecord, MediaUpdate, NewMediaRecord,
    TechnicalMetadata,
};
pub use schema::CATALOG_SCHEMA_SQL;
pub use store::{CatalogStore, SqliteCatalogStore};
