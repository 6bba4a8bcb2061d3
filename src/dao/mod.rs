/// Database model definitions.
pub mod models;
/// Storage abstraction over the five panel tables.
pub mod panel_store;
/// Backend-agnostic storage errors.
pub mod storage;
