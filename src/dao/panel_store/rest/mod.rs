//! Storage backend speaking the managed store's REST dialect.
//!
//! The external store exposes each table over HTTP with equality /
//! array-contains / boolean-or filters and `order=` clauses, which is the
//! full set of query capabilities the panel relies on.

mod config;
mod error;
mod models;
mod store;

pub use config::RestConfig;
pub use error::{RestDaoError, RestResult};
pub use store::RestPanelStore;
