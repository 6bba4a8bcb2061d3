//! Library crate for quiz-panel-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod context;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
