/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard projection and realtime streaming.
pub mod leaderboard_service;
/// Session bootstrap and donation callbacks.
pub mod panel_service;
/// Storage backend supervision with reconnect handling.
pub mod storage_supervisor;
/// Streamer game enumeration and activation.
pub mod streamer_service;
/// Viewer flow progression, scoring, and submission.
pub mod viewer_service;
