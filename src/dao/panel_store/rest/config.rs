use super::error::{RestDaoError, RestResult};

/// Runtime configuration describing how to reach the REST store.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Root URL of the store's REST endpoint (up to and including the API
    /// prefix, without a trailing slash).
    pub base_url: String,
    /// API key sent both as `apikey` and bearer token.
    pub api_key: String,
}

impl RestConfig {
    /// Construct a configuration from explicit URL and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> RestResult<Self> {
        let base_url =
            std::env::var("QUIZ_PANEL_REST_URL").map_err(|_| RestDaoError::MissingEnvVar {
                var: "QUIZ_PANEL_REST_URL",
            })?;
        let api_key =
            std::env::var("QUIZ_PANEL_REST_KEY").map_err(|_| RestDaoError::MissingEnvVar {
                var: "QUIZ_PANEL_REST_KEY",
            })?;

        Ok(Self::new(base_url, api_key))
    }
}
