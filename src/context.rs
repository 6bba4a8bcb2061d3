//! Host platform identity resolution.
//!
//! The panel iframe forwards the host's extension token with every request.
//! The host already verified the viewer when it issued the token, so only
//! the payload segment is read here; requests without a token fall back to
//! the query parameters used by the local development harness.

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::{dao::models::Role, error::AppError};

/// Identity triple resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// Viewer identity on the host platform, when shared.
    pub host_id: Option<String>,
    /// Channel the panel is embedded on.
    pub channel_id: Option<String>,
    /// Role the host reports for this viewer on this channel.
    pub role: Role,
}

impl HostContext {
    /// Host id, or the terminal "cannot identify user" failure.
    pub fn require_host_id(&self) -> Result<&str, AppError> {
        self.host_id
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("cannot identify user".into()))
    }

    /// Channel id, or the terminal "cannot identify channel" failure.
    pub fn require_channel_id(&self) -> Result<&str, AppError> {
        self.channel_id
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("cannot identify channel".into()))
    }
}

/// Claims the host platform places in its extension token payload.
#[derive(Debug, Deserialize)]
struct BridgeClaims {
    user_id: Option<String>,
    channel_id: Option<String>,
    role: Option<String>,
}

/// Query parameters accepted by the local development harness.
#[derive(Debug, Default, Deserialize)]
struct HarnessQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
    role: Option<String>,
}

/// The host platform calls the channel owner "broadcaster"; everyone else
/// plays as a viewer.
fn map_bridge_role(role: Option<&str>) -> Role {
    match role {
        Some("broadcaster") => Role::Streamer,
        _ => Role::Viewer,
    }
}

fn map_harness_role(role: Option<&str>) -> Role {
    match role {
        Some("streamer") => Role::Streamer,
        _ => Role::Viewer,
    }
}

/// Decode the payload segment of the host's extension token.
fn decode_bridge_token(token: &str) -> Result<HostContext, AppError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AppError::Unauthorized("malformed extension token".into()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| AppError::Unauthorized("malformed extension token payload".into()))?;

    let claims: BridgeClaims = serde_json::from_slice(&bytes)
        .map_err(|_| AppError::Unauthorized("unreadable extension token claims".into()))?;

    Ok(HostContext {
        role: map_bridge_role(claims.role.as_deref()),
        host_id: claims.user_id,
        channel_id: claims.channel_id,
    })
}

impl<S> FromRequestParts<S> for HostContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if let Some(token) = bearer {
            return decode_bridge_token(token);
        }

        let Query(query) = Query::<HarnessQuery>::try_from_uri(&parts.uri).unwrap_or_default();
        Ok(HostContext {
            role: map_harness_role(query.role.as_deref()),
            host_id: query.user_id,
            channel_id: query.channel_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};

    use super::*;

    fn parts_for(uri: &str, authorization: Option<String>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap().into_parts().0
    }

    async fn resolve(uri: &str, authorization: Option<String>) -> Result<HostContext, AppError> {
        let mut parts = parts_for(uri, authorization);
        HostContext::from_request_parts(&mut parts, &()).await
    }

    fn token_with_payload(payload: &str) -> String {
        let segment = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("head.{segment}.sig")
    }

    #[tokio::test]
    async fn bridge_token_wins_and_maps_broadcaster_to_streamer() {
        let token = token_with_payload(
            r#"{"user_id":"123456789","channel_id":"987654321","role":"broadcaster"}"#,
        );
        let context = resolve("http://panel/session", Some(format!("Bearer {token}")))
            .await
            .unwrap();

        assert_eq!(context.host_id.as_deref(), Some("123456789"));
        assert_eq!(context.channel_id.as_deref(), Some("987654321"));
        assert_eq!(context.role, Role::Streamer);
    }

    #[tokio::test]
    async fn bridge_token_non_broadcaster_roles_become_viewer() {
        let token =
            token_with_payload(r#"{"user_id":"1","channel_id":"2","role":"moderator"}"#);
        let context = resolve("http://panel/session", Some(format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(context.role, Role::Viewer);
    }

    #[tokio::test]
    async fn malformed_token_is_a_terminal_identity_failure() {
        let err = resolve("http://panel/session", Some("Bearer junk".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn query_parameters_back_the_local_harness() {
        let context = resolve(
            "http://panel/session?userId=11&channelId=22&role=streamer",
            None,
        )
        .await
        .unwrap();

        assert_eq!(context.host_id.as_deref(), Some("11"));
        assert_eq!(context.channel_id.as_deref(), Some("22"));
        assert_eq!(context.role, Role::Streamer);
    }

    #[tokio::test]
    async fn missing_identity_defaults_to_anonymous_viewer() {
        let context = resolve("http://panel/session", None).await.unwrap();
        assert_eq!(context.host_id, None);
        assert_eq!(context.role, Role::Viewer);
        assert!(context.require_host_id().is_err());
    }

    #[tokio::test]
    async fn unrecognized_harness_role_defaults_to_viewer() {
        let context = resolve("http://panel/session?userId=1&role=admin", None)
            .await
            .unwrap();
        assert_eq!(context.role, Role::Viewer);
    }
}
