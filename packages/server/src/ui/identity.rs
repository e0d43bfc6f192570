//! Caller identity extraction.
//!
//! Authentication happens in front of this server. The authenticating proxy
//! forwards the caller as the `x-user-id` header; browser WebSocket clients
//! cannot set headers and pass `user_id` as a query parameter instead.

use axum::{
    extract::{FromRequestParts, Query},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::domain::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub UserId);

impl Identity {
    pub fn user_id(&self) -> UserId {
        self.0
    }
}

#[derive(Debug, Deserialize)]
struct IdentityQuery {
    user_id: Option<String>,
}

/// Why the caller could not be identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRejection {
    Missing,
    Malformed(String),
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        match self {
            IdentityRejection::Missing => {
                (StatusCode::UNAUTHORIZED, "missing caller identity").into_response()
            }
            IdentityRejection::Malformed(raw) => (
                StatusCode::BAD_REQUEST,
                format!("malformed user id: '{raw}'"),
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(USER_ID_HEADER)
            .map(|value| value.to_str().unwrap_or_default().to_string());

        let raw = match from_header {
            Some(raw) => raw,
            None => Query::<IdentityQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(query)| query.user_id)
                .ok_or(IdentityRejection::Missing)?,
        };

        parse_user_id(&raw).map(Identity)
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, IdentityRejection> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(UserId::new(id)),
        _ => {
            tracing::warn!("Rejecting malformed user id '{}'", raw);
            Err(IdentityRejection::Malformed(raw.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Identity, IdentityRejection> {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_identity_from_header() {
        // テスト項目: x-user-id ヘッダーから呼び出し元を特定できる
        // given (前提条件):
        let request = Request::builder()
            .uri("/ws/meetings/7")
            .header(USER_ID_HEADER, "42")
            .body(())
            .unwrap();

        // when (操作):
        let identity = extract(request).await;

        // then (期待する結果):
        assert_eq!(identity, Ok(Identity(UserId::new(42))));
    }

    #[tokio::test]
    async fn test_identity_from_query_when_header_absent() {
        // テスト項目: ヘッダーが無い場合はクエリの user_id を使う
        // given (前提条件):
        let request = Request::builder()
            .uri("/ws/meetings/7?user_id=5")
            .body(())
            .unwrap();

        // when (操作):
        let identity = extract(request).await;

        // then (期待する結果):
        assert_eq!(identity, Ok(Identity(UserId::new(5))));
    }

    #[tokio::test]
    async fn test_header_takes_precedence_over_query() {
        // テスト項目: ヘッダーとクエリの両方がある場合はヘッダーを優先する
        // given (前提条件):
        let request = Request::builder()
            .uri("/ws/meetings/7?user_id=5")
            .header(USER_ID_HEADER, "6")
            .body(())
            .unwrap();

        // when (操作):
        let identity = extract(request).await;

        // then (期待する結果):
        assert_eq!(identity, Ok(Identity(UserId::new(6))));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_identity_are_rejected() {
        // テスト項目: 呼び出し元が無い場合は Missing、数値でない場合は Malformed
        // given (前提条件):
        let missing = Request::builder().uri("/api/health").body(()).unwrap();
        let malformed = Request::builder()
            .uri("/ws/meetings/7?user_id=alice")
            .body(())
            .unwrap();

        // when (操作):
        let missing = extract(missing).await;
        let malformed = extract(malformed).await;

        // then (期待する結果):
        assert_eq!(missing, Err(IdentityRejection::Missing));
        assert_eq!(
            malformed,
            Err(IdentityRejection::Malformed("alice".to_string()))
        );
    }
}
