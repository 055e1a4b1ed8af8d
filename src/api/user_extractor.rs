use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use std::collections::BTreeSet;

use crate::model::UserContext;

/// Axum extractor for UserContext from request headers
///
/// - X-User-Id: user identifier
/// - X-User-Name: optional display name
/// - X-User-Permissions: comma separated permission names
///
/// Requests without `X-User-Id` are anonymous and hold no permissions.
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        match extract_header_value(headers, "x-user-id") {
            Some(user_id) => Ok(UserContext::with_details(
                user_id,
                extract_header_value(headers, "x-user-name"),
                extract_permissions(headers),
            )),
            None => Ok(UserContext::anonymous()),
        }
    }
}

/// Extract header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_permissions(headers: &HeaderMap) -> BTreeSet<String> {
    extract_header_value(headers, "x-user-permissions")
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|permission| !permission.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
