//! Cookie-bound session identity.
//!
//! Every request passes through [`bind_session`], which resolves the caller's
//! [`SessionId`] from the session cookie or mints a new one. Handlers read it
//! back with the [`CurrentSession`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::error::AppError;
use super::state::AppState;
use crate::api::SessionId;
use crate::config::SessionConfig;

/// Session of the current request, as resolved by [`bind_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSession(pub SessionId);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| AppError::Internal("session middleware is not installed".to_string()))
    }
}

/// Find a well-formed session id in the request's `Cookie` headers.
///
/// Malformed values are ignored, as if no cookie were sent.
pub fn session_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == cookie_name)
        .find_map(|(_, value)| SessionId::parse(value.trim_matches('"')))
}

/// `Set-Cookie` value binding `session` to the client.
pub fn session_cookie(config: &SessionConfig, session: &SessionId) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        config.cookie_name,
        session.as_str()
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Middleware resolving the session and issuing a cookie for new ones.
pub async fn bind_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = session_from_headers(request.headers(), &state.session.cookie_name);
    let issued = existing.is_none();
    let session = existing.unwrap_or_else(SessionId::generate);
    if issued {
        debug!(session = session.log_prefix(), "issuing new session");
    }

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    if issued {
        match HeaderValue::from_str(&session_cookie(&state.session, &session)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "could not encode session cookie"),
        }
    }
    response
}
