//! Auth Middleware
//!
//! Bearer access-token guard and the merchant-only guard layered on top
//! of it.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::application::gateway::AuthStore;
use crate::domain::mail::MailGateway;
use crate::domain::value_object::tenant::AccountRef;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Caller identity resolved from the access token, stored in request
/// extensions for downstream handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub account: AccountRef,
    pub email: String,
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Reject requests without a valid access token
pub async fn require_access_token<R, M>(
    State(state): State<AuthAppState<R, M>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingAccessToken)?;
    let claims = state.gateway.authenticate(token)?;

    req.extensions_mut().insert(AuthIdentity {
        account: claims.owner(),
        email: claims.email,
    });

    Ok(next.run(req).await)
}

/// Merchant-only routes. Must run after `require_access_token`.
pub async fn require_merchant(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    let identity = req
        .extensions()
        .get::<AuthIdentity>()
        .ok_or(AuthError::MissingAccessToken)?;

    if !identity.account.tenant.is_merchant() {
        return Err(AuthError::MerchantOnly);
    }

    Ok(next.run(req).await)
}
