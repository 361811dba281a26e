//! Request extractors

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use platform::client::ClientMeta;

use crate::domain::value_object::tenant::TenantType;
use crate::error::AuthError;

/// Device metadata of the caller.
///
/// The socket address is used when the server was started with connect
/// info; otherwise only headers count.
#[derive(Debug, Clone)]
pub struct ClientContext(pub ClientMeta);

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(Self(ClientMeta::from_headers(&parts.headers, direct_ip)))
    }
}

/// `{tenant}` path segment, rejected with the auth error envelope
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub TenantType);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::InvalidInput("Malformed path"))?;

        let code = params
            .get("tenant")
            .ok_or(AuthError::InvalidInput("Account type missing from path"))?;
        Ok(Self(TenantType::from_str(code)?))
    }
}

/// JSON body whose rejection uses the auth error envelope (400)
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
                AuthError::InvalidInput("Malformed request body")
            })?;
        Ok(Self(value))
    }
}
