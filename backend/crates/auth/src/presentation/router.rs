//! Auth Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use platform::clock::{SharedClock, SystemClock};

use crate::application::config::AuthConfig;
use crate::application::gateway::{AuthGateway, AuthStore};
use crate::domain::mail::MailGateway;
use crate::infra::mail::LogMailGateway;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{require_access_token, require_merchant};

/// Create the Auth router with PostgreSQL repository.
///
/// Mail is logged; codes and reset links only appear in debug builds.
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    let mailer = if cfg!(debug_assertions) {
        LogMailGateway::revealing_secrets()
    } else {
        LogMailGateway::new()
    };
    auth_router_generic(repo, mailer, config, Arc::new(SystemClock))
}

/// Create a generic Auth router for any storage and mail implementation
pub fn auth_router_generic<R, M>(
    repo: R,
    mailer: M,
    config: AuthConfig,
    clock: SharedClock,
) -> Router
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let gateway = AuthGateway::new(Arc::new(repo), Arc::new(mailer), Arc::new(config), clock);
    let state = AuthAppState {
        gateway: Arc::new(gateway),
    };

    let protected = Router::new()
        .route("/me", get(handlers::me::<R, M>))
        .route("/logout-all", post(handlers::logout_all::<R, M>))
        .route("/account", delete(handlers::delete_account::<R, M>))
        .route(
            "/business/me",
            get(handlers::me::<R, M>).route_layer(middleware::from_fn(require_merchant)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token::<R, M>,
        ));

    Router::new()
        .route("/{tenant}/signup", post(handlers::signup::<R, M>))
        .route("/{tenant}/login", post(handlers::login::<R, M>))
        .route("/{tenant}/verify-email", post(handlers::verify_email::<R, M>))
        .route(
            "/{tenant}/resend-verification",
            post(handlers::resend_verification::<R, M>),
        )
        .route(
            "/{tenant}/forgot-password",
            post(handlers::forgot_password::<R, M>),
        )
        .route(
            "/{tenant}/reset-password/{token}",
            post(handlers::reset_password::<R, M>),
        )
        .route("/refresh", post(handlers::refresh::<R, M>))
        .route("/logout", post(handlers::logout::<R, M>))
        .merge(protected)
        .with_state(state)
}
