//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod billing;
pub mod brands;
pub mod health;
pub mod payments;
pub mod projects;
pub mod teams;
pub mod uploads;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(payments::protected_routes())
        .merge(billing::protected_routes())
        .merge(projects::routes())
        .merge(uploads::routes())
        .merge(brands::routes())
        .merge(teams::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(payments::public_routes())
        .merge(billing::public_routes())
        .merge(uploads::public_routes())
        .merge(protected_routes)
}
