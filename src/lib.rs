//! AgriTrace onboarding service.
//!
//! Authenticates users against a hosted identity provider and walks them
//! through role selection and role-specific profile submission, persisting
//! onboarding state to a hosted record store. The route guard derives
//! page-level navigation from that persisted state.

use std::sync::Arc;

use axum::response::Json;
use axum::routing::get;
use axum::Router;

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod onboarding;
pub mod store;

use auth::{auth_routes, AuthRouteState};
use guard::{guard_routes, GuardState};
use identity::IdentityProvider;
use onboarding::{onboarding_routes, OnboardingCoordinator, OnboardingRouteState};
use store::Store;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "agritrace" }))
}

/// Assemble the full application router over the given service handles.
pub fn app(identity: Arc<dyn IdentityProvider>, store: Arc<dyn Store>) -> Router {
    let coordinator = Arc::new(OnboardingCoordinator::new(Arc::clone(&store)));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes(AuthRouteState {
            identity: Arc::clone(&identity),
            store: Arc::clone(&store),
        }))
        .merge(onboarding_routes(OnboardingRouteState {
            identity: Arc::clone(&identity),
            store: Arc::clone(&store),
            coordinator,
        }))
        .merge(guard_routes(GuardState { identity, store }))
}
