//! Onboarding flow — state machine, entities, coordinator, and routes.

pub mod coordinator;
pub mod model;
pub mod routes;
pub mod state;

pub use coordinator::OnboardingCoordinator;
pub use routes::{onboarding_routes, OnboardingRouteState};
