//! Route guard — decides whether a navigation is allowed or redirected,
//! from auth state and onboarding progress alone.
//!
//! The decision itself is a pure function over a snapshot; the HTTP handler
//! around it assembles the snapshot (resolving the bearer token and lazily
//! creating the profile) and degrades to safe defaults when a lookup fails.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::auth::bearer_token;
use crate::error::{ApiError, StoreError};
use crate::identity::{AuthUser, IdentityProvider};
use crate::onboarding::model::{AccountType, UserProfile};
use crate::onboarding::state::OnboardingStatus;
use crate::store::Store;

/// Page classes the guard distinguishes. Anything that is not an
/// onboarding or dashboard page is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPage {
    Public,
    Onboarding,
    Dashboard,
}

impl TargetPage {
    pub fn classify(path: &str) -> TargetPage {
        if path.starts_with("/onboard") {
            Self::Onboarding
        } else if path.starts_with("/dashboard") {
            Self::Dashboard
        } else {
            Self::Public
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Public)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// The slice of profile state the routing decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct GuardSnapshot {
    pub onboarding_status: OnboardingStatus,
    pub account_type: Option<AccountType>,
}

impl GuardSnapshot {
    pub fn of(profile: &UserProfile) -> GuardSnapshot {
        GuardSnapshot {
            onboarding_status: profile.onboarding_status,
            account_type: profile.account_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// Decide whether the navigation proceeds or redirects.
///
/// Rules apply in order; the first match wins:
/// 1. anonymous user on a protected page → `/login`
/// 2. completed user on an onboarding page → `/dashboard`
/// 3. uncompleted user on the dashboard → their current onboarding page
///    (`/onboard/account-type` until a type is chosen, else the role page)
/// 4. otherwise → allow
///
/// A user whose profile could not be read (snapshot `None`) is treated as
/// not yet started, which can only send them earlier in the flow, never
/// onto the dashboard.
pub fn decide_route_access(
    auth: AuthState,
    snapshot: Option<GuardSnapshot>,
    target: TargetPage,
) -> RouteDecision {
    if auth == AuthState::Anonymous {
        if target.requires_auth() {
            return RouteDecision::Redirect("/login".to_string());
        }
        return RouteDecision::Allow;
    }

    let (status, account_type) = match snapshot {
        Some(s) => (s.onboarding_status, s.account_type),
        None => (OnboardingStatus::Pending, None),
    };

    // The page an uncompleted user belongs on right now.
    let current_onboarding_page = match account_type {
        Some(t) => t.onboarding_path(),
        None => "/onboard/account-type".to_string(),
    };

    match target {
        TargetPage::Onboarding if status.is_terminal() => {
            RouteDecision::Redirect("/dashboard".to_string())
        }
        TargetPage::Dashboard if !status.is_terminal() => {
            RouteDecision::Redirect(current_onboarding_page)
        }
        _ => RouteDecision::Allow,
    }
}

/// Fetch the user's profile, creating a pending one on first sight.
///
/// Profiles come into existence lazily: the first guarded navigation (or
/// login) after sign-up materialises the row from the identity record.
pub async fn ensure_profile(
    store: &dyn Store,
    user: &AuthUser,
) -> Result<UserProfile, StoreError> {
    if let Some(profile) = store.get_user_profile(user.id).await? {
        return Ok(profile);
    }
    let profile = UserProfile::new_pending(
        user.id,
        user.full_name(),
        user.email.clone(),
        user.phone.clone(),
    );
    store.insert_user_profile(&profile).await?;
    tracing::info!(user_id = %user.id, "created pending profile");
    Ok(profile)
}

#[derive(Clone)]
pub struct GuardState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn Store>,
}

#[derive(Debug, Deserialize)]
struct GuardQuery {
    path: String,
}

/// GET /api/guard?path=… — evaluate the routing policy for a navigation.
async fn check_route(
    State(state): State<GuardState>,
    headers: HeaderMap,
    Query(query): Query<GuardQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = TargetPage::classify(&query.path);

    // An invalid or expired token is the same as no token here: the guard
    // answers "where should this navigation go", it does not gatekeep data.
    let user = match bearer_token(&headers) {
        Some(token) => state.identity.resolve_token(token).await.ok(),
        None => None,
    };

    let (auth, snapshot) = match &user {
        None => (AuthState::Anonymous, None),
        Some(user) => {
            let snapshot = match ensure_profile(state.store.as_ref(), user).await {
                Ok(profile) => Some(GuardSnapshot::of(&profile)),
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "profile lookup failed in guard");
                    None
                }
            };
            (AuthState::Authenticated, snapshot)
        }
    };

    let body = match decide_route_access(auth, snapshot, target) {
        RouteDecision::Allow => json!({ "success": true, "allow": true }),
        RouteDecision::Redirect(to) => json!({
            "success": true,
            "allow": false,
            "redirectTo": to,
        }),
    };
    Ok(Json(body))
}

pub fn guard_routes(state: GuardState) -> Router {
    Router::new()
        .route("/api/guard", get(check_route))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: OnboardingStatus, account_type: Option<AccountType>) -> GuardSnapshot {
        GuardSnapshot {
            onboarding_status: status,
            account_type,
        }
    }

    #[test]
    fn page_classification() {
        assert_eq!(TargetPage::classify("/"), TargetPage::Public);
        assert_eq!(TargetPage::classify("/login"), TargetPage::Public);
        assert_eq!(TargetPage::classify("/about"), TargetPage::Public);
        assert_eq!(
            TargetPage::classify("/onboard/account-type"),
            TargetPage::Onboarding
        );
        assert_eq!(TargetPage::classify("/onboard/farmer"), TargetPage::Onboarding);
        assert_eq!(TargetPage::classify("/dashboard"), TargetPage::Dashboard);
        assert_eq!(
            TargetPage::classify("/dashboard/settings"),
            TargetPage::Dashboard
        );
    }

    #[test]
    fn anonymous_users_redirect_to_login_on_protected_pages() {
        for target in [TargetPage::Onboarding, TargetPage::Dashboard] {
            assert_eq!(
                decide_route_access(AuthState::Anonymous, None, target),
                RouteDecision::Redirect("/login".to_string())
            );
        }
        assert_eq!(
            decide_route_access(AuthState::Anonymous, None, TargetPage::Public),
            RouteDecision::Allow
        );
    }

    #[test]
    fn completed_users_leave_onboarding() {
        let s = snapshot(OnboardingStatus::Completed, Some(AccountType::Farmer));
        assert_eq!(
            decide_route_access(AuthState::Authenticated, Some(s), TargetPage::Onboarding),
            RouteDecision::Redirect("/dashboard".to_string())
        );
        assert_eq!(
            decide_route_access(AuthState::Authenticated, Some(s), TargetPage::Dashboard),
            RouteDecision::Allow
        );
        assert_eq!(
            decide_route_access(AuthState::Authenticated, Some(s), TargetPage::Public),
            RouteDecision::Allow
        );
    }

    #[test]
    fn uncompleted_users_cannot_reach_the_dashboard() {
        // No account type yet: back to the selection page.
        let s = snapshot(OnboardingStatus::Pending, None);
        assert_eq!(
            decide_route_access(AuthState::Authenticated, Some(s), TargetPage::Dashboard),
            RouteDecision::Redirect("/onboard/account-type".to_string())
        );

        // Type chosen: to the matching role page.
        for (account_type, page) in [
            (AccountType::Farmer, "/onboard/farmer"),
            (AccountType::Cooperative, "/onboard/cooperative"),
            (AccountType::Buyer, "/onboard/buyer"),
        ] {
            let s = snapshot(OnboardingStatus::InProgress, Some(account_type));
            assert_eq!(
                decide_route_access(AuthState::Authenticated, Some(s), TargetPage::Dashboard),
                RouteDecision::Redirect(page.to_string())
            );
        }
    }

    #[test]
    fn uncompleted_users_may_stay_on_onboarding_pages() {
        let s = snapshot(OnboardingStatus::InProgress, Some(AccountType::Buyer));
        assert_eq!(
            decide_route_access(AuthState::Authenticated, Some(s), TargetPage::Onboarding),
            RouteDecision::Allow
        );
        assert_eq!(
            decide_route_access(AuthState::Authenticated, Some(s), TargetPage::Public),
            RouteDecision::Allow
        );
    }

    #[test]
    fn missing_snapshot_degrades_to_not_started() {
        assert_eq!(
            decide_route_access(AuthState::Authenticated, None, TargetPage::Dashboard),
            RouteDecision::Redirect("/onboard/account-type".to_string())
        );
        // Never locked out of onboarding itself.
        assert_eq!(
            decide_route_access(AuthState::Authenticated, None, TargetPage::Onboarding),
            RouteDecision::Allow
        );
    }
}
