//! HTTP surface of the onboarding flow.
//!
//! Every endpoint is bearer-authenticated; the token is resolved to a user
//! id through the identity provider before anything touches the store.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::auth::require_user;
use crate::error::ApiError;
use crate::guard::ensure_profile;
use crate::identity::IdentityProvider;
use crate::store::Store;

use super::coordinator::OnboardingCoordinator;
use super::model::{
    AccountType, BuyerSubmission, CooperativeSubmission, FarmerSubmission, RoleSubmission,
};

#[derive(Clone)]
pub struct OnboardingRouteState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn Store>,
    pub coordinator: Arc<OnboardingCoordinator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountTypeBody {
    #[serde(default)]
    account_type: Option<String>,
}

/// POST /api/onboarding/account-type
async fn select_account_type(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(body): Json<AccountTypeBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(state.identity.as_ref(), &headers).await?;

    let raw = body
        .account_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::missing_fields(&["accountType"]))?;
    let account_type = AccountType::parse(raw).ok_or_else(|| {
        ApiError::Validation(format!(
            "invalid account type '{raw}': must be one of farmer, cooperative, buyer"
        ))
    })?;

    // Signed up but never hit a guarded page: materialise the profile now.
    ensure_profile(state.store.as_ref(), &user).await?;

    let next = state
        .coordinator
        .select_account_type(user.id, account_type)
        .await?;
    tracing::info!(user_id = %user.id, %account_type, "account type selected");

    Ok(Json(json!({
        "success": true,
        "message": format!("Account type set to {account_type}"),
        "nextStep": next.to_string(),
    })))
}

/// POST /api/onboarding/farmer
async fn submit_farmer(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(submission): Json<FarmerSubmission>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(state.identity.as_ref(), &headers).await?;
    let outcome = state
        .coordinator
        .submit_role_profile(user.id, RoleSubmission::Farmer(submission))
        .await?;
    tracing::info!(user_id = %user.id, farmer_id = %outcome.role.id(), "farmer onboarding completed");

    let mut body = json!({
        "success": true,
        "message": "Farmer profile saved",
        "farmerId": outcome.role.id(),
    });
    if let Some(farm) = outcome.farm {
        body["farmId"] = json!(farm.id);
        body["farmCode"] = json!(farm.farm_code);
    }
    Ok(Json(body))
}

/// POST /api/onboarding/cooperative
async fn submit_cooperative(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(submission): Json<CooperativeSubmission>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(state.identity.as_ref(), &headers).await?;
    let outcome = state
        .coordinator
        .submit_role_profile(user.id, RoleSubmission::Cooperative(submission))
        .await?;
    tracing::info!(user_id = %user.id, cooperative_id = %outcome.role.id(), "cooperative onboarding completed");

    Ok(Json(json!({
        "success": true,
        "message": "Cooperative profile saved",
        "cooperativeId": outcome.role.id(),
    })))
}

/// POST /api/onboarding/buyer
async fn submit_buyer(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(submission): Json<BuyerSubmission>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(state.identity.as_ref(), &headers).await?;
    let outcome = state
        .coordinator
        .submit_role_profile(user.id, RoleSubmission::Buyer(submission))
        .await?;
    tracing::info!(user_id = %user.id, buyer_id = %outcome.role.id(), "buyer onboarding completed");

    Ok(Json(json!({
        "success": true,
        "message": "Buyer profile saved",
        "buyerId": outcome.role.id(),
    })))
}

pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/api/onboarding/account-type", post(select_account_type))
        .route("/api/onboarding/farmer", post(submit_farmer))
        .route("/api/onboarding/cooperative", post(submit_cooperative))
        .route("/api/onboarding/buyer", post(submit_buyer))
        .with_state(state)
}
