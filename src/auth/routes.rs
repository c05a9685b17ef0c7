//! Authentication endpoints — thin passthroughs to the hosted identity
//! service, plus the lazy profile bootstrap that ties identity to
//! onboarding state.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::guard::ensure_profile;
use crate::identity::{
    IdentityProvider, OtpType, SignUpMethod, SignUpRequest,
};
use crate::onboarding::model::UserProfile;
use crate::store::Store;

use super::{bearer_token, require_user};

#[derive(Clone)]
pub struct AuthRouteState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn Store>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody {
    #[serde(default)]
    signup_method: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
}

/// POST /api/auth/signup
async fn signup(
    State(state): State<AuthRouteState>,
    Json(body): Json<SignupBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let method = body.signup_method.as_deref().unwrap_or("email");

    let mut missing = Vec::new();
    if body.full_name.as_deref().unwrap_or("").trim().is_empty() {
        missing.push("fullName");
    }
    if body.password.as_deref().unwrap_or("").is_empty() {
        missing.push("password");
    }
    let method = match method {
        "email" => {
            if body.email.as_deref().unwrap_or("").trim().is_empty() {
                missing.push("email");
            }
            SignUpMethod::Email(body.email.clone().unwrap_or_default())
        }
        "phone" => {
            if body.phone.as_deref().unwrap_or("").trim().is_empty() {
                missing.push("phone");
            }
            SignUpMethod::Phone(body.phone.clone().unwrap_or_default())
        }
        other => {
            return Err(ApiError::Validation(format!(
                "invalid signup method '{other}': must be email or phone"
            )));
        }
    };
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let outcome = state
        .identity
        .sign_up(SignUpRequest {
            method: method.clone(),
            password: body.password.unwrap_or_default(),
            full_name: body.full_name.clone().unwrap_or_default(),
            phone: body.phone.clone(),
        })
        .await?;

    // The profile row can also be created lazily at first guarded
    // navigation, so a failure here only loses the eager path.
    let profile = UserProfile::new_pending(
        outcome.user.id,
        body.full_name.unwrap_or_default(),
        outcome.user.email.clone(),
        outcome.user.phone.clone().or(body.phone),
    );
    if let Err(e) = state.store.insert_user_profile(&profile).await {
        tracing::warn!(user_id = %outcome.user.id, error = %e, "profile insert failed after signup");
    }

    let response = match method {
        SignUpMethod::Email(_) => json!({
            "success": true,
            "message": "Account created successfully! Please check your email to confirm your account.",
            "redirectTo": "/onboard/account-type",
        }),
        SignUpMethod::Phone(_) => match outcome.session {
            // Confirmation disabled server-side: a session comes straight back.
            Some(session) => json!({
                "success": true,
                "message": "Account created successfully!",
                "accessToken": session.access_token,
                "redirectTo": "/onboard/account-type",
            }),
            None => json!({
                "success": true,
                "message": "Please check your phone for verification code",
                "requiresVerification": true,
                "redirectTo": "/onboard/verification",
            }),
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    #[serde(default)]
    login_method: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// POST /api/auth/login
async fn login(
    State(state): State<AuthRouteState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match body.login_method.as_deref().unwrap_or("email") {
        "email" => {
            let mut missing = Vec::new();
            if body.email.as_deref().unwrap_or("").trim().is_empty() {
                missing.push("email");
            }
            if body.password.as_deref().unwrap_or("").is_empty() {
                missing.push("password");
            }
            if !missing.is_empty() {
                return Err(ApiError::missing_fields(&missing));
            }

            let outcome = state
                .identity
                .sign_in_with_password(
                    body.email.as_deref().unwrap_or_default(),
                    body.password.as_deref().unwrap_or_default(),
                )
                .await?;

            // Valid credentials, unconfirmed address: not an auth failure,
            // the client shows a resend-confirmation prompt instead.
            if outcome.user.email_confirmed_at.is_none() {
                return Ok(Json(json!({
                    "success": false,
                    "error": "please confirm your email address before logging in",
                    "requiresConfirmation": true,
                })));
            }

            let redirect_to = match ensure_profile(state.store.as_ref(), &outcome.user).await {
                Ok(profile) if profile.onboarding_status.is_terminal() => "/dashboard",
                Ok(_) => "/onboard/account-type",
                Err(e) => {
                    tracing::warn!(user_id = %outcome.user.id, error = %e, "profile lookup failed at login");
                    "/onboard/account-type"
                }
            };

            Ok(Json(json!({
                "success": true,
                "accessToken": outcome.session.access_token,
                "redirectTo": redirect_to,
            })))
        }
        "phone" => {
            let phone = match body.phone.as_deref().map(str::trim) {
                Some(p) if !p.is_empty() => p.to_string(),
                _ => return Err(ApiError::missing_fields(&["phone"])),
            };
            state.identity.send_otp(&phone).await?;
            Ok(Json(json!({
                "success": true,
                "requiresVerification": true,
                "phone": phone,
                "redirectTo": "/onboard/verification",
            })))
        }
        other => Err(ApiError::Validation(format!(
            "invalid login method '{other}': must be email or phone"
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpBody {
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "type")]
    otp_type: Option<String>,
}

/// POST /api/auth/verify-otp
async fn verify_otp(
    State(state): State<AuthRouteState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut missing = Vec::new();
    if body.phone.as_deref().unwrap_or("").trim().is_empty() {
        missing.push("phone");
    }
    if body.token.as_deref().unwrap_or("").trim().is_empty() {
        missing.push("token");
    }
    if body.otp_type.as_deref().unwrap_or("").trim().is_empty() {
        missing.push("type");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let otp_type = OtpType::parse(body.otp_type.as_deref().unwrap_or_default()).ok_or_else(
        || ApiError::Validation("verification type must be one of: sms, signup, recovery".to_string()),
    )?;

    let outcome = state
        .identity
        .verify_otp(
            body.phone.as_deref().unwrap_or_default(),
            body.token.as_deref().unwrap_or_default(),
            otp_type,
        )
        .await?;

    let redirect_to = match ensure_profile(state.store.as_ref(), &outcome.user).await {
        Ok(profile) if profile.onboarding_status.is_terminal() => "/dashboard",
        Ok(_) => "/onboard/account-type",
        Err(e) => {
            tracing::warn!(user_id = %outcome.user.id, error = %e, "profile lookup failed at verification");
            "/onboard/account-type"
        }
    };

    Ok(Json(json!({
        "success": true,
        "accessToken": outcome.session.access_token,
        "redirectTo": redirect_to,
    })))
}

/// POST /api/auth/logout
async fn logout(
    State(state): State<AuthRouteState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Resolve first so a bad token 401s instead of silently "logging out".
    let user = require_user(state.identity.as_ref(), &headers).await?;
    if let Some(token) = bearer_token(&headers) {
        state.identity.sign_out(token).await?;
    }
    tracing::info!(user_id = %user.id, "user signed out");
    Ok(Json(json!({ "success": true })))
}

pub fn auth_routes(state: AuthRouteState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/logout", post(logout))
        .with_state(state)
}
