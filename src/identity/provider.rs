//! Identity provider trait and the types it exchanges.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentityError;

/// An authenticated user as reported by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phone_confirmed_at: Option<DateTime<Utc>>,
    /// Free-form metadata captured at sign-up (e.g. `full_name`).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// Display name from sign-up metadata, falling back to `"User"`.
    pub fn full_name(&self) -> String {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .unwrap_or("User")
            .to_string()
    }
}

/// A session issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
}

/// How the user is registering.
#[derive(Debug, Clone)]
pub enum SignUpMethod {
    Email(String),
    Phone(String),
}

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub method: SignUpMethod,
    pub password: String,
    pub full_name: String,
    /// Contact phone carried as metadata for email sign-ups.
    pub phone: Option<String>,
}

/// Result of a sign-up. The session is absent when the service requires
/// out-of-band confirmation first.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}

#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: AuthUser,
    pub session: Session,
}

/// OTP verification discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Sms,
    Signup,
    Recovery,
}

impl OtpType {
    pub fn parse(s: &str) -> Option<OtpType> {
        match s {
            "sms" => Some(Self::Sms),
            "signup" => Some(Self::Signup),
            "recovery" => Some(Self::Recovery),
            _ => None,
        }
    }
}

/// Hosted identity service operations used by this system.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, IdentityError>;

    /// Send a one-time code to `phone`. Never auto-creates an account.
    async fn send_otp(&self, phone: &str) -> Result<(), IdentityError>;

    async fn verify_otp(
        &self,
        phone: &str,
        token: &str,
        otp_type: OtpType,
    ) -> Result<SignInOutcome, IdentityError>;

    /// Resolve a bearer token to the user it belongs to.
    async fn resolve_token(&self, bearer: &str) -> Result<AuthUser, IdentityError>;

    async fn sign_out(&self, bearer: &str) -> Result<(), IdentityError>;
}
