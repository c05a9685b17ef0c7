//! Hosted identity client (GoTrue-style auth REST API).
//!
//! Carries only the caller-scoped (anon) key; session tokens are forwarded
//! per request.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::error::IdentityError;

use super::provider::{
    AuthUser, IdentityProvider, OtpType, Session, SignInOutcome, SignUpMethod, SignUpOutcome,
    SignUpRequest,
};

pub struct HostedIdentity {
    http: reqwest::Client,
    base: String,
    anon_key: SecretString,
}

impl HostedIdentity {
    pub fn new(http: reqwest::Client, base: impl Into<String>, anon_key: SecretString) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("apikey", self.anon_key.expose_secret())
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value, IdentityError> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| IdentityError::Http(e.to_string()))?;
        let status = response.status();
        let body: Value = if status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            response
                .json()
                .await
                .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?
        };
        if status.is_success() {
            return Ok(body);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(IdentityError::Unauthorized);
        }
        if status.is_client_error() {
            // The service's 4xx messages are user-safe (invalid credentials,
            // duplicate account, weak password).
            return Err(IdentityError::Rejected(error_message(&body)));
        }
        Err(IdentityError::Http(format!(
            "{status}: {}",
            error_message(&body)
        )))
    }

    fn parse_user(value: &Value) -> Result<AuthUser, IdentityError> {
        serde_json::from_value(value.clone())
            .map_err(|e| IdentityError::InvalidResponse(format!("user object: {e}")))
    }

    fn parse_sign_in(body: Value) -> Result<SignInOutcome, IdentityError> {
        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| IdentityError::InvalidResponse("missing access_token".to_string()))?
            .to_string();
        let user = Self::parse_user(
            body.get("user")
                .ok_or_else(|| IdentityError::InvalidResponse("missing user".to_string()))?,
        )?;
        Ok(SignInOutcome {
            user,
            session: Session { access_token },
        })
    }
}

/// Pull the human-readable message out of a service error body.
fn error_message(body: &Value) -> String {
    for key in ["msg", "message", "error_description", "error"] {
        if let Some(s) = body.get(key).and_then(|v| v.as_str()) {
            return s.to_string();
        }
    }
    "request rejected by identity service".to_string()
}

#[async_trait]
impl IdentityProvider for HostedIdentity {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, IdentityError> {
        let metadata = json!({
            "full_name": request.full_name,
            "phone": request.phone,
        });
        let body = match &request.method {
            SignUpMethod::Email(email) => json!({
                "email": email,
                "password": request.password,
                "data": metadata,
            }),
            SignUpMethod::Phone(phone) => json!({
                "phone": phone,
                "password": request.password,
                "data": metadata,
            }),
        };
        let response = self.send(self.http.post(self.endpoint("signup")).json(&body)).await?;

        // With confirmation pending the service returns the bare user object;
        // otherwise it returns a session wrapping the user.
        if response.get("access_token").is_some() {
            let outcome = Self::parse_sign_in(response)?;
            return Ok(SignUpOutcome {
                user: outcome.user,
                session: Some(outcome.session),
            });
        }
        Ok(SignUpOutcome {
            user: Self::parse_user(&response)?,
            session: None,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, IdentityError> {
        let body = self
            .send(
                self.http
                    .post(self.endpoint("token"))
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        Self::parse_sign_in(body)
    }

    async fn send_otp(&self, phone: &str) -> Result<(), IdentityError> {
        self.send(
            self.http
                .post(self.endpoint("otp"))
                .json(&json!({ "phone": phone, "create_user": false })),
        )
        .await?;
        Ok(())
    }

    async fn verify_otp(
        &self,
        phone: &str,
        token: &str,
        otp_type: OtpType,
    ) -> Result<SignInOutcome, IdentityError> {
        let body = self
            .send(self.http.post(self.endpoint("verify")).json(&json!({
                "phone": phone,
                "token": token,
                "type": otp_type,
            })))
            .await?;
        Self::parse_sign_in(body)
    }

    async fn resolve_token(&self, bearer: &str) -> Result<AuthUser, IdentityError> {
        let body = self
            .send(
                self.http
                    .get(self.endpoint("user"))
                    .header(AUTHORIZATION, format!("Bearer {bearer}")),
            )
            .await?;
        Self::parse_user(&body)
    }

    async fn sign_out(&self, bearer: &str) -> Result<(), IdentityError> {
        self.send(
            self.http
                .post(self.endpoint("logout"))
                .header(AUTHORIZATION, format!("Bearer {bearer}")),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_service_fields() {
        assert_eq!(
            error_message(&json!({"msg": "User already registered"})),
            "User already registered"
        );
        assert_eq!(
            error_message(&json!({"error": "invalid_grant", "error_description": "bad creds"})),
            "bad creds"
        );
        assert_eq!(
            error_message(&json!({})),
            "request rejected by identity service"
        );
    }
}
