//! Hosted record store client (PostgREST-style REST API).
//!
//! Uses the privileged service-role key; only server-side request handlers
//! ever hold this client. Upserts rely on the store's unique keys
//! (`user_id` on tracking and role tables, `farmer_id` on the primary-farm
//! partial index) so every write is idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::error::StoreError;
use crate::onboarding::model::{
    AccountType, BuyerRecord, CooperativeRecord, FarmIds, FarmerRecord, NewFarm,
    OnboardingTracking, RoleRef, UserProfile,
};
use crate::onboarding::state::OnboardingStep;
use crate::store::Store;

#[derive(Debug, Deserialize)]
struct RowId {
    id: Uuid,
}

pub struct RestStore {
    http: reqwest::Client,
    base: String,
    service_role_key: SecretString,
}

impl RestStore {
    pub fn new(
        http: reqwest::Client,
        base: impl Into<String>,
        service_role_key: SecretString,
    ) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            service_role_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.service_role_key.expose_secret();
        builder
            .header("apikey", key)
            .header(AUTHORIZATION, format!("Bearer {key}"))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Query(format!("{status}: {body}")));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Send a write whose response body is irrelevant.
    async fn send_unit(&self, builder: reqwest::RequestBuilder) -> Result<(), StoreError> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Query(format!("{status}: {body}")));
        }
        Ok(())
    }

    /// Upsert a row keyed by `conflict_column` and return its id.
    async fn upsert_returning_id<B: serde::Serialize>(
        &self,
        table: &str,
        conflict_column: &str,
        body: &B,
    ) -> Result<Uuid, StoreError> {
        let rows: Vec<RowId> = self
            .send(
                self.http
                    .post(self.table_url(table))
                    .query(&[("on_conflict", conflict_column)])
                    .header(
                        "Prefer",
                        "resolution=merge-duplicates,return=representation",
                    )
                    .json(body),
            )
            .await?;
        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::Query(format!("{table} upsert returned no row")))
    }
}

#[async_trait]
impl Store for RestStore {
    async fn account_type_id(
        &self,
        account_type: AccountType,
    ) -> Result<Option<Uuid>, StoreError> {
        let rows: Vec<RowId> = self
            .send(self.http.get(self.table_url("account_types")).query(&[
                ("name", format!("eq.{account_type}")),
                ("select", "id".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let rows: Vec<UserProfile> = self
            .send(self.http.get(self.table_url("user_profiles")).query(&[
                ("id", format!("eq.{user_id}")),
                ("select", "*".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.send_unit(self.http.post(self.table_url("user_profiles")).json(profile))
            .await
    }

    async fn set_account_type(
        &self,
        user_id: Uuid,
        account_type: AccountType,
        account_type_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.send_unit(
            self.http
                .patch(self.table_url("user_profiles"))
                .query(&[("id", format!("eq.{user_id}"))])
                .json(&json!({
                    "account_type": account_type,
                    "account_type_id": account_type_id,
                    "onboarding_status": "in_progress",
                    "onboarding_started_at": started_at,
                })),
        )
        .await
    }

    async fn mark_profile_completed(
        &self,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
        role: RoleRef,
    ) -> Result<(), StoreError> {
        let role_column = match role {
            RoleRef::Farmer(_) => "farmer_id",
            RoleRef::Cooperative(_) => "cooperative_id",
            RoleRef::Buyer(_) => "buyer_id",
        };
        let mut changes = json!({
            "onboarding_status": "completed",
            "onboarding_completed_at": completed_at,
        });
        changes[role_column] = json!(role.id());
        self.send_unit(
            self.http
                .patch(self.table_url("user_profiles"))
                .query(&[("id", format!("eq.{user_id}"))])
                .json(&changes),
        )
        .await
    }

    async fn upsert_tracking(&self, tracking: &OnboardingTracking) -> Result<(), StoreError> {
        self.send_unit(
            self.http
                .post(self.table_url("onboarding_tracking"))
                .query(&[("on_conflict", "user_id")])
                .header("Prefer", "resolution=merge-duplicates")
                .json(tracking),
        )
        .await
    }

    async fn get_tracking(&self, user_id: Uuid) -> Result<Option<OnboardingTracking>, StoreError> {
        let rows: Vec<OnboardingTracking> = self
            .send(
                self.http
                    .get(self.table_url("onboarding_tracking"))
                    .query(&[
                        ("user_id", format!("eq.{user_id}")),
                        ("select", "*".to_string()),
                    ]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn complete_tracking(
        &self,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.send_unit(
            self.http
                .patch(self.table_url("onboarding_tracking"))
                .query(&[("user_id", format!("eq.{user_id}"))])
                .json(&json!({
                    "current_step": OnboardingStep::Complete,
                    "completed_steps": OnboardingStep::all(),
                    "is_complete": true,
                    "completed_at": completed_at,
                })),
        )
        .await
    }

    async fn upsert_farmer(&self, record: &FarmerRecord) -> Result<Uuid, StoreError> {
        self.upsert_returning_id("farmers", "user_id", record).await
    }

    async fn upsert_cooperative(&self, record: &CooperativeRecord) -> Result<Uuid, StoreError> {
        self.upsert_returning_id("cooperatives", "user_id", record)
            .await
    }

    async fn upsert_buyer(&self, record: &BuyerRecord) -> Result<Uuid, StoreError> {
        self.upsert_returning_id("buyers", "user_id", record).await
    }

    async fn upsert_primary_farm(&self, farm: &NewFarm) -> Result<FarmIds, StoreError> {
        let rows: Vec<FarmIds> = self
            .send(
                self.http
                    .post(self.table_url("farms"))
                    .query(&[("on_conflict", "farmer_id")])
                    .header(
                        "Prefer",
                        "resolution=merge-duplicates,return=representation",
                    )
                    .json(farm),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Query("farms upsert returned no row".to_string()))
    }
}
