//! Record-store trait — single-row operations against the hosted store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::onboarding::model::{
    AccountType, BuyerRecord, CooperativeRecord, FarmIds, FarmerRecord, NewFarm,
    OnboardingTracking, RoleRef, UserProfile,
};

/// Backend-agnostic store covering the entities the onboarding flow touches.
///
/// Every write is keyed by user id and idempotent (upsert or update by key).
/// There are no multi-row queries and no transactions: each call is an
/// independent round trip, and multi-entity operations are sequenced by the
/// coordinator.
#[async_trait]
pub trait Store: Send + Sync {
    /// Resolve an account-type name to its catalog id.
    async fn account_type_id(
        &self,
        account_type: AccountType,
    ) -> Result<Option<Uuid>, StoreError>;

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    async fn insert_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Record the chosen account type and move the profile to `in_progress`.
    async fn set_account_type(
        &self,
        user_id: Uuid,
        account_type: AccountType,
        account_type_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Mirror completion onto the profile and set the matching role key.
    async fn mark_profile_completed(
        &self,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
        role: RoleRef,
    ) -> Result<(), StoreError>;

    /// Upsert the tracking row (unique on user id; a repeat call overwrites).
    async fn upsert_tracking(&self, tracking: &OnboardingTracking) -> Result<(), StoreError>;

    async fn get_tracking(&self, user_id: Uuid) -> Result<Option<OnboardingTracking>, StoreError>;

    /// Move the tracking row to its terminal state (all four steps done).
    async fn complete_tracking(
        &self,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Upsert the farmer profile (unique on user id). Returns the row id.
    async fn upsert_farmer(&self, record: &FarmerRecord) -> Result<Uuid, StoreError>;

    /// Upsert the cooperative profile (unique on user id). Returns the row id.
    async fn upsert_cooperative(&self, record: &CooperativeRecord) -> Result<Uuid, StoreError>;

    /// Upsert the buyer profile (unique on user id). Returns the row id.
    async fn upsert_buyer(&self, record: &BuyerRecord) -> Result<Uuid, StoreError>;

    /// Upsert the farmer's primary farm (unique on farmer id, so a retried
    /// submission overwrites instead of duplicating). The store assigns the
    /// row id and farm code.
    async fn upsert_primary_farm(&self, farm: &NewFarm) -> Result<FarmIds, StoreError>;
}
