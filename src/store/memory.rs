//! In-memory `Store` implementation, for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::onboarding::model::{
    AccountType, BuyerRecord, CooperativeRecord, FarmIds, FarmerRecord, NewFarm,
    OnboardingTracking, RoleRef, UserProfile,
};
use crate::onboarding::state::{OnboardingStatus, OnboardingStep};
use crate::store::Store;

/// A persisted farm row with its store-assigned identifiers.
#[derive(Debug, Clone)]
pub struct StoredFarm {
    pub ids: FarmIds,
    pub farm: NewFarm,
}

#[derive(Default)]
struct Inner {
    account_types: HashMap<AccountType, Uuid>,
    profiles: HashMap<Uuid, UserProfile>,
    tracking: HashMap<Uuid, OnboardingTracking>,
    farmers: HashMap<Uuid, (Uuid, FarmerRecord)>,
    cooperatives: HashMap<Uuid, (Uuid, CooperativeRecord)>,
    buyers: HashMap<Uuid, (Uuid, BuyerRecord)>,
    farms: Vec<StoredFarm>,
    farm_seq: u32,
}

/// In-process store keyed exactly like the hosted one.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// A store with the three account types seeded in the catalog.
    pub fn new() -> Self {
        let mut account_types = HashMap::new();
        for t in AccountType::ALL {
            account_types.insert(t, Uuid::new_v4());
        }
        Self {
            inner: RwLock::new(Inner {
                account_types,
                ..Default::default()
            }),
        }
    }

    /// A store whose account-type catalog is empty (misconfigured service).
    pub fn without_catalog() -> Self {
        Self::default()
    }

    // ── Inspection helpers (not part of the trait) ──────────────────────

    pub async fn profiles(&self) -> Vec<UserProfile> {
        self.inner.read().await.profiles.values().cloned().collect()
    }

    pub async fn farms(&self) -> Vec<StoredFarm> {
        self.inner.read().await.farms.clone()
    }

    pub async fn farmer_row_count(&self) -> usize {
        self.inner.read().await.farmers.len()
    }

    pub async fn tracking_row_count(&self) -> usize {
        self.inner.read().await.tracking.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn account_type_id(
        &self,
        account_type: AccountType,
    ) -> Result<Option<Uuid>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .account_types
            .get(&account_type)
            .copied())
    }

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.inner.read().await.profiles.get(&user_id).cloned())
    }

    async fn insert_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.profiles.contains_key(&profile.id) {
            return Err(StoreError::Query(format!(
                "duplicate user profile for {}",
                profile.id
            )));
        }
        inner.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn set_account_type(
        &self,
        user_id: Uuid,
        account_type: AccountType,
        account_type_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "user_profiles",
                key: user_id.to_string(),
            })?;
        profile.account_type = Some(account_type);
        profile.account_type_id = Some(account_type_id);
        profile.onboarding_status = OnboardingStatus::InProgress;
        profile.onboarding_started_at = Some(started_at);
        Ok(())
    }

    async fn mark_profile_completed(
        &self,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
        role: RoleRef,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "user_profiles",
                key: user_id.to_string(),
            })?;
        profile.onboarding_status = OnboardingStatus::Completed;
        profile.onboarding_completed_at = Some(completed_at);
        match role {
            RoleRef::Farmer(id) => profile.farmer_id = Some(id),
            RoleRef::Cooperative(id) => profile.cooperative_id = Some(id),
            RoleRef::Buyer(id) => profile.buyer_id = Some(id),
        }
        Ok(())
    }

    async fn upsert_tracking(&self, tracking: &OnboardingTracking) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .tracking
            .insert(tracking.user_id, tracking.clone());
        Ok(())
    }

    async fn get_tracking(&self, user_id: Uuid) -> Result<Option<OnboardingTracking>, StoreError> {
        Ok(self.inner.read().await.tracking.get(&user_id).cloned())
    }

    async fn complete_tracking(
        &self,
        user_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let tracking = inner
            .tracking
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "onboarding_tracking",
                key: user_id.to_string(),
            })?;
        tracking.current_step = OnboardingStep::Complete;
        tracking.completed_steps = OnboardingStep::all().to_vec();
        tracking.is_complete = true;
        tracking.completed_at = Some(completed_at);
        Ok(())
    }

    async fn upsert_farmer(&self, record: &FarmerRecord) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner
            .farmers
            .get(&record.user_id)
            .map(|(id, _)| *id)
            .unwrap_or_else(Uuid::new_v4);
        inner.farmers.insert(record.user_id, (id, record.clone()));
        Ok(id)
    }

    async fn upsert_cooperative(&self, record: &CooperativeRecord) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner
            .cooperatives
            .get(&record.user_id)
            .map(|(id, _)| *id)
            .unwrap_or_else(Uuid::new_v4);
        inner
            .cooperatives
            .insert(record.user_id, (id, record.clone()));
        Ok(id)
    }

    async fn upsert_buyer(&self, record: &BuyerRecord) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner
            .buyers
            .get(&record.user_id)
            .map(|(id, _)| *id)
            .unwrap_or_else(Uuid::new_v4);
        inner.buyers.insert(record.user_id, (id, record.clone()));
        Ok(id)
    }

    async fn upsert_primary_farm(&self, farm: &NewFarm) -> Result<FarmIds, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .farms
            .iter_mut()
            .find(|f| f.farm.farmer_id == farm.farmer_id && f.farm.is_primary_farm)
        {
            existing.farm = farm.clone();
            return Ok(existing.ids.clone());
        }
        inner.farm_seq += 1;
        let ids = FarmIds {
            id: Uuid::new_v4(),
            farm_code: format!("FARM-{:04}", inner.farm_seq),
        };
        inner.farms.push(StoredFarm {
            ids: ids.clone(),
            farm: farm.clone(),
        });
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_profile() -> UserProfile {
        UserProfile::new_pending(Uuid::new_v4(), "Jane Doe".into(), None, None)
    }

    #[tokio::test]
    async fn catalog_is_seeded() {
        let store = MemoryStore::new();
        for t in AccountType::ALL {
            assert!(store.account_type_id(t).await.unwrap().is_some());
        }
        let empty = MemoryStore::without_catalog();
        assert!(
            empty
                .account_type_id(AccountType::Farmer)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn profile_insert_is_unique_by_id() {
        let store = MemoryStore::new();
        let profile = pending_profile();
        store.insert_user_profile(&profile).await.unwrap();
        assert!(store.insert_user_profile(&profile).await.is_err());
        assert_eq!(store.profiles().await.len(), 1);
    }

    #[tokio::test]
    async fn primary_farm_upsert_overwrites() {
        let store = MemoryStore::new();
        let farmer_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let draft = crate::onboarding::model::FarmerSubmission {
            farm_name: Some("Green Hills".into()),
            address: Some("12 Valley Rd".into()),
            ..Default::default()
        };
        let (_, farm_draft) = draft.validate(user_id, Utc::now()).unwrap();
        let farm = farm_draft.into_farm(farmer_id, user_id);

        let first = store.upsert_primary_farm(&farm).await.unwrap();
        let second = store.upsert_primary_farm(&farm).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.farm_code, second.farm_code);
        assert_eq!(store.farms().await.len(), 1);
    }

    #[tokio::test]
    async fn complete_tracking_requires_a_row() {
        let store = MemoryStore::new();
        let err = store
            .complete_tracking(Uuid::new_v4(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
