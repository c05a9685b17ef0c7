//! Onboarding coordinator — validates step input, persists it, and advances
//! the tracking state through the fixed four-step sequence.
//!
//! Multi-entity operations are sagas of idempotent upserts issued in a fixed
//! order. There is no transaction underneath: a failure mid-sequence leaves
//! earlier writes committed, and a retry re-runs the whole sequence, which
//! overwrites the already-applied steps with identical values.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::Store;

use super::model::{
    AccountType, OnboardingTracking, RoleRef, RoleSubmission, SubmissionOutcome,
};
use super::state::OnboardingStep;

pub struct OnboardingCoordinator {
    store: Arc<dyn Store>,
}

impl OnboardingCoordinator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record the chosen account type and open the tracking row.
    ///
    /// Returns the next step name, used purely for client navigation.
    /// Fails 404 when the catalog has no entry for the type (external
    /// misconfiguration, not user error) and 400 once onboarding is
    /// completed — the state machine is forward-only and has no reset.
    pub async fn select_account_type(
        &self,
        user_id: Uuid,
        account_type: AccountType,
    ) -> Result<OnboardingStep, ApiError> {
        // Catalog lookup happens before any write.
        let catalog_id = self
            .store
            .account_type_id(account_type)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("account type '{account_type}' is not configured"))
            })?;

        let profile = self
            .store
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| ApiError::Validation("no profile exists for this user".to_string()))?;
        if profile.onboarding_status.is_terminal() {
            return Err(ApiError::Validation(
                "onboarding is already completed".to_string(),
            ));
        }

        let now = Utc::now();
        self.store
            .set_account_type(user_id, account_type, catalog_id, now)
            .await?;
        self.store
            .upsert_tracking(&OnboardingTracking::started(user_id, catalog_id))
            .await?;

        Ok(OnboardingStep::PersonalInfo)
    }

    /// Persist a role profile and close out onboarding.
    ///
    /// All validation happens before any write: the submission must match
    /// the account type recorded on the profile, so exactly one role
    /// foreign key ever gets set and it agrees with `account_type`. The
    /// role row is the authoritative completion signal; the trailing
    /// profile/tracking mirror updates are best-effort (see
    /// [`Self::finish`]).
    pub async fn submit_role_profile(
        &self,
        user_id: Uuid,
        submission: RoleSubmission,
    ) -> Result<SubmissionOutcome, ApiError> {
        let profile = self
            .store
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| ApiError::Validation("no profile exists for this user".to_string()))?;
        match profile.account_type {
            None => {
                return Err(ApiError::Validation(
                    "no account type selected for this user".to_string(),
                ));
            }
            Some(selected) if selected != submission.account_type() => {
                return Err(ApiError::Validation(format!(
                    "account type mismatch: this user is registered as {selected}"
                )));
            }
            Some(_) => {}
        }

        let now = Utc::now();
        match submission {
            RoleSubmission::Farmer(s) => {
                let (record, farm_draft) = s.validate(user_id, now)?;
                let farmer_id = self.store.upsert_farmer(&record).await?;
                // A farm failure fails the call with the farmer row already
                // committed; the retry overwrites both rows by key.
                let farm = self
                    .store
                    .upsert_primary_farm(&farm_draft.into_farm(farmer_id, user_id))
                    .await?;
                let role = RoleRef::Farmer(farmer_id);
                self.finish(user_id, role, now).await;
                Ok(SubmissionOutcome {
                    role,
                    farm: Some(farm),
                })
            }
            RoleSubmission::Cooperative(s) => {
                let record = s.validate(user_id, now)?;
                let id = self.store.upsert_cooperative(&record).await?;
                let role = RoleRef::Cooperative(id);
                self.finish(user_id, role, now).await;
                Ok(SubmissionOutcome { role, farm: None })
            }
            RoleSubmission::Buyer(s) => {
                let record = s.validate(user_id, now)?;
                let id = self.store.upsert_buyer(&record).await?;
                let role = RoleRef::Buyer(id);
                self.finish(user_id, role, now).await;
                Ok(SubmissionOutcome { role, farm: None })
            }
        }
    }

    /// Trailing mirror updates on the user profile and tracking row.
    ///
    /// Failures here are recorded for operators and do not fail the
    /// operation; the route guard re-derives navigation from whatever
    /// state actually persisted.
    async fn finish(&self, user_id: Uuid, role: RoleRef, now: DateTime<Utc>) {
        if let Err(e) = self.store.mark_profile_completed(user_id, now, role).await {
            tracing::warn!(
                %user_id,
                account_type = %role.account_type(),
                error = %e,
                "profile completion mirror update failed after role write"
            );
        }
        if let Err(e) = self.store.complete_tracking(user_id, now).await {
            tracing::warn!(
                %user_id,
                error = %e,
                "onboarding tracking update failed after role write"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{BuyerSubmission, FarmerSubmission, UserProfile};
    use crate::onboarding::state::OnboardingStatus;
    use crate::store::MemoryStore;

    fn coordinator_with_store() -> (OnboardingCoordinator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            OnboardingCoordinator::new(Arc::clone(&store) as Arc<dyn Store>),
            store,
        )
    }

    async fn seed_pending(store: &MemoryStore) -> Uuid {
        let profile =
            UserProfile::new_pending(Uuid::new_v4(), "Jane Doe".to_string(), None, None);
        store.insert_user_profile(&profile).await.unwrap();
        profile.id
    }

    fn farmer_submission() -> RoleSubmission {
        RoleSubmission::Farmer(FarmerSubmission {
            farm_name: Some("Green Hills".to_string()),
            address: Some("12 Valley Rd".to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn select_sets_account_type_and_tracking() {
        for account_type in AccountType::ALL {
            let (coordinator, store) = coordinator_with_store();
            let user_id = seed_pending(&store).await;

            let next = coordinator
                .select_account_type(user_id, account_type)
                .await
                .unwrap();
            assert_eq!(next, OnboardingStep::PersonalInfo);

            let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
            assert_eq!(profile.onboarding_status, OnboardingStatus::InProgress);
            assert_eq!(profile.account_type, Some(account_type));
            assert!(profile.account_type_id.is_some());

            let tracking = store.get_tracking(user_id).await.unwrap().unwrap();
            assert_eq!(tracking.current_step, OnboardingStep::AccountType);
            assert!(!tracking.is_complete);
        }
    }

    #[tokio::test]
    async fn select_is_idempotent() {
        let (coordinator, store) = coordinator_with_store();
        let user_id = seed_pending(&store).await;

        coordinator
            .select_account_type(user_id, AccountType::Farmer)
            .await
            .unwrap();
        coordinator
            .select_account_type(user_id, AccountType::Farmer)
            .await
            .unwrap();

        assert_eq!(store.profiles().await.len(), 1);
        assert_eq!(store.tracking_row_count().await, 1);
        let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.onboarding_status, OnboardingStatus::InProgress);
        assert_eq!(profile.account_type, Some(AccountType::Farmer));
    }

    #[tokio::test]
    async fn missing_catalog_entry_fails_before_any_write() {
        let store = Arc::new(MemoryStore::without_catalog());
        let coordinator = OnboardingCoordinator::new(Arc::clone(&store) as Arc<dyn Store>);
        let user_id = seed_pending(&store).await;

        let err = coordinator
            .select_account_type(user_id, AccountType::Buyer)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.onboarding_status, OnboardingStatus::Pending);
        assert_eq!(profile.account_type, None);
        assert_eq!(store.tracking_row_count().await, 0);
    }

    #[tokio::test]
    async fn farmer_submission_completes_onboarding() {
        let (coordinator, store) = coordinator_with_store();
        let user_id = seed_pending(&store).await;
        coordinator
            .select_account_type(user_id, AccountType::Farmer)
            .await
            .unwrap();

        let outcome = coordinator
            .submit_role_profile(user_id, farmer_submission())
            .await
            .unwrap();
        let farm = outcome.farm.unwrap();
        assert_eq!(outcome.role.account_type(), AccountType::Farmer);

        let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.onboarding_status, OnboardingStatus::Completed);
        assert_eq!(profile.farmer_id, Some(outcome.role.id()));
        assert!(profile.onboarding_completed_at.is_some());

        let tracking = store.get_tracking(user_id).await.unwrap().unwrap();
        assert!(tracking.is_complete);
        assert_eq!(tracking.current_step, OnboardingStep::Complete);
        assert_eq!(tracking.completed_steps.len(), 4);

        let farms = store.farms().await;
        assert_eq!(farms.len(), 1);
        assert_eq!(farms[0].ids.id, farm.id);
        assert!(farms[0].farm.is_primary_farm);
        assert_eq!(farms[0].farm.created_by, user_id);
    }

    #[tokio::test]
    async fn duplicate_submission_collapses_to_one_row_set() {
        let (coordinator, store) = coordinator_with_store();
        let user_id = seed_pending(&store).await;
        coordinator
            .select_account_type(user_id, AccountType::Farmer)
            .await
            .unwrap();

        let first = coordinator
            .submit_role_profile(user_id, farmer_submission())
            .await
            .unwrap();
        let second = coordinator
            .submit_role_profile(user_id, farmer_submission())
            .await
            .unwrap();

        assert_eq!(first.role.id(), second.role.id());
        assert_eq!(store.farmer_row_count().await, 1);
        assert_eq!(store.farms().await.len(), 1);
    }

    #[tokio::test]
    async fn validation_failure_writes_nothing() {
        let (coordinator, store) = coordinator_with_store();
        let user_id = seed_pending(&store).await;
        coordinator
            .select_account_type(user_id, AccountType::Farmer)
            .await
            .unwrap();

        let err = coordinator
            .submit_role_profile(user_id, RoleSubmission::Farmer(FarmerSubmission::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert_eq!(store.farmer_row_count().await, 0);
        assert!(store.farms().await.is_empty());
        let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.onboarding_status, OnboardingStatus::InProgress);
    }

    #[tokio::test]
    async fn submission_must_match_selected_account_type() {
        let (coordinator, store) = coordinator_with_store();
        let user_id = seed_pending(&store).await;
        coordinator
            .select_account_type(user_id, AccountType::Farmer)
            .await
            .unwrap();

        let err = coordinator
            .submit_role_profile(
                user_id,
                RoleSubmission::Buyer(BuyerSubmission {
                    company_name: Some("Export Co".to_string()),
                    company_location: Some("Mombasa".to_string()),
                    contact_person_name: Some("Ben".to_string()),
                    contact_person_phone: Some("+254722222222".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // The farmer registration is untouched and no buyer key was set.
        let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.onboarding_status, OnboardingStatus::InProgress);
        assert_eq!(profile.account_type, Some(AccountType::Farmer));
        assert_eq!(profile.buyer_id, None);
        assert_eq!(profile.farmer_id, None);
    }

    #[tokio::test]
    async fn submission_without_selection_is_rejected() {
        let (coordinator, store) = coordinator_with_store();
        let user_id = seed_pending(&store).await;

        let err = coordinator
            .submit_role_profile(user_id, farmer_submission())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert_eq!(store.farmer_row_count().await, 0);
        let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.onboarding_status, OnboardingStatus::Pending);
    }

    #[tokio::test]
    async fn completed_user_cannot_reselect_account_type() {
        let (coordinator, store) = coordinator_with_store();
        let user_id = seed_pending(&store).await;
        coordinator
            .select_account_type(user_id, AccountType::Buyer)
            .await
            .unwrap();
        coordinator
            .submit_role_profile(
                user_id,
                RoleSubmission::Buyer(BuyerSubmission {
                    company_name: Some("Export Co".to_string()),
                    company_location: Some("Mombasa".to_string()),
                    contact_person_name: Some("Ben".to_string()),
                    contact_person_phone: Some("+254722222222".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();

        let err = coordinator
            .select_account_type(user_id, AccountType::Farmer)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // No silent regression: still completed, still a buyer.
        let profile = store.get_user_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.onboarding_status, OnboardingStatus::Completed);
        assert_eq!(profile.account_type, Some(AccountType::Buyer));
    }
}
