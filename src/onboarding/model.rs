//! Entities and wire payloads for the onboarding flow.
//!
//! Wire payloads use camelCase field names (the JSON the client sends);
//! persisted records use snake_case column names. Field coercion rules
//! (blank → null, numeric parse, list split) are stated once here and
//! shared by every role variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

use super::state::{OnboardingStatus, OnboardingStep, TOTAL_STEPS};

/// The role a user selects during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Farmer,
    Cooperative,
    Buyer,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [Self::Farmer, Self::Cooperative, Self::Buyer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Cooperative => "cooperative",
            Self::Buyer => "buyer",
        }
    }

    pub fn parse(s: &str) -> Option<AccountType> {
        match s {
            "farmer" => Some(Self::Farmer),
            "cooperative" => Some(Self::Cooperative),
            "buyer" => Some(Self::Buyer),
            _ => None,
        }
    }

    /// The role-specific onboarding page for this account type.
    pub fn onboarding_path(&self) -> String {
        format!("/onboard/{}", self.as_str())
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Foreign reference from a user profile to its role row.
///
/// Exactly one of the three role keys is ever set, and it matches the
/// stored account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRef {
    Farmer(Uuid),
    Cooperative(Uuid),
    Buyer(Uuid),
}

impl RoleRef {
    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Farmer(_) => AccountType::Farmer,
            Self::Cooperative(_) => AccountType::Cooperative,
            Self::Buyer(_) => AccountType::Buyer,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Farmer(id) | Self::Cooperative(id) | Self::Buyer(id) => *id,
        }
    }
}

/// The per-user profile row, created at first successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub account_type: Option<AccountType>,
    pub account_type_id: Option<Uuid>,
    pub onboarding_status: OnboardingStatus,
    pub onboarding_started_at: Option<DateTime<Utc>>,
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    pub farmer_id: Option<Uuid>,
    pub cooperative_id: Option<Uuid>,
    pub buyer_id: Option<Uuid>,
}

impl UserProfile {
    /// A minimal pending profile: no account type, no role reference.
    pub fn new_pending(
        id: Uuid,
        full_name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            id,
            full_name,
            email,
            phone,
            account_type: None,
            account_type_id: None,
            onboarding_status: OnboardingStatus::Pending,
            onboarding_started_at: Some(Utc::now()),
            onboarding_completed_at: None,
            farmer_id: None,
            cooperative_id: None,
            buyer_id: None,
        }
    }
}

/// Per-user onboarding tracking row (unique on `user_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingTracking {
    pub user_id: Uuid,
    pub account_type_id: Uuid,
    pub current_step: OnboardingStep,
    pub total_steps: u32,
    pub completed_steps: Vec<OnboardingStep>,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl OnboardingTracking {
    /// Tracking row right after account-type selection.
    pub fn started(user_id: Uuid, account_type_id: Uuid) -> Self {
        Self {
            user_id,
            account_type_id,
            current_step: OnboardingStep::AccountType,
            total_steps: TOTAL_STEPS,
            completed_steps: vec![OnboardingStep::AccountType],
            is_complete: false,
            completed_at: None,
        }
    }
}

// ── Field coercion ──────────────────────────────────────────────────────

/// Blank or absent strings become `None`; surrounding whitespace is trimmed.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric coercion: absent/blank → `None`, otherwise the value must parse.
pub(crate) fn parse_f64(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<f64>, ApiError> {
    match non_blank(value) {
        None => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::Validation(format!("{field} must be a number"))),
    }
}

pub(crate) fn parse_i32(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<i32>, ApiError> {
    match non_blank(value) {
        None => Ok(None),
        Some(s) => s
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ApiError::Validation(format!("{field} must be a whole number"))),
    }
}

/// Split a comma-separated list field: trim entries, drop empties.
pub(crate) fn split_list(value: &Option<String>) -> Vec<String> {
    value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Farmer ──────────────────────────────────────────────────────────────

/// Raw farmer onboarding submission (form body).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FarmerSubmission {
    pub farm_name: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub village: Option<String>,
    pub address: Option<String>,
    pub farm_size_hectares: Option<String>,
    pub primary_crops: Option<String>,
    pub farming_experience_years: Option<String>,
    pub payment_method_type: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub mobile_money_provider: Option<String>,
    pub mobile_money_number: Option<String>,
    pub cryptocurrency_wallet_address: Option<String>,
    pub cryptocurrency_type: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
}

/// Validated farmer profile row, ready to persist (keyed by `user_id`).
#[derive(Debug, Clone, Serialize)]
pub struct FarmerRecord {
    pub user_id: Uuid,
    pub payment_method_type: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub mobile_money_provider: Option<String>,
    pub mobile_money_number: Option<String>,
    pub cryptocurrency_wallet_address: Option<String>,
    pub cryptocurrency_type: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub is_onboarding_complete: bool,
    pub onboarding_completed_at: DateTime<Utc>,
}

/// Validated farm fields awaiting the owning farmer's row id.
#[derive(Debug, Clone)]
pub struct FarmDraft {
    pub farm_name: String,
    pub country_code: Option<String>,
    pub state_code: Option<String>,
    pub city_name: Option<String>,
    pub village: Option<String>,
    pub address: String,
    pub farm_size_hectares: Option<f64>,
    pub primary_crops: Vec<String>,
    pub farming_experience_years: Option<i32>,
}

impl FarmDraft {
    /// Attach the farmer row id and creating user to produce the insert row.
    pub fn into_farm(self, farmer_id: Uuid, created_by: Uuid) -> NewFarm {
        NewFarm {
            farmer_id,
            farm_name: self.farm_name,
            country_code: self.country_code,
            state_code: self.state_code,
            city_name: self.city_name,
            village: self.village,
            address: self.address,
            farm_size_hectares: self.farm_size_hectares,
            primary_crops: self.primary_crops,
            farming_experience_years: self.farming_experience_years,
            geocoding_status: "pending".to_string(),
            is_primary_farm: true,
            is_active: true,
            farm_status: "active".to_string(),
            created_by,
        }
    }
}

/// Farm insert row. The store assigns the id and farm code.
#[derive(Debug, Clone, Serialize)]
pub struct NewFarm {
    pub farmer_id: Uuid,
    pub farm_name: String,
    pub country_code: Option<String>,
    pub state_code: Option<String>,
    pub city_name: Option<String>,
    pub village: Option<String>,
    pub address: String,
    pub farm_size_hectares: Option<f64>,
    pub primary_crops: Vec<String>,
    pub farming_experience_years: Option<i32>,
    pub geocoding_status: String,
    pub is_primary_farm: bool,
    pub is_active: bool,
    pub farm_status: String,
    pub created_by: Uuid,
}

/// Store-assigned identifiers of a persisted farm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmIds {
    pub id: Uuid,
    pub farm_code: String,
}

impl FarmerSubmission {
    /// Validate and coerce. Fails with a 400 naming every missing required
    /// field before anything is written.
    pub fn validate(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(FarmerRecord, FarmDraft), ApiError> {
        let farm_name = non_blank(&self.farm_name);
        let address = non_blank(&self.address);

        let mut missing = Vec::new();
        if farm_name.is_none() {
            missing.push("farmName");
        }
        if address.is_none() {
            missing.push("address");
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(&missing));
        }

        let farm_size = parse_f64("farmSizeHectares", &self.farm_size_hectares)?;
        let experience = parse_i32("farmingExperienceYears", &self.farming_experience_years)?;

        // Only the fields of the chosen payment method are persisted.
        let payment_method = non_blank(&self.payment_method_type);
        let is_bank = payment_method.as_deref() == Some("bank");
        let is_mobile = payment_method.as_deref() == Some("mobile_money");
        let is_crypto = payment_method.as_deref() == Some("cryptocurrency");

        let record = FarmerRecord {
            user_id,
            payment_method_type: payment_method,
            bank_account_number: is_bank
                .then(|| non_blank(&self.bank_account_number))
                .flatten(),
            bank_name: is_bank.then(|| non_blank(&self.bank_name)).flatten(),
            mobile_money_provider: is_mobile
                .then(|| non_blank(&self.mobile_money_provider))
                .flatten(),
            mobile_money_number: is_mobile
                .then(|| non_blank(&self.mobile_money_number))
                .flatten(),
            cryptocurrency_wallet_address: is_crypto
                .then(|| non_blank(&self.cryptocurrency_wallet_address))
                .flatten(),
            cryptocurrency_type: is_crypto
                .then(|| non_blank(&self.cryptocurrency_type))
                .flatten(),
            emergency_contact_name: non_blank(&self.emergency_contact_name),
            emergency_contact_phone: non_blank(&self.emergency_contact_phone),
            emergency_contact_relationship: non_blank(&self.emergency_contact_relationship),
            is_onboarding_complete: true,
            onboarding_completed_at: now,
        };

        let draft = FarmDraft {
            // Both present per the missing-field check above.
            farm_name: farm_name.unwrap_or_default(),
            country_code: non_blank(&self.country),
            state_code: non_blank(&self.state),
            city_name: non_blank(&self.city),
            village: non_blank(&self.village),
            address: address.unwrap_or_default(),
            farm_size_hectares: farm_size,
            primary_crops: split_list(&self.primary_crops),
            farming_experience_years: experience,
        };

        Ok((record, draft))
    }
}

// ── Cooperative ─────────────────────────────────────────────────────────

/// Raw cooperative onboarding submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CooperativeSubmission {
    pub cooperative_name: Option<String>,
    pub registration_number: Option<String>,
    pub cooperative_location: Option<String>,
    pub cooperative_type: Option<String>,
    pub member_count: Option<String>,
    pub primary_products: Option<String>,
    pub year_established: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub contact_person_name: Option<String>,
    pub contact_person_phone: Option<String>,
    pub contact_person_email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
}

/// Validated cooperative profile row (keyed by `user_id`).
#[derive(Debug, Clone, Serialize)]
pub struct CooperativeRecord {
    pub user_id: Uuid,
    pub cooperative_name: String,
    pub registration_number: Option<String>,
    pub cooperative_location: String,
    pub cooperative_type: Option<String>,
    pub member_count: Option<i32>,
    pub primary_products: Vec<String>,
    pub year_established: Option<i32>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub contact_person_name: String,
    pub contact_person_phone: String,
    pub contact_person_email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub is_onboarding_complete: bool,
    pub onboarding_completed_at: DateTime<Utc>,
}

impl CooperativeSubmission {
    pub fn validate(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CooperativeRecord, ApiError> {
        let name = non_blank(&self.cooperative_name);
        let location = non_blank(&self.cooperative_location);
        let contact_name = non_blank(&self.contact_person_name);
        let contact_phone = non_blank(&self.contact_person_phone);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("cooperativeName");
        }
        if location.is_none() {
            missing.push("cooperativeLocation");
        }
        if contact_name.is_none() {
            missing.push("contactPersonName");
        }
        if contact_phone.is_none() {
            missing.push("contactPersonPhone");
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(&missing));
        }

        Ok(CooperativeRecord {
            user_id,
            cooperative_name: name.unwrap_or_default(),
            registration_number: non_blank(&self.registration_number),
            cooperative_location: location.unwrap_or_default(),
            cooperative_type: non_blank(&self.cooperative_type),
            member_count: parse_i32("memberCount", &self.member_count)?,
            primary_products: split_list(&self.primary_products),
            year_established: parse_i32("yearEstablished", &self.year_established)?,
            bank_account_number: non_blank(&self.bank_account_number),
            bank_name: non_blank(&self.bank_name),
            bank_branch: non_blank(&self.bank_branch),
            contact_person_name: contact_name.unwrap_or_default(),
            contact_person_phone: contact_phone.unwrap_or_default(),
            contact_person_email: non_blank(&self.contact_person_email),
            emergency_contact_name: non_blank(&self.emergency_contact_name),
            emergency_contact_phone: non_blank(&self.emergency_contact_phone),
            emergency_contact_relationship: non_blank(&self.emergency_contact_relationship),
            is_onboarding_complete: true,
            onboarding_completed_at: now,
        })
    }
}

// ── Buyer ───────────────────────────────────────────────────────────────

/// Raw buyer onboarding submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuyerSubmission {
    pub company_name: Option<String>,
    pub business_registration_number: Option<String>,
    pub company_location: Option<String>,
    pub business_type: Option<String>,
    pub company_size: Option<String>,
    pub primary_products: Option<String>,
    pub export_destinations: Option<String>,
    pub annual_purchase_volume: Option<String>,
    pub currency: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub contact_person_name: Option<String>,
    pub contact_person_phone: Option<String>,
    pub contact_person_email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
}

/// Validated buyer profile row (keyed by `user_id`).
#[derive(Debug, Clone, Serialize)]
pub struct BuyerRecord {
    pub user_id: Uuid,
    pub company_name: String,
    pub business_registration_number: Option<String>,
    pub company_location: String,
    pub business_type: Option<String>,
    pub company_size: Option<String>,
    pub primary_products: Vec<String>,
    pub export_destinations: Vec<String>,
    pub annual_purchase_volume: Option<f64>,
    pub currency: String,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub contact_person_name: String,
    pub contact_person_phone: String,
    pub contact_person_email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub is_onboarding_complete: bool,
    pub onboarding_completed_at: DateTime<Utc>,
}

impl BuyerSubmission {
    pub fn validate(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<BuyerRecord, ApiError> {
        let name = non_blank(&self.company_name);
        let location = non_blank(&self.company_location);
        let contact_name = non_blank(&self.contact_person_name);
        let contact_phone = non_blank(&self.contact_person_phone);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("companyName");
        }
        if location.is_none() {
            missing.push("companyLocation");
        }
        if contact_name.is_none() {
            missing.push("contactPersonName");
        }
        if contact_phone.is_none() {
            missing.push("contactPersonPhone");
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(&missing));
        }

        Ok(BuyerRecord {
            user_id,
            company_name: name.unwrap_or_default(),
            business_registration_number: non_blank(&self.business_registration_number),
            company_location: location.unwrap_or_default(),
            business_type: non_blank(&self.business_type),
            company_size: non_blank(&self.company_size),
            primary_products: split_list(&self.primary_products),
            export_destinations: split_list(&self.export_destinations),
            annual_purchase_volume: parse_f64(
                "annualPurchaseVolume",
                &self.annual_purchase_volume,
            )?,
            currency: non_blank(&self.currency).unwrap_or_else(|| "USD".to_string()),
            bank_account_number: non_blank(&self.bank_account_number),
            bank_name: non_blank(&self.bank_name),
            bank_branch: non_blank(&self.bank_branch),
            contact_person_name: contact_name.unwrap_or_default(),
            contact_person_phone: contact_phone.unwrap_or_default(),
            contact_person_email: non_blank(&self.contact_person_email),
            emergency_contact_name: non_blank(&self.emergency_contact_name),
            emergency_contact_phone: non_blank(&self.emergency_contact_phone),
            emergency_contact_relationship: non_blank(&self.emergency_contact_relationship),
            is_onboarding_complete: true,
            onboarding_completed_at: now,
        })
    }
}

// ── Submission wrapper ──────────────────────────────────────────────────

/// Role-specific submission payload, tagged by the selected account type.
#[derive(Debug, Clone)]
pub enum RoleSubmission {
    Farmer(FarmerSubmission),
    Cooperative(CooperativeSubmission),
    Buyer(BuyerSubmission),
}

impl RoleSubmission {
    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Farmer(_) => AccountType::Farmer,
            Self::Cooperative(_) => AccountType::Cooperative,
            Self::Buyer(_) => AccountType::Buyer,
        }
    }
}

/// Identifiers of the rows a successful submission created or updated.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub role: RoleRef,
    /// Set for farmer submissions only.
    pub farm: Option<FarmIds>,
}
