//! Data models for subscription tracking.
//!
//! Defines the subscription record, its closed frequency/status enums, the
//! draft and patch shapes used by store mutations, and the authenticated
//! user/session types. Field names on the wire are camelCase; serde rename
//! attributes keep the Rust side idiomatic.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Payment method recorded when the user leaves the field empty.
pub const DEFAULT_PAYMENT_METHOD: &str = "Not specified";

/// Suggested category labels. Suggested only — the field is free-form.
pub const SUGGESTED_CATEGORIES: [&str; 11] = [
    "Entertainment",
    "Software",
    "Music",
    "Productivity",
    "Cloud Storage",
    "News & Media",
    "Gaming",
    "Health & Fitness",
    "Education",
    "Business",
    "Other",
];

/// Suggested payment-method labels. Suggested only — the field is free-form.
pub const SUGGESTED_PAYMENT_METHODS: [&str; 7] =
    ["Credit Card", "Debit Card", "PayPal", "Bank Transfer", "Apple Pay", "Google Pay", "Other"];

/// Unique identifier for a subscription record.
///
/// Assigned only by the remote system — a record cannot be referenced
/// locally until the create call returns its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Creates a subscription id after validation.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if the id is empty.
    pub fn new<S: Into<String>>(id: S) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(TrackerError::Validation("subscription id cannot be empty".into()));
        }
        Ok(Self(id))
    }

    /// Returns the inner string reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Billing frequency — the cadence at which a subscription charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Charges every 7 days.
    Weekly,
    /// Charges once per calendar month.
    Monthly,
    /// Charges once per calendar year.
    Yearly,
}

impl Frequency {
    /// Human-readable label for display.
    #[must_use]
    pub fn display(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }
}

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Currently billing; included in cost aggregates.
    Active,
    /// Cancelled by the user; excluded from aggregates.
    Cancelled,
    /// Lapsed; excluded from aggregates.
    Expired,
}

/// A tracked recurring subscription.
///
/// `next_renewal` is derived from `start_date` + `frequency` at create/edit
/// time and is intentionally not recomputed afterward: once the date passes
/// it stays in the past until the user edits the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Server-assigned identifier, immutable.
    pub id: SubscriptionId,
    /// Display name, non-empty.
    pub name: String,
    /// Price per billing period, positive, currency-agnostic.
    pub price: Decimal,
    /// Billing cadence.
    pub frequency: Frequency,
    /// Free-form category label.
    pub category: String,
    /// Free-form payment-method label.
    pub payment_method: String,
    /// Date the subscription started (no time component).
    pub start_date: NaiveDate,
    /// Derived renewal date; never user-entered.
    pub next_renewal: NaiveDate,
    /// Lifecycle status.
    pub status: Status,
    /// Optional free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Subscription fields for a create call — everything but the id.
///
/// `next_renewal` is filled in by the store from `start_date` and
/// `frequency` before the draft goes over the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDraft {
    /// Display name, must be non-empty.
    pub name: String,
    /// Price per billing period, must be positive.
    pub price: Decimal,
    /// Billing cadence.
    pub frequency: Frequency,
    /// Free-form category label.
    pub category: String,
    /// Free-form payment-method label; empty becomes
    /// [`DEFAULT_PAYMENT_METHOD`].
    pub payment_method: String,
    /// Date the subscription started.
    pub start_date: NaiveDate,
    /// Lifecycle status; new records are normally [`Status::Active`].
    pub status: Status,
    /// Optional free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SubscriptionDraft {
    /// Validates the draft before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if the name is empty or the
    /// price is not positive. Category and payment method are free-form and
    /// never rejected.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::Validation("name is required".into()));
        }
        if self.price <= Decimal::ZERO {
            return Err(TrackerError::Validation("price must be a positive number".into()));
        }
        Ok(())
    }

    /// Returns the payment method, falling back to
    /// [`DEFAULT_PAYMENT_METHOD`] when empty.
    #[must_use]
    pub fn payment_method_or_default(&self) -> &str {
        if self.payment_method.trim().is_empty() {
            DEFAULT_PAYMENT_METHOD
        } else {
            &self.payment_method
        }
    }

    /// Builds the wire record for the create call.
    ///
    /// Applies the payment-method default and attaches the derived renewal
    /// date. The id is absent — the server assigns it.
    #[must_use]
    pub fn into_record(self, next_renewal: NaiveDate) -> NewSubscription {
        let payment_method = self.payment_method_or_default().to_owned();
        NewSubscription {
            name: self.name,
            price: self.price,
            frequency: self.frequency,
            category: self.category,
            payment_method,
            start_date: self.start_date,
            next_renewal,
            status: self.status,
            description: self.description,
        }
    }
}

/// Full subscription record minus the id, as sent to the create endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    /// Display name.
    pub name: String,
    /// Price per billing period.
    pub price: Decimal,
    /// Billing cadence.
    pub frequency: Frequency,
    /// Category label.
    pub category: String,
    /// Payment-method label, already defaulted.
    pub payment_method: String,
    /// Start date.
    pub start_date: NaiveDate,
    /// Derived renewal date.
    pub next_renewal: NaiveDate,
    /// Lifecycle status.
    pub status: Status,
    /// Optional free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update for an existing subscription.
///
/// Only set fields are sent; the server returns the full updated record,
/// which replaces the local entry wholesale (the patch is never merged
/// field-by-field locally).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// New billing cadence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    /// New category label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New payment-method label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// New start date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Recomputed renewal date; set by the store when the start date or
    /// frequency changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_renewal: Option<NaiveDate>,
    /// New lifecycle status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SubscriptionPatch {
    /// Validates the set fields before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if a set name is empty or a set
    /// price is not positive.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(TrackerError::Validation("name cannot be empty".into()));
            }
        }
        if let Some(price) = self.price {
            if price <= Decimal::ZERO {
                return Err(TrackerError::Validation("price must be a positive number".into()));
            }
        }
        Ok(())
    }
}

/// Authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned user id.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The authenticated identity for the current session.
///
/// A non-null session implies a persisted token; the credential store keeps
/// the two in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user.
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SubscriptionDraft {
        SubscriptionDraft {
            name: "Netflix".to_owned(),
            price: Decimal::new(1599, 2),
            frequency: Frequency::Monthly,
            category: "Entertainment".to_owned(),
            payment_method: "Credit Card".to_owned(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            status: Status::Active,
            description: None,
        }
    }

    // ========================================================================
    // SubscriptionId Tests
    // ========================================================================

    #[test]
    fn test_subscription_id_valid() {
        let id = SubscriptionId::new("sub-123").unwrap();
        assert_eq!(id.as_str(), "sub-123");
    }

    #[test]
    fn test_subscription_id_empty_rejected() {
        let result = SubscriptionId::new("");
        assert!(matches!(result.unwrap_err(), TrackerError::Validation(_)));
    }

    // ========================================================================
    // Draft Validation Tests
    // ========================================================================

    #[test]
    fn test_draft_valid() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_draft_empty_name_rejected() {
        let mut d = draft();
        d.name = "   ".to_owned();
        assert!(matches!(d.validate().unwrap_err(), TrackerError::Validation(_)));
    }

    #[test]
    fn test_draft_zero_price_rejected() {
        let mut d = draft();
        d.price = Decimal::ZERO;
        assert!(matches!(d.validate().unwrap_err(), TrackerError::Validation(_)));
    }

    #[test]
    fn test_draft_negative_price_rejected() {
        let mut d = draft();
        d.price = Decimal::new(-100, 2);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_draft_payment_method_default() {
        let mut d = draft();
        d.payment_method = String::new();
        assert_eq!(d.payment_method_or_default(), DEFAULT_PAYMENT_METHOD);
    }

    #[test]
    fn test_draft_payment_method_kept_when_set() {
        assert_eq!(draft().payment_method_or_default(), "Credit Card");
    }

    // ========================================================================
    // Patch Validation Tests
    // ========================================================================

    #[test]
    fn test_patch_empty_is_valid() {
        assert!(SubscriptionPatch::default().validate().is_ok());
    }

    #[test]
    fn test_patch_set_empty_name_rejected() {
        let patch = SubscriptionPatch { name: Some(String::new()), ..Default::default() };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_patch_set_nonpositive_price_rejected() {
        let patch = SubscriptionPatch { price: Some(Decimal::ZERO), ..Default::default() };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_patch_skips_unset_fields_on_wire() {
        let patch =
            SubscriptionPatch { category: Some("Music".to_owned()), ..Default::default() };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"category":"Music"}"#);
    }

    // ========================================================================
    // Serialization Tests
    // ========================================================================

    #[test]
    fn test_frequency_serialization() {
        assert_eq!(serde_json::to_string(&Frequency::Weekly).unwrap(), "\"weekly\"");
        assert_eq!(serde_json::to_string(&Frequency::Monthly).unwrap(), "\"monthly\"");
        assert_eq!(serde_json::to_string(&Frequency::Yearly).unwrap(), "\"yearly\"");
    }

    #[test]
    fn test_status_deserialization() {
        let status: Status = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, Status::Cancelled);
    }

    #[test]
    fn test_subscription_wire_field_names() {
        let json = r#"{
            "id": "sub-1",
            "name": "Spotify",
            "price": 9.99,
            "frequency": "monthly",
            "category": "Music",
            "paymentMethod": "PayPal",
            "startDate": "2026-02-01",
            "nextRenewal": "2026-03-01",
            "status": "active"
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.payment_method, "PayPal");
        assert_eq!(sub.next_renewal, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(sub.price, Decimal::new(999, 2));
        assert!(sub.description.is_none());
    }

    #[test]
    fn test_into_record_applies_payment_default_and_renewal() {
        let mut d = draft();
        d.payment_method = String::new();
        let record = d.into_record(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
        assert_eq!(record.payment_method, DEFAULT_PAYMENT_METHOD);
        assert_eq!(record.next_renewal, NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"nextRenewal\":\"2026-02-15\""));
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let json = serde_json::to_string(&draft()).unwrap();
        assert!(json.contains("\"paymentMethod\""));
        assert!(json.contains("\"startDate\""));
        assert!(!json.contains("\"payment_method\""));
    }

    #[test]
    fn test_user_optional_name() {
        let user: User = serde_json::from_str(r#"{"id":"u1","email":"a@b.c"}"#).unwrap();
        assert!(user.name.is_none());
    }
}
