//! Platform users as seen by the back-office.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tigube_core::{ApprovalStatus, UserId, UserType, VerificationStatus};

/// Columns read for the user table.
///
/// `totp_secret` and `last_admin_login` are deliberately not selected.
pub const USER_COLUMNS: &str = "id, email, first_name, last_name, user_type, created_at, \
    updated_at, is_suspended, verification_status, subscription_status, profile_completed, \
    is_admin, admin_role, city, plz, street, phone_number, profile_photo_url, show_ads, \
    premium_badge, plan_type, plan_expires_at, max_contact_requests, max_bookings, \
    search_priority, stripe_customer_id, stripe_subscription_id, public_profile_visible, \
    date_of_birth, gender, suspension_reason, suspended_at, suspended_by, \
    caretaker_profiles!caretaker_profiles_id_fkey(approval_status, approval_notes)";

/// Columns read for the pending approval queue.
pub const APPROVAL_QUEUE_COLUMNS: &str = "id, email, first_name, last_name, user_type, \
    created_at, city, plz, \
    caretaker_profiles!caretaker_profiles_id_fkey(approval_status, approval_notes)";

// =============================================================================
// Row Types
// =============================================================================

/// An embedded relation that PostgREST renders as either an object or an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Array form; the first element is used.
    Many(Vec<T>),
    /// Object form.
    One(T),
}

impl<T> OneOrMany<T> {
    /// The first (or only) element.
    pub fn into_first(self) -> Option<T> {
        match self {
            Self::Many(items) => items.into_iter().next(),
            Self::One(item) => Some(item),
        }
    }
}

/// `caretaker_profiles` fields embedded in a user row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovalEmbed {
    #[serde(default)]
    pub approval_status: Option<String>,
    #[serde(default)]
    pub approval_notes: Option<String>,
}

/// Raw `users` row with the embedded approval relation.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    user_type: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    is_suspended: Option<bool>,
    #[serde(default)]
    verification_status: Option<String>,
    #[serde(default)]
    subscription_status: Option<String>,
    #[serde(default)]
    profile_completed: Option<bool>,
    #[serde(default)]
    is_admin: Option<bool>,
    #[serde(default)]
    admin_role: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    plz: Option<String>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    profile_photo_url: Option<String>,
    #[serde(default)]
    show_ads: Option<bool>,
    #[serde(default)]
    premium_badge: Option<bool>,
    #[serde(default)]
    plan_type: Option<String>,
    #[serde(default)]
    plan_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    max_contact_requests: Option<i32>,
    #[serde(default)]
    max_bookings: Option<i32>,
    #[serde(default)]
    search_priority: Option<i32>,
    #[serde(default)]
    stripe_customer_id: Option<String>,
    #[serde(default)]
    stripe_subscription_id: Option<String>,
    #[serde(default)]
    public_profile_visible: Option<bool>,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    suspension_reason: Option<String>,
    #[serde(default)]
    suspended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    suspended_by: Option<UserId>,
    #[serde(default)]
    caretaker_profiles: Option<OneOrMany<ApprovalEmbed>>,
}

// =============================================================================
// Domain Types
// =============================================================================

/// A platform user with the approval relation flattened.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_suspended: bool,
    pub verification_status: Option<String>,
    pub subscription_status: Option<String>,
    pub profile_completed: bool,
    pub is_admin: bool,
    pub admin_role: Option<String>,
    pub city: Option<String>,
    pub plz: Option<String>,
    pub street: Option<String>,
    pub phone_number: Option<String>,
    pub profile_photo_url: Option<String>,
    pub show_ads: bool,
    pub premium_badge: bool,
    pub plan_type: Option<String>,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub max_contact_requests: Option<i32>,
    pub max_bookings: Option<i32>,
    pub search_priority: i32,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub public_profile_visible: bool,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub suspension_reason: Option<String>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub suspended_by: Option<UserId>,
    pub approval_status: ApprovalStatus,
    pub approval_notes: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let approval = row
            .caretaker_profiles
            .and_then(OneOrMany::into_first)
            .unwrap_or_default();
        let approval_status = approval
            .approval_status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            user_type: row.user_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_suspended: row.is_suspended.unwrap_or(false),
            verification_status: row.verification_status,
            subscription_status: row.subscription_status,
            profile_completed: row.profile_completed.unwrap_or(false),
            is_admin: row.is_admin.unwrap_or(false),
            admin_role: row.admin_role,
            city: row.city,
            plz: row.plz,
            street: row.street,
            phone_number: row.phone_number,
            profile_photo_url: row.profile_photo_url,
            show_ads: row.show_ads.unwrap_or(true),
            premium_badge: row.premium_badge.unwrap_or(false),
            plan_type: row.plan_type,
            plan_expires_at: row.plan_expires_at,
            max_contact_requests: row.max_contact_requests,
            max_bookings: row.max_bookings,
            search_priority: row.search_priority.unwrap_or(0),
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            public_profile_visible: row.public_profile_visible.unwrap_or(true),
            date_of_birth: row.date_of_birth,
            gender: row.gender,
            suspension_reason: row.suspension_reason,
            suspended_at: row.suspended_at,
            suspended_by: row.suspended_by,
            approval_status,
            approval_notes: approval.approval_notes,
        }
    }
}

impl User {
    /// "First Last", trimmed; empty when neither is set.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    /// Name for display, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() {
            self.email.clone().unwrap_or_else(|| self.id.to_string())
        } else {
            name
        }
    }

    /// Parsed user type, if known.
    #[must_use]
    pub fn user_type(&self) -> Option<UserType> {
        self.user_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// German label of the user type (raw value for unknown types).
    #[must_use]
    pub fn user_type_label(&self) -> String {
        self.user_type
            .as_deref()
            .map_or_else(String::new, UserType::label_for)
    }

    /// Parsed verification status, if known.
    #[must_use]
    pub fn verification(&self) -> Option<VerificationStatus> {
        self.verification_status
            .as_deref()
            .and_then(|s| s.parse().ok())
    }

    /// Whether the verification was approved.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verification() == Some(VerificationStatus::Approved)
    }

    /// Whether this user belongs to a type that needs approval.
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        self.user_type()
            .is_some_and(|t| UserType::APPROVAL_REQUIRED.contains(&t))
    }

    /// Address parts joined with ", ".
    #[must_use]
    pub fn address(&self) -> String {
        [&self.street, &self.plz, &self.city]
            .into_iter()
            .filter_map(|part| part.as_deref().filter(|s| !s.is_empty()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether any searchable field contains `term` (case-insensitive).
    ///
    /// Searched fields: email, first name, last name, city.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.email, &self.first_name, &self.last_name, &self.city]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Filter selection of the user table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserFilter {
    #[default]
    All,
    Owners,
    Caretakers,
    ServiceProviders,
    Admins,
    Suspended,
    Unverified,
    ApprovalPending,
    ApprovalApproved,
    ApprovalRejected,
    ApprovalNotRequested,
}

impl UserFilter {
    /// Every filter, in menu order.
    pub const ALL: [Self; 11] = [
        Self::All,
        Self::Owners,
        Self::Caretakers,
        Self::ServiceProviders,
        Self::Admins,
        Self::Suspended,
        Self::Unverified,
        Self::ApprovalPending,
        Self::ApprovalApproved,
        Self::ApprovalRejected,
        Self::ApprovalNotRequested,
    ];

    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Owners => "owners",
            Self::Caretakers => "caretakers",
            Self::ServiceProviders => "service_providers",
            Self::Admins => "admins",
            Self::Suspended => "suspended",
            Self::Unverified => "unverified",
            Self::ApprovalPending => "approval_pending",
            Self::ApprovalApproved => "approval_approved",
            Self::ApprovalRejected => "approval_rejected",
            Self::ApprovalNotRequested => "approval_not_requested",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "Alle Benutzer",
            Self::Owners => "Tierbesitzer",
            Self::Caretakers => "Betreuer",
            Self::ServiceProviders => "Dienstleister",
            Self::Admins => "Administratoren",
            Self::Suspended => "Gesperrte",
            Self::Unverified => "Nicht verifiziert",
            Self::ApprovalPending => "Wartet auf Freigabe",
            Self::ApprovalApproved => "Freigegeben",
            Self::ApprovalRejected => "Abgelehnt",
            Self::ApprovalNotRequested => "Noch nicht angefragt",
        }
    }

    /// Parse a query parameter; unknown values select everything.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::ALL.into_iter().find(|f| f.as_str() == v))
            .unwrap_or_default()
    }

    /// Whether `user` passes this filter.
    #[must_use]
    pub fn matches(self, user: &User) -> bool {
        match self {
            Self::All => true,
            Self::Owners => user.user_type() == Some(UserType::Owner),
            Self::Caretakers => user.user_type() == Some(UserType::Caretaker),
            Self::ServiceProviders => user.user_type().is_some_and(UserType::is_service_provider),
            Self::Admins => user.is_admin,
            Self::Suspended => user.is_suspended,
            Self::Unverified => user.verification() == Some(VerificationStatus::NotSubmitted),
            Self::ApprovalPending => user.approval_status == ApprovalStatus::Pending,
            Self::ApprovalApproved => user.approval_status == ApprovalStatus::Approved,
            Self::ApprovalRejected => user.approval_status == ApprovalStatus::Rejected,
            Self::ApprovalNotRequested => user.approval_status == ApprovalStatus::NotRequested,
        }
    }
}

/// Apply search and filter to a loaded page of users.
#[must_use]
pub fn filter_users(users: Vec<User>, filter: UserFilter, search: &str) -> Vec<User> {
    if filter == UserFilter::All && search.trim().is_empty() {
        return users;
    }
    users
        .into_iter()
        .filter(|u| filter.matches(u) && u.matches_search(search))
        .collect()
}

// =============================================================================
// Write Payloads
// =============================================================================

/// Change set written to `caretaker_profiles` for an approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalUpdate {
    pub approval_status: ApprovalStatus,
    pub updated_at: DateTime<Utc>,
    /// Outer `None` leaves the column untouched; `Some(None)` writes NULL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_approved_by: Option<UserId>,
}

impl ApprovalUpdate {
    /// Build the change set for `status`.
    ///
    /// A rejection always overwrites the notes (NULL when none are given);
    /// other decisions only write notes that are provided. Approvals are
    /// stamped with the deciding admin.
    #[must_use]
    pub fn new(
        status: ApprovalStatus,
        notes: Option<String>,
        decided_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        let notes = notes.filter(|n| !n.trim().is_empty());
        let approval_notes = match status {
            ApprovalStatus::Rejected => Some(notes),
            _ => notes.map(Some),
        };
        let (approval_approved_at, approval_approved_by) = if status == ApprovalStatus::Approved {
            (Some(now), decided_by)
        } else {
            (None, None)
        };

        Self {
            approval_status: status,
            updated_at: now,
            approval_notes,
            approval_approved_at,
            approval_approved_by,
        }
    }
}

/// Insert payload for a missing `caretaker_profiles` row.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalInsert<'a> {
    pub id: UserId,
    #[serde(flatten)]
    pub update: &'a ApprovalUpdate,
}

/// The signed-in admin's own profile.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminProfile {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub admin_role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AdminProfile {
    /// Admin role, `admin` when unset.
    #[must_use]
    pub fn role(&self) -> &str {
        self.admin_role.as_deref().unwrap_or("admin")
    }

    /// Greeting name: first name, else email, else "Admin".
    #[must_use]
    pub fn greeting_name(&self) -> String {
        self.first_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Admin".to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(value: serde_json::Value) -> User {
        let row: UserRow = serde_json::from_value(value).unwrap();
        row.into()
    }

    fn base() -> serde_json::Value {
        json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "email": "anna@example.de",
            "first_name": "Anna",
            "last_name": "Schmidt",
            "user_type": "caretaker",
            "city": "Berlin",
            "verification_status": "not_submitted",
            "created_at": "2024-03-01T10:00:00.123456+00:00"
        })
    }

    #[test]
    fn test_embedded_approval_as_array() {
        let mut value = base();
        value["caretaker_profiles"] = json!([{ "approval_status": "pending", "approval_notes": "fehlt" }]);
        let u = user(value);
        assert_eq!(u.approval_status, ApprovalStatus::Pending);
        assert_eq!(u.approval_notes.as_deref(), Some("fehlt"));
    }

    #[test]
    fn test_embedded_approval_as_object() {
        let mut value = base();
        value["caretaker_profiles"] = json!({ "approval_status": "approved" });
        assert_eq!(user(value).approval_status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_missing_approval_defaults_to_not_requested() {
        assert_eq!(user(base()).approval_status, ApprovalStatus::NotRequested);

        let mut value = base();
        value["caretaker_profiles"] = json!([]);
        assert_eq!(user(value).approval_status, ApprovalStatus::NotRequested);

        let mut value = base();
        value["caretaker_profiles"] = serde_json::Value::Null;
        assert_eq!(user(value).approval_status, ApprovalStatus::NotRequested);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let u = user(base());
        assert!(u.matches_search("ANNA"));
        assert!(u.matches_search("berl"));
        assert!(u.matches_search("example.de"));
        assert!(!u.matches_search("hamburg"));
        assert!(u.matches_search("  "));
    }

    #[test]
    fn test_filters() {
        let caretaker = user(base());
        assert!(UserFilter::Caretakers.matches(&caretaker));
        assert!(!UserFilter::Owners.matches(&caretaker));
        assert!(UserFilter::Unverified.matches(&caretaker));
        assert!(UserFilter::ApprovalNotRequested.matches(&caretaker));
        assert!(!UserFilter::Admins.matches(&caretaker));

        let mut value = base();
        value["user_type"] = json!("tierarzt");
        value["is_suspended"] = json!(true);
        let vet = user(value);
        assert!(UserFilter::ServiceProviders.matches(&vet));
        assert!(UserFilter::Suspended.matches(&vet));
    }

    #[test]
    fn test_filter_from_param() {
        assert_eq!(UserFilter::from_param(Some("admins")), UserFilter::Admins);
        assert_eq!(UserFilter::from_param(Some("bogus")), UserFilter::All);
        assert_eq!(UserFilter::from_param(None), UserFilter::All);
    }

    #[test]
    fn test_filter_users() {
        let mut other = base();
        other["id"] = json!("11111111-10b1-426f-9247-bb680e5fe0c8");
        other["first_name"] = json!("Bernd");
        other["city"] = json!("Hamburg");
        other["user_type"] = json!("owner");
        let users = vec![user(base()), user(other)];

        assert_eq!(filter_users(users.clone(), UserFilter::All, "").len(), 2);
        assert_eq!(filter_users(users.clone(), UserFilter::Owners, "").len(), 1);
        let found = filter_users(users, UserFilter::All, "hamburg");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_name(), "Bernd Schmidt");
    }

    #[test]
    fn test_rejection_always_writes_notes() {
        let now = Utc::now();
        let update = ApprovalUpdate::new(ApprovalStatus::Rejected, None, None, now);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["approval_status"], "rejected");
        assert!(json.get("approval_notes").unwrap().is_null());
        assert!(json.get("approval_approved_at").is_none());
    }

    #[test]
    fn test_pending_only_writes_provided_notes() {
        let now = Utc::now();
        let json = serde_json::to_value(ApprovalUpdate::new(ApprovalStatus::Pending, None, None, now)).unwrap();
        assert!(json.get("approval_notes").is_none());

        let json = serde_json::to_value(ApprovalUpdate::new(
            ApprovalStatus::Pending,
            Some("Bitte Nachweis hochladen".to_string()),
            None,
            now,
        ))
        .unwrap();
        assert_eq!(json["approval_notes"], "Bitte Nachweis hochladen");
    }

    #[test]
    fn test_approval_is_stamped() {
        let admin = UserId::random();
        let now = Utc::now();
        let update = ApprovalUpdate::new(ApprovalStatus::Approved, None, Some(admin), now);
        assert_eq!(update.approval_approved_at, Some(now));
        assert_eq!(update.approval_approved_by, Some(admin));

        let insert = ApprovalInsert { id: admin, update: &update };
        let json = serde_json::to_value(&insert).unwrap();
        assert_eq!(json["id"], admin.to_string());
        assert_eq!(json["approval_status"], "approved");
    }

    #[test]
    fn test_admin_profile_defaults() {
        let profile: AdminProfile = serde_json::from_value(json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "email": "chef@tigube.de"
        }))
        .unwrap();
        assert_eq!(profile.role(), "admin");
        assert_eq!(profile.greeting_name(), "chef@tigube.de");
    }
}
