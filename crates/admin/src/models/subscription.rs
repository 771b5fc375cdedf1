//! Subscription state and the plan entitlements derived from it.
//!
//! The billing provider writes `subscriptions` rows; the app reads plan
//! limits from columns on `users`. Sync copies the former into the latter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tigube_core::{PlanType, SubscriptionStatus, UserId};

/// Columns read from `users` for plan comparison.
pub const USER_PLAN_COLUMNS: &str = "id, email, first_name, last_name, subscription_status, \
    plan_type, plan_expires_at, show_ads, premium_badge, max_contact_requests, max_bookings, \
    search_priority";

/// A billing subscription row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRow {
    pub user_id: UserId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
}

impl SubscriptionRow {
    /// Parsed status; unknown values are treated as canceled.
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(SubscriptionStatus::Canceled)
    }

    /// Parsed plan; unknown values are treated as premium for paid states.
    #[must_use]
    pub fn plan(&self) -> PlanType {
        self.plan_type
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(PlanType::Premium)
    }
}

/// Plan-related columns of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPlan {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub plan_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub show_ads: Option<bool>,
    #[serde(default)]
    pub premium_badge: Option<bool>,
    #[serde(default)]
    pub max_contact_requests: Option<i32>,
    #[serde(default)]
    pub max_bookings: Option<i32>,
    #[serde(default)]
    pub search_priority: Option<i32>,
}

impl UserPlan {
    /// Name for display, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        if name.is_empty() {
            self.email.clone().unwrap_or_else(|| self.id.to_string())
        } else {
            name
        }
    }

    /// Whether the stored status claims a paid plan.
    #[must_use]
    pub fn claims_paid_plan(&self) -> bool {
        self.subscription_status
            .as_deref()
            .and_then(|s| s.parse::<SubscriptionStatus>().ok())
            .is_some_and(SubscriptionStatus::grants_paid_plan)
    }
}

/// Users per stored plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanCounts {
    pub free: usize,
    pub basic: usize,
    pub premium: usize,
    /// Missing or unrecognised `plan_type`.
    pub unknown: usize,
}

impl PlanCounts {
    /// Count `users` by their stored plan.
    #[must_use]
    pub fn tally(users: &[UserPlan]) -> Self {
        users.iter().fold(Self::default(), |mut counts, user| {
            match user.plan_type.as_deref().and_then(|p| p.parse().ok()) {
                Some(PlanType::Free) => counts.free += 1,
                Some(PlanType::Basic) => counts.basic += 1,
                Some(PlanType::Premium) => counts.premium += 1,
                None => counts.unknown += 1,
            }
            counts
        })
    }

    /// Users on a paid plan.
    #[must_use]
    pub const fn paid(&self) -> usize {
        self.basic + self.premium
    }
}

/// Limits and perks granted by a plan.
///
/// `None` limits mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanEntitlements {
    pub plan_type: PlanType,
    pub show_ads: bool,
    pub premium_badge: bool,
    pub max_contact_requests: Option<i32>,
    pub max_bookings: Option<i32>,
    pub search_priority: i32,
}

impl PlanEntitlements {
    /// Entitlements of the free tier.
    pub const FREE: Self = Self {
        plan_type: PlanType::Free,
        show_ads: true,
        premium_badge: false,
        max_contact_requests: Some(3),
        max_bookings: Some(3),
        search_priority: 0,
    };

    /// Entitlements of the basic tier.
    pub const BASIC: Self = Self {
        plan_type: PlanType::Basic,
        show_ads: false,
        premium_badge: false,
        max_contact_requests: Some(20),
        max_bookings: Some(10),
        search_priority: 1,
    };

    /// Entitlements of the premium tier.
    pub const PREMIUM: Self = Self {
        plan_type: PlanType::Premium,
        show_ads: false,
        premium_badge: true,
        max_contact_requests: None,
        max_bookings: None,
        search_priority: 2,
    };

    /// Entitlements of `plan`.
    #[must_use]
    pub const fn for_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Free => Self::FREE,
            PlanType::Basic => Self::BASIC,
            PlanType::Premium => Self::PREMIUM,
        }
    }
}

/// Plan columns a user should carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredPlan {
    pub subscription_status: SubscriptionStatus,
    pub plan_expires_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub entitlements: PlanEntitlements,
}

impl DesiredPlan {
    /// Derive from the billing row; no row (or an unpaid state) means free.
    #[must_use]
    pub fn from_subscription(subscription: Option<&SubscriptionRow>) -> Self {
        match subscription {
            Some(sub) if sub.status().grants_paid_plan() => Self {
                subscription_status: sub.status(),
                plan_expires_at: sub.current_period_end,
                entitlements: PlanEntitlements::for_plan(sub.plan()),
            },
            Some(sub) => Self {
                subscription_status: sub.status(),
                plan_expires_at: None,
                entitlements: PlanEntitlements::FREE,
            },
            None => Self {
                subscription_status: SubscriptionStatus::Free,
                plan_expires_at: None,
                entitlements: PlanEntitlements::FREE,
            },
        }
    }
}

/// Update payload written by the sync.
#[derive(Debug, Clone, Serialize)]
pub struct PlanUpdate<'a> {
    #[serde(flatten)]
    pub desired: &'a DesiredPlan,
    pub updated_at: DateTime<Utc>,
}

/// A user whose columns disagree with their subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDrift {
    pub user: UserPlan,
    pub desired: DesiredPlan,
    /// Names of the differing columns.
    pub fields: Vec<&'static str>,
}

impl PlanDrift {
    /// Compare `user` with the plan derived from `subscription`.
    ///
    /// Returns `None` when the columns already agree.
    #[must_use]
    pub fn detect(user: &UserPlan, subscription: Option<&SubscriptionRow>) -> Option<Self> {
        let desired = DesiredPlan::from_subscription(subscription);
        let e = &desired.entitlements;
        let mut fields = Vec::new();

        if user.subscription_status.as_deref() != Some(desired.subscription_status.as_str()) {
            fields.push("subscription_status");
        }
        if user.plan_type.as_deref() != Some(e.plan_type.as_str()) {
            fields.push("plan_type");
        }
        if user.plan_expires_at != desired.plan_expires_at {
            fields.push("plan_expires_at");
        }
        if user.show_ads != Some(e.show_ads) {
            fields.push("show_ads");
        }
        if user.premium_badge != Some(e.premium_badge) {
            fields.push("premium_badge");
        }
        if user.max_contact_requests != e.max_contact_requests {
            fields.push("max_contact_requests");
        }
        if user.max_bookings != e.max_bookings {
            fields.push("max_bookings");
        }
        if user.search_priority != Some(e.search_priority) {
            fields.push("search_priority");
        }

        (!fields.is_empty()).then(|| Self {
            user: user.clone(),
            desired,
            fields,
        })
    }
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    /// Users compared.
    pub checked: usize,
    /// Users whose columns disagreed.
    pub drifted: usize,
    /// Users updated (always 0 for a dry run).
    pub updated: usize,
    /// Updates that failed.
    pub failed: usize,
    pub drifts: Vec<PlanDrift>,
}

impl SyncReport {
    /// One-line German summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "Probelauf: {} Benutzer geprüft, {} Abweichungen gefunden.",
                self.checked, self.drifted
            )
        } else {
            format!(
                "{} Benutzer geprüft, {} aktualisiert, {} fehlgeschlagen.",
                self.checked, self.updated, self.failed
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_plan(value: serde_json::Value) -> UserPlan {
        let mut base = json!({ "id": "67e55044-10b1-426f-9247-bb680e5fe0c8" });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), value.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn subscription(status: &str, plan: &str) -> SubscriptionRow {
        serde_json::from_value(json!({
            "user_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "status": status,
            "plan_type": plan,
            "current_period_end": "2030-01-01T00:00:00+00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_free_user_in_sync() {
        let user = user_plan(json!({
            "subscription_status": "free",
            "plan_type": "free",
            "show_ads": true,
            "premium_badge": false,
            "max_contact_requests": 3,
            "max_bookings": 3,
            "search_priority": 0
        }));
        assert!(PlanDrift::detect(&user, None).is_none());
    }

    #[test]
    fn test_active_premium_subscription_upgrades() {
        let user = user_plan(json!({ "subscription_status": "free", "plan_type": "free" }));
        let drift = PlanDrift::detect(&user, Some(&subscription("active", "premium"))).unwrap();
        assert_eq!(drift.desired.entitlements, PlanEntitlements::PREMIUM);
        assert_eq!(drift.desired.subscription_status, SubscriptionStatus::Active);
        assert!(drift.fields.contains(&"plan_type"));
        assert!(drift.fields.contains(&"premium_badge"));
        assert!(drift.desired.plan_expires_at.is_some());
    }

    #[test]
    fn test_canceled_subscription_downgrades() {
        let user = user_plan(json!({
            "subscription_status": "premium",
            "plan_type": "premium",
            "premium_badge": true
        }));
        assert!(user.claims_paid_plan());
        let drift = PlanDrift::detect(&user, Some(&subscription("canceled", "premium"))).unwrap();
        assert_eq!(drift.desired.entitlements, PlanEntitlements::FREE);
        assert_eq!(drift.desired.subscription_status, SubscriptionStatus::Canceled);
        assert_eq!(drift.desired.plan_expires_at, None);
    }

    #[test]
    fn test_update_payload_is_flat() {
        let desired = DesiredPlan::from_subscription(Some(&subscription("trialing", "basic")));
        let update = PlanUpdate {
            desired: &desired,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["subscription_status"], "trialing");
        assert_eq!(json["plan_type"], "basic");
        assert_eq!(json["max_bookings"], 10);
        assert_eq!(json["show_ads"], false);
        assert!(json.get("entitlements").is_none());
    }

    #[test]
    fn test_unlimited_limits_serialize_as_null() {
        let json = serde_json::to_value(PlanEntitlements::PREMIUM).unwrap();
        assert!(json["max_contact_requests"].is_null());
    }

    #[test]
    fn test_plan_counts() {
        let users = vec![
            user_plan(json!({ "plan_type": "free" })),
            user_plan(json!({ "plan_type": "premium" })),
            user_plan(json!({ "plan_type": "basic" })),
            user_plan(json!({ "plan_type": "gold" })),
            user_plan(json!({})),
        ];
        let counts = PlanCounts::tally(&users);
        assert_eq!(counts.free, 1);
        assert_eq!(counts.paid(), 2);
        assert_eq!(counts.unknown, 2);
    }

    #[test]
    fn test_report_summary() {
        let report = SyncReport {
            dry_run: true,
            checked: 10,
            drifted: 2,
            ..SyncReport::default()
        };
        assert_eq!(report.summary(), "Probelauf: 10 Benutzer geprüft, 2 Abweichungen gefunden.");
    }
}
