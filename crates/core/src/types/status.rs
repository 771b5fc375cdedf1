//! Status vocabularies stored as text columns in the platform tables.
//!
//! Each enum maps 1:1 onto the strings the backend stores, with a German
//! display label for the admin UI. Unknown strings are rejected by `FromStr`;
//! row types keep such columns as `String` and parse on demand so a new value
//! introduced by the app never breaks the admin listing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a column value is not part of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownValue {
    /// Vocabulary name (e.g. `user_type`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Define a text-backed vocabulary enum.
///
/// Generates `as_str`, `label`, `ALL`, `Display`, `FromStr` and string-based
/// serde implementations.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal, $label:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The value stored in the backend column.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// German label for the admin UI.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err(UnknownValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

vocabulary! {
    /// Kind of platform account (`users.user_type`).
    UserType("user_type") {
        Owner => "owner", "Tierbesitzer";
        Caretaker => "caretaker", "Betreuer";
        Dienstleister => "dienstleister", "Dienstleister";
        Tierarzt => "tierarzt", "Tierarzt";
        Hundetrainer => "hundetrainer", "Hundetrainer";
        Tierfriseur => "tierfriseur", "Tierfriseur";
        Physiotherapeut => "physiotherapeut", "Physiotherapeut";
        Ernaehrungsberater => "ernaehrungsberater", "Ernährungsberater";
        Tierfotograf => "tierfotograf", "Tierfotograf";
        Sonstige => "sonstige", "Sonstige";
        Admin => "admin", "Administrator";
    }
}

impl UserType {
    /// Specialised service providers counted alongside caretakers.
    pub const SERVICE_PROVIDERS: &'static [Self] = &[
        Self::Tierfotograf,
        Self::Hundetrainer,
        Self::Tierarzt,
        Self::Tierfriseur,
        Self::Physiotherapeut,
        Self::Ernaehrungsberater,
        Self::Sonstige,
    ];

    /// Account types whose public profile needs an approval decision.
    pub const APPROVAL_REQUIRED: &'static [Self] = &[
        Self::Caretaker,
        Self::Dienstleister,
        Self::Tierarzt,
        Self::Hundetrainer,
        Self::Tierfriseur,
        Self::Physiotherapeut,
        Self::Ernaehrungsberater,
        Self::Tierfotograf,
        Self::Sonstige,
    ];

    /// Whether this is one of the specialised service provider types.
    #[must_use]
    pub fn is_service_provider(self) -> bool {
        Self::SERVICE_PROVIDERS.contains(&self)
    }

    /// Label for a raw column value, falling back to the value itself.
    #[must_use]
    pub fn label_for(raw: &str) -> String {
        raw.parse::<Self>()
            .map_or_else(|_| raw.to_string(), |t| t.label().to_string())
    }
}

vocabulary! {
    /// Identity verification state (`users.verification_status`).
    VerificationStatus("verification_status") {
        NotSubmitted => "not_submitted", "Nicht eingereicht";
        Pending => "pending", "Ausstehend";
        Approved => "approved", "Verifiziert";
        Rejected => "rejected", "Abgelehnt";
    }
}

vocabulary! {
    /// Profile approval state (`caretaker_profiles.approval_status`).
    ApprovalStatus("approval_status") {
        NotRequested => "not_requested", "Nicht angefragt";
        Pending => "pending", "Freigabe ausstehend";
        Approved => "approved", "Freigegeben";
        Rejected => "rejected", "Abgelehnt";
    }
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        Self::NotRequested
    }
}

vocabulary! {
    /// Billing state mirrored onto `users.subscription_status`.
    SubscriptionStatus("subscription_status") {
        Free => "free", "Kostenlos";
        Trialing => "trialing", "Testphase";
        Active => "active", "Aktiv";
        Premium => "premium", "Premium";
        PastDue => "past_due", "Zahlung überfällig";
        Canceled => "canceled", "Gekündigt";
    }
}

impl SubscriptionStatus {
    /// Statuses counted as an active paid subscription on the dashboard.
    pub const COUNTED_ACTIVE: &'static [Self] = &[Self::Active, Self::Premium];

    /// Whether the subscriber currently receives paid entitlements.
    #[must_use]
    pub const fn grants_paid_plan(self) -> bool {
        matches!(self, Self::Trialing | Self::Active | Self::Premium)
    }
}

vocabulary! {
    /// Plan tier (`users.plan_type`, `subscriptions.plan_type`).
    PlanType("plan_type") {
        Free => "free", "Free";
        Basic => "basic", "Basic";
        Premium => "premium", "Premium";
    }
}

vocabulary! {
    /// Admin privilege level (`users.admin_role`).
    AdminRole("admin_role") {
        Admin => "admin", "Administrator";
        SuperAdmin => "super_admin", "Super-Admin";
        Moderator => "moderator", "Moderator";
    }
}

vocabulary! {
    /// Placement type of an advertisement format.
    AdType("ad_type") {
        SearchCard => "search_card", "Suchkarte";
        SearchFilter => "search_filter", "Suchfilter";
        SearchCardFilter => "search_card_filter", "Suchkarte & Filter";
        ProfileBanner => "profile_banner", "Profil Banner";
        DashboardBanner => "dashboard_banner", "Dashboard Banner";
    }
}

impl AdType {
    /// Label for a raw column value, falling back to the value itself.
    #[must_use]
    pub fn label_for(raw: &str) -> String {
        raw.parse::<Self>()
            .map_or_else(|_| raw.to_string(), |t| t.label().to_string())
    }
}

vocabulary! {
    /// Moderation state of user generated content (`reviews.moderation_status`).
    ModerationStatus("moderation_status") {
        Pending => "pending", "Ungeprüft";
        Approved => "approved", "Freigegeben";
        Rejected => "rejected", "Entfernt";
        Flagged => "flagged", "Markiert";
    }
}

vocabulary! {
    /// Action a moderator takes on a content item.
    ModerationAction("moderation_action") {
        Approve => "approve", "Freigeben";
        Reject => "reject", "Entfernen";
        Flag => "flag", "Markieren";
    }
}

impl ModerationAction {
    /// Status the content item ends up in.
    #[must_use]
    pub const fn resulting_status(self) -> ModerationStatus {
        match self {
            Self::Approve => ModerationStatus::Approved,
            Self::Reject => ModerationStatus::Rejected,
            Self::Flag => ModerationStatus::Flagged,
        }
    }
}

vocabulary! {
    /// Support ticket state (`support_tickets.status`).
    TicketStatus("ticket_status") {
        Open => "open", "Offen";
        InProgress => "in_progress", "In Bearbeitung";
        Resolved => "resolved", "Gelöst";
        Closed => "closed", "Geschlossen";
    }
}

vocabulary! {
    /// Blog post state (`blog_posts.status`).
    PostStatus("post_status") {
        Draft => "draft", "Entwurf";
        Published => "published", "Veröffentlicht";
        Archived => "archived", "Archiviert";
    }
}

vocabulary! {
    /// Verification request state (`verification_requests.status`).
    VerificationRequestStatus("verification_request_status") {
        Pending => "pending", "Ausstehend";
        InReview => "in_review", "In Prüfung";
        Approved => "approved", "Genehmigt";
        Rejected => "rejected", "Abgelehnt";
    }
}
