//! User repository.
//!
//! Reads `users` with the embedded `caretaker_profiles` relation and writes
//! the admin toggles (verification, suspension, admin flag, approval).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use tigube_core::{ApprovalStatus, Email, UserId, UserType, VerificationStatus};

use super::{Page, RepositoryError, page_range};
use crate::models::user::{
    APPROVAL_QUEUE_COLUMNS, AdminProfile, ApprovalInsert, ApprovalUpdate, USER_COLUMNS, User,
    UserRow,
};
use crate::supabase::{Query, SupabaseClient};

/// Rows fetched per request when walking the whole table.
const EXPORT_BATCH: u64 = 1000;

// =============================================================================
// Write Payloads
// =============================================================================

#[derive(Serialize)]
struct VerifyChange {
    verification_status: VerificationStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SuspensionChange {
    is_suspended: bool,
    suspended_at: Option<DateTime<Utc>>,
    suspension_reason: Option<String>,
    suspended_by: Option<UserId>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AdminChange {
    is_admin: bool,
    admin_role: Option<&'static str>,
    updated_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for `users` and `caretaker_profiles`.
pub struct UserRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// One page of users, newest first, with the exact total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, per_page: u64) -> Result<Page<User>, RepositoryError> {
        let (from, to) = page_range(page, per_page);
        let query = Query::select(USER_COLUMNS)
            .order("created_at", false)
            .range(from, to);
        let (rows, total) = self
            .client
            .select_with_count::<UserRow>("users", &query)
            .await?;
        Ok(Page {
            rows: rows.into_iter().map(User::from).collect(),
            total,
        })
    }

    /// Every user, newest first, fetched in batches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if any batch fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.list(page, EXPORT_BATCH).await?;
            let fetched = batch.rows.len() as u64;
            users.extend(batch.rows);
            if fetched < EXPORT_BATCH || users.len() as u64 >= batch.total {
                break;
            }
            page += 1;
        }
        Ok(users)
    }

    /// A single user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<User, RepositoryError> {
        let query = Query::select(USER_COLUMNS).eq("id", id);
        self.client
            .select_single::<UserRow>("users", &query)
            .await
            .map(User::from)
            .map_err(RepositoryError::from_single)
    }

    /// Look a user up by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let query = Query::select(USER_COLUMNS).eq("email", email);
        let row: Option<UserRow> = self.client.maybe_single("users", &query).await?;
        Ok(row.map(User::from))
    }

    /// Mark the user's verification as approved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    #[instrument(skip(self))]
    pub async fn verify(&self, id: UserId) -> Result<(), RepositoryError> {
        let change = VerifyChange {
            verification_status: VerificationStatus::Approved,
            updated_at: Utc::now(),
        };
        self.update_user(id, &change).await
    }

    /// Suspend or reinstate a user.
    ///
    /// Reinstating clears the suspension timestamp, reason and actor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    #[instrument(skip(self, reason))]
    pub async fn set_suspended(
        &self,
        id: UserId,
        suspended: bool,
        reason: Option<String>,
        by: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let change = if suspended {
            SuspensionChange {
                is_suspended: true,
                suspended_at: Some(now),
                suspension_reason: reason.filter(|r| !r.trim().is_empty()),
                suspended_by: by,
                updated_at: now,
            }
        } else {
            SuspensionChange {
                is_suspended: false,
                suspended_at: None,
                suspension_reason: None,
                suspended_by: None,
                updated_at: now,
            }
        };
        self.update_user(id, &change).await
    }

    /// Grant or revoke admin privilege (`admin_role` `admin` or NULL).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    #[instrument(skip(self))]
    pub async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<(), RepositoryError> {
        let change = AdminChange {
            is_admin,
            admin_role: is_admin.then_some("admin"),
            updated_at: Utc::now(),
        };
        self.update_user(id, &change).await
    }

    /// Record an approval decision on `caretaker_profiles`.
    ///
    /// The profile row is created when the user has none yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the update or insert fails.
    #[instrument(skip(self, notes))]
    pub async fn set_approval_status(
        &self,
        id: UserId,
        status: ApprovalStatus,
        notes: Option<String>,
        by: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        let update = ApprovalUpdate::new(status, notes, by, Utc::now());
        let updated: Vec<Value> = self
            .client
            .update("caretaker_profiles", &Query::new().eq("id", id), &update)
            .await?;

        if updated.is_empty() {
            tracing::info!(user_id = %id, "No caretaker profile yet, creating one");
            let insert = ApprovalInsert {
                id,
                update: &update,
            };
            let _: Vec<Value> = self.client.insert("caretaker_profiles", &insert).await?;
        }

        tracing::info!(user_id = %id, status = %status, "Approval status updated");
        Ok(())
    }

    /// Approve a caretaker or service provider.
    ///
    /// # Errors
    ///
    /// See [`Self::set_approval_status`].
    pub async fn approve(&self, id: UserId, by: UserId) -> Result<(), RepositoryError> {
        self.set_approval_status(id, ApprovalStatus::Approved, None, Some(by))
            .await
    }

    /// Reject a caretaker or service provider.
    ///
    /// # Errors
    ///
    /// See [`Self::set_approval_status`].
    pub async fn reject(
        &self,
        id: UserId,
        reason: Option<String>,
        by: UserId,
    ) -> Result<(), RepositoryError> {
        self.set_approval_status(id, ApprovalStatus::Rejected, reason, Some(by))
            .await
    }

    /// Newest users of approval-requiring types whose approval is pending
    /// or rejected.
    ///
    /// The status filter runs locally on the fetched rows, so fewer than
    /// `limit` users may be returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn pending_approvals(&self, limit: u64) -> Result<Vec<User>, RepositoryError> {
        let query = Query::select(APPROVAL_QUEUE_COLUMNS)
            .in_list(
                "user_type",
                UserType::APPROVAL_REQUIRED.iter().map(|t| t.as_str()),
            )
            .order("created_at", false)
            .limit(limit);
        let rows: Vec<UserRow> = self.client.select("users", &query).await?;

        Ok(rows
            .into_iter()
            .map(User::from)
            .filter(|u| {
                matches!(
                    u.approval_status,
                    ApprovalStatus::Pending | ApprovalStatus::Rejected
                )
            })
            .collect())
    }

    /// Profile of an admin; `None` if the user is not an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn admin_profile(&self, id: UserId) -> Result<Option<AdminProfile>, RepositoryError> {
        let query = Query::select("id, email, first_name, last_name, admin_role, created_at")
            .eq("id", id)
            .eq("is_admin", true);
        Ok(self.client.maybe_single("users", &query).await?)
    }

    async fn update_user<B: Serialize + Sync>(
        &self,
        id: UserId,
        change: &B,
    ) -> Result<(), RepositoryError> {
        let updated: Vec<Value> = self
            .client
            .update("users", &Query::new().eq("id", id), change)
            .await?;
        if updated.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
