//! User commands: CSV export and admin rights.

use std::io::Write;
use std::path::Path;

use tigube_admin::csv;
use tigube_admin::db::UserRepository;
use tigube_admin::models::UserFilter;
use tigube_admin::models::user::filter_users;
use tigube_admin::supabase::SupabaseClient;
use tigube_core::Email;

use super::CliError;

/// Export users matching `filter` and `search` as CSV.
///
/// Writes to `output`, or stdout when `None`.
///
/// # Errors
///
/// Returns `CliError` if loading fails or the output cannot be written.
pub async fn export(
    client: &SupabaseClient,
    output: Option<&Path>,
    filter: &str,
    search: &str,
) -> Result<(), CliError> {
    let parsed = UserFilter::from_param(Some(filter));
    if parsed.as_str() != filter {
        tracing::warn!("Unknown filter '{filter}', exporting all users");
    }

    tracing::info!("Loading users...");
    let users = UserRepository::new(client).list_all().await?;
    let total = users.len();
    let users = filter_users(users, parsed, search);
    let body = csv::users_csv(&users);

    match output {
        Some(path) => {
            std::fs::write(path, body)?;
            tracing::info!(
                "Exported {} of {} users to {}",
                users.len(),
                total,
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.write_all(b"\n")?;
            tracing::info!("Exported {} of {} users", users.len(), total);
        }
    }
    Ok(())
}

/// Grant or revoke admin rights by email address.
///
/// # Errors
///
/// Returns `CliError::UserNotFound` when no user has this email.
pub async fn set_admin(client: &SupabaseClient, email: &str, grant: bool) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let repo = UserRepository::new(client);

    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.to_string()))?;

    if user.is_admin == grant {
        tracing::info!(
            "{} is already {}",
            email,
            if grant { "an admin" } else { "not an admin" }
        );
        return Ok(());
    }

    repo.set_admin(user.id, grant).await?;
    if grant {
        tracing::info!("Granted admin rights to {} ({})", email, user.id);
    } else {
        tracing::info!("Revoked admin rights from {} ({})", email, user.id);
    }
    Ok(())
}
