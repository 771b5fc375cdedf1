//! CSV export of the user table.
//!
//! Every data field is wrapped in double quotes with embedded quotes
//! doubled; rows are separated by `\n`.

use chrono::NaiveDate;

use crate::filters::format_date;
use crate::models::User;

/// Header row of the user export.
pub const USER_EXPORT_HEADER: [&str; 8] = [
    "Name",
    "E-Mail",
    "Typ",
    "Status",
    "Verifiziert",
    "Registriert",
    "Stadt",
    "PLZ",
];

/// Media type of the export.
pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Quote one field.
#[must_use]
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// The export row of one user.
#[must_use]
pub fn user_record(user: &User) -> [String; 8] {
    [
        user.full_name(),
        user.email.clone().unwrap_or_default(),
        user.user_type_label(),
        if user.is_suspended { "Gesperrt" } else { "Aktiv" }.to_string(),
        if user.is_verified() { "Ja" } else { "Nein" }.to_string(),
        user.created_at.as_ref().map(format_date).unwrap_or_default(),
        user.city.clone().unwrap_or_default(),
        user.plz.clone().unwrap_or_default(),
    ]
}

/// Render users as CSV.
#[must_use]
pub fn users_csv(users: &[User]) -> String {
    let mut out = USER_EXPORT_HEADER.join(",");
    for user in users {
        out.push('\n');
        let record = user_record(user);
        let quoted: Vec<String> = record.iter().map(|f| quote(f)).collect();
        out.push_str(&quoted.join(","));
    }
    out
}

/// `benutzer-export-YYYY-MM-DD.csv`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("benutzer-export-{}.csv", date.format("%Y-%m-%d"))
}
