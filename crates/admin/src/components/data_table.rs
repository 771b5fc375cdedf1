//! Data table component types.
//!
//! These types define the configuration for the list tables in the admin
//! panel (users, advertisements) plus the page arithmetic behind their
//! pagination footer.

use serde::{Deserialize, Serialize};

use crate::models::{AdFilter, UserFilter};

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Whether the column is visible by default.
    pub default_visible: bool,
}

impl TableColumn {
    /// Create a new column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            default_visible: true,
        }
    }

    /// Set whether the column is visible by default.
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Text input filter.
    Text,
    /// Single-select dropdown.
    Select,
}

/// Filter definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Filter parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Placeholder text (for text inputs).
    pub placeholder: Option<String>,
    /// Available options (for selects).
    pub options: Vec<FilterOption>,
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            placeholder: Some(placeholder.to_string()),
            options: vec![],
        }
    }

    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            placeholder: None,
            options,
        }
    }

    /// Whether this is a select.
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.filter_type == FilterType::Select
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            search_placeholder: "Suchen...".to_string(),
            empty_title: "Keine Einträge gefunden".to_string(),
            empty_description: None,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Columns visible by default.
    #[must_use]
    pub fn visible_columns(&self) -> Vec<&TableColumn> {
        self.columns.iter().filter(|c| c.default_visible).collect()
    }
}

/// Build the users table configuration.
#[must_use]
pub fn users_table_config() -> DataTableConfig {
    DataTableConfig::new("users")
        .column(TableColumn::new("name", "Benutzer"))
        .column(TableColumn::new("type", "Typ"))
        .column(TableColumn::new("location", "Ort"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::new("approval", "Freigabe"))
        .column(TableColumn::new("created", "Registriert"))
        .column(TableColumn::new("phone", "Telefon").visible(false))
        .filter(TableFilter::select(
            "filter",
            "Filter",
            UserFilter::ALL
                .iter()
                .map(|f| FilterOption::new(f.as_str(), f.label()))
                .collect(),
        ))
        .search_placeholder("Nach E-Mail, Name oder Stadt suchen...")
        .empty_state(
            "Keine Benutzer gefunden",
            Some("Passen Sie die Suche oder den Filter an."),
        )
}

/// Build the advertisements table configuration.
#[must_use]
pub fn advertisements_table_config() -> DataTableConfig {
    DataTableConfig::new("advertisements")
        .column(TableColumn::new("title", "Werbung"))
        .column(TableColumn::new("format", "Format"))
        .column(TableColumn::new("period", "Zeitraum"))
        .column(TableColumn::new("stats", "Statistik"))
        .column(TableColumn::new("status", "Status"))
        .filter(TableFilter::select(
            "active",
            "Status",
            AdFilter::ALL
                .iter()
                .map(|f| FilterOption::new(f.as_str(), f.label()))
                .collect(),
        ))
        .search_placeholder("Nach Titel oder Beschreibung suchen...")
        .empty_state("Keine Werbung gefunden", None)
}

// =============================================================================
// Pagination
// =============================================================================

/// Page arithmetic for a list footer. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl Pagination {
    /// Clamp `page` into `1..=total_pages`.
    #[must_use]
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        let mut pagination = Self {
            page: page.max(1),
            per_page,
            total,
        };
        pagination.page = pagination.page.min(pagination.total_pages());
        pagination
    }

    /// Number of pages; an empty list still has one.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Previous page number (saturating at 1).
    #[must_use]
    pub const fn prev_page(&self) -> u64 {
        if self.page > 1 { self.page - 1 } else { 1 }
    }

    /// Next page number (saturating at the last page).
    #[must_use]
    pub const fn next_page(&self) -> u64 {
        if self.has_next() { self.page + 1 } else { self.page }
    }

    /// 1-based index of the first row on this page (0 when empty).
    #[must_use]
    pub const fn first_row(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last row on this page.
    #[must_use]
    pub const fn last_row(&self) -> u64 {
        let end = self.page * self.per_page;
        if end < self.total { end } else { self.total }
    }

    /// "Zeige 21 bis 40 von 95".
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Zeige {} bis {} von {}",
            self.first_row(),
            self.last_row(),
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(2, 20, 95);
        assert_eq!(p.total_pages(), 5);
        assert!(p.has_prev());
        assert!(p.has_next());
        assert_eq!(p.prev_page(), 1);
        assert_eq!(p.next_page(), 3);
        assert_eq!(p.first_row(), 21);
        assert_eq!(p.last_row(), 40);
        assert_eq!(p.summary(), "Zeige 21 bis 40 von 95");
    }

    #[test]
    fn test_pagination_last_page_and_clamping() {
        let p = Pagination::new(9, 20, 95);
        assert_eq!(p.page, 5);
        assert!(!p.has_next());
        assert_eq!(p.next_page(), 5);
        assert_eq!(p.last_row(), 95);

        let p = Pagination::new(0, 20, 95);
        assert_eq!(p.page, 1);
        assert!(!p.has_prev());
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages(), 1);
        assert_eq!(p.first_row(), 0);
        assert_eq!(p.last_row(), 0);
        assert!(!p.has_next());
    }

    #[test]
    fn test_users_table_has_every_filter() {
        let config = users_table_config();
        assert_eq!(config.filters[0].options.len(), UserFilter::ALL.len());
        assert!(config.visible_columns().iter().all(|c| c.key != "phone"));
    }
}
