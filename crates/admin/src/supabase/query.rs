//! `PostgREST` query builder.
//!
//! Filters render as `column=op.value` query parameters:
//!
//! ```text
//! select=id,email&user_type=eq.owner&order=created_at.desc&offset=0&limit=50
//! ```

use std::fmt::Display;

use url::form_urlencoded;

/// A `PostgREST` read or filter description.
///
/// Used for `select*`, `count`, `update` and `delete` calls. Flags such as
/// [`Query::count_exact`] and [`Query::single`] become request headers in the
/// client rather than query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
    order: Vec<String>,
    count_exact: bool,
    single: bool,
    head: bool,
}

impl Query {
    /// Empty query (all columns, no filters).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query selecting the given column list.
    ///
    /// The list is passed through verbatim so embedded resources work:
    /// `*, caretaker_profiles!caretaker_profiles_id_fkey(approval_status)`.
    #[must_use]
    pub fn select(columns: &str) -> Self {
        Self::new().columns(columns)
    }

    /// Set the column list.
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        let compact: String = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.params.retain(|(k, _)| k != "select");
        self.params.push(("select".to_string(), compact));
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl Display) -> Self {
        self.params
            .push((column.to_string(), format!("{op}.{value}")));
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    /// `column <> value`
    #[must_use]
    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "neq", value)
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value)
    }

    /// Case-insensitive `LIKE`; `*` is the wildcard.
    #[must_use]
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn not_null(self, column: &str) -> Self {
        self.filter(column, "not.is", "null")
    }

    /// `column IN (values...)`
    #[must_use]
    pub fn in_list<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let rendered = values
            .into_iter()
            .map(|v| quote_value(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", format!("({rendered})"))
    }

    /// Disjunction of raw filter expressions, e.g. `email.ilike.*a*,city.ilike.*a*`.
    #[must_use]
    pub fn or(mut self, expressions: &str) -> Self {
        self.params
            .push(("or".to_string(), format!("({expressions})")));
        self
    }

    /// Append an ordering term.
    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{column}.{direction}"));
        self
    }

    /// Inclusive row range, as in `range(0, 49)` for the first 50 rows.
    #[must_use]
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.params.retain(|(k, _)| k != "offset" && k != "limit");
        self.params.push(("offset".to_string(), from.to_string()));
        self.params
            .push(("limit".to_string(), (to.saturating_sub(from) + 1).to_string()));
        self
    }

    /// Maximum number of rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.params.retain(|(k, _)| k != "limit");
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    /// Ask for the exact total row count (`Prefer: count=exact`).
    #[must_use]
    pub const fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    /// Expect exactly one row (`Accept: application/vnd.pgrst.object+json`).
    #[must_use]
    pub const fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Only fetch headers (used with [`Query::count_exact`]).
    #[must_use]
    pub const fn head(mut self) -> Self {
        self.head = true;
        self
    }

    /// Whether an exact count was requested.
    #[must_use]
    pub const fn wants_count(&self) -> bool {
        self.count_exact
    }

    /// Whether a single object was requested.
    #[must_use]
    pub const fn wants_single(&self) -> bool {
        self.single
    }

    /// Whether only headers were requested.
    #[must_use]
    pub const fn wants_head(&self) -> bool {
        self.head
    }

    /// Query parameters in request order.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = self.params.clone();
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        params
    }

    /// Filter-only parameters (no select, order or paging), for mutations.
    #[must_use]
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "select" | "offset" | "limit"))
            .cloned()
            .collect()
    }

    /// Url-encoded query string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params())
            .finish()
    }
}

/// Quote an `in.(...)` list element when it contains reserved characters.
fn quote_value(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ', '.', ':']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Parse the total from a `Content-Range` header (`0-24/3573`, `*/0`).
///
/// Returns `None` when the total is unknown (`0-24/*`) or the header is malformed.
#[must_use]
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

/// Escape a free-text search term for use inside an `ilike` pattern in an `or` filter.
#[must_use]
pub fn escape_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_filters_and_order() {
        let query = Query::select("id, email ,first_name")
            .eq("user_type", "owner")
            .gte("created_at", "2024-01-01")
            .order("created_at", false)
            .range(50, 99);

        assert_eq!(
            query.params(),
            vec![
                ("select".to_string(), "id,email,first_name".to_string()),
                ("user_type".to_string(), "eq.owner".to_string()),
                ("created_at".to_string(), "gte.2024-01-01".to_string()),
                ("offset".to_string(), "50".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_in_list_quotes_reserved_values() {
        let query = Query::new().in_list("status", ["active", "premium", "a,b"]);
        assert_eq!(
            query.params(),
            vec![(
                "status".to_string(),
                "in.(active,premium,\"a,b\")".to_string()
            )]
        );
    }

    #[test]
    fn test_null_checks() {
        let query = Query::new().is_null("deleted_at").not_null("format_id");
        assert_eq!(
            query.params(),
            vec![
                ("deleted_at".to_string(), "is.null".to_string()),
                ("format_id".to_string(), "not.is.null".to_string()),
            ]
        );
    }

    #[test]
    fn test_or_wraps_in_parentheses() {
        let query = Query::new().or("email.ilike.*kim*,city.ilike.*kim*");
        assert_eq!(
            query.to_query_string(),
            "or=%28email.ilike.*kim*%2Ccity.ilike.*kim*%29"
        );
    }

    #[test]
    fn test_range_replaces_previous_paging() {
        let query = Query::new().limit(10).range(0, 19);
        let params = query.params();
        assert_eq!(params.len(), 2);
        assert!(params.contains(&("limit".to_string(), "20".to_string())));
    }

    #[test]
    fn test_filter_params_drop_select_and_paging() {
        let query = Query::select("*").eq("id", "abc").range(0, 9);
        assert_eq!(
            query.filter_params(),
            vec![("id".to_string(), "eq.abc".to_string())]
        );
    }

    #[test]
    fn test_flags() {
        let query = Query::new().count_exact().head();
        assert!(query.wants_count());
        assert!(query.wants_head());
        assert!(!query.wants_single());
        assert!(Query::new().single().wants_single());
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-24/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_escape_search_term() {
        assert_eq!(escape_search_term("  kim,(huber)* "), "kimhuber");
        assert_eq!(escape_search_term("Berlin"), "Berlin");
    }
}
