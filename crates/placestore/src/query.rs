//! Sort and filter descriptions for listing places.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Order by name.
    #[default]
    Name,
    /// Order by category.
    Category,
    /// Order by creation time.
    CreatedAt,
    /// Order by last modification time.
    UpdatedAt,
}

impl SortKey {
    /// The column this key sorts on.
    pub(crate) const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Direction of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    pub(crate) const fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Descending => write!(f, "descending"),
        }
    }
}

/// Which places to list and in what order.
///
/// The default lists everything by name, ascending. Whatever the key and
/// direction, places that compare equal stay in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    /// Sort key.
    pub sort_key: SortKey,
    /// Sort direction.
    pub order: SortOrder,
    /// Only include favorites.
    pub favorites_only: bool,
    /// Only include places in exactly this category.
    pub category: Option<String>,
    /// Case-insensitive substring matched against name, category and notes.
    pub search: Option<String>,
    /// Maximum number of places to return.
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Everything, by name ascending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort key.
    #[must_use]
    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort_key = key;
        self
    }

    /// Set the sort direction.
    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Restrict to favorites.
    #[must_use]
    pub fn favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    /// Restrict to one category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to places mentioning `text`.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `ORDER BY` clause for this query. Ties always fall back to `id ASC`.
    pub(crate) fn order_clause(&self) -> String {
        format!(
            "ORDER BY {} {}, id ASC",
            self.sort_key.column(),
            self.order.keyword()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query() {
        let query = ListQuery::new();
        assert_eq!(query.sort_key, SortKey::Name);
        assert_eq!(query.order, SortOrder::Ascending);
        assert!(!query.favorites_only);
        assert!(query.category.is_none());
        assert!(query.search.is_none());
        assert!(query.limit.is_none());
    }

    #[test]
    fn test_order_clause_default() {
        assert_eq!(ListQuery::new().order_clause(), "ORDER BY name ASC, id ASC");
    }

    #[test]
    fn test_order_clause_descending_keeps_insertion_tiebreak() {
        let query = ListQuery::new()
            .sort_by(SortKey::UpdatedAt)
            .order(SortOrder::Descending);
        assert_eq!(query.order_clause(), "ORDER BY updated_at DESC, id ASC");
    }

    #[test]
    fn test_builder() {
        let query = ListQuery::new()
            .sort_by(SortKey::Category)
            .favorites_only(true)
            .category("Market")
            .search("pike")
            .limit(10);

        assert_eq!(query.sort_key, SortKey::Category);
        assert!(query.favorites_only);
        assert_eq!(query.category.as_deref(), Some("Market"));
        assert_eq!(query.search.as_deref(), Some("pike"));
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_sort_key_display() {
        assert_eq!(SortKey::Name.to_string(), "name");
        assert_eq!(SortKey::CreatedAt.to_string(), "created_at");
    }

    #[test]
    fn test_sort_order_display() {
        assert_eq!(SortOrder::Ascending.to_string(), "ascending");
        assert_eq!(SortOrder::Descending.to_string(), "descending");
    }

    #[test]
    fn test_sort_key_serde() {
        let json = serde_json::to_string(&SortKey::UpdatedAt).unwrap();
        assert_eq!(json, "\"updated_at\"");
        let key: SortKey = serde_json::from_str("\"category\"").unwrap();
        assert_eq!(key, SortKey::Category);
    }
}
