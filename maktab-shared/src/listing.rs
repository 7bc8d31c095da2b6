//! Search and sort helpers for admin list views
//!
//! Every admin list view behaves the same way: fetch the full entity list,
//! apply a case-insensitive substring search over a fixed set of display
//! fields, then apply a single (key, direction) sort. Sorting is stable:
//! unequal keys order by direction, equal keys keep their prior order, so
//! re-sorting by the same key and direction never reshuffles ties.

use serde::{Deserialize, Serialize};

/// Sort direction for a list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending (default)
    #[default]
    Asc,

    /// Descending
    Desc,
}

impl SortDirection {
    /// Direction as a query-string value
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Query parameters shared by every admin list view
///
/// The sort key names are per-entity; an unknown key falls back to the
/// entity's default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring search over the entity's display fields
    pub search: Option<String>,

    /// Sort key
    pub sort: Option<String>,

    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
}

/// Checks whether any of the display fields contains the query
///
/// Matching is case-insensitive substring; an empty query matches
/// everything.
pub fn matches_query<S: AsRef<str>>(fields: &[S], query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    fields
        .iter()
        .any(|field| field.as_ref().to_lowercase().contains(&needle))
}

/// Filters a list down to rows whose display fields match the query
pub fn filter_by_query<T, F>(items: Vec<T>, query: Option<&str>, display_fields: F) -> Vec<T>
where
    F: Fn(&T) -> Vec<String>,
{
    match query {
        None => items,
        Some(q) if q.trim().is_empty() => items,
        Some(q) => items
            .into_iter()
            .filter(|item| matches_query(&display_fields(item), q))
            .collect(),
    }
}

/// Sorts a list by one key with the 3-way tie rule
///
/// Unequal keys order by `direction`; equal keys keep their existing
/// relative order (stable).
pub fn sort_stable<T, K, F>(items: &mut [T], key: F, direction: SortDirection)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| match direction {
        SortDirection::Asc => key(a).cmp(&key(b)),
        SortDirection::Desc => key(b).cmp(&key(a)),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        group: u32,
        seq: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Fatima", group: 2, seq: 0 },
            Row { name: "Aisha", group: 1, seq: 1 },
            Row { name: "Maryam", group: 2, seq: 2 },
            Row { name: "Khadija", group: 1, seq: 3 },
        ]
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        assert!(matches_query(&["Fatima", "Dubai"], "fati"));
        assert!(matches_query(&["Fatima", "Dubai"], "DUB"));
        assert!(!matches_query(&["Fatima", "Dubai"], "cairo"));
        assert!(matches_query(&["anything"], "  "));
    }

    #[test]
    fn test_filter_by_query() {
        let filtered = filter_by_query(rows(), Some("ma"), |r| vec![r.name.to_string()]);
        let names: Vec<&str> = filtered.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Fatima", "Maryam"]);
    }

    #[test]
    fn test_sort_directions() {
        let mut asc = rows();
        sort_stable(&mut asc, |r| r.name, SortDirection::Asc);
        assert_eq!(asc[0].name, "Aisha");
        assert_eq!(asc[3].name, "Maryam");

        let mut desc = rows();
        sort_stable(&mut desc, |r| r.name, SortDirection::Desc);
        assert_eq!(desc[0].name, "Maryam");
    }

    #[test]
    fn test_sort_keeps_ties_stable() {
        let mut sorted = rows();
        sort_stable(&mut sorted, |r| r.group, SortDirection::Asc);

        // Within each group, original order (seq) is preserved.
        let seqs: Vec<u32> = sorted.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 3, 0, 2]);

        // Re-sorting by the same key and direction changes nothing.
        let before = sorted.clone();
        sort_stable(&mut sorted, |r| r.group, SortDirection::Asc);
        assert_eq!(sorted, before);
    }

    #[test]
    fn test_desc_keeps_ties_stable() {
        let mut sorted = rows();
        sort_stable(&mut sorted, |r| r.group, SortDirection::Desc);

        let seqs: Vec<u32> = sorted.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 2, 1, 3]);
    }
}
