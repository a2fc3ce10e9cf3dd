//! Medium to page lookup built from the mapping table

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use utmdash_common::{MappingEntry, FALLBACK_CATEGORY};

/// The page a medium resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PageInfo {
    /// Display name of the page
    pub page_name: String,
    /// Category the page is grouped under
    pub category: String,
}

/// A medium claimed by more than one mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMedium {
    /// The contested medium
    pub medium: String,
    /// Page names of every claiming entry, in table order; the last one wins
    pub page_names: Vec<String>,
}

/// Immutable medium lookup for one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct MappingLookup {
    pages: HashMap<String, PageInfo>,
    duplicates: Vec<DuplicateMedium>,
}

impl MappingLookup {
    /// Builds the lookup; a medium listed by several entries maps to the last.
    pub fn from_entries(entries: &[MappingEntry]) -> Self {
        let mut pages: HashMap<String, PageInfo> = HashMap::new();
        let mut claims: HashMap<&str, Vec<String>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for entry in entries {
            let info = PageInfo {
                page_name: entry.page_name.clone(),
                category: entry.category_or_default().to_string(),
            };
            for medium in &entry.utm_mediums {
                let claimants = claims.entry(medium.as_str()).or_insert_with(|| {
                    order.push(medium.as_str());
                    Vec::new()
                });
                claimants.push(entry.page_name.clone());
                pages.insert(medium.clone(), info.clone());
            }
        }

        let duplicates = order
            .into_iter()
            .filter_map(|medium| {
                let page_names = claims.remove(medium)?;
                (page_names.len() > 1).then(|| DuplicateMedium {
                    medium: medium.to_string(),
                    page_names,
                })
            })
            .collect();

        debug!("Built mapping lookup with {} mediums", pages.len());
        Self { pages, duplicates }
    }

    /// Resolves a medium, falling back to the medium itself under "Other".
    pub fn resolve(&self, medium: &str) -> PageInfo {
        self.pages.get(medium).cloned().unwrap_or_else(|| PageInfo {
            page_name: medium.to_string(),
            category: FALLBACK_CATEGORY.to_string(),
        })
    }

    /// Whether the medium is claimed by any entry.
    pub fn is_mapped(&self, medium: &str) -> bool {
        self.pages.contains_key(medium)
    }

    /// Mediums claimed by more than one entry, in first-claim order.
    pub fn duplicate_mediums(&self) -> &[DuplicateMedium] {
        &self.duplicates
    }

    /// Number of distinct mapped mediums.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no medium is mapped.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utmdash_common::test_utils::mapping;

    #[test]
    fn test_mapped_medium_resolves_to_entry() {
        let lookup = MappingLookup::from_entries(&[mapping("USS Hub", "USS", &["uss_page_1", "uss_page_2"])]);
        let info = lookup.resolve("uss_page_2");
        assert_eq!(info.page_name, "USS Hub");
        assert_eq!(info.category, "USS");
        assert_eq!(lookup.len(), 2);
        assert!(lookup.is_mapped("uss_page_1"));
    }

    #[test]
    fn test_unknown_medium_falls_back() {
        let lookup = MappingLookup::from_entries(&[]);
        let info = lookup.resolve("unknown_xyz");
        assert_eq!(info.page_name, "unknown_xyz");
        assert_eq!(info.category, "Other");
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_blank_category_becomes_uncategorized() {
        let lookup = MappingLookup::from_entries(&[mapping("Zoo", "  ", &["zoo"])]);
        assert_eq!(lookup.resolve("zoo").category, "Uncategorized");
    }

    #[test]
    fn test_last_entry_wins_on_duplicates() {
        let lookup = MappingLookup::from_entries(&[
            mapping("First Page", "A", &["dup_medium", "solo"]),
            mapping("Second Page", "B", &["dup_medium"]),
            mapping("Third Page", "C", &["dup_medium"]),
        ]);

        let info = lookup.resolve("dup_medium");
        assert_eq!(info.page_name, "Third Page");
        assert_eq!(info.category, "C");

        let duplicates = lookup.duplicate_mediums();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].medium, "dup_medium");
        assert_eq!(duplicates[0].page_names, vec!["First Page", "Second Page", "Third Page"]);
    }
}
