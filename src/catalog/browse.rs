//! Client-side search, category filter and pagination over loaded designs

use crate::inventory::Design;

/// Page size for the design library view
pub const LIBRARY_PAGE_SIZE: usize = 16;

/// Category value that disables category filtering
pub const ALL_CATEGORIES: &str = "all";

/// Search and category filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignFilter {
    /// Case-insensitive substring over title or featured pokemon name
    pub search: String,
    /// Exact category, or `all`
    pub category: Option<String>,
}

impl DesignFilter {
    pub fn new(search: Option<&str>, category: Option<&str>) -> Self {
        Self {
            search: search.unwrap_or_default().to_string(),
            category: category
                .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
                .map(str::to_string),
        }
    }

    /// Whether a design passes both filters
    pub fn matches(&self, design: &Design) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = design.title.to_lowercase().contains(&needle)
            || design
                .pokemon_name()
                .is_some_and(|name| name.to_lowercase().contains(&needle));

        let matches_category = match &self.category {
            None => true,
            Some(category) => design.category() == Some(category.as_str()),
        };

        matches_search && matches_category
    }

    /// Designs passing the filter, in catalog order
    pub fn apply<'a>(&self, designs: &'a [Design]) -> Vec<&'a Design> {
        designs.iter().filter(|d| self.matches(d)).collect()
    }
}

/// Number of pages needed for `count` items
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Items on a 1-based page; out-of-range pages are empty
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

/// Distinct categories in first-seen order
pub fn categories(designs: &[Design]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for category in designs.iter().filter_map(Design::category) {
        if !seen.contains(&category) {
            seen.push(category);
        }
    }
    seen
}
