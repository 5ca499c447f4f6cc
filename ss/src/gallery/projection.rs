//! Sorted, filterable gallery list derived from a store snapshot

use std::collections::BTreeSet;
use std::fmt;

use gallerystore::GalleryRecord;
use tracing::debug;

use crate::domain::GalleryItem;

/// Label of the filter that shows every domain
pub const ALL_DOMAINS: &str = "All";

/// Domain filter for the gallery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DomainFilter {
    #[default]
    All,
    Domain(String),
}

impl DomainFilter {
    /// Parse a user-facing label; "All" (any case) selects everything
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case(ALL_DOMAINS) {
            Self::All
        } else {
            Self::Domain(label.to_string())
        }
    }

    pub fn matches(&self, item: &GalleryItem) -> bool {
        match self {
            Self::All => true,
            Self::Domain(domain) => item.fact.domain == *domain,
        }
    }
}

impl fmt::Display for DomainFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "{}", ALL_DOMAINS),
            Self::Domain(domain) => write!(f, "{}", domain),
        }
    }
}

/// The gallery as presented: newest first, with its domain list and filter
///
/// Rebuilt from scratch on every [`refresh`](GalleryView::refresh); nothing
/// is diffed.
#[derive(Debug, Clone, Default)]
pub struct GalleryView {
    items: Vec<GalleryItem>,
    domains: Vec<String>,
    filter: DomainFilter,
}

impl GalleryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a fresh store snapshot
    pub fn refresh(&mut self, snapshot: Vec<GalleryRecord>) {
        debug!(count = snapshot.len(), "GalleryView::refresh: called");
        let mut items: Vec<GalleryItem> = snapshot.into_iter().map(GalleryItem::from).collect();
        // Stable: equal timestamps keep store order
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.domains = items
            .iter()
            .map(|i| i.fact.domain.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.items = items;
    }

    /// Change the filter; a domain that is not present shows nothing
    pub fn set_filter(&mut self, filter: DomainFilter) {
        debug!(%filter, "GalleryView::set_filter: called");
        self.filter = filter;
    }

    pub fn filter(&self) -> &DomainFilter {
        &self.filter
    }

    /// Items passing the current filter, newest first
    pub fn visible(&self) -> Vec<&GalleryItem> {
        self.items.iter().filter(|i| self.filter.matches(i)).collect()
    }

    /// All items, newest first
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    /// Distinct domains, sorted
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Filter choices as shown to the user: "All" then each domain
    pub fn filter_options(&self) -> Vec<String> {
        std::iter::once(ALL_DOMAINS.to_string())
            .chain(self.domains.iter().cloned())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&GalleryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
