use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::model::{Property, PropertyPage};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 6;
pub const MAX_LIMIT: u64 = 100;

/// Listing filter. Empty strings and empty lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub project: Option<String>,
    pub search: Option<String>,
    pub types: Vec<String>,
}

impl PropertyFilter {
    pub fn new(project: Option<String>, search: Option<String>, types: Vec<String>) -> Self {
        Self {
            project: project.filter(|p| !p.is_empty()),
            search: search.filter(|s| !s.is_empty()).map(|s| s.to_lowercase()),
            types: types.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn matches(&self, property: &Property) -> bool {
        let details = &property.details;

        if let Some(project) = &self.project {
            if &details.project != project {
                return false;
            }
        }

        if let Some(search) = &self.search {
            if !details.title.to_lowercase().contains(search.as_str()) {
                return false;
            }
        }

        self.types.is_empty() || details.types.iter().any(|t| self.types.contains(t))
    }
}

/// 1-based page request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1).saturating_mul(self.limit)) as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// `order` ascending, then newest first.
pub fn listing_order(a: &Property, b: &Property) -> Ordering {
    a.details
        .order
        .cmp(&b.details.order)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Filters, sorts and slices an unordered set of properties into a page.
pub fn select_page(
    properties: impl IntoIterator<Item = Property>,
    filter: &PropertyFilter,
    page: PageRequest,
) -> PropertyPage {
    let mut matching: Vec<Property> = properties
        .into_iter()
        .filter(|property| filter.matches(property))
        .collect();
    matching.sort_by(listing_order);

    let total = matching.len() as u64;
    let properties = matching
        .into_iter()
        .skip(page.offset())
        .take(page.limit as usize)
        .collect();

    PropertyPage {
        properties,
        total,
        page: page.page,
        limit: page.limit,
    }
}

/// Sorted distinct `type` values, optionally scoped to one project.
pub fn distinct_types<'a>(
    properties: impl IntoIterator<Item = &'a Property>,
    project: Option<&str>,
) -> Vec<String> {
    properties
        .into_iter()
        .filter(|property| project.map_or(true, |p| property.details.project == p))
        .flat_map(|property| property.details.types.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::model::PropertyDetails;
    use chrono::{Duration, TimeZone, Utc};

    fn property(id: u64, title: &str, types: &[&str], order: i64, age_minutes: i64) -> Property {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let details = PropertyDetails {
            title: title.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            order,
            ..PropertyDetails::default()
        };
        details.into_property(id, now - Duration::minutes(age_minutes))
    }

    fn ids(page: &PropertyPage) -> Vec<u64> {
        page.properties.iter().map(|p| p.property_id).collect()
    }

    #[test]
    fn types_filter_keeps_intersecting_records_and_counts_all() {
        let all = vec![
            property(1, "Villa Rose", &["villa"], 1, 0),
            property(2, "Chalet Cedar", &["chalet", "residential"], 2, 0),
            property(3, "Office", &["commercial"], 3, 0),
            property(4, "Villa Mar", &["villa"], 4, 0),
        ];
        let filter = PropertyFilter::new(None, None, vec!["villa".into(), "chalet".into()]);

        let page = select_page(all, &filter, PageRequest::new(Some(1), Some(2)));

        assert_eq!(ids(&page), vec![1, 2]);
        assert_eq!(page.total, 3);
        assert_eq!(page.limit, 2);
    }

    #[test]
    fn search_is_case_insensitive_substring_on_title() {
        let all = vec![
            property(1, "Sea View Studio", &["interiar"], 0, 0),
            property(2, "Garden Duplex", &["interiar"], 0, 0),
        ];
        let filter = PropertyFilter::new(None, Some("VIEW".into()), vec![]);

        let page = select_page(all, &filter, PageRequest::default());

        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn sorts_by_order_then_newest_first() {
        let all = vec![
            property(1, "a", &[], 2, 0),
            property(2, "b", &[], 1, 30),
            property(3, "c", &[], 1, 5),
        ];

        let page = select_page(all, &PropertyFilter::default(), PageRequest::default());

        assert_eq!(ids(&page), vec![3, 2, 1]);
    }

    #[test]
    fn page_past_the_end_is_empty_but_counts_total() {
        let all = (1..=7).map(|id| property(id, "x", &[], id as i64, 0)).collect::<Vec<_>>();

        let page = select_page(all, &PropertyFilter::default(), PageRequest::new(Some(2), None));
        assert_eq!(ids(&page), vec![7]);

        let all = (1..=7).map(|id| property(id, "x", &[], id as i64, 0)).collect::<Vec<_>>();
        let page = select_page(all, &PropertyFilter::default(), PageRequest::new(Some(5), None));
        assert!(page.properties.is_empty());
        assert_eq!(page.total, 7);
    }

    #[test]
    fn page_request_is_clamped() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(None, Some(10_000)).limit, MAX_LIMIT);
        assert_eq!(PageRequest::default(), PageRequest { page: 1, limit: 6 });
    }

    #[test]
    fn distinct_types_flattens_and_scopes_by_project() {
        let mut other = property(3, "z", &["commercial"], 0, 0);
        other.details.project = "mila two".to_string();
        let all = vec![
            property(1, "x", &["villa", "chalet"], 0, 0),
            property(2, "y", &["villa"], 0, 0),
            other,
        ];

        assert_eq!(distinct_types(&all, None), vec!["chalet", "commercial", "villa"]);
        assert_eq!(distinct_types(&all, Some("mila one")), vec!["chalet", "villa"]);
    }
}
