//! Filtering, sorting and pagination over in-memory record collections
use std::cmp::Ordering;

use chrono::{NaiveDate, Utc};

use crate::store::Versioned;
use crate::types::TimeStamp;

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    Date(i64), // unix millis
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A record that can be searched, filtered and sorted in a list view.
pub trait Listable {
    /// Fields matched by the free text search.
    fn search_text(&self) -> Vec<&str>;
    fn status_label(&self) -> Option<&str>;
    fn primary_date(&self) -> Option<&TimeStamp<Utc>>;
    fn sort_key(&self, field: &str) -> Option<SortKey>;

    /// Value of a named field for the extra equality filter.
    fn extra_field(&self, _field: &str) -> Option<String> {
        None
    }
}

/// All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search_term: Option<String>,
    pub status: Option<String>,
    pub date: Option<NaiveDate>,
    pub extra: Option<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_search_term(mut self, term: &str) -> Self {
        self.search_term = Some(term.to_string());
        self
    }
    pub fn set_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }
    pub fn set_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
    pub fn set_extra(mut self, field: &str, value: &str) -> Self {
        self.extra = Some((field.to_string(), value.to_string()));
        self
    }

    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        if let Some(term) = self.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = term.to_lowercase();
            if !item
                .search_text()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        if let Some(status) = &self.status
            && item.status_label() != Some(status.as_str())
        {
            return false;
        }

        if let Some(date) = self.date
            && item.primary_date().map(|d| d.date()) != Some(date)
        {
            return false;
        }

        if let Some((field, value)) = &self.extra
            && item.extra_field(field).as_deref() != Some(value.as_str())
        {
            return false;
        }

        true
    }
}

impl<T: Listable> Listable for Versioned<T> {
    fn search_text(&self) -> Vec<&str> {
        self.record.search_text()
    }
    fn status_label(&self) -> Option<&str> {
        self.record.status_label()
    }
    fn primary_date(&self) -> Option<&TimeStamp<Utc>> {
        self.record.primary_date()
    }
    fn sort_key(&self, field: &str) -> Option<SortKey> {
        self.record.sort_key(field)
    }
    fn extra_field(&self, field: &str) -> Option<String> {
        self.record.extra_field(field)
    }
}

pub fn list<'a, T: Listable>(items: &'a [T], query: &ListQuery) -> Vec<&'a T> {
    items.iter().filter(|item| query.matches(*item)).collect()
}

fn compare_keys(a: &Option<SortKey>, b: &Option<SortKey>) -> Ordering {
    match (a, b) {
        (Some(SortKey::Number(a)), Some(SortKey::Number(b))) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Some(SortKey::Date(a)), Some(SortKey::Date(b))) => a.cmp(b),
        (Some(SortKey::Text(a)), Some(SortKey::Text(b))) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Stable sort on `field`. Ties, and items of an unknown field, keep their incoming order.
pub fn sort<'a, T: Listable>(items: Vec<&'a T>, field: &str, direction: SortDirection) -> Vec<&'a T> {
    let mut keyed: Vec<(Option<SortKey>, &'a T)> =
        items.into_iter().map(|item| (item.sort_key(field), item)).collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord = compare_keys(a, b);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });

    keyed.into_iter().map(|(_, item)| item).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize, // 1-indexed, after clamping
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slices out one page. Page numbers outside the valid range are clamped to it.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));

    let start = ((page - 1) * page_size).min(total_items);
    let end = (start + page_size).min(total_items);

    Page {
        items: &items[start..end],
        page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row {
        label: &'static str,
        status: &'static str,
        amount: f64,
        day: TimeStamp<Utc>,
    }

    impl Listable for Row {
        fn search_text(&self) -> Vec<&str> {
            vec![self.label]
        }
        fn status_label(&self) -> Option<&str> {
            Some(self.status)
        }
        fn primary_date(&self) -> Option<&TimeStamp<Utc>> {
            Some(&self.day)
        }
        fn sort_key(&self, field: &str) -> Option<SortKey> {
            match field {
                "amount" => Some(SortKey::Number(self.amount)),
                "date" => Some(SortKey::Date(self.day.timestamp_millis())),
                "label" => Some(SortKey::Text(self.label.to_string())),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { label: "Fuel", status: "pending", amount: 300.0, day: TimeStamp::on_day(2025, 1, 3) },
            Row { label: "Rent", status: "paid", amount: 100.0, day: TimeStamp::on_day(2025, 1, 1) },
            Row { label: "fuel top-up", status: "pending", amount: 100.0, day: TimeStamp::on_day(2025, 1, 2) },
        ]
    }

    #[test]
    fn filters_are_and_combined() {
        let rows = rows();
        let query = ListQuery::new().set_search_term("FUEL").set_status("pending");
        let labels: Vec<_> = list(&rows, &query).iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Fuel", "fuel top-up"]);

        let query = query.set_date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        let labels: Vec<_> = list(&rows, &query).iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["fuel top-up"]);
    }

    #[test]
    fn numeric_sort_is_stable() {
        let rows = rows();
        let sorted = sort(list(&rows, &ListQuery::new()), "amount", SortDirection::Ascending);
        let labels: Vec<_> = sorted.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Rent", "fuel top-up", "Fuel"]);

        let sorted = sort(list(&rows, &ListQuery::new()), "amount", SortDirection::Descending);
        let labels: Vec<_> = sorted.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Fuel", "Rent", "fuel top-up"]);
    }

    #[test]
    fn date_sort_uses_timestamps() {
        let rows = rows();
        let sorted = sort(list(&rows, &ListQuery::new()), "date", SortDirection::Ascending);
        let labels: Vec<_> = sorted.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Rent", "fuel top-up", "Fuel"]);
    }

    #[test]
    fn unknown_field_keeps_order() {
        let rows = rows();
        let sorted = sort(list(&rows, &ListQuery::new()), "nope", SortDirection::Descending);
        let labels: Vec<_> = sorted.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Fuel", "Rent", "fuel top-up"]);
    }

    #[test]
    fn pages_are_clamped() {
        let items: Vec<u32> = (1..=7).collect();

        let page = paginate(&items, 2, 3);
        assert_eq!(page.items, &[4, 5, 6]);
        assert_eq!(page.total_pages, 3);

        assert_eq!(paginate(&items, 99, 3).items, &[7]);
        assert_eq!(paginate(&items, 0, 3).page, 1);
        assert_eq!(paginate(&items, 1, 0).items, &[1]);
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let items: Vec<u32> = vec![];
        let page = paginate(&items, 5, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
    }
}
