//! Property-based tests for listing: filters, sorting and pagination
//!
//! Prefinancings with random amounts, beneficiaries and dates are run through the same
//! helpers the list views use.

use chrono::Utc;
use grant_ledger::listing::{ListQuery, Listable, SortDirection, list, paginate, sort};
use grant_ledger::prefinancing::{Prefinancing, PrefinancingDraft};
use grant_ledger::types::{Amount, TimeStamp};
use proptest::prelude::*;

// PROPERTY TEST STRATEGIES

/// Strategy to generate an issue date within one year
fn date_strategy() -> impl Strategy<Value = TimeStamp<Utc>> {
    (1u32..=12, 1u32..=28).prop_map(|(month, day)| TimeStamp::on_day(2025, month, day))
}

/// Strategy to generate positive amounts, with a small range so ties are common
fn amount_strategy() -> impl Strategy<Value = Amount> {
    1u64..=20
}

fn beneficiary_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("Field team"), Just("Clinique Keur"), Just("Garage Central")]
}

/// Strategy to generate a prefinancing; the index keeps numbers unique
fn prefinancing_strategy(index: usize) -> impl Strategy<Value = Prefinancing> {
    (amount_strategy(), beneficiary_strategy(), date_strategy()).prop_map(move |(amount, beneficiary, date)| {
        PrefinancingDraft::new()
            .set_number(&format!("PF-{index:03}"))
            .set_grant("grant_1")
            .set_beneficiary(beneficiary)
            .set_amount(amount)
            .set_issue_date(date)
            .validate_and_finalise()
            .expect("generated drafts are valid")
    })
}

fn collection_strategy() -> impl Strategy<Value = Vec<Prefinancing>> {
    (0usize..40).prop_flat_map(|len| (0..len).map(prefinancing_strategy).collect::<Vec<_>>())
}

fn direction_strategy() -> impl Strategy<Value = SortDirection> {
    prop::bool::ANY.prop_map(|b| if b { SortDirection::Ascending } else { SortDirection::Descending })
}

// PROPERTY TESTS
proptest! {
    /// Property: walking every page yields each item exactly once, in order
    #[test]
    fn pages_partition_the_collection(items in collection_strategy(), page_size in 1usize..12) {
        let total_pages = paginate(&items, 1, page_size).total_pages;
        let mut seen: Vec<&str> = Vec::new();
        for page in 1..=total_pages {
            let slice = paginate(&items, page, page_size);
            prop_assert!(slice.items.len() <= page_size);
            seen.extend(slice.items.iter().map(|p| p.number.as_str()));
        }

        let expected: Vec<&str> = items.iter().map(|p| p.number.as_str()).collect();
        prop_assert_eq!(seen, expected);
    }

    /// Property: requesting the same page twice gives the same slice, and out of range pages
    /// are clamped into range
    #[test]
    fn pagination_is_idempotent(items in collection_strategy(), page in 0usize..20, page_size in 1usize..12) {
        let first = paginate(&items, page, page_size);
        let again = paginate(&items, first.page, page_size);

        prop_assert_eq!(first.items, again.items);
        prop_assert!(first.page >= 1);
        prop_assert!(first.page <= first.total_pages.max(1));
    }

    /// Property: sorting is ordered by the key and stable for equal keys
    #[test]
    fn amount_sort_is_ordered_and_stable(items in collection_strategy(), direction in direction_strategy()) {
        let sorted = sort(list(&items, &ListQuery::new()), "amount", direction);
        prop_assert_eq!(sorted.len(), items.len());

        let position = |number: &str| items.iter().position(|p| p.number == number);
        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            match direction {
                SortDirection::Ascending => {
                    prop_assert!(a.amount <= b.amount);
                }
                SortDirection::Descending => {
                    prop_assert!(a.amount >= b.amount);
                }
            }
            if a.amount == b.amount {
                prop_assert!(position(a.number.as_str()) < position(b.number.as_str()));
            }
        }
    }

    /// Property: every listed item matches the query and every unlisted one does not
    #[test]
    fn filters_split_the_collection(
        items in collection_strategy(),
        beneficiary in beneficiary_strategy(),
        month in 1u32..=12,
    ) {
        let day = TimeStamp::on_day(2025, month, 1).date();
        let query = ListQuery::new()
            .set_search_term(&beneficiary.to_uppercase())
            .set_status("pending");
        let listed = list(&items, &query);

        for item in &items {
            let expected = item.beneficiary == beneficiary;
            prop_assert_eq!(listed.iter().any(|l| l.number == item.number), expected);
        }

        let dated = list(&items, &ListQuery::new().set_date(day));
        prop_assert!(dated.iter().all(|p| p.primary_date().map(|d| d.date()) == Some(day)));
    }
}
