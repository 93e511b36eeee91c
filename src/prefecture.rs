//! Exact-match filtering on the prefecture attribute.

use std::collections::BTreeSet;

use crate::types::Bookstore;

/// Bookstores whose prefecture equals `prefecture` exactly.
///
/// `None` or an empty string means "no filter" and returns every input
/// entry. Matching is plain string equality with no case folding. Entries
/// without a prefecture never match a non-empty filter. Relative order is
/// preserved.
pub fn filter_by_prefecture<'a, I>(bookstores: I, prefecture: Option<&str>) -> Vec<&'a Bookstore>
where
    I: IntoIterator<Item = &'a Bookstore>,
{
    match prefecture.filter(|p| !p.is_empty()) {
        None => bookstores.into_iter().collect(),
        Some(wanted) => bookstores
            .into_iter()
            .filter(|store| store.prefecture.as_deref() == Some(wanted))
            .collect(),
    }
}

/// Distinct prefecture values, sorted ascending. Absent values are skipped.
pub fn list_prefectures<'a, I>(bookstores: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a Bookstore>,
{
    bookstores
        .into_iter()
        .filter_map(|store| store.prefecture.as_deref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
