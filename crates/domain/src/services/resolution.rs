//! Temporal resolution over an append-only set of scheduled entries.
//!
//! Every function here is pure: the result depends only on the entries passed
//! in and the reference time. Stores that cannot push a query down to their
//! backend use these functions directly.
//!
//! Definitions used throughout:
//! - an entry is *effective* at `t` when `valid_from <= t`;
//! - the *current* entry of a key is its effective entry with the greatest
//!   `valid_from` (ties: greatest `created`, then greatest `id`);
//! - an effective entry is *outdated* when another effective entry of the same
//!   key has a strictly greater `valid_from`;
//! - the *latest* entry of a key is the one with the greatest `created`
//!   (ties: greatest `id`), regardless of `valid_from`.

use chrono::{DateTime, Utc};
use shared::pagination::{Page, PageRequest, SortDirection};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{EntrySort, EntrySortField, ScheduledConfigEntry};

/// Total order used to pick the current entry.
fn effective_order(a: &ScheduledConfigEntry, b: &ScheduledConfigEntry) -> Ordering {
    a.valid_from
        .cmp(&b.valid_from)
        .then_with(|| a.created.cmp(&b.created))
        .then_with(|| a.id.cmp(&b.id))
}

/// Total order used to pick the latest entry.
fn creation_order(a: &ScheduledConfigEntry, b: &ScheduledConfigEntry) -> Ordering {
    a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id))
}

/// Resolve the entry in effect for `key` at `reference_time`.
///
/// `key` must already be normalized. Returns `None` when the key has no
/// entries or only future-dated ones.
pub fn resolve_current<'a, I>(
    entries: I,
    key: &str,
    reference_time: DateTime<Utc>,
) -> Option<&'a ScheduledConfigEntry>
where
    I: IntoIterator<Item = &'a ScheduledConfigEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.key == key && e.is_effective_at(reference_time))
        .max_by(|a, b| effective_order(a, b))
}

/// Find every effective entry superseded by a later effective entry of the
/// same key.
///
/// One pass records the greatest effective `valid_from` per key, a second
/// pass keeps entries strictly below it. Future-dated entries are never
/// returned, and neither is the current entry of any key. Output is ordered
/// by key, `valid_from`, then id.
pub fn find_outdated(
    entries: &[ScheduledConfigEntry],
    reference_time: DateTime<Utc>,
) -> Vec<&ScheduledConfigEntry> {
    let mut effective_from: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for entry in entries.iter().filter(|e| e.is_effective_at(reference_time)) {
        effective_from
            .entry(entry.key.as_str())
            .and_modify(|max| {
                if entry.valid_from > *max {
                    *max = entry.valid_from;
                }
            })
            .or_insert(entry.valid_from);
    }

    let mut outdated: Vec<&ScheduledConfigEntry> = entries
        .iter()
        .filter(|e| e.is_effective_at(reference_time))
        .filter(|e| {
            effective_from
                .get(e.key.as_str())
                .is_some_and(|max| e.valid_from < *max)
        })
        .collect();

    outdated.sort_by(|a, b| {
        a.key
            .cmp(&b.key)
            .then_with(|| a.valid_from.cmp(&b.valid_from))
            .then_with(|| a.id.cmp(&b.id))
    });
    outdated
}

/// Revisions of `key` created strictly before `before`, newest first.
pub fn history<'a, I>(entries: I, key: &str, before: DateTime<Utc>) -> Vec<&'a ScheduledConfigEntry>
where
    I: IntoIterator<Item = &'a ScheduledConfigEntry>,
{
    let mut revisions: Vec<&ScheduledConfigEntry> = entries
        .into_iter()
        .filter(|e| e.key == key && e.created < before)
        .collect();
    revisions.sort_by(|a, b| creation_order(b, a));
    revisions
}

/// The most recently created entry of every key, in no particular order.
pub fn latest_per_key<'a, I>(entries: I) -> Vec<&'a ScheduledConfigEntry>
where
    I: IntoIterator<Item = &'a ScheduledConfigEntry>,
{
    let mut latest: HashMap<&str, &ScheduledConfigEntry> = HashMap::new();
    for entry in entries {
        latest
            .entry(entry.key.as_str())
            .and_modify(|current| {
                if creation_order(entry, current) == Ordering::Greater {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }
    latest.into_values().collect()
}

fn compare_field(a: &ScheduledConfigEntry, b: &ScheduledConfigEntry, field: EntrySortField) -> Ordering {
    match field {
        EntrySortField::Key => a.key.cmp(&b.key),
        EntrySortField::ValidFrom => a.valid_from.cmp(&b.valid_from),
        EntrySortField::Created => a.created.cmp(&b.created),
        EntrySortField::Id => a.id.cmp(&b.id),
    }
}

/// Sort entries by `sort`, breaking remaining ties by ascending id.
pub fn sort_entries(entries: &mut [&ScheduledConfigEntry], sort: &EntrySort) {
    let keys = sort.with_id_tiebreak();
    entries.sort_by(|a, b| {
        keys.iter().fold(Ordering::Equal, |ordering, (field, direction)| {
            ordering.then_with(|| {
                let ordering = compare_field(a, b, *field);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
        })
    });
}

/// Slice an already ordered result set into the requested page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
    let page_items = items.into_iter().skip(offset).take(limit).collect();
    Page::new(page_items, request, total)
}

/// Latest entry of every key, ordered by `sort` and sliced into `request`.
pub fn latest_per_key_page(
    entries: &[ScheduledConfigEntry],
    request: PageRequest,
    sort: &EntrySort,
) -> Page<ScheduledConfigEntry> {
    let mut latest = latest_per_key(entries);
    sort_entries(&mut latest, sort);
    paginate(latest, request).map(Clone::clone)
}
