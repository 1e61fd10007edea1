use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::file_entry::{FileEntry, Listing, MimeCategory};
use crate::models::view::{ListingView, SortKey, SortOrder, TypeFilter, ViewQuery};
use crate::state::AppState;

fn matches_search(name: &str, needle: &str) -> bool {
    needle.is_empty() || name.to_lowercase().contains(needle)
}

fn compare(a: &FileEntry, b: &FileEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Size => a.size_bytes.cmp(&b.size_bytes),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Type => a.mime_category.as_str().cmp(b.mime_category.as_str()),
    }
}

pub fn visible_files(files: &[FileEntry], query: &ViewQuery) -> Vec<FileEntry> {
    let needle = query.search_term.to_lowercase();

    let mut visible: Vec<FileEntry> = files
        .iter()
        .filter(|file| matches_search(&file.name, &needle))
        .filter(|file| query.type_filter.accepts(file.mime_category))
        .cloned()
        .collect();

    // `sort_by` is stable, so equal keys keep their listing order in both directions.
    visible.sort_by(|a, b| match query.sort_order {
        SortOrder::Asc => compare(a, b, query.sort_key),
        SortOrder::Desc => compare(b, a, query.sort_key),
    });
    visible
}

pub fn derive_view(listing: &Listing, query: &ViewQuery) -> ListingView {
    let needle = query.search_term.to_lowercase();
    ListingView {
        visible_files: visible_files(&listing.files, query),
        visible_folders: listing
            .folders
            .iter()
            .filter(|folder| matches_search(folder, &needle))
            .cloned()
            .collect(),
    }
}

pub fn category_counts(files: &[FileEntry]) -> BTreeMap<MimeCategory, usize> {
    let mut counts = BTreeMap::new();
    for file in files {
        *counts.entry(file.mime_category).or_insert(0) += 1;
    }
    counts
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

pub fn set_search_term(state: &AppState, term: &str) {
    state.browsing().query.search_term = term.to_string();
}

pub fn set_type_filter(state: &AppState, filter: TypeFilter) {
    state.browsing().query.type_filter = filter;
}

/// Selecting the active key again flips the order; a new key starts ascending.
pub fn set_sort(state: &AppState, key: SortKey) {
    let mut browsing = state.browsing();
    let query = &mut browsing.query;
    if query.sort_key == key {
        query.sort_order = query.sort_order.toggled();
    } else {
        query.sort_key = key;
        query.sort_order = SortOrder::Asc;
    }
}

pub fn current_view(state: &AppState) -> ListingView {
    let browsing = state.browsing();
    derive_view(&browsing.listing, &browsing.query)
}
