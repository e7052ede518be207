use std::{
    collections::{HashMap, HashSet},
    time::Instant,
};

use crate::{
    dataset::CityRow,
    text::{normalize, tokens},
};

/// Which lookup stage produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    Canonical,
}

/// Accumulates dataset rows, then freezes them into a [`PlaceIndex`].
#[derive(Debug, Default)]
pub struct PlaceIndexBuilder {
    records: Vec<CityRow>,
    keys: HashMap<String, Vec<usize>>,
    canonical: Vec<(String, usize)>,
    seen: HashSet<String>,
    skipped: usize,
}

impl PlaceIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one row. Rows without a usable city are skipped.
    pub fn push(&mut self, row: CityRow) -> bool {
        let Some(canonical) = row.city_name().map(str::to_owned) else {
            self.skipped += 1;
            return false;
        };

        let idx = self.records.len();
        self.records.push(row);

        if self.seen.insert(canonical.clone()) {
            self.canonical.push((canonical.clone(), idx));
        }

        let norm = normalize(&canonical);
        let parts = tokens(&norm);

        self.add_key(&norm, idx);
        for end in 1..=parts.len() {
            self.add_key(&parts[..end].join(" "), idx);
        }
        for part in &parts {
            self.add_key(part, idx);
        }

        true
    }

    fn add_key(&mut self, key: &str, idx: usize) {
        if key.is_empty() {
            return;
        }
        let entry = self.keys.entry(key.to_owned()).or_default();
        if entry.last() != Some(&idx) {
            entry.push(idx);
        }
    }

    pub fn build(self) -> PlaceIndex {
        let mut scan_order: Vec<String> = self.keys.keys().cloned().collect();
        scan_order.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        if self.skipped > 0 {
            tracing::debug!(skipped = self.skipped, "rows without a city were not indexed");
        }

        PlaceIndex {
            records: self.records,
            keys: self.keys,
            scan_order,
            canonical: self.canonical,
        }
    }
}

impl Extend<CityRow> for PlaceIndexBuilder {
    fn extend<I: IntoIterator<Item = CityRow>>(&mut self, rows: I) {
        for row in rows {
            self.push(row);
        }
    }
}

/// Immutable multi-key index over city names.
///
/// Keys are normalized full names, space-joined token prefixes and single
/// tokens. Each key lists its rows in dataset order. Prefix and substring
/// scans walk keys shortest first, then lexicographically, so results are
/// stable across rebuilds.
#[derive(Debug, Default)]
pub struct PlaceIndex {
    records: Vec<CityRow>,
    keys: HashMap<String, Vec<usize>>,
    scan_order: Vec<String>,
    canonical: Vec<(String, usize)>,
}

impl PlaceIndex {
    pub fn from_rows<I: IntoIterator<Item = CityRow>>(rows: I) -> Self {
        let started = Instant::now();
        let mut builder = PlaceIndexBuilder::new();
        builder.extend(rows);
        let index = builder.build();

        tracing::info!(
            records = index.records.len(),
            keys = index.keys.len(),
            cities = index.canonical.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "place index built"
        );
        index
    }

    /// Best-effort single match: exact key, key prefix, key substring, then
    /// canonical-name substring.
    pub fn lookup(&self, query: &str) -> Option<&CityRow> {
        self.lookup_with_kind(query).map(|(_, row)| row)
    }

    pub fn lookup_with_kind(&self, query: &str) -> Option<(MatchKind, &CityRow)> {
        let q = normalize(query);

        if !q.is_empty() {
            if let Some(row) = self.first_for(&q) {
                return Some((MatchKind::Exact, row));
            }

            if let Some(row) = self.scan(|key| key.starts_with(q.as_str())) {
                return Some((MatchKind::Prefix, row));
            }

            if let Some(row) = self.scan(|key| key.contains(q.as_str())) {
                return Some((MatchKind::Substring, row));
            }
        }

        let raw = query.trim().to_lowercase();
        if raw.is_empty() {
            return None;
        }

        self.canonical
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&raw))
            .find_map(|(name, first)| {
                self.first_for(&normalize(name))
                    .or_else(|| self.records.get(*first))
            })
            .map(|row| (MatchKind::Canonical, row))
    }

    fn first_for(&self, key: &str) -> Option<&CityRow> {
        self.keys
            .get(key)
            .and_then(|rows| rows.first())
            .and_then(|&idx| self.records.get(idx))
    }

    fn scan(&self, pred: impl Fn(&str) -> bool) -> Option<&CityRow> {
        self.scan_order
            .iter()
            .find(|key| pred(key))
            .and_then(|key| self.first_for(key))
    }

    /// Canonical names containing `query` (case-insensitive), first-seen order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&str> {
        let q = query.trim().to_lowercase();
        self.canonical
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| name.to_lowercase().contains(&q))
            .take(limit)
            .collect()
    }

    /// All rows registered under a normalized key.
    pub fn rows_for(&self, key: &str) -> Vec<&CityRow> {
        self.keys
            .get(key)
            .map(|rows| rows.iter().filter_map(|&i| self.records.get(i)).collect())
            .unwrap_or_default()
    }

    /// Keys in scan order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.scan_order.iter().map(String::as_str)
    }

    pub fn canonical_cities(&self) -> impl Iterator<Item = &str> {
        self.canonical.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
