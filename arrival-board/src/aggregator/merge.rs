//! Pure merge, sort and filter steps applied after the fan-out settles.

use crate::domain::{ArrivalRecord, BoardEntry, LineSet, StationId, TimeWindow};

/// Concatenate boards in the given order, tagging each entry with its
/// constituent, then sort.
pub fn merge_boards(boards: Vec<(StationId, Vec<BoardEntry>)>) -> Vec<ArrivalRecord> {
    let mut records: Vec<ArrivalRecord> = boards
        .into_iter()
        .flat_map(|(station_id, entries)| {
            entries
                .into_iter()
                .map(move |entry| ArrivalRecord::from_entry(entry, station_id.clone()))
        })
        .collect();
    sort_arrivals(&mut records);
    records
}

/// Stable sort by minutes, ties broken by line code.
///
/// Records equal on both keys keep their concatenation order.
pub fn sort_arrivals(records: &mut [ArrivalRecord]) {
    records.sort_by(|a, b| {
        a.minutes_until_arrival
            .cmp(&b.minutes_until_arrival)
            .then_with(|| a.line.cmp(&b.line))
    });
}

/// Lines present in `records`, ignoring the unknown-line placeholder.
pub fn observed_lines(records: &[ArrivalRecord]) -> LineSet {
    records
        .iter()
        .map(|r| &r.line)
        .filter(|line| !line.is_unknown())
        .cloned()
        .collect()
}

/// Keep records with `min <= minutes <= max`.
pub fn apply_window(records: Vec<ArrivalRecord>, window: TimeWindow) -> Vec<ArrivalRecord> {
    records
        .into_iter()
        .filter(|r| window.contains(r.minutes_until_arrival))
        .collect()
}

/// Keep records whose line is in `lines`.
pub fn apply_line_filter(records: Vec<ArrivalRecord>, lines: &LineSet) -> Vec<ArrivalRecord> {
    records
        .into_iter()
        .filter(|r| lines.contains(&r.line))
        .collect()
}
