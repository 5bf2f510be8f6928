use rayon::prelude::*;
use std::collections::HashMap;
use tracing::trace;

use crate::domain::SortMode;
use crate::record::{Column, Record};

/// Store local row identity. Handed out when a row enters the store and never exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(u64);

#[derive(Debug, Clone)]
pub struct Row {
    pub id: RowId,
    pub record: Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// Decides the direction of the next sort.
#[derive(Debug)]
pub struct SortState {
    mode: SortMode,
    next: Direction,
    next_per_column: HashMap<Column, Direction>,
    last: Option<(Column, Direction)>,
}

impl SortState {
    pub fn new(mode: SortMode) -> Self {
        SortState {
            mode,
            next: Direction::Ascending,
            next_per_column: HashMap::new(),
            last: None,
        }
    }

    /// Returns the direction to use for `column` and advances the state.
    fn advance(&mut self, column: Column) -> Direction {
        let direction = match self.mode {
            SortMode::Shared => {
                let d = self.next;
                self.next = d.flip();
                d
            }
            SortMode::PerColumn => {
                let entry = self
                    .next_per_column
                    .entry(column)
                    .or_insert(Direction::Ascending);
                let d = *entry;
                *entry = d.flip();
                d
            }
        };
        self.last = Some((column, direction));
        direction
    }

    /// Column and direction of the most recent sort.
    pub fn last(&self) -> Option<(Column, Direction)> {
        self.last
    }
}

/// The ordered rows of the sheet.
#[derive(Debug, Default)]
pub struct RecordStore {
    rows: Vec<Row>,
    next_id: u64,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        let mut store = RecordStore::default();
        store.replace(records);
        store
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Records in store order, detached from their ids.
    pub fn records(&self) -> Vec<Record> {
        self.rows.iter().map(|r| r.record.clone()).collect()
    }

    fn next_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn append(&mut self, record: Record) -> RowId {
        let id = self.next_id();
        self.rows.push(Row { id, record });
        id
    }

    /// Appends the blank row of the "New Action" button.
    pub fn add_empty(&mut self) -> RowId {
        self.append(Record::default())
    }

    /// Replaces every row. Ids keep counting so old ids never match new rows.
    pub fn replace(&mut self, records: Vec<Record>) {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            rows.push(Row {
                id: self.next_id(),
                record,
            });
        }
        self.rows = rows;
    }

    /// Reorders the whole store by the text of `column`.
    ///
    /// Descending is a stable ascending sort followed by a reversal, so two
    /// consecutive sorts on a column are exact mirror images of each other.
    pub fn sort(&mut self, column: Column, state: &mut SortState) -> Direction {
        let direction = state.advance(column);
        self.rows
            .sort_by(|a, b| a.record.cell(column).cmp(b.record.cell(column)));
        if direction == Direction::Descending {
            self.rows.reverse();
        }
        trace!("Sorted {} rows by {:?} {:?}", self.rows.len(), column, direction);
        direction
    }

    /// Store indices of the rows whose job contains `query`, ignoring case.
    /// Results keep store order.
    pub fn filter(&self, query: &str) -> Vec<usize> {
        if query.is_empty() {
            return (0..self.rows.len()).collect();
        }
        let needle = query.to_lowercase();
        self.rows
            .par_iter()
            .enumerate()
            .filter(|(_, row)| row.record.job.to_lowercase().contains(&needle))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_data;

    fn jobs(store: &RecordStore) -> Vec<String> {
        store.rows().iter().map(|r| r.record.job.clone()).collect()
    }

    #[test]
    fn empty_query_selects_everything_in_order() {
        let mut store = RecordStore::new(sample_data());
        store.sort(Column::Due, &mut SortState::new(SortMode::Shared));
        assert_eq!(store.filter(""), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn filter_matches_job_case_insensitively() {
        let store = RecordStore::new(sample_data());
        let hits = store.filter("report");
        assert_eq!(hits, vec![4]);
        assert_eq!(store.rows()[4].record.job, "Prepare financial report for Q4");

        let hits = store.filter("FOR");
        for (idx, row) in store.rows().iter().enumerate() {
            let contains = row.record.job.to_lowercase().contains("for");
            assert_eq!(hits.contains(&idx), contains, "{}", row.record.job);
        }
        assert_eq!(hits, vec![1, 2, 3, 4]);
    }

    #[test]
    fn filter_only_looks_at_the_job() {
        let store = RecordStore::new(sample_data());
        assert!(store.filter("Aisha").is_empty());
    }

    #[test]
    fn shared_flag_toggles_across_columns() {
        let mut store = RecordStore::new(sample_data());
        let mut state = SortState::new(SortMode::Shared);

        assert_eq!(store.sort(Column::Job, &mut state), Direction::Ascending);
        assert_eq!(
            jobs(&store),
            vec![
                "Design new features for the website",
                "Finalize user testing feedback for app",
                "Launch social media campaign",
                "Prepare financial report for Q4",
                "Update press kit for company redesign",
            ]
        );
        assert_eq!(store.sort(Column::Job, &mut state), Direction::Descending);
        assert_eq!(
            jobs(&store),
            vec![
                "Update press kit for company redesign",
                "Prepare financial report for Q4",
                "Launch social media campaign",
                "Finalize user testing feedback for app",
                "Design new features for the website",
            ]
        );
        // The flag is shared, a different column continues the alternation.
        assert_eq!(store.sort(Column::Value, &mut state), Direction::Ascending);
        assert_eq!(state.last(), Some((Column::Value, Direction::Ascending)));
    }

    #[test]
    fn per_column_mode_remembers_each_column() {
        let mut store = RecordStore::new(sample_data());
        let mut state = SortState::new(SortMode::PerColumn);
        assert_eq!(store.sort(Column::Job, &mut state), Direction::Ascending);
        assert_eq!(store.sort(Column::Status, &mut state), Direction::Ascending);
        assert_eq!(store.sort(Column::Job, &mut state), Direction::Descending);
    }

    #[test]
    fn nested_columns_sort_by_name() {
        let mut store = RecordStore::new(sample_data());
        store.sort(Column::Assigned, &mut SortState::new(SortMode::Shared));
        let names: Vec<&str> = store
            .rows()
            .iter()
            .map(|r| r.record.assigned.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Kevin Smith",
                "Rachel Lee",
                "Sophie Choudhury",
                "Tejas Pandey",
                "Tom Wright"
            ]
        );
    }

    #[test]
    fn two_sorts_are_mirror_images_even_with_ties() {
        let mut records = sample_data();
        records.push(Record::default());
        records.push(Record::with_job("x"));
        let mut store = RecordStore::new(records);
        let mut state = SortState::new(SortMode::Shared);

        // Priority has ties (two Medium, two Low, two empty).
        store.sort(Column::Priority, &mut state);
        let first: Vec<RowId> = store.rows().iter().map(|r| r.id).collect();
        store.sort(Column::Priority, &mut state);
        let mut second: Vec<RowId> = store.rows().iter().map(|r| r.id).collect();
        second.reverse();
        assert_eq!(first, second);
    }

    #[test]
    fn sort_is_a_permutation() {
        let mut store = RecordStore::new(sample_data());
        let mut before = store.records();
        store.sort(Column::Url, &mut SortState::new(SortMode::Shared));
        let mut after = store.records();
        assert_eq!(after.len(), before.len());
        before.sort_by(|a, b| a.job.cmp(&b.job));
        after.sort_by(|a, b| a.job.cmp(&b.job));
        assert_eq!(before, after);
    }

    #[test]
    fn add_empty_appends_one_blank_row() {
        let mut store = RecordStore::new(sample_data());
        let id = store.add_empty();
        assert_eq!(store.len(), 6);
        assert_eq!(store.position(id), Some(5));
        assert_eq!(store.rows()[5].record, Record::default());
    }

    #[test]
    fn replace_hands_out_fresh_ids() {
        let mut store = RecordStore::new(sample_data());
        let old = store.rows()[0].id;
        store.replace(sample_data());
        assert_eq!(store.position(old), None);
        store.replace(Vec::new());
        assert!(store.is_empty());
        assert!(store.filter("").is_empty());
    }
}
