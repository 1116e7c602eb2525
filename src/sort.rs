//! Click-to-sort over the visual row order.

use std::cmp::Ordering;

use crate::columns::ColumnDescriptor;
use crate::models::ResultRecord;
use crate::table::ResultTable;

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<usize>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    /// Header click: the active column flips direction, any other column
    /// becomes active and ascending.
    pub fn click(&mut self, column: usize) {
        if self.column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column);
            self.ascending = true;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Three-way comparator over storage positions.
pub struct SortEngine<'a> {
    columns: &'a [ColumnDescriptor],
    records: &'a [ResultRecord],
    table: &'a ResultTable,
}

impl<'a> SortEngine<'a> {
    pub fn new(
        columns: &'a [ColumnDescriptor],
        records: &'a [ResultRecord],
        table: &'a ResultTable,
    ) -> Self {
        Self {
            columns,
            records,
            table,
        }
    }

    /// Compare the records stored at `a` and `b` by `column`.
    ///
    /// NaN compares equal to everything.
    pub fn compare(&self, column: usize, a: usize, b: usize, ascending: bool) -> Ordering {
        let descriptor = &self.columns[column];
        let ord = if descriptor.is_index {
            a.cmp(&b)
        } else if descriptor.is_numeric {
            let va = descriptor.value(&self.records[a]).unwrap_or(f64::NEG_INFINITY);
            let vb = descriptor.value(&self.records[b]).unwrap_or(f64::NEG_INFINITY);
            if va < vb {
                Ordering::Less
            } else if va > vb {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        } else {
            compare_ignore_case(self.table.cell(column, a), self.table.cell(column, b))
        };

        if ascending {
            ord
        } else {
            ord.reverse()
        }
    }

    /// Stable-sort the visual permutation `order` by the given state.
    /// An inactive or out-of-range column leaves `order` untouched.
    ///
    /// Rows whose numeric value is NaN keep their slots and the remaining
    /// rows are sorted around them, so the sort always sees a total order.
    pub fn sort(&self, order: &mut [usize], state: SortState) {
        let Some(column) = state.column.filter(|&c| c < self.columns.len()) else {
            return;
        };
        let descriptor = &self.columns[column];
        if !descriptor.is_numeric {
            order.sort_by(|&a, &b| self.compare(column, a, b, state.ascending));
            return;
        }

        let is_nan = |row: usize| {
            descriptor
                .value(&self.records[row])
                .is_some_and(f64::is_nan)
        };
        let mut sorted: Vec<usize> = order.iter().copied().filter(|&row| !is_nan(row)).collect();
        sorted.sort_by(|&a, &b| self.compare(column, a, b, state.ascending));

        let mut sorted = sorted.into_iter();
        for slot in order.iter_mut().filter(|slot| !is_nan(**slot)) {
            if let Some(row) = sorted.next() {
                *slot = row;
            }
        }
    }

    /// Apply a header click. Clicking the active column again mirrors the
    /// current order; any other column sorts ascending.
    pub fn click(&self, order: &mut [usize], state: &mut SortState, column: usize) {
        if column >= self.columns.len() {
            return;
        }
        let toggled = state.column == Some(column);
        state.click(column);
        if toggled {
            order.reverse();
        } else {
            self.sort(order, *state);
        }
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::build_columns;
    use crate::config::DisplayPreferences;
    use crate::models::TrackId;

    fn fixture() -> (Vec<ColumnDescriptor>, Vec<ResultRecord>) {
        let prefs = DisplayPreferences {
            index: true,
            title: true,
            dynamic_range: true,
            ..DisplayPreferences::none()
        };
        let records = vec![
            ResultRecord {
                title: "banana".to_string(),
                dynamic_range: 9.0,
                ..ResultRecord::new(TrackId(1))
            },
            ResultRecord {
                title: "Apple".to_string(),
                dynamic_range: 14.0,
                ..ResultRecord::new(TrackId(2))
            },
            ResultRecord {
                title: "cherry".to_string(),
                ..ResultRecord::new(TrackId(3))
            },
        ];
        (build_columns(&prefs), records)
    }

    #[test]
    fn test_click_toggles_and_resets() {
        let mut state = SortState::default();
        state.click(2);
        assert_eq!(state, SortState { column: Some(2), ascending: true });
        state.click(2);
        assert!(!state.ascending);
        state.click(1);
        assert_eq!(state, SortState { column: Some(1), ascending: true });
        state.reset();
        assert_eq!(state.column, None);
    }

    #[test]
    fn test_text_sort_ignores_case() {
        let (columns, records) = fixture();
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        let mut order = vec![0, 1, 2];
        engine.sort(&mut order, SortState { column: Some(1), ascending: true });
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_numeric_sort_puts_unmeasured_first() {
        let (columns, records) = fixture();
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        let mut order = vec![0, 1, 2];
        engine.sort(&mut order, SortState { column: Some(2), ascending: true });
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_second_click_reverses() {
        let (columns, records) = fixture();
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        let mut state = SortState::default();
        let mut order = vec![0, 1, 2];

        engine.click(&mut order, &mut state, 2);
        let first = order.clone();
        engine.click(&mut order, &mut state, 2);
        assert!(!state.ascending);
        let mut reversed = first;
        reversed.reverse();
        assert_eq!(order, reversed);
    }

    #[test]
    fn test_second_click_mirrors_ties() {
        let (columns, mut records) = fixture();
        records[0].dynamic_range = 9.0;
        records[1].dynamic_range = 9.0;
        records[2].dynamic_range = 14.0;
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        let mut state = SortState::default();
        let mut order = vec![0, 1, 2];

        engine.click(&mut order, &mut state, 2);
        assert_eq!(order, vec![0, 1, 2]);
        engine.click(&mut order, &mut state, 2);
        assert_eq!(order, vec![2, 1, 0]);
        engine.click(&mut order, &mut state, 2);
        assert_eq!(order, vec![0, 1, 2]);

        // A different column starts ascending from the current order.
        engine.click(&mut order, &mut state, 1);
        assert_eq!(state, SortState { column: Some(1), ascending: true });
        assert_eq!(order, vec![1, 0, 2]);

        engine.click(&mut order, &mut state, 5);
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_many_nan_values_sort_without_panic() {
        let prefs = DisplayPreferences {
            dynamic_range: true,
            ..DisplayPreferences::none()
        };
        let columns = build_columns(&prefs);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let records: Vec<ResultRecord> = (0..3000u64)
            .map(|i| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let dynamic_range = if i % 3 == 0 {
                    f64::NAN
                } else {
                    (seed >> 40) as f64 / 1000.0
                };
                ResultRecord {
                    dynamic_range,
                    ..ResultRecord::new(TrackId(i))
                }
            })
            .collect();
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);

        for ascending in [true, false] {
            let mut order: Vec<usize> = (0..records.len()).rev().collect();
            let before = order.clone();
            engine.sort(&mut order, SortState { column: Some(0), ascending });

            for (slot, &row) in order.iter().enumerate() {
                if records[row].dynamic_range.is_nan() {
                    assert_eq!(before[slot], row, "NaN row moved");
                }
            }
            let values: Vec<f64> = order
                .iter()
                .map(|&row| records[row].dynamic_range)
                .filter(|v| !v.is_nan())
                .collect();
            assert!(values.windows(2).all(|w| if ascending { w[0] <= w[1] } else { w[0] >= w[1] }));

            let mut rows = order.clone();
            rows.sort_unstable();
            assert_eq!(rows, (0..records.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_index_sort_restores_ingestion_order() {
        let (columns, records) = fixture();
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        let mut order = vec![2, 0, 1];
        engine.sort(&mut order, SortState { column: Some(0), ascending: true });
        assert_eq!(order, vec![0, 1, 2]);
        engine.sort(&mut order, SortState { column: Some(0), ascending: false });
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_nan_compares_equal() {
        let (columns, mut records) = fixture();
        records[0].dynamic_range = f64::NAN;
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        assert_eq!(engine.compare(2, 0, 1, true), Ordering::Equal);
        assert_eq!(engine.compare(2, 1, 0, false), Ordering::Equal);
    }

    #[test]
    fn test_new_column_has_no_secondary_key() {
        let (columns, mut records) = fixture();
        records[2].dynamic_range = 9.0;
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        // Ties on DR keep whatever order the previous sort produced.
        let mut order = vec![2, 1, 0];
        engine.sort(&mut order, SortState { column: Some(2), ascending: true });
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_inactive_state_is_noop() {
        let (columns, records) = fixture();
        let table = ResultTable::build(&columns, &records);
        let engine = SortEngine::new(&columns, &records, &table);
        let mut order = vec![1, 2, 0];
        engine.sort(&mut order, SortState::default());
        engine.sort(&mut order, SortState { column: Some(7), ascending: true });
        assert_eq!(order, vec![1, 2, 0]);
    }
}
