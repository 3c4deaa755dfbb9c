use crate::pitch::Point;
use crate::scene::EventColumns;
use crate::{COL_X, COL_X2, COL_Y, COL_Y2, EventTable, Value};

/// Frequency of each distinct value in one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCounts {
    pub column: String,
    /// Highest count first; ties keep first-appearance order.
    pub counts: Vec<(Value, u64)>,
}

impl ValueCounts {
    pub fn max(&self) -> u64 {
        self.counts.iter().map(|(_, n)| *n).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    pub height: Option<ValueCounts>,
    pub outcome: Option<ValueCounts>,
    pub pressure: Option<ValueCounts>,
    /// Mean Euclidean pass length over rows with a valid end coordinate.
    pub mean_pass_length: Option<f64>,
    pub filtered_rows: usize,
    pub total_rows: usize,
}

impl Statistics {
    pub fn charts(&self) -> impl Iterator<Item = (&'static str, &ValueCounts)> {
        [
            ("Pass height", self.height.as_ref()),
            ("Outcome", self.outcome.as_ref()),
            ("Pressure", self.pressure.as_ref()),
        ]
        .into_iter()
        .filter_map(|(title, counts)| counts.map(|c| (title, c)))
    }

    pub fn mean_pass_length_label(&self) -> String {
        format_length(self.mean_pass_length)
    }
}

pub fn format_length(length: Option<f64>) -> String {
    match length {
        Some(len) => format!("{len:.2}"),
        None => "n/a".to_string(),
    }
}

/// Value counts of `column` over `rows`; `None` when the column is absent.
/// Missing cells are not counted.
pub fn value_counts(table: &EventTable, rows: &[usize], column: &str) -> Option<ValueCounts> {
    let idx = table.column_index(column)?;
    let mut counts: Vec<(Value, u64)> = Vec::new();
    for &row in rows {
        let value = table.value(row, idx);
        if value.is_missing() {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value.clone(), 1)),
        }
    }
    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Some(ValueCounts { column: column.to_string(), counts })
}

pub fn pass_length(table: &EventTable, row: usize) -> Option<f64> {
    let start = Point::new(table.number(row, COL_X)?, table.number(row, COL_Y)?);
    let end = Point::new(table.number(row, COL_X2)?, table.number(row, COL_Y2)?);
    Some(start.distance(end))
}

/// Mean pass length, skipping rows without an end coordinate.
pub fn mean_pass_length(table: &EventTable, rows: &[usize]) -> Option<f64> {
    let lengths: Vec<f64> = rows
        .iter()
        .filter_map(|&row| pass_length(table, row))
        .filter(|len| len.is_finite())
        .collect();
    if lengths.is_empty() {
        return None;
    }
    Some(lengths.iter().sum::<f64>() / lengths.len() as f64)
}

pub fn compute_statistics(
    table: &EventTable,
    rows: &[usize],
    columns: &EventColumns,
) -> Statistics {
    Statistics {
        height: value_counts(table, rows, &columns.height),
        outcome: value_counts(table, rows, &columns.outcome),
        pressure: value_counts(table, rows, &columns.pressure),
        mean_pass_length: mean_pass_length(table, rows),
        filtered_rows: rows.len(),
        total_rows: table.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_rows_without_end() {
        let table = EventTable::new(
            vec!["X".into(), "Y".into(), "X2".into(), "Y2".into()],
            vec![
                vec![0.0.into(), 0.0.into(), 10.0.into(), 0.0.into()],
                vec![5.0.into(), 5.0.into(), Value::Missing, Value::Missing],
            ],
        );
        let mean = mean_pass_length(&table, &[0, 1]);
        assert_eq!(mean, Some(10.0));
        assert_eq!(format_length(mean), "10.00");
    }

    #[test]
    fn mean_is_none_without_end_columns() {
        let table = EventTable::new(vec!["X".into(), "Y".into()], vec![vec![1.0.into(), 1.0.into()]]);
        assert_eq!(mean_pass_length(&table, &[0]), None);
        assert_eq!(format_length(None), "n/a");
    }

    #[test]
    fn mean_uses_euclidean_length() {
        let table = EventTable::new(
            vec!["X".into(), "Y".into(), "X2".into(), "Y2".into()],
            vec![
                vec![0.0.into(), 0.0.into(), 3.0.into(), 4.0.into()],
                vec![0.0.into(), 0.0.into(), 6.0.into(), 8.0.into()],
            ],
        );
        assert_eq!(mean_pass_length(&table, &[0, 1]), Some(7.5));
        assert_eq!(mean_pass_length(&table, &[1]), Some(10.0));
    }

    #[test]
    fn value_counts_order_by_frequency_then_appearance() {
        let table = EventTable::new(
            vec!["Outcome".into()],
            vec![
                vec!["b".into()],
                vec!["a".into()],
                vec!["a".into()],
                vec![Value::Missing],
                vec!["c".into()],
            ],
        );
        let counts = value_counts(&table, &[0, 1, 2, 3, 4], "Outcome").unwrap();
        let expected: Vec<(Value, u64)> =
            vec![("a".into(), 2), ("b".into(), 1), ("c".into(), 1)];
        assert_eq!(counts.counts, expected);
        assert_eq!(counts.max(), 2);
    }

    #[test]
    fn counts_only_cover_filtered_rows() {
        let table = EventTable::new(
            vec!["Outcome".into()],
            vec![vec!["a".into()], vec!["b".into()]],
        );
        let counts = value_counts(&table, &[1], "Outcome").unwrap();
        assert_eq!(counts.counts, vec![(Value::from("b"), 1)]);
    }

    #[test]
    fn absent_columns_produce_no_chart() {
        let table = EventTable::new(
            vec!["X".into(), "Y".into(), "Outcome".into()],
            vec![vec![0.0.into(), 0.0.into(), "ok".into()]],
        );
        let stats = compute_statistics(&table, &[0], &EventColumns::default());
        assert!(stats.height.is_none());
        assert!(stats.pressure.is_none());
        let titles: Vec<_> = stats.charts().map(|(t, _)| t).collect();
        assert_eq!(titles, vec!["Outcome"]);
        assert_eq!(stats.mean_pass_length_label(), "n/a");
    }
}
