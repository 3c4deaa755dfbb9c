use crate::{EventTable, Value};
use std::collections::BTreeSet;

/// Columns with at most this many distinct values get a multi-select.
pub const MULTI_SELECT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    MultiSelect,
    SingleSelect,
}

/// Filter control derived from a column's contents, independent of any UI.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub column: String,
    pub kind: FilterKind,
    /// Sorted distinct non-missing values.
    pub options: Vec<Value>,
    /// Whether any cell in the column is missing.
    pub has_missing: bool,
}

impl FilterSpec {
    /// Initial selection: everything for multi-selects, the first option for
    /// single-selects.
    pub fn default_selection(&self) -> FilterSelection {
        match self.kind {
            FilterKind::MultiSelect => FilterSelection::Multi {
                selected: self.options.iter().cloned().collect(),
                include_missing: true,
            },
            FilterKind::SingleSelect => FilterSelection::Single {
                value: self.options.first().cloned().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterSelection {
    Multi {
        selected: BTreeSet<Value>,
        /// Keep rows whose cell is missing. Only meaningful when the column
        /// has missing cells.
        include_missing: bool,
    },
    Single {
        value: Value,
    },
}

impl FilterSelection {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FilterSelection::Multi { selected, include_missing } => {
                if value.is_missing() {
                    *include_missing
                } else {
                    selected.contains(value)
                }
            }
            FilterSelection::Single { value: chosen } => {
                !value.is_missing() && value == chosen
            }
        }
    }

    pub fn is_selected(&self, option: &Value) -> bool {
        match self {
            FilterSelection::Multi { selected, .. } => selected.contains(option),
            FilterSelection::Single { value } => value == option,
        }
    }

    /// Flip one multi-select option. No-op for single-selects.
    pub fn toggle(&mut self, option: &Value) {
        if let FilterSelection::Multi { selected, .. } = self
            && !selected.remove(option)
        {
            selected.insert(option.clone());
        }
    }

    pub fn toggle_missing(&mut self) {
        if let FilterSelection::Multi { include_missing, .. } = self {
            *include_missing = !*include_missing;
        }
    }

    pub fn select_all(&mut self, spec: &FilterSpec) {
        if let FilterSelection::Multi { selected, include_missing } = self {
            *selected = spec.options.iter().cloned().collect();
            *include_missing = true;
        }
    }

    pub fn select_none(&mut self) {
        if let FilterSelection::Multi { selected, include_missing } = self {
            selected.clear();
            *include_missing = false;
        }
    }

    /// Move a single-select to the next (or previous) option, wrapping.
    pub fn cycle(&mut self, spec: &FilterSpec, forward: bool) {
        let FilterSelection::Single { value } = self else {
            return;
        };
        if spec.options.is_empty() {
            return;
        }
        let len = spec.options.len();
        let idx = spec.options.iter().position(|o| o == value).unwrap_or(0);
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        *value = spec.options[next].clone();
    }
}

/// Derive one filter control per column not in `excluded`.
///
/// Columns that are entirely missing produce no control and thus never filter.
pub fn derive_filter_specs(table: &EventTable, excluded: &[&str]) -> Vec<FilterSpec> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !excluded.contains(&name.as_str()))
        .filter_map(|(idx, name)| {
            let options = table.distinct(idx);
            if options.is_empty() {
                return None;
            }
            let kind = if options.len() <= MULTI_SELECT_LIMIT {
                FilterKind::MultiSelect
            } else {
                FilterKind::SingleSelect
            };
            Some(FilterSpec {
                column: name.clone(),
                kind,
                options,
                has_missing: table.column_has_missing(idx),
            })
        })
        .collect()
}

/// Indices of rows accepted by every filter, in table order.
pub fn apply_filters(
    table: &EventTable,
    specs: &[FilterSpec],
    selections: &[FilterSelection],
) -> Vec<usize> {
    let bound: Vec<(usize, &FilterSelection)> = specs
        .iter()
        .zip(selections)
        .filter_map(|(spec, sel)| table.column_index(&spec.column).map(|idx| (idx, sel)))
        .collect();

    (0..table.len())
        .filter(|&row| {
            bound
                .iter()
                .all(|(col, sel)| sel.accepts(table.value(row, *col)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::COORDINATE_COLUMNS;

    fn table_with_distinct(count: usize) -> EventTable {
        EventTable::new(
            vec!["X".into(), "Y".into(), "Player".into()],
            (0..count)
                .map(|i| {
                    vec![
                        Value::Number(i as f64),
                        Value::Number(0.0),
                        Value::Text(format!("P{i:02}")),
                    ]
                })
                .collect(),
        )
    }

    fn defaults(specs: &[FilterSpec]) -> Vec<FilterSelection> {
        specs.iter().map(FilterSpec::default_selection).collect()
    }

    #[test]
    fn coordinate_columns_are_never_filters() {
        let table = table_with_distinct(3);
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].column, "Player");
    }

    #[test]
    fn ten_distinct_values_is_multi_select_with_no_effect() {
        let table = table_with_distinct(10);
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        assert_eq!(specs[0].kind, FilterKind::MultiSelect);
        let rows = apply_filters(&table, &specs, &defaults(&specs));
        assert_eq!(rows, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn eleven_distinct_values_is_single_select() {
        let table = table_with_distinct(11);
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        assert_eq!(specs[0].kind, FilterKind::SingleSelect);
        let selections = defaults(&specs);
        assert_eq!(selections[0], FilterSelection::Single { value: Value::from("P00") });
        assert_eq!(apply_filters(&table, &specs, &selections), vec![0]);
    }

    #[test]
    fn filters_compose_by_intersection() {
        let table = EventTable::new(
            vec!["X".into(), "Y".into(), "Outcome".into(), "Height".into()],
            vec![
                vec![0.0.into(), 0.0.into(), "ok".into(), "flach".into()],
                vec![0.0.into(), 0.0.into(), "ok".into(), "hoch".into()],
                vec![0.0.into(), 0.0.into(), "fail".into(), "flach".into()],
                vec![0.0.into(), 0.0.into(), "fail".into(), "hoch".into()],
            ],
        );
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        let mut selections = defaults(&specs);
        selections[0].toggle(&Value::from("fail"));
        selections[1].toggle(&Value::from("flach"));
        assert_eq!(apply_filters(&table, &specs, &selections), vec![1]);

        // Every surviving row is in every selected set; every other row is not.
        for row in 0..table.len() {
            let in_all = specs.iter().zip(&selections).all(|(spec, sel)| {
                let col = table.column_index(&spec.column).unwrap();
                sel.accepts(table.value(row, col))
            });
            assert_eq!(in_all, row == 1);
        }
    }

    #[test]
    fn all_missing_column_yields_no_filter() {
        let table = EventTable::new(
            vec!["X".into(), "Y".into(), "Notes".into()],
            vec![
                vec![1.0.into(), 1.0.into(), Value::Missing],
                vec![2.0.into(), 2.0.into(), Value::Number(f64::NAN)],
            ],
        );
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        assert!(specs.is_empty());
        assert_eq!(apply_filters(&table, &specs, &[]), vec![0, 1]);
    }

    #[test]
    fn missing_cells_follow_include_missing_flag() {
        let table = EventTable::new(
            vec!["X".into(), "Y".into(), "Pressure".into()],
            vec![
                vec![1.0.into(), 1.0.into(), "hoch".into()],
                vec![2.0.into(), 2.0.into(), Value::Missing],
            ],
        );
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        assert!(specs[0].has_missing);
        assert_eq!(specs[0].options, vec![Value::from("hoch")]);

        let mut selections = defaults(&specs);
        assert_eq!(apply_filters(&table, &specs, &selections), vec![0, 1]);
        selections[0].toggle_missing();
        assert_eq!(apply_filters(&table, &specs, &selections), vec![0]);
    }

    #[test]
    fn single_select_cycles_with_wraparound() {
        let table = table_with_distinct(11);
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        let mut sel = specs[0].default_selection();
        sel.cycle(&specs[0], false);
        assert_eq!(sel, FilterSelection::Single { value: Value::from("P10") });
        sel.cycle(&specs[0], true);
        assert_eq!(sel, FilterSelection::Single { value: Value::from("P00") });
    }

    #[test]
    fn select_none_then_all() {
        let table = table_with_distinct(4);
        let specs = derive_filter_specs(&table, &COORDINATE_COLUMNS);
        let mut sel = specs[0].default_selection();
        sel.select_none();
        assert!(apply_filters(&table, &specs, std::slice::from_ref(&sel)).is_empty());
        sel.select_all(&specs[0]);
        assert_eq!(apply_filters(&table, &specs, &[sel]).len(), 4);
    }
}
