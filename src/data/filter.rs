use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use super::model::{CellValue, Dataset, RowSet};
use crate::error::{Result, SplitError};

// ---------------------------------------------------------------------------
// Filter predicates: which values are permitted per column
// ---------------------------------------------------------------------------

/// One selection block: maps column_name → set of permitted values.
pub type FilterSpec = BTreeMap<String, BTreeSet<CellValue>>;

/// Ordered list of selection blocks. The effective predicate is the
/// conjunction of every column constraint in every block.
pub type FilterSet = Vec<FilterSpec>;

/// Build a single-column [`FilterSpec`].
pub fn filter_spec<I>(column: &str, values: I) -> FilterSpec
where
    I: IntoIterator<Item = CellValue>,
{
    let mut spec = FilterSpec::new();
    spec.insert(column.to_string(), values.into_iter().collect());
    spec
}

/// Split the dataset into `(segment, complement)`.
///
/// A row is in the segment when, for every constrained column, its cell is
/// in the permitted set. A column named by several blocks must satisfy all
/// of them, i.e. its permitted set is the intersection of theirs.
///
/// * No constraints at all → empty segment, complement = every row.
/// * A column missing from the dataset → [`SplitError::UnknownColumn`].
/// * An empty permitted set → nothing matches that column.
pub fn segment(dataset: &Dataset, filters: &FilterSet) -> Result<(RowSet, RowSet)> {
    let constraints = resolve_constraints(dataset, filters)?;

    if constraints.is_empty() {
        return Ok((RowSet::new(), dataset.row_ids()));
    }

    let mut matched = RowSet::new();
    let mut rest = RowSet::new();
    for (id, row) in dataset.rows.iter().enumerate() {
        let passes = constraints
            .iter()
            .all(|(&col, allowed)| row.cells.get(col).is_some_and(|v| allowed.contains(v)));
        if passes {
            matched.insert(id);
        } else {
            rest.insert(id);
        }
    }

    log::debug!(
        "segment: {} of {} rows match {} column constraint(s)",
        matched.len(),
        dataset.len(),
        constraints.len()
    );

    Ok((matched, rest))
}

/// Collapse the filter blocks into one permitted set per column index.
fn resolve_constraints(
    dataset: &Dataset,
    filters: &FilterSet,
) -> Result<BTreeMap<usize, BTreeSet<CellValue>>> {
    let mut constraints: BTreeMap<usize, BTreeSet<CellValue>> = BTreeMap::new();

    for spec in filters {
        for (column, allowed) in spec {
            let idx = dataset
                .column_index(column)
                .ok_or_else(|| SplitError::UnknownColumn(column.clone()))?;
            match constraints.entry(idx) {
                Entry::Vacant(slot) => {
                    slot.insert(allowed.clone());
                }
                Entry::Occupied(mut slot) => {
                    let narrowed = slot.get().intersection(allowed).cloned().collect();
                    slot.insert(narrowed);
                }
            }
        }
    }

    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn survey() -> Dataset {
        let rows = [
            ("north", "18-30"),
            ("north", "31-50"),
            ("south", "18-30"),
            ("east", "51+"),
            ("south", "31-50"),
            ("north", "51+"),
        ]
        .iter()
        .map(|(r, a)| Row::new(vec![s(r), s(a)]))
        .collect();
        Dataset::from_rows(vec!["region".into(), "age_group".into()], rows)
    }

    #[test]
    fn empty_filter_set_selects_nothing() {
        let ds = survey();
        let (seg, rest) = segment(&ds, &FilterSet::new()).unwrap();
        assert!(seg.is_empty());
        assert_eq!(rest, ds.row_ids());
    }

    #[test]
    fn block_without_columns_selects_nothing() {
        let ds = survey();
        let (seg, rest) = segment(&ds, &vec![FilterSpec::new()]).unwrap();
        assert!(seg.is_empty());
        assert_eq!(rest.len(), ds.len());
    }

    #[test]
    fn single_column_membership() {
        let ds = survey();
        let filters = vec![filter_spec("region", [s("north"), s("east")])];
        let (seg, rest) = segment(&ds, &filters).unwrap();
        assert_eq!(seg, RowSet::from([0, 1, 3, 5]));
        assert_eq!(rest, RowSet::from([2, 4]));
    }

    #[test]
    fn columns_within_a_block_are_conjunctive() {
        let ds = survey();
        let mut spec = filter_spec("region", [s("north")]);
        spec.insert("age_group".into(), [s("51+")].into_iter().collect());
        let (seg, _) = segment(&ds, &vec![spec]).unwrap();
        assert_eq!(seg, RowSet::from([5]));
    }

    #[test]
    fn later_blocks_narrow_the_segment() {
        let ds = survey();
        let filters = vec![
            filter_spec("region", [s("north"), s("south")]),
            filter_spec("age_group", [s("18-30")]),
        ];
        let (seg, rest) = segment(&ds, &filters).unwrap();
        assert_eq!(seg, RowSet::from([0, 2]));
        assert_eq!(rest, RowSet::from([1, 3, 4, 5]));
    }

    #[test]
    fn repeated_column_intersects_permitted_values() {
        let ds = survey();
        let filters = vec![
            filter_spec("region", [s("north"), s("south")]),
            filter_spec("region", [s("south"), s("east")]),
        ];
        let (seg, _) = segment(&ds, &filters).unwrap();
        assert_eq!(seg, RowSet::from([2, 4]));
    }

    #[test]
    fn conflicting_constraints_on_one_column_select_nothing() {
        let ds = survey();
        let filters = vec![
            filter_spec("region", [s("north")]),
            filter_spec("region", [s("east")]),
        ];
        let (seg, rest) = segment(&ds, &filters).unwrap();
        assert!(seg.is_empty());
        assert_eq!(rest.len(), ds.len());
    }

    #[test]
    fn unknown_column_is_an_error() {
        let ds = survey();
        let filters = vec![filter_spec("income", [CellValue::Integer(1)])];
        assert_eq!(
            segment(&ds, &filters),
            Err(SplitError::UnknownColumn("income".into()))
        );
    }

    #[test]
    fn empty_value_set_matches_no_rows() {
        let ds = survey();
        let filters = vec![filter_spec("region", Vec::<CellValue>::new())];
        let (seg, rest) = segment(&ds, &filters).unwrap();
        assert!(seg.is_empty());
        assert_eq!(rest.len(), ds.len());
    }
}
