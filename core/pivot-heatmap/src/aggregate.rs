//! FILENAME: core/pivot-heatmap/src/aggregate.rs
//! Grouping & aggregation - partitions records into row x column buckets and
//! reduces each bucket to a single number.
//!
//! Architecture:
//! - Composite keys are interned into dense ids during the single pass
//! - Each (row id, column id) cell collects the raw values pushed into it
//! - `finish` sorts both axes by key and reduces every cell exactly once
//!
//! The accumulator is resumable: records can be fed in batches, and as long
//! as batches arrive in input order the result equals a one-shot call.

use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

use crate::definition::AggregationType;
use crate::error::{PivotError, Result};
use crate::key::CompositeKey;
use crate::record::{OrderedFloat, Record, Value};

/// Dense id of an interned key on one axis.
pub type GroupId = u32;

// ============================================================================
// KEY INTERNING
// ============================================================================

/// Assigns each distinct composite key a dense id in first-seen order.
#[derive(Debug, Default)]
struct KeyInterner {
    key_to_id: FxHashMap<CompositeKey, GroupId>,
    id_to_key: Vec<CompositeKey>,
}

impl KeyInterner {
    /// Returns None once the id space is exhausted.
    fn intern(&mut self, key: CompositeKey) -> Option<GroupId> {
        if let Some(&id) = self.key_to_id.get(&key) {
            return Some(id);
        }
        let id = GroupId::try_from(self.id_to_key.len()).ok()?;
        self.id_to_key.push(key.clone());
        self.key_to_id.insert(key, id);
        Some(id)
    }

    fn len(&self) -> usize {
        self.id_to_key.len()
    }

    /// Consumes the interner and returns the keys in ascending order together
    /// with a map from old id to sorted position.
    fn into_sorted(self) -> (Vec<CompositeKey>, Vec<usize>) {
        let mut order: Vec<usize> = (0..self.id_to_key.len()).collect();
        order.sort_by(|&a, &b| self.id_to_key[a].cmp(&self.id_to_key[b]));

        let mut position = vec![0; order.len()];
        for (pos, &id) in order.iter().enumerate() {
            position[id] = pos;
        }

        let mut slots: Vec<Option<CompositeKey>> =
            self.id_to_key.into_iter().map(Some).collect();
        let keys = order
            .iter()
            .filter_map(|&id| slots[id].take())
            .collect();

        (keys, position)
    }
}

// ============================================================================
// OUTPUT STRUCTURES
// ============================================================================

/// A distinct key on the column axis plus the records that map to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnGroup {
    pub key: CompositeKey,

    /// Indices into the input record slice, in input order.
    pub members: Vec<usize>,
}

/// Dense row x column grid of aggregated values. Cells no record
/// contributed to are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Option<f64>>,
}

impl DataMatrix {
    /// An all-absent grid. Fails when the cell count does not fit in memory
    /// addressing (`rows * cols` overflow or a byte size past `isize::MAX`).
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .filter(|&len| {
                len.checked_mul(std::mem::size_of::<Option<f64>>())
                    .map_or(false, |bytes| bytes <= isize::MAX as usize)
            })
            .ok_or(PivotError::TooManyGroups { rows, cols })?;
        Ok(DataMatrix {
            rows,
            cols,
            cells: vec![None; len],
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    /// True when no cell holds a value.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col]
        } else {
            None
        }
    }

    /// The value a renderer shows: absent cells read as 0.
    pub fn value_or_zero(&self, row: usize, col: usize) -> f64 {
        self.get(row, col).unwrap_or(0.0)
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.cells[row * self.cols + col] = Some(value);
    }

    /// Present values in one row.
    pub fn row_values(&self, row: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.cols).filter_map(move |col| self.get(row, col))
    }

    /// Present values in one column.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows).filter_map(move |row| self.get(row, col))
    }

    /// Every present value, row-major.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().filter_map(|c| *c)
    }

    /// Rows as slices, row-major.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<f64>]> + '_ {
        (0..self.rows).map(move |r| &self.cells[r * self.cols..(r + 1) * self.cols])
    }
}

/// Serialized as a list of rows, `null` for absent cells.
impl Serialize for DataMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

/// Result of grouping and aggregation, both axes sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotData {
    pub row_headers: Vec<CompositeKey>,
    pub column_groups: Vec<ColumnGroup>,
    pub matrix: DataMatrix,
}

impl PivotData {
    pub fn row_index(&self, key: &CompositeKey) -> Option<usize> {
        self.row_headers.binary_search(key).ok()
    }

    pub fn column_index(&self, key: &CompositeKey) -> Option<usize> {
        self.column_groups
            .binary_search_by(|group| group.key.cmp(key))
            .ok()
    }

    /// Looks a cell up by its row and column keys.
    pub fn get_by_key(&self, row: &CompositeKey, col: &CompositeKey) -> Option<f64> {
        let r = self.row_index(row)?;
        let c = self.column_index(col)?;
        self.matrix.get(r, c)
    }

    pub fn column_keys(&self) -> Vec<CompositeKey> {
        self.column_groups.iter().map(|g| g.key.clone()).collect()
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

type CellValues = SmallVec<[Value; 4]>;

/// Single-pass grouping state for one pivot computation.
pub struct PivotAccumulator<'a> {
    row_fields: &'a [String],
    column_fields: &'a [String],
    value_field: &'a str,
    aggregation: AggregationType,

    rows: KeyInterner,
    columns: KeyInterner,

    /// Member record indices, indexed by column group id.
    column_members: Vec<Vec<usize>>,

    /// Raw values per (row id, column id).
    cells: FxHashMap<(GroupId, GroupId), CellValues>,

    /// Index the next pushed record is reported under.
    next_record: usize,
}

impl<'a> PivotAccumulator<'a> {
    pub fn new(
        row_fields: &'a [String],
        column_fields: &'a [String],
        value_field: &'a str,
        aggregation: AggregationType,
    ) -> Self {
        PivotAccumulator {
            row_fields,
            column_fields,
            value_field,
            aggregation,
            rows: KeyInterner::default(),
            columns: KeyInterner::default(),
            column_members: Vec::new(),
            cells: FxHashMap::default(),
            next_record: 0,
        }
    }

    /// Adds one record. A record failing field lookup or the value check
    /// leaves the accumulator unchanged.
    pub fn push(&mut self, record: &Record) -> Result<()> {
        let index = self.next_record;

        let row_key = CompositeKey::from_record(self.row_fields, index, record)?;
        let column_key = CompositeKey::from_record(self.column_fields, index, record)?;
        let value = record.lookup(index, self.value_field)?;

        if self.aggregation.requires_numbers() && !value.is_number() {
            return Err(PivotError::InvalidValue {
                record: index,
                field: self.value_field.to_string(),
                value: value.to_string(),
            });
        }

        let (row_id, col_id) = match (self.rows.intern(row_key), self.columns.intern(column_key)) {
            (Some(row_id), Some(col_id)) => (row_id, col_id),
            _ => {
                return Err(PivotError::TooManyGroups {
                    rows: self.rows.len(),
                    cols: self.columns.len(),
                })
            }
        };

        if col_id as usize == self.column_members.len() {
            self.column_members.push(Vec::new());
        }
        self.column_members[col_id as usize].push(index);

        self.cells
            .entry((row_id, col_id))
            .or_default()
            .push(value.clone());

        self.next_record += 1;
        Ok(())
    }

    /// Adds a batch of records, continuing the record numbering.
    pub fn push_batch(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            self.push(record)?;
        }
        Ok(())
    }

    /// Number of records accepted so far.
    pub fn record_count(&self) -> usize {
        self.next_record
    }

    /// Sorts both axes and reduces every cell.
    pub fn finish(self) -> Result<PivotData> {
        trace!(
            "finishing {} records: {} row groups, {} column groups, {} cells",
            self.next_record,
            self.rows.len(),
            self.columns.len(),
            self.cells.len()
        );

        let (row_headers, row_position) = self.rows.into_sorted();
        let (column_keys, col_position) = self.columns.into_sorted();

        let mut by_position: Vec<(usize, Vec<usize>)> = self
            .column_members
            .into_iter()
            .enumerate()
            .map(|(id, members)| (col_position[id], members))
            .collect();
        by_position.sort_by_key(|(pos, _)| *pos);

        let column_groups = column_keys
            .into_iter()
            .zip(by_position)
            .map(|(key, (_, members))| ColumnGroup { key, members })
            .collect();

        let mut matrix = DataMatrix::new(row_headers.len(), col_position.len())?;
        for ((row_id, col_id), values) in &self.cells {
            let value = reduce(self.aggregation, values);
            matrix.set(
                row_position[*row_id as usize],
                col_position[*col_id as usize],
                value,
            );
        }

        Ok(PivotData {
            row_headers,
            column_groups,
            matrix,
        })
    }
}

/// Groups `records` on the two axes and reduces each cell with `aggregation`.
pub fn aggregate(
    records: &[Record],
    row_fields: &[String],
    column_fields: &[String],
    value_field: &str,
    aggregation: AggregationType,
) -> Result<PivotData> {
    let mut accumulator = PivotAccumulator::new(row_fields, column_fields, value_field, aggregation);
    accumulator.push_batch(records)?;
    accumulator.finish()
}

// ============================================================================
// REDUCTIONS
// ============================================================================

/// Distinct-value identity for `countUnique`: numbers by value, text by
/// content, and a number never equals a text.
#[derive(Debug, PartialEq, Eq, Hash)]
enum DistinctValue<'v> {
    Number(OrderedFloat),
    Text(&'v str),
}

impl<'v> From<&'v Value> for DistinctValue<'v> {
    fn from(value: &'v Value) -> Self {
        match value {
            Value::Number(n) => DistinctValue::Number(OrderedFloat(*n)),
            Value::Text(s) => DistinctValue::Text(s),
        }
    }
}

/// Reduces a non-empty value list. Numeric modes only see numbers, since
/// `push` rejects text for them.
fn reduce(aggregation: AggregationType, values: &[Value]) -> f64 {
    match aggregation {
        AggregationType::Sum => numbers(values).sum(),
        AggregationType::Count => values.len() as f64,
        AggregationType::CountUnique => {
            let distinct: FxHashSet<DistinctValue<'_>> =
                values.iter().map(DistinctValue::from).collect();
            distinct.len() as f64
        }
        AggregationType::Average => {
            if values.is_empty() {
                0.0
            } else {
                numbers(values).sum::<f64>() / values.len() as f64
            }
        }
        AggregationType::Median => {
            let mut sorted: Vec<f64> = numbers(values).collect();
            median(&mut sorted)
        }
    }
}

fn numbers(values: &[Value]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(Value::as_number)
}

/// Numeric median; sorts `values` in place.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Number(v)).collect()
    }

    fn sales_records() -> Vec<Record> {
        vec![
            Record::new().with("region", "E").with("prod", "A").with("qty", 10),
            Record::new().with("region", "E").with("prod", "B").with("qty", 5),
            Record::new().with("region", "W").with("prod", "A").with("qty", 7),
        ]
    }

    #[test]
    fn test_basic_sum() {
        let records = sales_records();
        let data = aggregate(
            &records,
            &fields(&["region"]),
            &fields(&["prod"]),
            "qty",
            AggregationType::Sum,
        )
        .unwrap();

        let rows: Vec<String> = data.row_headers.iter().map(|k| k.display()).collect();
        let cols: Vec<String> = data.column_groups.iter().map(|g| g.key.display()).collect();
        assert_eq!(rows, vec!["E", "W"]);
        assert_eq!(cols, vec!["A", "B"]);

        assert_eq!(data.matrix.get(0, 0), Some(10.0));
        assert_eq!(data.matrix.get(0, 1), Some(5.0));
        assert_eq!(data.matrix.get(1, 0), Some(7.0));
        assert_eq!(data.matrix.get(1, 1), None);
        assert_eq!(data.matrix.value_or_zero(1, 1), 0.0);
    }

    #[test]
    fn test_column_group_members() {
        let records = sales_records();
        let data = aggregate(
            &records,
            &fields(&["region"]),
            &fields(&["prod"]),
            "qty",
            AggregationType::Sum,
        )
        .unwrap();

        assert_eq!(data.column_groups[0].members, vec![0, 2]);
        assert_eq!(data.column_groups[1].members, vec![1]);
    }

    #[test]
    fn test_get_by_key() {
        let records = sales_records();
        let data = aggregate(
            &records,
            &fields(&["region"]),
            &fields(&["prod"]),
            "qty",
            AggregationType::Sum,
        )
        .unwrap();

        let w = CompositeKey::from_tokens(["W"]);
        let a = CompositeKey::from_tokens(["A"]);
        let b = CompositeKey::from_tokens(["B"]);
        assert_eq!(data.get_by_key(&w, &a), Some(7.0));
        assert_eq!(data.get_by_key(&w, &b), None);
        assert_eq!(data.get_by_key(&CompositeKey::from_tokens(["N"]), &a), None);
    }

    #[test]
    fn test_median() {
        assert_eq!(reduce(AggregationType::Median, &nums(&[1.0, 2.0, 3.0, 4.0])), 2.5);
        assert_eq!(reduce(AggregationType::Median, &nums(&[1.0, 2.0, 3.0])), 2.0);
        // Numeric, not lexicographic, ordering.
        assert_eq!(reduce(AggregationType::Median, &nums(&[10.0, 9.0, 100.0])), 10.0);
    }

    #[test]
    fn test_count_unique() {
        let values = nums(&[1.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(reduce(AggregationType::CountUnique, &values), 3.0);

        let mixed = vec![Value::from(1), Value::from("1"), Value::from("a"), Value::from("a")];
        assert_eq!(reduce(AggregationType::CountUnique, &mixed), 3.0);
    }

    #[test]
    fn test_average_and_count() {
        let values = nums(&[2.0, 4.0, 9.0]);
        assert_eq!(reduce(AggregationType::Average, &values), 5.0);
        assert_eq!(reduce(AggregationType::Count, &values), 3.0);
        assert_eq!(reduce(AggregationType::Sum, &values), 15.0);
    }

    #[test]
    fn test_count_sums_to_record_count() {
        let records = vec![
            Record::new().with("r", "x").with("c", "1").with("v", 1),
            Record::new().with("r", "x").with("c", "1").with("v", 2),
            Record::new().with("r", "y").with("c", "2").with("v", 3),
            Record::new().with("r", "z").with("c", "1").with("v", 4),
            Record::new().with("r", "y").with("c", "2").with("v", 5),
        ];
        let data = aggregate(
            &records,
            &fields(&["r"]),
            &fields(&["c"]),
            "v",
            AggregationType::Count,
        )
        .unwrap();

        let total: f64 = data.matrix.values().sum();
        assert_eq!(total, records.len() as f64);
    }

    #[test]
    fn test_count_accepts_text_values() {
        let records = vec![
            Record::new().with("r", "x").with("name", "alice"),
            Record::new().with("r", "x").with("name", "bob"),
            Record::new().with("r", "x").with("name", "alice"),
        ];
        let rows = fields(&["r"]);

        let count = aggregate(&records, &rows, &[], "name", AggregationType::Count).unwrap();
        assert_eq!(count.matrix.get(0, 0), Some(3.0));

        let unique = aggregate(&records, &rows, &[], "name", AggregationType::CountUnique).unwrap();
        assert_eq!(unique.matrix.get(0, 0), Some(2.0));
    }

    #[test]
    fn test_text_under_numeric_mode_is_error() {
        let records = vec![
            Record::new().with("r", "x").with("v", 1),
            Record::new().with("r", "x").with("v", "n/a"),
        ];
        let err = aggregate(&records, &fields(&["r"]), &[], "v", AggregationType::Sum).unwrap_err();

        match err {
            PivotError::InvalidValue { record, field, value } => {
                assert_eq!(record, 1);
                assert_eq!(field, "v");
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_value_field_is_error() {
        let records = vec![Record::new().with("r", "x")];
        let err = aggregate(&records, &fields(&["r"]), &[], "v", AggregationType::Count).unwrap_err();
        assert!(matches!(err, PivotError::FieldNotFound { record: 0, ref field } if field == "v"));
    }

    #[test]
    fn test_empty_axes_collapse_to_one_group() {
        let records = sales_records();
        let data = aggregate(&records, &[], &[], "qty", AggregationType::Sum).unwrap();

        assert_eq!(data.row_headers.len(), 1);
        assert_eq!(data.column_groups.len(), 1);
        assert!(data.row_headers[0].is_empty());
        assert_eq!(data.matrix.get(0, 0), Some(22.0));
    }

    #[test]
    fn test_empty_input() {
        let data = aggregate(
            &[],
            &fields(&["region"]),
            &fields(&["prod"]),
            "qty",
            AggregationType::Sum,
        )
        .unwrap();

        assert!(data.row_headers.is_empty());
        assert!(data.column_groups.is_empty());
        assert!(data.matrix.is_empty());
        assert_eq!(data.matrix.row_count(), 0);
    }

    #[test]
    fn test_keys_strictly_ascending() {
        let records: Vec<Record> = ["d", "b", "a", "c", "b", "a"]
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Record::new()
                    .with("r", *r)
                    .with("c", if i % 2 == 0 { "y" } else { "x" })
                    .with("v", i as i64)
            })
            .collect();
        let data = aggregate(&records, &fields(&["r"]), &fields(&["c"]), "v", AggregationType::Sum)
            .unwrap();

        assert!(data.row_headers.windows(2).all(|w| w[0] < w[1]));
        assert!(data.column_groups.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn test_batches_match_single_pass() {
        let records: Vec<Record> = (0..20)
            .map(|i| {
                Record::new()
                    .with("r", format!("r{}", i % 3))
                    .with("c", format!("c{}", i % 4))
                    .with("v", 0.1 * i as f64)
            })
            .collect();
        let rows = fields(&["r"]);
        let cols = fields(&["c"]);

        let single = aggregate(&records, &rows, &cols, "v", AggregationType::Sum).unwrap();

        let mut acc = PivotAccumulator::new(&rows, &cols, "v", AggregationType::Sum);
        for chunk in records.chunks(7) {
            acc.push_batch(chunk).unwrap();
        }
        assert_eq!(acc.record_count(), 20);
        let batched = acc.finish().unwrap();

        assert_eq!(single, batched);
    }

    #[test]
    fn test_matrix_size_overflow_is_error() {
        let err = DataMatrix::new(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, PivotError::TooManyGroups { rows: usize::MAX, cols: 2 }));

        assert!(DataMatrix::new(usize::MAX / 4, 1).is_err());

        let empty = DataMatrix::new(usize::MAX, 0).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_interner_ids_are_dense_and_stable() {
        let mut interner = KeyInterner::default();
        let a = CompositeKey::from_tokens(["a"]);
        let b = CompositeKey::from_tokens(["b"]);

        assert_eq!(interner.intern(b.clone()), Some(0));
        assert_eq!(interner.intern(a.clone()), Some(1));
        assert_eq!(interner.intern(b), Some(0));
        assert_eq!(interner.len(), 2);

        let (keys, position) = interner.into_sorted();
        assert_eq!(keys, vec![a, CompositeKey::from_tokens(["b"])]);
        assert_eq!(position, vec![1, 0]);
    }

    #[test]
    fn test_matrix_serializes_as_rows() {
        let records = sales_records();
        let data = aggregate(
            &records,
            &fields(&["region"]),
            &fields(&["prod"]),
            "qty",
            AggregationType::Sum,
        )
        .unwrap();

        let json = serde_json::to_string(&data.matrix).unwrap();
        assert_eq!(json, "[[10.0,5.0],[7.0,null]]");
    }
}
