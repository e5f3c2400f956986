// src/table/arrow.rs

use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};

use super::{Cell, Table};

/// Which [`Cell`] variant an Arrow column turns into.
///
/// - Int*, UInt*, Float*, Decimal* → `Number`
/// - everything castable to Utf8   → `Text`
/// - nulls (and NaN)               → `Missing`
fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _)
    )
}

fn column_cells(name: &str, arr: &ArrayRef) -> Result<Vec<Cell>> {
    if is_numeric(arr.data_type()) {
        let casted = cast(arr, &DataType::Float64)
            .with_context(|| format!("casting column `{}` to Float64", name))?;
        let floats = casted
            .as_any()
            .downcast_ref::<Float64Array>()
            .with_context(|| format!("column `{}` is not Float64 after cast", name))?;
        Ok(floats.iter().map(Cell::from).collect())
    } else {
        let casted = cast(arr, &DataType::Utf8)
            .with_context(|| format!("casting column `{}` to Utf8", name))?;
        let strings = casted
            .as_any()
            .downcast_ref::<StringArray>()
            .with_context(|| format!("column `{}` is not Utf8 after cast", name))?;
        Ok(strings
            .iter()
            .map(|v| v.map(str::to_string).into())
            .collect())
    }
}

/// Convert record batches sharing one schema into a single [`Table`].
pub fn table_from_batches(batches: &[RecordBatch]) -> Result<Table> {
    let Some(first) = batches.first() else {
        return Ok(Table::default());
    };
    let schema = first.schema();
    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for batch in batches {
        if batch.schema().fields() != schema.fields() {
            anyhow::bail!("record batches do not share a schema");
        }
        let cols = batch
            .columns()
            .iter()
            .zip(&columns)
            .map(|(arr, name)| column_cells(name, arr))
            .collect::<Result<Vec<_>>>()?;

        for i in 0..batch.num_rows() {
            rows.push(cols.iter().map(|c| c[i].clone()).collect());
        }
    }

    Ok(Table::new(columns, rows)?)
}

impl TryFrom<&RecordBatch> for Table {
    type Error = anyhow::Error;

    fn try_from(batch: &RecordBatch) -> Result<Self> {
        table_from_batches(std::slice::from_ref(batch))
    }
}
