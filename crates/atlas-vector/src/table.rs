//! LanceDB connection helpers and typed column access for record batches.
use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::{connect, Connection, Table};

use crate::schema::build_chunk_schema;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

/// Opens the passage table, creating it empty when absent.
pub async fn open_chunk_table(conn: &Connection, name: &str, dim: i32) -> Result<Table> {
    let names = conn.table_names().execute().await?;
    if !names.iter().any(|n| n == name) {
        let schema = build_chunk_schema(dim);
        let empty = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
        conn.create_table(name, Box::new(empty)).execute().await?;
        tracing::info!(table = name, dim, "created chunk table");
    }
    Ok(conn.open_table(name).execute().await?)
}

pub(crate) fn utf8<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not utf8"))
}

pub(crate) fn int32<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not int32"))
}

pub(crate) fn float32<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not float32"))
}

pub(crate) fn nullable(col: &StringArray, i: usize) -> Option<String> {
    if col.is_null(i) { None } else { Some(col.value(i).to_string()) }
}
