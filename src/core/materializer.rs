//! Result materialization
//!
//! Turns a forward-only [`Cursor`] into [`ResultRow`]s, and rows into typed
//! records through a [`TableMap`].
//!
//! The row readers leave the cursor open; wrap them in [`read_and_close`]
//! when the cursor should be closed once the read is over, whatever its
//! outcome. The `*_async` variants take ownership of the cursor, drain it on
//! the blocking thread pool and always close it.

use super::driver::Cursor;
use super::error::{DatabaseError, PropertyMappingError, Result};
use super::mapping::{EntityMetadata, MappingOptions, TableMap};
use super::row::ResultRow;

/// Copy the cursor's current row
fn read_current_row<C: Cursor + ?Sized>(cursor: &C) -> Result<ResultRow> {
    let count = cursor.field_count();
    let mut row = ResultRow::with_capacity(count);
    for ordinal in 0..count {
        let value = cursor.value(ordinal)?;
        row.push(cursor.field_name(ordinal), cursor.field_type(ordinal), value);
    }
    Ok(row)
}

/// The first row, or an empty row when there is none
pub fn first_row<C: Cursor + ?Sized>(cursor: &mut C) -> Result<ResultRow> {
    if cursor.read()? {
        read_current_row(cursor)
    } else {
        Ok(ResultRow::new())
    }
}

/// The only row, or an empty row when there is none
///
/// # Errors
///
/// Returns [`DatabaseError::MultipleRows`] when a second row exists.
pub fn single_row<C: Cursor + ?Sized>(cursor: &mut C) -> Result<ResultRow> {
    if !cursor.read()? {
        return Ok(ResultRow::new());
    }
    let row = read_current_row(cursor)?;
    if cursor.read()? {
        return Err(DatabaseError::MultipleRows);
    }
    Ok(row)
}

/// The final row, draining the cursor
pub fn last_row<C: Cursor + ?Sized>(cursor: &mut C) -> Result<ResultRow> {
    let mut last = None;
    while cursor.read()? {
        last = Some(read_current_row(cursor)?);
    }
    Ok(last.unwrap_or_default())
}

/// Every row, in cursor order
pub fn all_rows<C: Cursor + ?Sized>(cursor: &mut C) -> Result<Vec<ResultRow>> {
    let mut rows = Vec::new();
    while cursor.read()? {
        rows.push(read_current_row(cursor)?);
    }
    tracing::trace!(rows = rows.len(), "materialized rows");
    Ok(rows)
}

/// Skip `skip` rows, then collect up to `take`
///
/// Reading stops as soon as `take` rows are collected. A `take` of zero
/// means no upper bound.
pub fn paged_rows<C: Cursor + ?Sized>(cursor: &mut C, skip: u64, take: u64) -> Result<Vec<ResultRow>> {
    for _ in 0..skip {
        if !cursor.read()? {
            return Ok(Vec::new());
        }
    }

    let limit = usize::try_from(take).unwrap_or(usize::MAX);
    let mut rows = Vec::with_capacity(limit.min(1024));
    while take == 0 || rows.len() < limit {
        if !cursor.read()? {
            break;
        }
        rows.push(read_current_row(cursor)?);
    }
    tracing::trace!(skip, take, rows = rows.len(), "materialized page");
    Ok(rows)
}

/// Run a read against the cursor, then close it
///
/// The cursor is closed whether or not the read succeeded. A read error wins
/// over a close error; the latter is only logged in that case.
pub fn read_and_close<C, R, F>(cursor: &mut C, read: F) -> Result<R>
where
    C: Cursor + ?Sized,
    F: FnOnce(&mut C) -> Result<R>,
{
    let result = read(cursor);
    let closed = if cursor.is_closed() {
        Ok(())
    } else {
        cursor.close()
    };
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(error = %close_err, "failed to close cursor after read error");
            Err(err)
        }
    }
}

/// Build one `T` per row
///
/// Each record starts from `T::default()`. Every valid property whose column
/// is present in the row is assigned; properties without a column keep their
/// default. All properties of a row are attempted before its failures are
/// reported together.
///
/// # Errors
///
/// Returns [`DatabaseError::PropertyMapping`] for the first row with any
/// failed assignment.
pub fn rows_to_typed<T: Default>(
    rows: &[ResultRow],
    map: &TableMap<T>,
    options: &MappingOptions,
) -> Result<Vec<T>> {
    rows_to_typed_with(rows, map, map, options)
}

/// [`rows_to_typed`] with column names resolved through `metadata`
///
/// The map still supplies the setters and the property flags. Properties
/// the metadata does not know read from the map's own column name.
///
/// # Errors
///
/// Same as [`rows_to_typed`].
pub fn rows_to_typed_with<T, M>(
    rows: &[ResultRow],
    map: &TableMap<T>,
    metadata: &M,
    options: &MappingOptions,
) -> Result<Vec<T>>
where
    T: Default,
    M: EntityMetadata + ?Sized,
{
    let properties: Vec<_> = map
        .valid_properties(options)
        .map(|p| {
            let column = metadata.column_name(p.name()).unwrap_or(p.column_name());
            (p, column)
        })
        .collect();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let mut record = T::default();
        let mut failures = Vec::new();
        for (property, column) in &properties {
            if let Some(value) = row.get_ignore_case(column) {
                if let Err(failure) = property.assign(&mut record, value) {
                    failures.push(failure);
                }
            }
        }
        if !failures.is_empty() {
            return Err(PropertyMappingError {
                target_type: map.target_type().to_string(),
                failures,
            }
            .into());
        }
        records.push(record);
    }
    Ok(records)
}

/// Write a record's valid properties into a row, keyed by column name
pub fn typed_to_row<T>(record: &T, map: &TableMap<T>, options: &MappingOptions) -> ResultRow {
    let mut row = ResultRow::new();
    for property in map.valid_properties(options) {
        row.push(property.column_name(), property.type_name(), property.read(record));
    }
    row
}

async fn offload<C, R, F>(cursor: C, read: F) -> Result<R>
where
    C: Cursor + Send + 'static,
    R: Send + 'static,
    F: FnOnce(&mut C) -> Result<R> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut cursor = cursor;
        read_and_close(&mut cursor, read)
    })
    .await
    .map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))?
}

/// [`first_row`] on the blocking pool, closing the cursor afterwards
pub async fn first_row_async<C: Cursor + Send + 'static>(cursor: C) -> Result<ResultRow> {
    offload(cursor, |c| first_row(c)).await
}

/// [`single_row`] on the blocking pool, closing the cursor afterwards
pub async fn single_row_async<C: Cursor + Send + 'static>(cursor: C) -> Result<ResultRow> {
    offload(cursor, |c| single_row(c)).await
}

/// [`last_row`] on the blocking pool, closing the cursor afterwards
pub async fn last_row_async<C: Cursor + Send + 'static>(cursor: C) -> Result<ResultRow> {
    offload(cursor, |c| last_row(c)).await
}

/// [`all_rows`] on the blocking pool, closing the cursor afterwards
pub async fn all_rows_async<C: Cursor + Send + 'static>(cursor: C) -> Result<Vec<ResultRow>> {
    offload(cursor, |c| all_rows(c)).await
}

/// [`paged_rows`] on the blocking pool, closing the cursor afterwards
pub async fn paged_rows_async<C: Cursor + Send + 'static>(
    cursor: C,
    skip: u64,
    take: u64,
) -> Result<Vec<ResultRow>> {
    offload(cursor, move |c| paged_rows(c, skip, take)).await
}
