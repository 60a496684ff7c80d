use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::date_column;
use crate::models::{MonthKey, NewWorker, Worker};

#[derive(Debug, Default, Clone)]
pub struct WorkerFilter {
    /// Only workers whose effective date falls in this month.
    pub month: Option<MonthKey>,
}

fn map_worker(row: &Row<'_>) -> rusqlite::Result<Worker> {
    Ok(Worker {
        id: row.get(0)?,
        name: row.get(1)?,
        designation: row.get(2)?,
        payment_cents: row.get(3)?,
        effective_date: date_column(row, 4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// List workers, most recently created first.
pub fn list_workers(conn: &Connection, filter: &WorkerFilter) -> rusqlite::Result<Vec<Worker>> {
    let mut sql = String::from(
        "SELECT id, name, designation, payment_cents, effective_date, created_at, updated_at
         FROM workers
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(month) = filter.month {
        sql.push_str(" AND effective_date >= ?");
        params_vec.push(Box::new(month.first_day().format("%Y-%m-%d").to_string()));
        if let Some(next) = month.next() {
            sql.push_str(" AND effective_date < ?");
            params_vec.push(Box::new(next.first_day().format("%Y-%m-%d").to_string()));
        }
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let workers = stmt
        .query_map(params_refs.as_slice(), map_worker)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = workers.len(), month = ?filter.month.map(|m| m.key()), "Listed workers");
    Ok(workers)
}

pub fn get_worker(conn: &Connection, id: i64) -> rusqlite::Result<Option<Worker>> {
    conn.query_row(
        "SELECT id, name, designation, payment_cents, effective_date, created_at, updated_at
         FROM workers WHERE id = ?",
        [id],
        map_worker,
    )
    .optional()
}

pub fn create_worker(conn: &Connection, worker: &NewWorker) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO workers (name, designation, payment_cents, effective_date)
         VALUES (?, ?, ?, ?)",
        params![
            worker.name,
            worker.designation,
            worker.payment_cents,
            worker.effective_date.format("%Y-%m-%d").to_string()
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(worker_id = id, name = %worker.name, "Created worker");
    Ok(id)
}

pub fn update_worker(conn: &Connection, id: i64, worker: &NewWorker) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE workers SET name = ?, designation = ?, payment_cents = ?, effective_date = ?,
         updated_at = datetime('now') WHERE id = ?",
        params![
            worker.name,
            worker.designation,
            worker.payment_cents,
            worker.effective_date.format("%Y-%m-%d").to_string(),
            id
        ],
    )?;
    if rows > 0 {
        debug!(worker_id = id, name = %worker.name, "Updated worker");
    }
    Ok(rows > 0)
}

pub fn delete_worker(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM workers WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(worker_id = id, "Deleted worker");
    }
    Ok(rows > 0)
}
