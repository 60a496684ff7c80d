use crate::models::{Dish, DishWithCategory, NewDish};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::parse_column;

#[derive(Debug, Default, Clone)]
pub struct DishFilter {
    /// Case-insensitive substring match on the dish name.
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub available_only: bool,
}

const DISH_COLUMNS: &str = "d.id, d.name, d.price_cents, d.kind, d.description, d.is_available,
        d.category_id, d.created_at, d.updated_at, c.name, c.icon";

fn map_dish(row: &Row<'_>) -> rusqlite::Result<DishWithCategory> {
    Ok(DishWithCategory {
        dish: Dish {
            id: row.get(0)?,
            name: row.get(1)?,
            price_cents: row.get(2)?,
            kind: parse_column(row, 3)?,
            description: row.get(4)?,
            is_available: row.get(5)?,
            category_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        },
        category_name: row.get(9)?,
        category_icon: row.get(10)?,
    })
}

pub fn list_dishes(
    conn: &Connection,
    filter: &DishFilter,
) -> rusqlite::Result<Vec<DishWithCategory>> {
    let mut sql = format!(
        "SELECT {DISH_COLUMNS}
         FROM dishes d
         LEFT JOIN categories c ON d.category_id = c.id
         WHERE 1=1"
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref search) = filter.search {
        sql.push_str(" AND d.name LIKE ? COLLATE NOCASE");
        params_vec.push(Box::new(format!("%{}%", search)));
    }
    if let Some(category_id) = filter.category_id {
        sql.push_str(" AND d.category_id = ?");
        params_vec.push(Box::new(category_id));
    }
    if filter.available_only {
        sql.push_str(" AND d.is_available = 1");
    }
    sql.push_str(" ORDER BY d.name COLLATE NOCASE, d.id");

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let dishes = stmt
        .query_map(params_refs.as_slice(), map_dish)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = dishes.len(), "Listed dishes");
    Ok(dishes)
}

pub fn get_dish(conn: &Connection, id: i64) -> rusqlite::Result<Option<DishWithCategory>> {
    conn.query_row(
        &format!(
            "SELECT {DISH_COLUMNS}
             FROM dishes d
             LEFT JOIN categories c ON d.category_id = c.id
             WHERE d.id = ?"
        ),
        [id],
        map_dish,
    )
    .optional()
}

pub fn create_dish(conn: &Connection, dish: &NewDish) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO dishes (name, price_cents, kind, description, is_available, category_id)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            dish.name,
            dish.price_cents,
            dish.kind.as_str(),
            dish.description,
            dish.is_available,
            dish.category_id
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(dish_id = id, name = %dish.name, "Created dish");
    Ok(id)
}

pub fn update_dish(conn: &Connection, id: i64, dish: &NewDish) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE dishes SET name = ?, price_cents = ?, kind = ?, description = ?,
         is_available = ?, category_id = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![
            dish.name,
            dish.price_cents,
            dish.kind.as_str(),
            dish.description,
            dish.is_available,
            dish.category_id,
            id
        ],
    )?;
    if rows > 0 {
        debug!(dish_id = id, name = %dish.name, "Updated dish");
    }
    Ok(rows > 0)
}

/// Flip the availability flag. Returns the new value, or `None` if the dish
/// does not exist.
pub fn toggle_availability(conn: &Connection, id: i64) -> rusqlite::Result<Option<bool>> {
    let rows = conn.execute(
        "UPDATE dishes SET is_available = NOT is_available, updated_at = datetime('now')
         WHERE id = ?",
        [id],
    )?;
    if rows == 0 {
        return Ok(None);
    }
    let available: bool =
        conn.query_row("SELECT is_available FROM dishes WHERE id = ?", [id], |row| {
            row.get(0)
        })?;
    debug!(dish_id = id, available, "Toggled dish availability");
    Ok(Some(available))
}

pub fn delete_dish(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM dishes WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(dish_id = id, "Deleted dish");
    }
    Ok(rows > 0)
}

pub fn dish_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM dishes WHERE id = ?)",
        [id],
        |row| row.get(0),
    )
}
