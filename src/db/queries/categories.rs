use crate::models::Category;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
    })
}

pub fn list_categories(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, icon
         FROM categories
         ORDER BY name",
    )?;

    let categories = stmt
        .query_map([], map_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = categories.len(), "Listed categories");
    Ok(categories)
}

pub fn get_category(conn: &Connection, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name, icon FROM categories WHERE id = ?",
        [id],
        map_category,
    )
    .optional()
}
