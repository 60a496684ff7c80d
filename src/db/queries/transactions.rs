use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, trace};

use super::{parse_column, timestamp_column};
use crate::models::{
    DishRef, NewTransaction, Transaction, TransactionKind, TransactionWithDish, TIMESTAMP_FORMAT,
};

#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub dish_id: Option<i64>,
    /// Inclusive lower bound on the transaction timestamp.
    pub from: Option<NaiveDateTime>,
    /// Exclusive upper bound on the transaction timestamp.
    pub until: Option<NaiveDateTime>,
    pub limit: Option<i64>,
}

impl TransactionFilter {
    fn where_clause(&self, sql: &mut String, params_vec: &mut Vec<Box<dyn rusqlite::ToSql>>) {
        if let Some(kind) = self.kind {
            sql.push_str(" AND t.kind = ?");
            params_vec.push(Box::new(kind.as_str()));
        }
        if let Some(dish_id) = self.dish_id {
            sql.push_str(" AND t.dish_id = ?");
            params_vec.push(Box::new(dish_id));
        }
        if let Some(from) = self.from {
            sql.push_str(" AND t.transaction_date >= ?");
            params_vec.push(Box::new(from.format(TIMESTAMP_FORMAT).to_string()));
        }
        if let Some(until) = self.until {
            sql.push_str(" AND t.transaction_date < ?");
            params_vec.push(Box::new(until.format(TIMESTAMP_FORMAT).to_string()));
        }
    }
}

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<TransactionWithDish> {
    let dish_name: Option<String> = row.get(7)?;
    // The dish columns are all NULL when the reference is missing or dangling.
    let dish = match dish_name {
        Some(name) => Some(DishRef {
            name,
            kind: parse_column(row, 8)?,
            category_name: row.get(9)?,
        }),
        None => None,
    };

    Ok(TransactionWithDish {
        transaction: Transaction {
            id: row.get(0)?,
            kind: parse_column(row, 1)?,
            amount_cents: row.get(2)?,
            description: row.get(3)?,
            dish_id: row.get(4)?,
            quantity: row.get(5)?,
            timestamp: timestamp_column(row, 6)?,
        },
        dish,
    })
}

/// List transactions joined with their dish, newest first.
pub fn list_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> rusqlite::Result<Vec<TransactionWithDish>> {
    let mut sql = String::from(
        "SELECT t.id, t.kind, t.amount_cents, t.description, t.dish_id, t.quantity,
                t.transaction_date, d.name, d.kind, c.name
         FROM transactions t
         LEFT JOIN dishes d ON t.dish_id = d.id
         LEFT JOIN categories c ON d.category_id = c.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    filter.where_clause(&mut sql, &mut params_vec);

    sql.push_str(" ORDER BY t.transaction_date DESC, t.id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(limit));
    }

    trace!(sql = %sql, "Listing transactions");
    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let transactions = stmt
        .query_map(params_refs.as_slice(), map_transaction)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = transactions.len(), "Listed transactions");
    Ok(transactions)
}

pub fn get_transaction(
    conn: &Connection,
    id: i64,
) -> rusqlite::Result<Option<TransactionWithDish>> {
    conn.query_row(
        "SELECT t.id, t.kind, t.amount_cents, t.description, t.dish_id, t.quantity,
                t.transaction_date, d.name, d.kind, c.name
         FROM transactions t
         LEFT JOIN dishes d ON t.dish_id = d.id
         LEFT JOIN categories c ON d.category_id = c.id
         WHERE t.id = ?",
        [id],
        map_transaction,
    )
    .optional()
}

pub fn create_transaction(conn: &Connection, tx: &NewTransaction) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO transactions
            (kind, amount_cents, description, dish_id, quantity, transaction_date)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            tx.kind.as_str(),
            tx.amount_cents,
            tx.description,
            tx.dish_id,
            tx.quantity,
            tx.timestamp.format(TIMESTAMP_FORMAT).to_string()
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(
        transaction_id = id,
        kind = %tx.kind,
        amount_cents = tx.amount_cents,
        "Created transaction"
    );
    Ok(id)
}

pub fn delete_transaction(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM transactions WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(transaction_id = id, "Deleted transaction");
    }
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_in_memory_pool, migrations};
    use crate::db::queries::dishes;
    use crate::models::{DishKind, NewDish};
    use chrono::NaiveDate;
    use std::path::Path;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sale(
        kind: TransactionKind,
        cents: i64,
        dish_id: Option<i64>,
        timestamp: NaiveDateTime,
    ) -> NewTransaction {
        NewTransaction {
            kind,
            amount_cents: cents,
            description: "test".into(),
            dish_id,
            quantity: dish_id.map(|_| 1),
            timestamp,
        }
    }

    #[test]
    fn test_filters_combine() {
        let pool = create_in_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        migrations::run_migrations(&conn, Path::new("migrations")).unwrap();

        let dish_id = dishes::create_dish(
            &conn,
            &NewDish {
                name: "Masala Chai".into(),
                price_cents: 3000,
                kind: DishKind::Veg,
                description: None,
                is_available: true,
                category_id: Some(6),
            },
        )
        .unwrap();

        for tx in [
            sale(TransactionKind::Income, 3000, Some(dish_id), at(1, 9)),
            sale(TransactionKind::Income, 6000, Some(dish_id), at(2, 9)),
            sale(TransactionKind::Income, 9000, None, at(3, 9)),
            sale(TransactionKind::Expense, 1500, None, at(3, 18)),
        ] {
            create_transaction(&conn, &tx).unwrap();
        }

        let all = list_transactions(&conn, &TransactionFilter::default()).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].transaction.kind, TransactionKind::Expense);

        let chai = TransactionFilter {
            dish_id: Some(dish_id),
            ..Default::default()
        };
        let rows = list_transactions(&conn, &chai).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.dish.as_ref().unwrap().kind == DishKind::Veg));

        // from is inclusive, until exclusive
        let window = TransactionFilter {
            kind: Some(TransactionKind::Income),
            from: Some(at(2, 9)),
            until: Some(at(3, 9)),
            ..Default::default()
        };
        let rows = list_transactions(&conn, &window).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction.amount_cents, 6000);

        let latest = TransactionFilter {
            limit: Some(2),
            ..Default::default()
        };
        let rows = list_transactions(&conn, &latest).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].transaction.amount_cents, 9000);
    }

    #[test]
    fn test_deleting_dish_detaches_transactions() {
        let pool = create_in_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        migrations::run_migrations(&conn, Path::new("migrations")).unwrap();

        let dish_id = dishes::create_dish(
            &conn,
            &NewDish {
                name: "Tandoori Chicken".into(),
                price_cents: 42000,
                kind: DishKind::NonVeg,
                description: None,
                is_available: true,
                category_id: None,
            },
        )
        .unwrap();
        let tx = sale(TransactionKind::Income, 42000, Some(dish_id), at(5, 20));
        let id = create_transaction(&conn, &tx).unwrap();

        assert!(dishes::delete_dish(&conn, dish_id).unwrap());

        let row = get_transaction(&conn, id).unwrap().unwrap();
        assert_eq!(row.transaction.dish_id, None);
        assert!(row.dish.is_none());
        assert!(delete_transaction(&conn, id).unwrap());
        assert!(get_transaction(&conn, id).unwrap().is_none());
    }
}
