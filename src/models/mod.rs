pub mod category;
pub mod dish;
pub mod month;
pub mod transaction;
pub mod worker;

pub use category::{Category, UNCATEGORIZED};
pub use dish::{Dish, DishKind, DishWithCategory, NewDish};
pub use month::MonthKey;
pub use transaction::{
    DishRef, NewTransaction, Transaction, TransactionKind, TransactionWithDish, TIMESTAMP_FORMAT,
};
pub use worker::{NewWorker, Worker};
