pub mod payroll;
pub mod reports;
