use serde::Serialize;

use crate::models::{MonthKey, Worker};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PayrollSummary {
    pub worker_count: i64,
    pub total_payment_cents: i64,
}

impl PayrollSummary {
    pub fn from_workers(workers: &[Worker]) -> Self {
        Self {
            worker_count: workers.len() as i64,
            total_payment_cents: workers.iter().map(|w| w.payment_cents).sum(),
        }
    }
}

/// Distinct months that have at least one worker, newest first.
pub fn effective_months(workers: &[Worker]) -> Vec<MonthKey> {
    let mut months: Vec<MonthKey> = workers
        .iter()
        .map(|w| MonthKey::from_date(w.effective_date))
        .collect();
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.dedup();
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn worker(id: i64, payment_cents: i64, date: (i32, u32, u32)) -> Worker {
        Worker {
            id,
            name: format!("Worker {}", id),
            designation: "Cook".into(),
            payment_cents,
            effective_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_summary_totals() {
        let workers = vec![worker(1, 1500000, (2024, 3, 1)), worker(2, 1200000, (2024, 3, 5))];
        let summary = PayrollSummary::from_workers(&workers);
        assert_eq!(summary.worker_count, 2);
        assert_eq!(summary.total_payment_cents, 2700000);
        assert_eq!(PayrollSummary::from_workers(&[]), PayrollSummary::default());
    }

    #[test]
    fn test_effective_months_newest_first_and_distinct() {
        let workers = vec![
            worker(1, 1, (2024, 1, 31)),
            worker(2, 1, (2024, 3, 1)),
            worker(3, 1, (2023, 12, 1)),
            worker(4, 1, (2024, 3, 20)),
        ];
        let keys: Vec<String> = effective_months(&workers).iter().map(|m| m.key()).collect();
        assert_eq!(keys, vec!["2024-03", "2024-01", "2023-12"]);
    }
}
