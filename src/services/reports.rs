//! Report aggregation over a snapshot of transaction and dish rows.
//!
//! Every function here is pure: handlers fetch rows once per request and
//! recompute the whole report from them.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{
    DishKind, DishWithCategory, MonthKey, TransactionKind, TransactionWithDish, UNCATEGORIZED,
};

/// Number of dishes kept by [`top_dishes`] on the reports page.
pub const TOP_DISHES_LIMIT: usize = 5;

/// Length of the trailing daily revenue window.
pub const DAILY_WINDOW_DAYS: u32 = 7;

/// Income/expense totals plus the veg/non-veg split of dish revenue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevenueSplit {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub veg_revenue_cents: i64,
    pub non_veg_revenue_cents: i64,
}

impl RevenueSplit {
    /// Income without a joined dish counts toward `income_cents` only, so
    /// the veg and non-veg totals may sum to less than the income.
    pub fn from_transactions(transactions: &[TransactionWithDish]) -> Self {
        let mut split = Self::default();

        for row in transactions {
            let amount = row.transaction.amount_cents;
            match row.transaction.kind {
                TransactionKind::Expense => split.expense_cents += amount,
                TransactionKind::Income => {
                    split.income_cents += amount;
                    match row.dish.as_ref().map(|d| d.kind) {
                        Some(DishKind::Veg) => split.veg_revenue_cents += amount,
                        Some(DishKind::NonVeg) => split.non_veg_revenue_cents += amount,
                        None => {}
                    }
                }
            }
        }

        split
    }

    pub fn profit_cents(&self) -> i64 {
        self.income_cents - self.expense_cents
    }

    pub fn dish_revenue_cents(&self) -> i64 {
        self.veg_revenue_cents + self.non_veg_revenue_cents
    }

    pub fn veg_percentage(&self) -> i64 {
        percentage(self.veg_revenue_cents, self.dish_revenue_cents())
    }

    pub fn non_veg_percentage(&self) -> i64 {
        percentage(self.non_veg_revenue_cents, self.dish_revenue_cents())
    }

    /// The two pie slices for the veg/non-veg chart, veg first.
    pub fn slices(&self) -> Vec<RevenueSlice> {
        vec![
            RevenueSlice {
                name: "Veg Items",
                kind: DishKind::Veg,
                value_cents: self.veg_revenue_cents,
                percentage: self.veg_percentage(),
            },
            RevenueSlice {
                name: "Non-Veg Items",
                kind: DishKind::NonVeg,
                value_cents: self.non_veg_revenue_cents,
                percentage: self.non_veg_percentage(),
            },
        ]
    }
}

fn percentage(part: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as i64
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueSlice {
    pub name: &'static str,
    pub kind: DishKind,
    pub value_cents: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    /// Sortable `YYYY-MM` key.
    pub month: String,
    pub label: String,
    pub income_cents: i64,
    pub expense_cents: i64,
}

/// Income and expense per calendar month, oldest month first.
///
/// Labels are short month names, or month plus year when the series spans
/// more than one year.
pub fn monthly_trends(transactions: &[TransactionWithDish]) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<MonthKey, (i64, i64)> = BTreeMap::new();

    for row in transactions {
        let key = MonthKey::from_date(row.transaction.date());
        let entry = months.entry(key).or_insert((0, 0));
        match row.transaction.kind {
            TransactionKind::Income => entry.0 += row.transaction.amount_cents,
            TransactionKind::Expense => entry.1 += row.transaction.amount_cents,
        }
    }

    let spans_years = match (months.keys().next(), months.keys().next_back()) {
        (Some(first), Some(last)) => first.year() != last.year(),
        _ => false,
    };

    months
        .into_iter()
        .map(|(key, (income_cents, expense_cents))| MonthlyBucket {
            month: key.key(),
            label: if spans_years {
                key.long_label()
            } else {
                key.short_label()
            },
            income_cents,
            expense_cents,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub label: String,
    pub revenue_cents: i64,
}

/// Income per day for the `days` days ending at `today`, oldest first.
///
/// Always returns exactly `days` buckets; days without sales are zero.
pub fn daily_revenue(
    transactions: &[TransactionWithDish],
    today: NaiveDate,
    days: u32,
) -> Vec<DailyBucket> {
    let mut buckets: Vec<DailyBucket> = (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));
            DailyBucket {
                date,
                label: date.format("%a %-d").to_string(),
                revenue_cents: 0,
            }
        })
        .collect();

    let Some(first_day) = buckets.first().map(|b| b.date) else {
        return buckets;
    };

    for row in transactions.iter().filter(|t| t.is_income()) {
        let date = row.transaction.date();
        if date < first_day || date > today {
            continue;
        }
        let index = (date - first_day).num_days() as usize;
        if let Some(bucket) = buckets.get_mut(index) {
            bucket.revenue_cents += row.transaction.amount_cents;
        }
    }

    buckets
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishSales {
    pub name: String,
    pub kind: DishKind,
    pub revenue_cents: i64,
    pub order_count: i64,
}

/// Best-selling dishes by revenue, at most `limit` entries.
///
/// Sales are grouped by dish *name*, so two distinct dishes sharing a name
/// are reported as one. Equal revenues keep the order in which the dishes
/// first appear in `transactions`.
pub fn top_dishes(transactions: &[TransactionWithDish], limit: usize) -> Vec<DishSales> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sales: Vec<DishSales> = Vec::new();

    for row in transactions.iter().filter(|t| t.is_income()) {
        let Some(dish) = row.dish.as_ref() else {
            continue;
        };

        let slot = *index.entry(dish.name.as_str()).or_insert_with(|| {
            sales.push(DishSales {
                name: dish.name.clone(),
                kind: dish.kind,
                revenue_cents: 0,
                order_count: 0,
            });
            sales.len() - 1
        });

        sales[slot].revenue_cents += row.transaction.amount_cents;
        sales[slot].order_count += row.transaction.order_count();
    }

    // stable sort keeps first-seen order among ties
    sales.sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
    sales.truncate(limit);
    sales
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRollup {
    pub name: String,
    pub dish_count: i64,
    pub veg_count: i64,
    pub non_veg_count: i64,
}

/// Dish counts per category in first-seen order. Dishes without a category
/// are counted under "Uncategorized".
pub fn category_breakdown(dishes: &[DishWithCategory]) -> Vec<CategoryRollup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rollups: Vec<CategoryRollup> = Vec::new();

    for dish in dishes {
        let name = dish
            .category_name
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let slot = match index.get(&name) {
            Some(slot) => *slot,
            None => {
                rollups.push(CategoryRollup {
                    name: name.clone(),
                    dish_count: 0,
                    veg_count: 0,
                    non_veg_count: 0,
                });
                index.insert(name, rollups.len() - 1);
                rollups.len() - 1
            }
        };

        let rollup = &mut rollups[slot];
        rollup.dish_count += 1;
        match dish.dish.kind {
            DishKind::Veg => rollup.veg_count += 1,
            DishKind::NonVeg => rollup.non_veg_count += 1,
        }
    }

    rollups
}

/// Menu composition shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MenuStats {
    pub total_dishes: i64,
    pub veg_dishes: i64,
    pub non_veg_dishes: i64,
}

impl MenuStats {
    pub fn from_dishes(dishes: &[DishWithCategory]) -> Self {
        let veg_dishes = dishes.iter().filter(|d| d.dish.kind.is_veg()).count() as i64;
        let total_dishes = dishes.len() as i64;
        Self {
            total_dishes,
            veg_dishes,
            non_veg_dishes: total_dishes - veg_dishes,
        }
    }
}

/// Everything the reports page renders.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub split: RevenueSplit,
    pub monthly: Vec<MonthlyBucket>,
    pub daily: Vec<DailyBucket>,
    pub top_dishes: Vec<DishSales>,
    pub categories: Vec<CategoryRollup>,
}

impl Report {
    pub fn build(
        transactions: &[TransactionWithDish],
        dishes: &[DishWithCategory],
        today: NaiveDate,
    ) -> Self {
        Self {
            split: RevenueSplit::from_transactions(transactions),
            monthly: monthly_trends(transactions),
            daily: daily_revenue(transactions, today, DAILY_WINDOW_DAYS),
            top_dishes: top_dishes(transactions, TOP_DISHES_LIMIT),
            categories: category_breakdown(dishes),
        }
    }

    pub fn max_monthly_cents(&self) -> i64 {
        self.monthly
            .iter()
            .map(|m| m.income_cents.max(m.expense_cents))
            .max()
            .unwrap_or(0)
    }

    pub fn max_daily_cents(&self) -> i64 {
        self.daily.iter().map(|d| d.revenue_cents).max().unwrap_or(0)
    }
}

/// Width of a bar relative to `max`, as a whole percent for inline styles.
pub fn bar_width(value: i64, max: i64) -> i64 {
    percentage(value, max).clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dish, DishRef, Transaction};
    use chrono::NaiveDateTime;

    fn ts(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn tx(
        id: i64,
        kind: TransactionKind,
        amount_cents: i64,
        dish: Option<(&str, DishKind)>,
        quantity: Option<i64>,
        date: &str,
    ) -> TransactionWithDish {
        TransactionWithDish {
            transaction: Transaction {
                id,
                kind,
                amount_cents,
                description: format!("tx {}", id),
                dish_id: dish.map(|_| id),
                quantity,
                timestamp: ts(date),
            },
            dish: dish.map(|(name, kind)| DishRef {
                name: name.to_string(),
                kind,
                category_name: None,
            }),
        }
    }

    fn income(
        id: i64,
        cents: i64,
        dish: Option<(&str, DishKind)>,
        date: &str,
    ) -> TransactionWithDish {
        tx(id, TransactionKind::Income, cents, dish, None, date)
    }

    fn expense(id: i64, cents: i64, date: &str) -> TransactionWithDish {
        tx(id, TransactionKind::Expense, cents, None, None, date)
    }

    fn dish(id: i64, kind: DishKind, category: Option<&str>) -> DishWithCategory {
        DishWithCategory {
            dish: Dish {
                id,
                name: format!("Dish {}", id),
                price_cents: 10000,
                kind,
                description: None,
                is_available: true,
                category_id: category.map(|_| 1),
                created_at: String::new(),
                updated_at: String::new(),
            },
            category_name: category.map(String::from),
            category_icon: None,
        }
    }

    fn sample() -> Vec<TransactionWithDish> {
        vec![
            income(1, 45000, Some(("Paneer Tikka", DishKind::Veg)), "2024-03-04"),
            income(2, 32000, Some(("Chicken Biryani", DishKind::NonVeg)), "2024-03-03"),
            income(3, 12000, None, "2024-02-20"),
            expense(4, 8000, "2024-02-18"),
            income(5, 20000, Some(("Paneer Tikka", DishKind::Veg)), "2024-01-10"),
            expense(6, 50000, "2023-12-31"),
            income(7, 15000, Some(("Dal Makhani", DishKind::Veg)), "2023-12-30"),
        ]
    }

    #[test]
    fn test_split_scenario() {
        let rows = vec![
            income(1, 10000, Some(("Veg Thali", DishKind::Veg)), "2024-01-01"),
            income(2, 5000, Some(("Mutton Curry", DishKind::NonVeg)), "2024-01-01"),
            expense(3, 3000, "2024-01-01"),
        ];
        let split = RevenueSplit::from_transactions(&rows);
        assert_eq!(split.income_cents, 15000);
        assert_eq!(split.expense_cents, 3000);
        assert_eq!(split.veg_revenue_cents, 10000);
        assert_eq!(split.non_veg_revenue_cents, 5000);
        assert_eq!(split.profit_cents(), 12000);
        assert_eq!(split.veg_percentage(), 67);
        assert_eq!(split.non_veg_percentage(), 33);
    }

    #[test]
    fn test_split_totals_match_partition() {
        let rows = sample();
        let split = RevenueSplit::from_transactions(&rows);

        let income: i64 = rows
            .iter()
            .filter(|r| r.is_income())
            .map(|r| r.transaction.amount_cents)
            .sum();
        let all: i64 = rows.iter().map(|r| r.transaction.amount_cents).sum();

        assert_eq!(split.income_cents, income);
        assert_eq!(split.income_cents + split.expense_cents, all);
        // income without a dish is excluded from the veg/non-veg split
        assert!(split.dish_revenue_cents() < split.income_cents);
        assert_eq!(split.income_cents - split.dish_revenue_cents(), 12000);
    }

    #[test]
    fn test_split_equal_when_every_income_has_a_dish() {
        let rows: Vec<_> = sample()
            .into_iter()
            .filter(|r| !r.is_income() || r.dish.is_some())
            .collect();
        let split = RevenueSplit::from_transactions(&rows);
        assert_eq!(split.dish_revenue_cents(), split.income_cents);
    }

    #[test]
    fn test_split_empty_has_zero_percentages() {
        let split = RevenueSplit::from_transactions(&[]);
        assert_eq!(split, RevenueSplit::default());
        assert_eq!(split.veg_percentage(), 0);
        let slices = split.slices();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "Veg Items");
    }

    #[test]
    fn test_monthly_sorted_by_key_across_years() {
        let buckets = monthly_trends(&sample());
        let keys: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-02", "2024-03"]);
        assert_eq!(buckets[0].label, "Dec 2023");
        assert_eq!(buckets[0].income_cents, 15000);
        assert_eq!(buckets[0].expense_cents, 50000);
        assert_eq!(buckets[2].income_cents, 12000);
        assert_eq!(buckets[2].expense_cents, 8000);
        assert_eq!(buckets[3].income_cents, 77000);
    }

    #[test]
    fn test_monthly_single_year_uses_short_labels() {
        let rows = vec![
            income(1, 100, None, "2024-05-02"),
            expense(2, 50, "2024-04-02"),
        ];
        let buckets = monthly_trends(&rows);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Apr", "May"]);
    }

    #[test]
    fn test_daily_window_always_has_seven_buckets() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let buckets = daily_revenue(&[], today, DAILY_WINDOW_DAYS);
        assert_eq!(buckets.len(), 7);
        assert!(buckets.iter().all(|b| b.revenue_cents == 0));
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2024, 2, 27).unwrap());
        assert_eq!(buckets[6].date, today);
        assert_eq!(buckets[6].label, "Mon 4");
    }

    #[test]
    fn test_daily_window_sums_income_inside_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut rows = sample();
        rows.push(income(8, 7000, None, "2024-02-27"));
        rows.push(income(9, 9999, None, "2024-02-26"));
        rows.push(expense(10, 4000, "2024-03-04"));

        let buckets = daily_revenue(&rows, today, DAILY_WINDOW_DAYS);
        let window_start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let expected: i64 = rows
            .iter()
            .filter(|r| r.is_income())
            .filter(|r| r.transaction.date() >= window_start && r.transaction.date() <= today)
            .map(|r| r.transaction.amount_cents)
            .sum();

        let total: i64 = buckets.iter().map(|b| b.revenue_cents).sum();
        assert_eq!(total, expected);
        assert_eq!(total, 45000 + 32000 + 7000);
        assert_eq!(buckets[0].revenue_cents, 7000);
        assert_eq!(buckets[5].revenue_cents, 32000);
        assert_eq!(buckets[6].revenue_cents, 45000);
        assert!(buckets.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_top_dishes_groups_by_name_and_counts_orders() {
        let chicken = Some(("Butter Chicken", DishKind::NonVeg));
        let dosa = Some(("Masala Dosa", DishKind::Veg));
        let day = "2024-03-01";
        let rows = vec![
            tx(1, TransactionKind::Income, 30000, chicken, Some(2), day),
            tx(2, TransactionKind::Income, 15000, chicken, None, day),
            tx(3, TransactionKind::Income, 20000, dosa, Some(4), day),
            tx(4, TransactionKind::Expense, 99999, dosa, None, day),
        ];
        let top = top_dishes(&rows, TOP_DISHES_LIMIT);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Butter Chicken");
        assert_eq!(top[0].revenue_cents, 45000);
        assert_eq!(top[0].order_count, 3);
        assert_eq!(top[1].name, "Masala Dosa");
        assert_eq!(top[1].order_count, 4);
    }

    #[test]
    fn test_top_dishes_truncates_sorted_and_unique() {
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        let rows: Vec<_> = names
            .iter()
            .enumerate()
            .flat_map(|(i, name)| {
                let cents = (i as i64 + 1) * 1000;
                vec![
                    income(i as i64 * 2, cents, Some((name, DishKind::Veg)), "2024-01-01"),
                    income(i as i64 * 2 + 1, cents, Some((name, DishKind::Veg)), "2024-01-02"),
                ]
            })
            .collect();

        let top = top_dishes(&rows, TOP_DISHES_LIMIT);
        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].revenue_cents >= w[1].revenue_cents));
        let mut unique: Vec<&str> = top.iter().map(|d| d.name.as_str()).collect();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), top.len());
        assert_eq!(top[0].name, "G");
    }

    #[test]
    fn test_top_dishes_ties_keep_first_seen_order() {
        let rows = vec![
            income(1, 5000, Some(("Idli", DishKind::Veg)), "2024-01-03"),
            income(2, 5000, Some(("Fish Fry", DishKind::NonVeg)), "2024-01-02"),
            income(3, 5000, Some(("Vada", DishKind::Veg)), "2024-01-01"),
        ];
        let names: Vec<String> = top_dishes(&rows, 5).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Idli", "Fish Fry", "Vada"]);
    }

    #[test]
    fn test_category_breakdown_counts() {
        let dishes = vec![
            dish(1, DishKind::Veg, Some("Starters")),
            dish(2, DishKind::NonVeg, Some("Starters")),
            dish(3, DishKind::NonVeg, Some("Main Course")),
            dish(4, DishKind::Veg, None),
            dish(5, DishKind::Veg, Some("Starters")),
        ];
        let rollup = category_breakdown(&dishes);

        let names: Vec<&str> = rollup.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Starters", "Main Course", "Uncategorized"]);
        assert_eq!(rollup[0].dish_count, 3);
        assert_eq!(rollup[0].veg_count, 2);
        assert_eq!(rollup[0].non_veg_count, 1);

        for c in &rollup {
            assert_eq!(c.veg_count + c.non_veg_count, c.dish_count);
        }
        let total: i64 = rollup.iter().map(|c| c.dish_count).sum();
        assert_eq!(total, dishes.len() as i64);
    }

    #[test]
    fn test_menu_stats() {
        let dishes = vec![
            dish(1, DishKind::Veg, None),
            dish(2, DishKind::NonVeg, None),
            dish(3, DishKind::Veg, None),
        ];
        let stats = MenuStats::from_dishes(&dishes);
        assert_eq!(stats.total_dishes, 3);
        assert_eq!(stats.veg_dishes, 2);
        assert_eq!(stats.non_veg_dishes, 1);
    }

    #[test]
    fn test_bar_width_clamps() {
        assert_eq!(bar_width(50, 200), 25);
        assert_eq!(bar_width(5, 0), 0);
        assert_eq!(bar_width(300, 200), 100);
    }
}
