//! Folds transactions into per-period budget reports.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use hearth_domain::{Budget, BudgetPeriod, BudgetStatus, PeriodWindow, Transaction};

pub struct PeriodAggregator;

impl PeriodAggregator {
    /// Aggregates tracked expense spending for `budget` within `window`.
    ///
    /// An ongoing window is summed up to `today` and reported without an end date.
    /// Every tracked category appears in the breakdown, even with zero spending.
    pub fn aggregate(
        window: PeriodWindow,
        today: NaiveDate,
        budget: &Budget,
        transactions: &[Transaction],
    ) -> BudgetPeriod {
        let reported_end = window.reported_end(today);
        let upper = reported_end.unwrap_or(today).min(window.end);

        let mut category_spending: BTreeMap<_, f64> = budget
            .categories
            .iter()
            .map(|category| (category.clone(), 0.0))
            .collect();
        let mut total_spent = 0.0;
        for txn in transactions.iter().filter(|txn| {
            txn.is_expense() && txn.falls_within(window.start, upper) && budget.tracks(&txn.category)
        }) {
            total_spent += txn.amount;
            *category_spending.entry(txn.category.clone()).or_insert(0.0) += txn.amount;
        }

        let percent_used = if budget.amount > 0.0 {
            Some(total_spent / budget.amount * 100.0)
        } else {
            None
        };

        BudgetPeriod {
            budget_id: budget.id,
            start_date: window.start,
            end_date: reported_end,
            is_active: window.contains(today),
            allowance: budget.amount,
            total_spent,
            total_saved: budget.amount - total_spent,
            percent_used,
            status: BudgetStatus::from_parts(budget.amount, total_spent),
            category_spending,
        }
    }

    pub fn aggregate_all(
        window: PeriodWindow,
        today: NaiveDate,
        budgets: &[Budget],
        transactions: &[Transaction],
    ) -> Vec<BudgetPeriod> {
        budgets
            .iter()
            .map(|budget| Self::aggregate(window, today, budget, transactions))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_domain::{CategoryKey, TransactionType};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key(raw: &str) -> CategoryKey {
        CategoryKey::parse(raw).unwrap()
    }

    fn txn(day: NaiveDate, amount: f64, category: &str, kind: TransactionType) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            description: "entry".into(),
            amount,
            kind,
            category: key(category),
            account_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            person_id: None,
            date: day,
            series_id: None,
            created_at: Utc::now(),
        }
    }

    fn budget(amount: f64) -> Budget {
        Budget::new(
            "Food",
            amount,
            [key("groceries"), key("dining")],
            Uuid::new_v4(),
        )
    }

    #[test]
    fn ongoing_period_sums_up_to_today() {
        let window = PeriodWindow::new(date(2024, 2, 27), date(2024, 3, 26));
        let today = date(2024, 3, 15);
        let transactions = vec![
            txn(date(2024, 2, 27), 40.0, "groceries", TransactionType::Expense),
            txn(date(2024, 3, 15), 10.0, "dining", TransactionType::Expense),
            txn(date(2024, 3, 20), 99.0, "groceries", TransactionType::Expense),
            txn(date(2024, 3, 1), 70.0, "housing", TransactionType::Expense),
            txn(date(2024, 3, 2), 500.0, "groceries", TransactionType::Income),
            txn(date(2024, 2, 26), 5.0, "groceries", TransactionType::Expense),
        ];

        let period = PeriodAggregator::aggregate(window, today, &budget(200.0), &transactions);
        assert_eq!(period.start_date, date(2024, 2, 27));
        assert_eq!(period.end_date, None);
        assert!(period.is_active);
        assert_eq!(period.total_spent, 50.0);
        assert_eq!(period.total_saved, 150.0);
        assert_eq!(period.percent_used, Some(25.0));
        assert_eq!(period.status, BudgetStatus::UnderBudget);
        assert_eq!(period.category_spending[&key("groceries")], 40.0);
        assert_eq!(period.category_spending[&key("dining")], 10.0);
        assert!(!period.category_spending.contains_key(&key("housing")));
    }

    #[test]
    fn closed_period_reports_end_and_overrun() {
        let window = PeriodWindow::new(date(2024, 2, 27), date(2024, 3, 10));
        let transactions = vec![
            txn(date(2024, 3, 10), 120.0, "groceries", TransactionType::Expense),
            txn(date(2024, 3, 11), 30.0, "groceries", TransactionType::Expense),
        ];
        let period = PeriodAggregator::aggregate(
            window,
            date(2024, 3, 15),
            &budget(100.0),
            &transactions,
        );
        assert_eq!(period.end_date, Some(date(2024, 3, 10)));
        assert!(!period.is_active);
        assert_eq!(period.total_spent, 120.0);
        assert_eq!(period.total_saved, -20.0);
        assert_eq!(period.status, BudgetStatus::OverBudget);
    }

    #[test]
    fn tracked_categories_default_to_zero() {
        let window = PeriodWindow::new(date(2024, 3, 1), date(2024, 3, 31));
        let period = PeriodAggregator::aggregate(window, date(2024, 3, 5), &budget(0.0), &[]);
        assert_eq!(period.category_spending.len(), 2);
        assert!(period.category_spending.values().all(|spent| *spent == 0.0));
        assert_eq!(period.percent_used, None);
        assert_eq!(period.status, BudgetStatus::Empty);
    }
}
