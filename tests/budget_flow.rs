mod common;

use chrono::NaiveDate;
use insta::assert_snapshot;
use uuid::Uuid;

use hearth_core::{
    AccountService, BudgetService, CoreError, ExceptionStatus, ExceptionResolver, HouseholdStore,
    TransactionService,
};
use hearth_domain::{
    AccountKind, Budget, CategoryKey, TransactionRequest, TransactionType,
};

use common::{open_store, test_home};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn key(raw: &str) -> CategoryKey {
    CategoryKey::parse(raw).unwrap()
}

struct Household {
    store: hearth_storage_json::JsonHouseholdStore,
    person_id: Uuid,
    account_id: Uuid,
    user_id: Uuid,
}

fn household(anchor_day: u32) -> Household {
    let home = test_home();
    let store = open_store(&home);
    let user_id = Uuid::new_v4();
    let person = AccountService::add_person(&store, "Ana", user_id, anchor_day).unwrap();
    let account =
        AccountService::add_account(&store, "Main", AccountKind::Checking, user_id).unwrap();
    Household {
        store,
        person_id: person.id,
        account_id: account.id,
        user_id,
    }
}

fn spend(hh: &Household, day: NaiveDate, amount: f64, category: &str) {
    TransactionService::record(
        &hh.store,
        TransactionRequest {
            description: format!("{category} on {day}"),
            amount,
            kind: TransactionType::Expense,
            category: key(category),
            account_id: hh.account_id,
            user_id: hh.user_id,
            person_id: Some(hh.person_id),
            date: day,
            series_id: None,
        },
    )
    .unwrap();
}

#[test]
fn current_period_report_json() {
    let hh = household(27);
    let mut budget = Budget::new(
        "Food",
        400.0,
        [key("groceries"), key("dining")],
        hh.person_id,
    );
    budget.id = Uuid::nil();
    hh.store.insert_budget(budget).unwrap();

    spend(&hh, date(2024, 2, 26), 75.0, "groceries");
    spend(&hh, date(2024, 2, 27), 40.0, "dining");
    spend(&hh, date(2024, 3, 1), 60.0, "groceries");
    spend(&hh, date(2024, 3, 2), 20.0, "transport");
    spend(&hh, date(2024, 3, 20), 9.0, "dining");

    let report = BudgetService::current_report(&hh.store, hh.person_id, date(2024, 3, 15)).unwrap();
    let json = serde_json::to_string_pretty(&report.periods[0]).unwrap();
    assert_snapshot!("current_period_report", json);
}

#[test]
fn exception_lifecycle_across_periods() {
    let hh = household(27);
    let (exception, preview) = BudgetService::create_exception(
        &hh.store,
        hh.person_id,
        date(2024, 3, 20),
        Some("early payday".into()),
        date(2024, 3, 15),
    )
    .unwrap();
    assert_eq!(preview.shift.truncated.end, date(2024, 3, 20));

    // Inside the following period, which still ends the day before the next anchor.
    let err = BudgetService::preview_exception(
        &hh.store,
        hh.person_id,
        date(2024, 4, 10),
        date(2024, 3, 25),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CoreError::ExceptionAlreadyOpen { open_until } if open_until == date(2024, 3, 26)
    ));
    let resolved =
        BudgetService::resolve_for_person(&hh.store, hh.person_id, date(2024, 3, 25)).unwrap();
    assert_eq!(resolved.current.start, date(2024, 3, 21));
    assert_eq!(resolved.current.end, date(2024, 3, 26));
    assert_eq!(resolved.next.start, date(2024, 3, 27));

    // Once consumed the normal cadence returns and a new exception is allowed.
    let later = date(2024, 5, 1);
    assert_eq!(
        ExceptionResolver::exception_status(27, later, &exception),
        ExceptionStatus::Consumed
    );
    let resolved = BudgetService::resolve_for_person(&hh.store, hh.person_id, later).unwrap();
    assert_eq!(resolved.current.start, date(2024, 4, 27));
    assert!(resolved.can_add_exception);

    let history =
        BudgetService::period_history(&hh.store, hh.person_id, date(2024, 2, 1), date(2024, 5, 30))
            .unwrap();
    let starts: Vec<_> = history.iter().map(|window| window.start).collect();
    assert_eq!(
        starts,
        vec![
            date(2024, 1, 27),
            date(2024, 2, 27),
            date(2024, 3, 21),
            date(2024, 3, 27),
            date(2024, 4, 27),
            date(2024, 5, 27),
        ]
    );
}
