use chrono::NaiveDate;
use uuid::Uuid;

use hearth_domain::{BudgetPeriod, PeriodWindow};

pub fn money(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

/// First eight hex digits of an id, enough to tell records apart on screen.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

pub fn date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn optional_date(value: Option<NaiveDate>) -> String {
    value.map(date).unwrap_or_else(|| "open".to_string())
}

pub fn window(window: &PeriodWindow) -> String {
    format!("{} .. {}", date(window.start), date(window.end))
}

pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(percent) => format!("{percent:.1}%"),
        None => "n/a".to_string(),
    }
}

pub fn period_line(label: &str, period: &BudgetPeriod, currency: &str) -> String {
    format!(
        "  {:<18} spent {:>14} of {:>14}  saved {:>14}  {:>7}  {}",
        label,
        money(period.total_spent, currency),
        money(period.allowance, currency),
        money(period.total_saved, currency),
        percent(period.percent_used),
        period.status
    )
}
