use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Expense, Month};

/// Filter set applied to the flat expense list. Empty lists and `None` bounds match everything.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ExpenseFilters {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub categories: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub payment_methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total: f64,
    pub average: f64,
    pub category_totals: BTreeMap<String, f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: String,
    pub total: f64,
    pub by_category: BTreeMap<String, f64>,
    pub expense_count: usize,
    pub average_expense: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySummary {
    pub year: String,
    pub total: f64,
    pub by_category: BTreeMap<String, f64>,
    pub by_month: BTreeMap<Month, f64>,
    pub expense_count: usize,
    pub average_expense: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeDetails {
    pub total_income: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseMonthGroup {
    #[serde(default)]
    pub income_details: IncomeDetails,
    #[serde(default, rename = "expense_details")]
    pub expense_details: Vec<Expense>,
}

pub type GroupedExpenses = BTreeMap<String, BTreeMap<Month, ExpenseMonthGroup>>;

pub fn expense_date(expense: &Expense) -> Option<NaiveDate> {
    let raw = expense.date.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn date_key(raw: &str) -> &str {
    let raw = raw.trim();
    raw.get(..10).unwrap_or(raw)
}

pub fn filter_expenses<'a>(expenses: &'a [Expense], filters: &ExpenseFilters) -> Vec<&'a Expense> {
    let search = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .map(str::to_lowercase);
    let start = filters.start_date.as_deref().map(date_key).filter(|d| !d.is_empty());
    let end = filters.end_date.as_deref().map(date_key).filter(|d| !d.is_empty());

    expenses
        .iter()
        .filter(|expense| filters.min_amount.map_or(true, |min| expense.amount >= min))
        .filter(|expense| filters.max_amount.map_or(true, |max| expense.amount <= max))
        .filter(|expense| {
            filters.categories.is_empty() || filters.categories.contains(&expense.category)
        })
        .filter(|expense| start.map_or(true, |start| date_key(&expense.date) >= start))
        .filter(|expense| end.map_or(true, |end| date_key(&expense.date) <= end))
        .filter(|expense| {
            search
                .as_ref()
                .map_or(true, |query| expense.description.to_lowercase().contains(query))
        })
        .filter(|expense| {
            filters.payment_methods.is_empty()
                || filters.payment_methods.contains(&expense.payment_method)
        })
        .collect()
}

pub fn summary_stats(expenses: &[&Expense]) -> SummaryStats {
    let mut stats = SummaryStats {
        count: expenses.len(),
        ..SummaryStats::default()
    };
    for expense in expenses {
        stats.total += expense.amount;
        *stats
            .category_totals
            .entry(expense.category.clone())
            .or_default() += expense.amount;
    }
    if stats.count > 0 {
        stats.average = stats.total / stats.count as f64;
    }
    stats
}

/// Expenses at or above `multiplier` times the average of the given view.
pub fn detect_anomalies<'a>(expenses: &[&'a Expense], multiplier: f64) -> Vec<&'a Expense> {
    if expenses.is_empty() {
        return Vec::new();
    }
    let average = expenses.iter().map(|expense| expense.amount).sum::<f64>() / expenses.len() as f64;
    if average <= 0.0 {
        return Vec::new();
    }
    let threshold = average * multiplier;
    expenses
        .iter()
        .copied()
        .filter(|expense| expense.amount >= threshold)
        .collect()
}

/// Summaries keyed "Month YYYY", in calendar order. Undated expenses are skipped.
pub fn monthly_summaries(expenses: &[&Expense]) -> Vec<MonthlySummary> {
    let mut buckets: BTreeMap<(i32, Month), Vec<&Expense>> = BTreeMap::new();
    for &expense in expenses {
        let Some(date) = expense_date(expense) else {
            continue;
        };
        let Some(month) = Month::from_number(date.month()) else {
            continue;
        };
        buckets.entry((date.year(), month)).or_default().push(expense);
    }

    buckets
        .into_iter()
        .map(|((year, month), items)| {
            let stats = summary_stats(&items);
            MonthlySummary {
                month: format!("{month} {year}"),
                total: stats.total,
                by_category: stats.category_totals,
                expense_count: stats.count,
                average_expense: stats.average,
            }
        })
        .collect()
}

pub fn yearly_summaries(expenses: &[&Expense]) -> Vec<YearlySummary> {
    let mut buckets: BTreeMap<i32, Vec<(Month, &Expense)>> = BTreeMap::new();
    for &expense in expenses {
        let Some(date) = expense_date(expense) else {
            continue;
        };
        let Some(month) = Month::from_number(date.month()) else {
            continue;
        };
        buckets.entry(date.year()).or_default().push((month, expense));
    }

    buckets
        .into_iter()
        .map(|(year, items)| {
            let mut by_month: BTreeMap<Month, f64> = BTreeMap::new();
            for (month, expense) in &items {
                *by_month.entry(*month).or_default() += expense.amount;
            }
            let stats = summary_stats(&items.iter().map(|(_, expense)| *expense).collect::<Vec<_>>());
            YearlySummary {
                year: year.to_string(),
                total: stats.total,
                by_category: stats.category_totals,
                by_month,
                expense_count: stats.count,
                average_expense: stats.average,
            }
        })
        .collect()
}

pub fn categories(expenses: &[Expense]) -> Vec<String> {
    distinct(expenses.iter().map(|expense| expense.category.as_str()))
}

pub fn payment_methods(expenses: &[Expense]) -> Vec<String> {
    distinct(expenses.iter().map(|expense| expense.payment_method.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(ToOwned::to_owned)
        .collect()
}

/// `year → month → {incomeDetails, expense_details}`. `income` supplies the
/// month's income figure.
pub fn group_by_year_month<F>(expenses: &[Expense], income: F) -> GroupedExpenses
where
    F: Fn(i32, Month) -> f64,
{
    let mut grouped = GroupedExpenses::new();
    for expense in expenses {
        let Some(date) = expense_date(expense) else {
            continue;
        };
        let Some(month) = Month::from_number(date.month()) else {
            continue;
        };
        grouped
            .entry(date.year().to_string())
            .or_default()
            .entry(month)
            .or_insert_with(|| ExpenseMonthGroup {
                income_details: IncomeDetails {
                    total_income: income(date.year(), month),
                },
                expense_details: Vec::new(),
            })
            .expense_details
            .push(expense.clone());
    }
    grouped
}

pub fn flatten_expenses(grouped: &GroupedExpenses) -> Vec<Expense> {
    grouped
        .values()
        .flat_map(|months| months.values())
        .flat_map(|group| group.expense_details.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        categories, detect_anomalies, filter_expenses, flatten_expenses, group_by_year_month,
        monthly_summaries, payment_methods, summary_stats, yearly_summaries, ExpenseFilters,
    };
    use crate::models::{Expense, Month};

    fn expense(date: &str, amount: f64, category: &str, description: &str, method: &str) -> Expense {
        Expense {
            id: None,
            date: date.to_string(),
            amount,
            category: category.to_string(),
            description: description.to_string(),
            sub_category: String::new(),
            payment_method: method.to_string(),
            tags: Vec::new(),
        }
    }

    fn expenses() -> Vec<Expense> {
        vec![
            expense("2024-01-05", 100.0, "Food", "Groceries", "UPI"),
            expense("2024-01-20", 200.0, "Travel", "Bus pass", "Cash"),
            expense("2024-02-03", 150.0, "Food", "Dinner out", "UPI"),
            expense("2023-12-31", 50.0, "Utilities", "Water bill", "Card"),
            expense("2024-02-14", 1500.0, "Gifts", "Anniversary GIFT", "Card"),
        ]
    }

    #[test]
    fn filters_combine() {
        let all = expenses();
        let filters = ExpenseFilters {
            categories: vec!["Food".to_string()],
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            ..ExpenseFilters::default()
        };
        let matched = filter_expenses(&all, &filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].description, "Groceries");

        let search = ExpenseFilters {
            search: Some("gift".to_string()),
            payment_methods: vec!["Card".to_string()],
            min_amount: Some(1000.0),
            ..ExpenseFilters::default()
        };
        assert_eq!(filter_expenses(&all, &search).len(), 1);
        assert_eq!(filter_expenses(&all, &ExpenseFilters::default()).len(), 5);
    }

    #[test]
    fn summary_and_anomalies() {
        let all = expenses();
        let view = filter_expenses(&all, &ExpenseFilters::default());
        let stats = summary_stats(&view);
        assert_eq!(stats.total, 2000.0);
        assert_eq!(stats.average, 400.0);
        assert_eq!(stats.category_totals["Food"], 250.0);

        let anomalies = detect_anomalies(&view, 3.0);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].amount, 1500.0);
        assert!(detect_anomalies(&[], 3.0).is_empty());
        assert_eq!(summary_stats(&[]).average, 0.0);
    }

    #[test]
    fn zero_amounts_are_never_anomalies() {
        let free = [
            expense("2024-01-05", 0.0, "Food", "Samples", "Cash"),
            expense("2024-01-06", 0.0, "Food", "Samples", "Cash"),
        ];
        let view = free.iter().collect::<Vec<_>>();
        assert!(detect_anomalies(&view, 3.0).is_empty());
    }

    #[test]
    fn monthly_and_yearly_summaries() {
        let all = expenses();
        let view = filter_expenses(&all, &ExpenseFilters::default());
        let monthly = monthly_summaries(&view);
        let labels = monthly.iter().map(|m| m.month.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["December 2023", "January 2024", "February 2024"]);
        assert_eq!(monthly[1].expense_count, 2);
        assert_eq!(monthly[1].average_expense, 150.0);

        let yearly = yearly_summaries(&view);
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[1].year, "2024");
        assert_eq!(yearly[1].by_month[&Month::February], 1650.0);
        assert_eq!(yearly[1].by_category["Food"], 250.0);
    }

    #[test]
    fn distinct_categories_and_methods() {
        let all = expenses();
        assert_eq!(categories(&all), vec!["Food", "Gifts", "Travel", "Utilities"]);
        assert_eq!(payment_methods(&all), vec!["Card", "Cash", "UPI"]);
    }

    #[test]
    fn grouping_flattens_back() {
        let all = expenses();
        let grouped = group_by_year_month(&all, |year, month| {
            if year == 2024 && month == Month::January {
                3400.0
            } else {
                0.0
            }
        });
        assert_eq!(grouped["2024"][&Month::January].expense_details.len(), 2);
        assert_eq!(
            grouped["2024"][&Month::January].income_details.total_income,
            3400.0
        );
        assert_eq!(flatten_expenses(&grouped).len(), all.len());

        let json = serde_json::to_value(&grouped).unwrap();
        assert!(json["2024"]["January"]["expense_details"].is_array());
        assert_eq!(json["2024"]["January"]["incomeDetails"]["totalIncome"], 3400.0);
    }
}
