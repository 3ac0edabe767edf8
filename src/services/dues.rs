use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{DuesInfo, Month, MonthlyData, RentLedgerData, ShopData};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearDues {
    pub months: Vec<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesSummary {
    pub total_pending_months: usize,
    pub total_due_amount: f64,
    pub year_breakdown: BTreeMap<String, YearDues>,
}

/// Label stored in `previousYearDues.dueMonths`, e.g. "April 2023".
pub fn due_month_label(month: Month, year: i32) -> String {
    format!("{month} {year}")
}

/// Dues for one shop as seen from `selected_year`.
///
/// The amount is the stored prior-year rollup; it is not recomputed here.
/// The month count adds the rollup's months to the current year's non-Paid
/// entries. Missing year or shop gives the zero summary.
pub fn get_dues_info(shop_number: &str, data: &RentLedgerData, selected_year: &str) -> DuesSummary {
    let Some(shop) = data.shop(selected_year, shop_number) else {
        return DuesSummary::default();
    };

    let previous = &shop.previous_year_dues;
    let current_pending = shop
        .monthly_data
        .iter()
        .filter(|(_, entry)| !entry.status.is_paid())
        .collect::<Vec<_>>();

    let bare_label_year = selected_year
        .trim()
        .parse::<i32>()
        .map(|year| (year - 1).to_string())
        .unwrap_or_else(|_| "previous".to_string());

    let mut year_breakdown: BTreeMap<String, YearDues> = BTreeMap::new();
    for label in &previous.due_months {
        let year = label_year(label).unwrap_or_else(|| bare_label_year.clone());
        year_breakdown
            .entry(year)
            .or_default()
            .months
            .push(label.clone());
    }
    fill_prior_amounts(&mut year_breakdown, data, shop_number, previous.total_dues);

    if !current_pending.is_empty() {
        let current = year_breakdown.entry(selected_year.to_string()).or_default();
        for (month, entry) in &current_pending {
            current.months.push(month.to_string());
            current.amount += entry.outstanding(shop.rent_amount);
        }
    }

    DuesSummary {
        total_pending_months: previous.due_months.len() + current_pending.len(),
        total_due_amount: previous.total_dues,
        year_breakdown,
    }
}

/// Per-year amounts for the rollup groups. Loaded years are summed from their
/// months; a single unloaded group takes whatever the rollup total leaves.
fn fill_prior_amounts(
    breakdown: &mut BTreeMap<String, YearDues>,
    data: &RentLedgerData,
    shop_number: &str,
    rollup_total: f64,
) {
    let mut resolved = 0.0;
    let mut unresolved = Vec::new();

    for (year, group) in breakdown.iter_mut() {
        let Some(shop) = data.shop(year, shop_number) else {
            unresolved.push(year.clone());
            continue;
        };
        group.amount = group
            .months
            .iter()
            .filter_map(|label| label_month(label))
            .filter_map(|month| shop.monthly_data.get(&month))
            .filter(|entry| !entry.status.is_paid())
            .map(|entry| entry.outstanding(shop.rent_amount))
            .sum();
        resolved += group.amount;
    }

    if let [year] = unresolved.as_slice() {
        if let Some(group) = breakdown.get_mut(year) {
            group.amount = (rollup_total - resolved).max(0.0);
        }
    }
}

fn label_year(label: &str) -> Option<String> {
    let (_, year) = label.trim().rsplit_once(' ')?;
    year.parse::<i32>().ok().map(|year| year.to_string())
}

fn label_month(label: &str) -> Option<Month> {
    label.split_whitespace().next()?.parse().ok()
}

/// Σ rent − Σ paid over the year's entries, never negative.
pub fn calculate_current_year_dues(monthly_data: &BTreeMap<Month, MonthlyData>) -> f64 {
    let (rent, paid) = monthly_data
        .values()
        .fold((0.0, 0.0), |(rent, paid), entry| {
            (rent + entry.rent, paid + entry.paid)
        });
    (rent - paid).max(0.0)
}

pub fn calculate_total_dues(shop: &ShopData) -> f64 {
    calculate_current_year_dues(&shop.monthly_data) + shop.previous_year_dues.total_dues
}

/// Rebuild the prior-year rollup for `shop_number` as seen from `year`,
/// scanning every loaded year before it for non-Paid months.
pub fn rollup_unpaid_before(data: &RentLedgerData, shop_number: &str, year: i32) -> DuesInfo {
    let mut rollup = DuesInfo::default();
    add_unpaid_between(&mut rollup, data, shop_number, i32::MIN, year);
    rollup
}

/// Append the non-Paid months of loaded years in `[start, end)` to `rollup`.
fn add_unpaid_between(
    rollup: &mut DuesInfo,
    data: &RentLedgerData,
    shop_number: &str,
    start: i32,
    end: i32,
) {
    for (loaded_year, key) in data.sorted_years() {
        if loaded_year < start {
            continue;
        }
        if loaded_year >= end {
            break;
        }
        let Some(shop) = data.shop(&key, shop_number) else {
            continue;
        };
        for (month, entry) in &shop.monthly_data {
            if entry.status.is_paid() {
                continue;
            }
            rollup.total_dues += entry.outstanding(shop.rent_amount);
            rollup.due_months.push(due_month_label(*month, loaded_year));
        }
    }

    rollup.description = if rollup.due_months.is_empty() {
        String::new()
    } else {
        format!(
            "{} pending month(s) from previous years",
            rollup.due_months.len()
        )
    };
}

/// Recompute the stored dues fields of `shop_number` for `from_year` and
/// every later loaded year, rebuilding each rollup from loaded data.
pub fn refresh_shop_dues(data: &mut RentLedgerData, shop_number: &str, from_year: i32) {
    let rollups = data
        .sorted_years()
        .into_iter()
        .filter(|(year, _)| *year >= from_year)
        .map(|(year, key)| (key, Some(rollup_unpaid_before(data, shop_number, year))))
        .collect::<Vec<_>>();
    store_dues(data, shop_number, rollups);
}

/// Refresh after one month of `year` changed.
///
/// `year` keeps its stored prior-year rollup, which only depends on earlier
/// years; its current-year fields and balance are refreshed. Each later
/// loaded year gets that rollup plus the unpaid months of loaded years from
/// `year` up to it.
pub fn refresh_after_month_edit(data: &mut RentLedgerData, shop_number: &str, year: i32) {
    let base = data
        .shop(&year.to_string(), shop_number)
        .map(|shop| shop.previous_year_dues.clone())
        .unwrap_or_else(|| rollup_unpaid_before(data, shop_number, year));

    let rollups = data
        .sorted_years()
        .into_iter()
        .filter(|(loaded_year, _)| *loaded_year >= year)
        .map(|(loaded_year, key)| {
            if loaded_year == year {
                return (key, None);
            }
            let mut rollup = base.clone();
            add_unpaid_between(&mut rollup, data, shop_number, year, loaded_year);
            (key, Some(rollup))
        })
        .collect::<Vec<_>>();
    store_dues(data, shop_number, rollups);
}

/// Write each year's rollup (when given) and its current-year dues.
fn store_dues(
    data: &mut RentLedgerData,
    shop_number: &str,
    rollups: Vec<(String, Option<DuesInfo>)>,
) {
    for (key, rollup) in rollups {
        let Some(shop) = data.shop_mut(&key, shop_number) else {
            continue;
        };
        if let Some(rollup) = rollup {
            shop.previous_year_dues = rollup;
        }

        let current = calculate_current_year_dues(&shop.monthly_data);
        shop.current_year_dues = DuesInfo {
            total_dues: current,
            due_months: shop
                .monthly_data
                .iter()
                .filter(|(_, entry)| !entry.status.is_paid())
                .map(|(month, _)| month.to_string())
                .collect(),
            description: String::new(),
        };
        shop.total_dues_balance = current + shop.previous_year_dues.total_dues;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        calculate_current_year_dues, calculate_total_dues, get_dues_info, refresh_after_month_edit,
        refresh_shop_dues, rollup_unpaid_before,
    };
    use crate::models::{
        DuesInfo, Month, MonthlyData, PaymentStatus, RentLedgerData, ShopData, YearData,
    };

    fn month(rent: f64, paid: f64, status: PaymentStatus) -> MonthlyData {
        MonthlyData {
            rent,
            paid,
            status,
            ..MonthlyData::default()
        }
    }

    fn shop_paid_through(rent: f64, paid_months: usize) -> ShopData {
        let mut shop = ShopData {
            rent_amount: rent,
            ..ShopData::default()
        };
        for (index, m) in Month::ALL.into_iter().enumerate() {
            let entry = if index < paid_months {
                month(rent, rent, PaymentStatus::Paid)
            } else {
                month(rent, 0.0, PaymentStatus::Pending)
            };
            shop.monthly_data.insert(m, entry);
        }
        shop
    }

    fn ledger(years: Vec<(&str, ShopData)>) -> RentLedgerData {
        let mut data = RentLedgerData::default();
        for (year, shop) in years {
            data.years.insert(
                year.to_string(),
                YearData {
                    shops: BTreeMap::from([("1".to_string(), shop)]),
                },
            );
        }
        data
    }

    #[test]
    fn missing_year_or_shop_is_zero() {
        let data = ledger(vec![("2024", shop_paid_through(3400.0, 12))]);
        assert_eq!(get_dues_info("1", &data, "2023"), Default::default());
        assert_eq!(get_dues_info("9", &data, "2024"), Default::default());
    }

    #[test]
    fn pending_count_adds_rollup_months_to_current_non_paid() {
        let mut shop = shop_paid_through(3400.0, 3);
        shop.previous_year_dues = DuesInfo {
            total_dues: 6800.0,
            due_months: vec!["April".to_string(), "May".to_string()],
            description: String::new(),
        };
        let data = ledger(vec![("2024", shop)]);

        let dues = get_dues_info("1", &data, "2024");
        assert_eq!(dues.total_pending_months, 2 + 9);
        assert_eq!(dues.total_due_amount, 6800.0);

        let prior = &dues.year_breakdown["2023"];
        assert_eq!(prior.months, vec!["April", "May"]);
        assert_eq!(prior.amount, 6800.0);
        let current = &dues.year_breakdown["2024"];
        assert_eq!(current.months.len(), 9);
        assert_eq!(current.amount, 9.0 * 3400.0);
    }

    #[test]
    fn loaded_prior_years_report_their_own_amounts() {
        let mut older = shop_paid_through(3000.0, 12);
        older
            .monthly_data
            .insert(Month::December, month(3000.0, 1000.0, PaymentStatus::Partial));
        let mut current = shop_paid_through(3400.0, 12);
        current.previous_year_dues = DuesInfo {
            total_dues: 2000.0,
            due_months: vec!["December 2023".to_string()],
            description: String::new(),
        };
        let data = ledger(vec![("2023", older), ("2024", current)]);

        let dues = get_dues_info("1", &data, "2024");
        assert_eq!(dues.total_pending_months, 1);
        assert_eq!(dues.year_breakdown["2023"].amount, 2000.0);
        assert!(!dues.year_breakdown.contains_key("2024"));
    }

    #[test]
    fn rollup_scans_all_earlier_years() {
        let data = ledger(vec![
            ("2022", shop_paid_through(3000.0, 11)),
            ("2023", shop_paid_through(3400.0, 10)),
            ("2024", shop_paid_through(3400.0, 0)),
        ]);
        let rollup = rollup_unpaid_before(&data, "1", 2024);
        assert_eq!(rollup.total_dues, 3000.0 + 2.0 * 3400.0);
        assert_eq!(
            rollup.due_months,
            vec!["December 2022", "November 2023", "December 2023"]
        );
        assert!(rollup_unpaid_before(&data, "1", 2022).due_months.is_empty());
        assert_eq!(rollup_unpaid_before(&data, "1", 2022).total_dues, 0.0);
    }

    #[test]
    fn current_and_total_dues() {
        let mut shop = shop_paid_through(3400.0, 10);
        assert_eq!(calculate_current_year_dues(&shop.monthly_data), 6800.0);
        shop.previous_year_dues.total_dues = 1000.0;
        assert_eq!(calculate_total_dues(&shop), 7800.0);
        assert_eq!(calculate_current_year_dues(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn refresh_rewrites_later_years_only() {
        let mut data = ledger(vec![
            ("2022", shop_paid_through(3000.0, 11)),
            ("2023", shop_paid_through(3400.0, 12)),
            ("2024", shop_paid_through(3400.0, 2)),
        ]);
        refresh_shop_dues(&mut data, "1", 2023);

        assert_eq!(data.shop("2022", "1").unwrap().previous_year_dues, DuesInfo::default());
        assert_eq!(data.shop("2022", "1").unwrap().total_dues_balance, 0.0);
        let y2023 = data.shop("2023", "1").unwrap();
        assert_eq!(y2023.previous_year_dues.due_months, vec!["December 2022"]);
        assert_eq!(y2023.total_dues_balance, 3000.0);
        let y2024 = data.shop("2024", "1").unwrap();
        assert_eq!(y2024.previous_year_dues.total_dues, 3000.0);
        assert_eq!(y2024.current_year_dues.total_dues, 10.0 * 3400.0);
        assert_eq!(y2024.current_year_dues.due_months.len(), 10);
        assert_eq!(y2024.total_dues_balance, 3000.0 + 34000.0);
    }

    #[test]
    fn month_edit_keeps_stored_rollup_of_unloaded_years() {
        let mut current = shop_paid_through(3400.0, 1);
        current.previous_year_dues = DuesInfo {
            total_dues: 6800.0,
            due_months: vec!["April 2023".to_string(), "May 2023".to_string()],
            description: "2 pending month(s) from previous years".to_string(),
        };
        let mut next = shop_paid_through(3400.0, 12);
        next.previous_year_dues = DuesInfo::default();
        let mut data = ledger(vec![("2024", current), ("2025", next)]);

        refresh_after_month_edit(&mut data, "1", 2024);

        let y2024 = data.shop("2024", "1").unwrap();
        assert_eq!(y2024.previous_year_dues.total_dues, 6800.0);
        assert_eq!(y2024.total_dues_balance, 6800.0 + 11.0 * 3400.0);
        assert_eq!(get_dues_info("1", &data, "2024").total_due_amount, 6800.0);

        let y2025 = data.shop("2025", "1").unwrap();
        assert_eq!(y2025.previous_year_dues.total_dues, 6800.0 + 11.0 * 3400.0);
        assert_eq!(y2025.previous_year_dues.due_months.len(), 2 + 11);
        assert_eq!(y2025.previous_year_dues.due_months[0], "April 2023");
    }
}
