use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Month, ShopData, TenantStatus, YearData};
use crate::services::shop_numbers::compare_shop_numbers;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_shops: usize,
    pub active_shops: usize,
    pub inactive_shops: usize,
    pub total_rent_collected: f64,
    pub total_dues: f64,
    pub total_advance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueShop {
    pub shop_number: String,
    pub tenant_name: String,
    pub tenant_status: Option<TenantStatus>,
    pub rent_amount: f64,
    pub total_dues: f64,
    pub due_months: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCollection {
    pub month: &'static str,
    pub full_month: Month,
    pub collected: f64,
    pub expected: f64,
    pub dues: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub total_collected: f64,
    pub total_dues: f64,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStatusDistribution {
    pub active_shops: usize,
    pub inactive_shops: usize,
    pub shops_with_dues: usize,
    pub shops_without_dues: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatePoint {
    pub month: &'static str,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionGraphs {
    pub monthly: Vec<MonthlyCollection>,
    pub summary: CollectionSummary,
    pub status_distribution: ShopStatusDistribution,
    pub collection_rate_trend: Vec<RatePoint>,
}

fn collected(shop: &ShopData) -> f64 {
    shop.monthly_data.values().map(|entry| entry.paid).sum()
}

pub fn dashboard_stats(year: &YearData) -> DashboardStats {
    let total_shops = year.shops.len();
    let active_shops = year.shops.values().filter(|shop| shop.is_active()).count();

    DashboardStats {
        total_shops,
        active_shops,
        inactive_shops: total_shops - active_shops,
        total_rent_collected: year.shops.values().map(collected).sum(),
        total_dues: year
            .shops
            .values()
            .map(|shop| shop.previous_year_dues.total_dues)
            .sum(),
        total_advance: year.shops.values().map(|shop| shop.advance_amount).sum(),
    }
}

/// Shops carrying prior-year dues, largest first.
pub fn overdue_shops(year: &YearData, include_inactive: bool) -> Vec<OverdueShop> {
    let mut overdue = year
        .shops
        .iter()
        .filter(|(_, shop)| shop.previous_year_dues.total_dues > 0.0)
        .filter(|(_, shop)| include_inactive || shop.is_active())
        .map(|(number, shop)| OverdueShop {
            shop_number: number.clone(),
            tenant_name: shop.tenant_name().to_string(),
            tenant_status: shop.tenant_status(),
            rent_amount: shop.rent_amount,
            total_dues: shop.previous_year_dues.total_dues,
            due_months: shop.previous_year_dues.due_months.clone(),
        })
        .collect::<Vec<_>>();

    overdue.sort_by(|left, right| {
        right
            .total_dues
            .total_cmp(&left.total_dues)
            .then_with(|| compare_shop_numbers(&left.shop_number, &right.shop_number))
    });
    overdue
}

/// The current year stops at the current month; other years show all twelve.
pub fn months_to_show(year: i32, today: NaiveDate) -> Vec<Month> {
    if year == today.year() {
        Month::from_number(today.month())
            .map(|month| month.up_to().collect())
            .unwrap_or_else(|| Month::ALL.to_vec())
    } else {
        Month::ALL.to_vec()
    }
}

/// Collected, expected and dues per month. A month with no entry counts its
/// full shop rent as due.
pub fn monthly_collections(year: &YearData, months: &[Month]) -> Vec<MonthlyCollection> {
    months
        .iter()
        .map(|&month| {
            let mut row = MonthlyCollection {
                month: month.short_name(),
                full_month: month,
                collected: 0.0,
                expected: 0.0,
                dues: 0.0,
            };
            for shop in year.shops.values() {
                match shop.monthly_data.get(&month) {
                    Some(entry) => {
                        let rent = entry.effective_rent(shop.rent_amount);
                        row.collected += entry.paid;
                        row.expected += rent;
                        row.dues += (rent - entry.paid).max(0.0);
                    }
                    None => {
                        row.expected += shop.rent_amount;
                        row.dues += shop.rent_amount;
                    }
                }
            }
            row
        })
        .collect()
}

/// Rate is collected over collected plus prior-year dues, in percent.
pub fn collection_summary(year: &YearData) -> CollectionSummary {
    let stats = dashboard_stats(year);
    let base = stats.total_rent_collected + stats.total_dues;
    CollectionSummary {
        total_collected: stats.total_rent_collected,
        total_dues: stats.total_dues,
        collection_rate: percent(stats.total_rent_collected, base),
    }
}

pub fn status_distribution(year: &YearData) -> ShopStatusDistribution {
    let total = year.shops.len();
    let active_shops = year.shops.values().filter(|shop| shop.is_active()).count();
    let shops_with_dues = year
        .shops
        .values()
        .filter(|shop| shop.previous_year_dues.total_dues > 0.0)
        .count();
    ShopStatusDistribution {
        active_shops,
        inactive_shops: total - active_shops,
        shops_with_dues,
        shops_without_dues: total - shops_with_dues,
    }
}

/// Running collected / expected, month by month.
pub fn collection_rate_trend(monthly: &[MonthlyCollection]) -> Vec<RatePoint> {
    let mut cumulative_collected = 0.0;
    let mut cumulative_expected = 0.0;
    monthly
        .iter()
        .map(|row| {
            cumulative_collected += row.collected;
            cumulative_expected += row.expected;
            RatePoint {
                month: row.month,
                rate: percent(cumulative_collected, cumulative_expected),
            }
        })
        .collect()
}

pub fn collection_graphs(year_data: &YearData, year: i32, today: NaiveDate) -> CollectionGraphs {
    let monthly = monthly_collections(year_data, &months_to_show(year, today));
    let collection_rate_trend = collection_rate_trend(&monthly);
    CollectionGraphs {
        monthly,
        summary: collection_summary(year_data),
        status_distribution: status_distribution(year_data),
        collection_rate_trend,
    }
}

pub(crate) fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        collection_graphs, dashboard_stats, months_to_show, monthly_collections, overdue_shops,
    };
    use crate::models::{
        DuesInfo, Month, MonthlyData, PaymentStatus, ShopData, Tenant, TenantStatus, YearData,
    };

    fn shop(status: TenantStatus, rent: f64, dues: f64, paid_months: usize) -> ShopData {
        let tenant = Tenant {
            name: "Tenant".to_string(),
            status,
            ..Tenant::default()
        };
        let mut shop = ShopData::with_pending_year(tenant, rent, 10000.0);
        for month in Month::ALL.into_iter().take(paid_months) {
            shop.monthly_data.insert(
                month,
                MonthlyData {
                    rent,
                    paid: rent,
                    status: PaymentStatus::Paid,
                    ..MonthlyData::default()
                },
            );
        }
        shop.previous_year_dues = DuesInfo {
            total_dues: dues,
            ..DuesInfo::default()
        };
        shop
    }

    fn year() -> YearData {
        YearData {
            shops: [
                ("1", shop(TenantStatus::Active, 3000.0, 500.0, 2)),
                ("2", shop(TenantStatus::Inactive, 4000.0, 9000.0, 0)),
                ("3", shop(TenantStatus::Active, 2000.0, 7000.0, 1)),
                ("10", shop(TenantStatus::Active, 1000.0, 0.0, 0)),
            ]
            .into_iter()
            .map(|(number, shop)| (number.to_string(), shop))
            .collect(),
        }
    }

    #[test]
    fn stats_sum_paid_dues_and_advance() {
        let stats = dashboard_stats(&year());
        assert_eq!(stats.total_shops, 4);
        assert_eq!(stats.active_shops, 3);
        assert_eq!(stats.inactive_shops, 1);
        assert_eq!(stats.total_rent_collected, 6000.0 + 2000.0);
        assert_eq!(stats.total_dues, 16500.0);
        assert_eq!(stats.total_advance, 40000.0);
    }

    #[test]
    fn overdue_list_sorted_descending_and_filtered() {
        let active_only = overdue_shops(&year(), false)
            .into_iter()
            .map(|shop| shop.shop_number)
            .collect::<Vec<_>>();
        assert_eq!(active_only, vec!["3", "1"]);

        let all = overdue_shops(&year(), true)
            .into_iter()
            .map(|shop| shop.shop_number)
            .collect::<Vec<_>>();
        assert_eq!(all, vec!["2", "3", "1"]);
    }

    #[test]
    fn current_year_months_stop_at_today() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();
        assert_eq!(
            months_to_show(2024, today),
            vec![Month::January, Month::February, Month::March, Month::April]
        );
        assert_eq!(months_to_show(2023, today).len(), 12);
    }

    #[test]
    fn missing_month_counts_full_rent_as_due() {
        let mut year = year();
        year.shops
            .get_mut("10")
            .unwrap()
            .monthly_data
            .remove(&Month::January);
        let rows = monthly_collections(&year, &[Month::January]);
        assert_eq!(rows[0].collected, 5000.0);
        assert_eq!(rows[0].expected, 10000.0);
        assert_eq!(rows[0].dues, 5000.0);
        assert_eq!(rows[0].month, "Jan");
    }

    #[test]
    fn graphs_rates_are_percentages() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let graphs = collection_graphs(&year(), 2024, today);
        assert_eq!(graphs.monthly.len(), 2);
        assert_eq!(graphs.collection_rate_trend[0].rate, 5000.0 / 10000.0 * 100.0);
        assert_eq!(graphs.collection_rate_trend[1].rate, 8000.0 / 20000.0 * 100.0);
        assert_eq!(
            graphs.summary.collection_rate,
            8000.0 / (8000.0 + 16500.0) * 100.0
        );
        assert_eq!(graphs.status_distribution.shops_with_dues, 3);
        assert_eq!(graphs.status_distribution.shops_without_dues, 1);
    }
}
