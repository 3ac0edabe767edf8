use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Month, MonthlyData, PaymentStatus, YearData};
use crate::services::dashboard::{months_to_show, percent};
use crate::services::dues::calculate_total_dues;
use crate::services::shop_numbers::get_active_shops;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub total_rent: f64,
    pub total_collected: f64,
    pub total_pending: f64,
    pub partial_count: usize,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyStats {
    pub months_included: usize,
    pub total_rent: f64,
    pub total_collected: f64,
    pub total_pending: f64,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReportRow {
    pub shop_number: String,
    pub tenant_name: String,
    pub rent: f64,
    pub paid: f64,
    pub status: PaymentStatus,
    pub advance_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub year: i32,
    pub month: Month,
    pub stats: MonthlyStats,
    pub rows: Vec<MonthlyReportRow>,
}

/// Parse a `YYYY-MM` report month.
pub fn parse_report_month(raw: &str) -> Option<(i32, Month)> {
    let (year, month) = raw.trim().split_once('-')?;
    if year.len() != 4 {
        return None;
    }
    let year = year.parse::<i32>().ok()?;
    let month = Month::from_number(month.parse::<u32>().ok()?)?;
    Some((year, month))
}

fn month_entry(rent_amount: f64, entry: Option<&MonthlyData>) -> MonthlyData {
    match entry {
        Some(entry) => MonthlyData {
            rent: entry.effective_rent(rent_amount),
            ..entry.clone()
        },
        None => MonthlyData::pending(rent_amount),
    }
}

/// Active shops only, in shop-number order.
pub fn monthly_report(year_data: &YearData, year: i32, month: Month) -> MonthlyReport {
    let rows = get_active_shops(&year_data.shops)
        .into_iter()
        .map(|(number, shop)| {
            let entry = month_entry(shop.rent_amount, shop.monthly_data.get(&month));
            MonthlyReportRow {
                shop_number: number.to_string(),
                tenant_name: shop.tenant_name().to_string(),
                rent: entry.rent,
                paid: entry.paid,
                status: entry.status,
                advance_amount: shop.advance_amount,
            }
        })
        .collect::<Vec<_>>();

    let total_rent = rows.iter().map(|row| row.rent).sum::<f64>();
    let total_collected = rows.iter().map(|row| row.paid).sum::<f64>();
    let stats = MonthlyStats {
        total_rent,
        total_collected,
        total_pending: total_rent - total_collected,
        partial_count: rows
            .iter()
            .filter(|row| row.status == PaymentStatus::Partial)
            .count(),
        collection_rate: percent(total_collected, total_rent),
    };

    MonthlyReport {
        year,
        month,
        stats,
        rows,
    }
}

/// Rent and collections over the months elapsed so far. Pending is the
/// total dues balance of each active shop.
pub fn yearly_stats(year_data: &YearData, year: i32, today: NaiveDate) -> YearlyStats {
    let months = months_to_show(year, today);
    let active = get_active_shops(&year_data.shops);

    let mut total_rent = 0.0;
    let mut total_collected = 0.0;
    for (_, shop) in &active {
        for month in &months {
            let entry = month_entry(shop.rent_amount, shop.monthly_data.get(month));
            total_rent += entry.rent;
            total_collected += entry.paid;
        }
    }

    YearlyStats {
        months_included: months.len(),
        total_rent,
        total_collected,
        total_pending: active.iter().map(|(_, shop)| calculate_total_dues(shop)).sum(),
        collection_rate: percent(total_collected, total_rent),
    }
}
