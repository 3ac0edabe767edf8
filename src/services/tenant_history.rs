use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Month, PaymentStatus, RentLedgerData, TenantStatus};
use crate::services::advance::{advance_balance, advance_deposit, advance_remaining};
use crate::services::shop_numbers::compare_shop_numbers;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMonth {
    pub month: Month,
    pub rent_amount: f64,
    pub paid_amount: f64,
    pub advance_deduction: f64,
    pub status: PaymentStatus,
    pub payment_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyHistory {
    pub total_rent: f64,
    pub total_paid: f64,
    pub total_pending: f64,
    pub advance_balance: f64,
    pub monthly_data: Vec<HistoryMonth>,
    pub status: Option<TenantStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSection {
    pub year: String,
    pub data: YearlyHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllYearsHistory {
    pub total_rent: f64,
    pub total_paid: f64,
    pub total_pending: f64,
    pub advance_balance: f64,
    pub year_sections: Vec<YearSection>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingByYear {
    pub total_months: usize,
    pub total_amount: f64,
    pub years: BTreeMap<String, Vec<Month>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceSnapshot {
    pub advance_deposit: f64,
    pub advance_remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopListing {
    pub shop_number: String,
    pub tenant_name: String,
    pub year: String,
}

/// Twelve rows for one shop and year. Missing months read as Pending at the
/// shop rent with no payment date.
pub fn yearly_history(data: &RentLedgerData, shop_number: &str, year: &str) -> Option<YearlyHistory> {
    let shop = data.shop(year, shop_number)?;

    let monthly_data = Month::ALL
        .into_iter()
        .map(|month| match shop.monthly_data.get(&month) {
            Some(entry) => HistoryMonth {
                month,
                rent_amount: entry.effective_rent(shop.rent_amount),
                paid_amount: entry.paid,
                advance_deduction: entry.advance_used,
                status: entry.status,
                payment_date: if entry.date.is_empty() {
                    "-".to_string()
                } else {
                    entry.date.clone()
                },
            },
            None => HistoryMonth {
                month,
                rent_amount: shop.rent_amount,
                paid_amount: 0.0,
                advance_deduction: 0.0,
                status: PaymentStatus::Pending,
                payment_date: "-".to_string(),
            },
        })
        .collect::<Vec<_>>();

    let total_rent = monthly_data.iter().map(|row| row.rent_amount).sum::<f64>();
    let total_paid = monthly_data.iter().map(|row| row.paid_amount).sum::<f64>();

    Some(YearlyHistory {
        total_rent,
        total_paid,
        total_pending: total_rent - total_paid,
        advance_balance: advance_balance(data.advance_transactions_for(shop_number)),
        monthly_data,
        status: shop.tenant_status(),
    })
}

/// Every loaded year that has the shop, newest first, with summed totals.
pub fn all_years_history(data: &RentLedgerData, shop_number: &str) -> AllYearsHistory {
    let year_sections = data
        .sorted_years()
        .into_iter()
        .rev()
        .filter_map(|(_, key)| {
            yearly_history(data, shop_number, &key).map(|history| YearSection {
                year: key,
                data: history,
            })
        })
        .collect::<Vec<_>>();

    AllYearsHistory {
        total_rent: year_sections.iter().map(|section| section.data.total_rent).sum(),
        total_paid: year_sections.iter().map(|section| section.data.total_paid).sum(),
        total_pending: year_sections
            .iter()
            .map(|section| section.data.total_pending)
            .sum(),
        advance_balance: advance_balance(data.advance_transactions_for(shop_number)),
        year_sections,
    }
}

/// Non-Paid months per loaded year. Only years with pending months add to the amount.
pub fn pending_by_year(data: &RentLedgerData, shop_number: &str) -> PendingByYear {
    let mut pending = PendingByYear::default();
    for (_, key) in data.sorted_years() {
        let Some(history) = yearly_history(data, shop_number, &key) else {
            continue;
        };
        let months = history
            .monthly_data
            .iter()
            .filter(|row| !row.status.is_paid())
            .map(|row| row.month)
            .collect::<Vec<_>>();
        if months.is_empty() {
            continue;
        }
        pending.total_months += months.len();
        pending.total_amount += history.total_pending;
        pending.years.insert(key, months);
    }
    pending
}

/// Deposit and remaining advance, read from the most recent loaded year holding the shop.
pub fn advance_snapshot(data: &RentLedgerData, shop_number: &str) -> Option<AdvanceSnapshot> {
    let shop = data
        .sorted_years()
        .into_iter()
        .rev()
        .find_map(|(_, key)| data.shop(&key, shop_number))?;
    let transactions = data.advance_transactions_for(shop_number);
    Some(AdvanceSnapshot {
        advance_deposit: advance_deposit(transactions, shop),
        advance_remaining: advance_remaining(transactions, shop),
    })
}

/// Active shops across loaded years, one entry per shop number.
pub fn history_shops(data: &RentLedgerData) -> Vec<ShopListing> {
    let mut listings: Vec<ShopListing> = Vec::new();
    for (_, key) in data.sorted_years().into_iter().rev() {
        let Some(year) = data.years.get(&key) else {
            continue;
        };
        for (number, shop) in &year.shops {
            if !shop.is_active() || listings.iter().any(|seen| &seen.shop_number == number) {
                continue;
            }
            listings.push(ShopListing {
                shop_number: number.clone(),
                tenant_name: shop.tenant_name().to_string(),
                year: key.clone(),
            });
        }
    }
    listings.sort_by(|left, right| compare_shop_numbers(&left.shop_number, &right.shop_number));
    listings
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        advance_snapshot, all_years_history, history_shops, pending_by_year, yearly_history,
    };
    use crate::models::{
        AdvanceTransaction, Month, MonthlyData, PaymentStatus, RentLedgerData, ShopData, Tenant,
        TransactionType, YearData,
    };

    fn shop(rent: f64, paid_months: usize) -> ShopData {
        let tenant = Tenant {
            name: "Amit Kumar".to_string(),
            ..Tenant::default()
        };
        let mut shop = ShopData::with_pending_year(tenant, rent, 20000.0);
        for month in Month::ALL.into_iter().take(paid_months) {
            shop.monthly_data.insert(
                month,
                MonthlyData {
                    rent,
                    paid: rent,
                    status: PaymentStatus::Paid,
                    date: "2024-01-05".to_string(),
                    advance_used: 0.0,
                },
            );
        }
        shop
    }

    fn ledger() -> RentLedgerData {
        let mut data = RentLedgerData::default();
        for (year, shop) in [("2023", shop(3000.0, 12)), ("2024", shop(3400.0, 3))] {
            data.years.insert(
                year.to_string(),
                YearData {
                    shops: BTreeMap::from([("1".to_string(), shop)]),
                },
            );
        }
        data.advance_transactions.insert(
            "1".to_string(),
            vec![
                AdvanceTransaction::new(TransactionType::Deposit, 20000.0, "2023-01-01", ""),
                AdvanceTransaction::new(TransactionType::AdvanceDeduction, 10000.0, "2024-01-01", ""),
            ],
        );
        data
    }

    #[test]
    fn yearly_history_fills_missing_months() {
        let mut data = ledger();
        data.shop_mut("2024", "1")
            .unwrap()
            .monthly_data
            .remove(&Month::December);

        let history = yearly_history(&data, "1", "2024").unwrap();
        assert_eq!(history.monthly_data.len(), 12);
        let december = &history.monthly_data[11];
        assert_eq!(december.status, PaymentStatus::Pending);
        assert_eq!(december.rent_amount, 3400.0);
        assert_eq!(december.payment_date, "-");
        assert_eq!(history.total_rent, 12.0 * 3400.0);
        assert_eq!(history.total_paid, 3.0 * 3400.0);
        assert_eq!(history.total_pending, 9.0 * 3400.0);
        assert_eq!(history.advance_balance, 10000.0);
        assert!(yearly_history(&data, "1", "2019").is_none());
    }

    #[test]
    fn all_years_sums_newest_first() {
        let history = all_years_history(&ledger(), "1");
        let years = history
            .year_sections
            .iter()
            .map(|section| section.year.as_str())
            .collect::<Vec<_>>();
        assert_eq!(years, vec!["2024", "2023"]);
        assert_eq!(history.total_rent, 36000.0 + 40800.0);
        assert_eq!(history.total_pending, 9.0 * 3400.0);
    }

    #[test]
    fn pending_groups_only_years_with_open_months() {
        let pending = pending_by_year(&ledger(), "1");
        assert_eq!(pending.total_months, 9);
        assert_eq!(pending.total_amount, 9.0 * 3400.0);
        assert!(!pending.years.contains_key("2023"));
        assert_eq!(pending.years["2024"][0], Month::April);
    }

    #[test]
    fn advance_snapshot_and_shop_listing() {
        let data = ledger();
        let snapshot = advance_snapshot(&data, "1").unwrap();
        assert_eq!(snapshot.advance_deposit, 20000.0);
        assert_eq!(snapshot.advance_remaining, 10000.0);
        assert!(advance_snapshot(&data, "5").is_none());

        let shops = history_shops(&data);
        assert_eq!(shops.len(), 1);
        assert_eq!(shops[0].year, "2024");
    }
}
