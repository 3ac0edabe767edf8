use serde::Serialize;

use crate::models::{
    AdvanceTransaction, DuesInfo, Month, MonthlyData, PaymentStatus, RentLedgerData,
};
use crate::services::advance::rent_deduction;
use crate::services::dues::{due_month_label, refresh_shop_dues};

/// One rent entry submission for a shop.
#[derive(Debug, Clone, PartialEq)]
pub struct RentPayment {
    pub shop_number: String,
    pub year: i32,
    pub month: Month,
    pub paid_amount: f64,
    pub use_advance: bool,
    pub advance_deduction: f64,
    pub payment_date: String,
}

impl RentPayment {
    /// Cash plus the advance draw, when the advance is used.
    pub fn allocatable(&self) -> f64 {
        let advance = if self.use_advance {
            self.advance_deduction
        } else {
            0.0
        };
        self.paid_amount + advance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationStep {
    pub year: i32,
    pub month: Month,
    pub applied: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub shop_number: String,
    pub total_allocated: f64,
    pub steps: Vec<AllocationStep>,
    /// Funds left after every due month was covered, credited to the target month.
    pub target_credit: f64,
    pub advance_transaction: Option<AdvanceTransaction>,
    pub previous_year_dues: DuesInfo,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("Shop {shop_number} not found for year {year}.")]
    ShopNotFound { shop_number: String, year: i32 },
    #[error("Payment amount must be greater than zero.")]
    EmptyPayment,
}

/// Apply `payment` oldest-first: unpaid months of loaded earlier years, then
/// the target year's months up to and including the target month.
///
/// On error the dataset is left untouched.
pub fn allocate_payment(
    data: &mut RentLedgerData,
    payment: &RentPayment,
) -> Result<AllocationReport, AllocationError> {
    let target_key = payment.year.to_string();
    if data.shop(&target_key, &payment.shop_number).is_none() {
        return Err(AllocationError::ShopNotFound {
            shop_number: payment.shop_number.clone(),
            year: payment.year,
        });
    }
    let total = payment.allocatable();
    if !(total > 0.0) {
        return Err(AllocationError::EmptyPayment);
    }

    let mut remaining = total;
    let mut steps = Vec::new();

    let earlier_years = data
        .sorted_years()
        .into_iter()
        .filter(|(year, _)| *year < payment.year)
        .collect::<Vec<_>>();
    for (year, key) in earlier_years {
        if remaining <= 0.0 {
            break;
        }
        let Some(shop) = data.shop_mut(&key, &payment.shop_number) else {
            continue;
        };
        let shop_rent = shop.rent_amount;
        for (month, entry) in shop.monthly_data.iter_mut() {
            if remaining <= 0.0 {
                break;
            }
            if entry.status.is_paid() {
                continue;
            }
            let applied = apply_to_month(entry, shop_rent, remaining, &payment.payment_date);
            remaining -= applied;
            steps.push(AllocationStep {
                year,
                month: *month,
                applied,
                status: entry.status,
            });
        }
    }

    let mut target_credit = 0.0;
    if let Some(shop) = data.shop_mut(&target_key, &payment.shop_number) {
        let shop_rent = shop.rent_amount;
        for month in payment.month.up_to() {
            if remaining <= 0.0 {
                break;
            }
            let entry = shop
                .monthly_data
                .entry(month)
                .or_insert_with(|| MonthlyData::pending(shop_rent));
            if entry.status.is_paid() {
                continue;
            }
            let applied = apply_to_month(entry, shop_rent, remaining, &payment.payment_date);
            remaining -= applied;
            steps.push(AllocationStep {
                year: payment.year,
                month,
                applied,
                status: entry.status,
            });
        }

        let target = shop
            .monthly_data
            .entry(payment.month)
            .or_insert_with(|| MonthlyData::pending(shop_rent));
        if remaining > 0.0 {
            target.paid += remaining;
            target.status = status_after(target, shop_rent, remaining);
            target.date = payment.payment_date.clone();
            target_credit = remaining;
        }
        if payment.use_advance && payment.advance_deduction > 0.0 {
            target.advance_used += payment.advance_deduction;
        }
    }

    let advance_transaction = (payment.use_advance && payment.advance_deduction > 0.0).then(|| {
        let label = due_month_label(payment.month, payment.year);
        let transaction = rent_deduction(
            payment.advance_deduction,
            &payment.payment_date,
            &label,
        );
        data.advance_transactions
            .entry(payment.shop_number.clone())
            .or_default()
            .push(transaction.clone());
        transaction
    });

    refresh_shop_dues(data, &payment.shop_number, payment.year);
    let previous_year_dues = data
        .shop(&target_key, &payment.shop_number)
        .map(|shop| shop.previous_year_dues.clone())
        .unwrap_or_default();

    tracing::debug!(
        shop_number = %payment.shop_number,
        year = payment.year,
        month = %payment.month,
        total,
        months_touched = steps.len(),
        target_credit,
        "Allocated rent payment"
    );

    Ok(AllocationReport {
        shop_number: payment.shop_number.clone(),
        total_allocated: total,
        steps,
        target_credit,
        advance_transaction,
        previous_year_dues,
    })
}

/// Pay up to the month's outstanding amount and return what was applied.
fn apply_to_month(entry: &mut MonthlyData, shop_rent: f64, available: f64, date: &str) -> f64 {
    let applied = available.min(entry.outstanding(shop_rent));
    entry.paid += applied;
    entry.status = status_after(entry, shop_rent, applied);
    if applied > 0.0 {
        entry.date = date.to_string();
    }
    applied
}

fn status_after(entry: &MonthlyData, shop_rent: f64, applied: f64) -> PaymentStatus {
    if entry.paid >= entry.effective_rent(shop_rent) {
        PaymentStatus::Paid
    } else if applied > 0.0 {
        PaymentStatus::Partial
    } else {
        entry.status
    }
}
