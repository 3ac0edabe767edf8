use serde::Serialize;

use crate::models::{AdvanceTransaction, ShopData, TransactionType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceBalance {
    pub total_deposited: f64,
    pub total_deducted: f64,
    pub balance: f64,
}

/// Deposits minus every kind of deduction. Order of the list does not matter.
pub fn advance_balance(transactions: &[AdvanceTransaction]) -> f64 {
    summarize(transactions).balance
}

pub fn summarize(transactions: &[AdvanceTransaction]) -> AdvanceBalance {
    let (total_deposited, total_deducted) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(deposited, deducted), txn| {
                if txn.transaction_type.is_deduction() {
                    (deposited, deducted + txn.amount)
                } else {
                    (deposited + txn.amount, deducted)
                }
            });
    AdvanceBalance {
        total_deposited,
        total_deducted,
        balance: total_deposited - total_deducted,
    }
}

/// Total deposited for a shop; the shop's own `advanceAmount` when it has no transactions.
pub fn advance_deposit(transactions: &[AdvanceTransaction], shop: &ShopData) -> f64 {
    if transactions.is_empty() {
        return shop.advance_amount;
    }
    summarize(transactions).total_deposited
}

/// `advanceAmount` less the "Advance Deduction" entries only.
pub fn advance_remaining(transactions: &[AdvanceTransaction], shop: &ShopData) -> f64 {
    let deducted = transactions
        .iter()
        .filter(|txn| txn.transaction_type == TransactionType::AdvanceDeduction)
        .map(|txn| txn.amount)
        .sum::<f64>();
    shop.advance_amount - deducted
}

pub fn rent_deduction(amount: f64, date: &str, period_label: &str) -> AdvanceTransaction {
    AdvanceTransaction::new(
        TransactionType::Deduction,
        amount,
        date,
        format!("Rent payment for {period_label}"),
    )
}
