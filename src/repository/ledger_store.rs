use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{
    AdvanceTransaction, Expense, Month, MonthlyData, RentLedgerData, ShopData, TenantRecord,
    YearData,
};
use crate::services::dues::refresh_after_month_edit;
use crate::services::sample_data::{sample_dataset, sample_expenses, sample_tenants};

/// Everything the service owns: the year-keyed ledger, the tenant registry
/// and the flat expense list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerStore {
    pub ledger: RentLedgerData,
    pub tenants: Vec<TenantRecord>,
    pub expenses: Vec<Expense>,
    #[serde(skip)]
    loading_years: HashSet<String>,
}

impl LedgerStore {
    pub fn seeded(years: &[i32], timestamp: &str) -> Self {
        Self {
            ledger: sample_dataset(years),
            tenants: sample_tenants(timestamp),
            expenses: years.iter().flat_map(|&year| sample_expenses(year)).collect(),
            loading_years: HashSet::new(),
        }
    }

    pub fn has_year(&self, year: &str) -> bool {
        self.ledger.years.contains_key(year)
    }

    pub fn is_year_loading(&self, year: &str) -> bool {
        self.loading_years.contains(year)
    }

    /// Mark `year` as loading. False when it is already present or in flight.
    pub fn begin_year_load(&mut self, year: &str) -> bool {
        if self.has_year(year) || self.is_year_loading(year) {
            return false;
        }
        self.loading_years.insert(year.to_string())
    }

    pub fn finish_year_load(&mut self, year: &str, loaded: Option<YearData>) {
        self.loading_years.remove(year);
        if let Some(year_data) = loaded {
            self.set_year_data(year, year_data);
        }
    }

    pub fn set_year_data(&mut self, year: &str, year_data: YearData) {
        self.ledger.years.insert(year.to_string(), year_data);
    }

    pub fn shop(&self, year: &str, shop_number: &str) -> Option<&ShopData> {
        self.ledger.shop(year, shop_number)
    }

    /// Insert or replace a shop, creating the year when missing.
    pub fn add_shop(&mut self, year: &str, shop_number: &str, shop: ShopData) {
        self.ledger
            .years
            .entry(year.to_string())
            .or_default()
            .shops
            .insert(shop_number.to_string(), shop);
    }

    /// Replace an existing shop. No-op when the year or shop is missing.
    pub fn update_shop(&mut self, year: &str, shop_number: &str, shop: ShopData) -> bool {
        match self.ledger.shop_mut(year, shop_number) {
            Some(existing) => {
                *existing = shop;
                true
            }
            None => false,
        }
    }

    pub fn delete_shop(&mut self, year: &str, shop_number: &str) -> bool {
        self.ledger
            .years
            .get_mut(year)
            .and_then(|year_data| year_data.shops.remove(shop_number))
            .is_some()
    }

    /// Overwrite one month and refresh the dues rollups that depend on it.
    pub fn update_monthly_data(
        &mut self,
        year: &str,
        shop_number: &str,
        month: Month,
        entry: MonthlyData,
    ) -> bool {
        let Some(shop) = self.ledger.shop_mut(year, shop_number) else {
            return false;
        };
        shop.monthly_data.insert(month, entry);
        if let Ok(year) = year.trim().parse::<i32>() {
            refresh_after_month_edit(&mut self.ledger, shop_number, year);
        }
        true
    }

    pub fn add_advance_transaction(&mut self, shop_number: &str, transaction: AdvanceTransaction) {
        self.ledger
            .advance_transactions
            .entry(shop_number.to_string())
            .or_default()
            .push(transaction);
    }

    /// Append an expense, assigning an id when it has none.
    pub fn add_expense(&mut self, mut expense: Expense) -> Expense {
        if expense.id.is_none() {
            expense.id = Some(uuid::Uuid::new_v4().to_string());
        }
        self.expenses.push(expense.clone());
        expense
    }

    pub fn find_tenant(&self, id: &str) -> Option<&TenantRecord> {
        self.tenants.iter().find(|record| record.id == id)
    }

    pub fn tenant_for_shop(&self, shop_no: &str) -> Option<&TenantRecord> {
        self.tenants.iter().find(|record| record.shop_no == shop_no)
    }

    pub fn insert_tenant(&mut self, record: TenantRecord) {
        self.tenants.push(record);
    }

    pub fn replace_tenant(&mut self, record: TenantRecord) -> bool {
        match self.tenants.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    pub fn remove_tenant(&mut self, id: &str) -> Option<TenantRecord> {
        let index = self.tenants.iter().position(|record| record.id == id)?;
        Some(self.tenants.remove(index))
    }

    /// Mirror a registry record into `year`: update the shop's tenant, rent and
    /// advance, or open a fresh year of pending months for a new shop.
    pub fn apply_tenant_to_year(&mut self, record: &TenantRecord, year: &str) {
        if let Some(shop) = self.ledger.shop_mut(year, &record.shop_no) {
            shop.tenant = Some(record.tenant.clone());
            shop.rent_amount = record.monthly_rent;
            shop.advance_amount = record.advance_amount;
            return;
        }
        let shop = ShopData::with_pending_year(
            record.tenant.clone(),
            record.monthly_rent,
            record.advance_amount,
        );
        self.add_shop(year, &record.shop_no, shop);
    }
}
