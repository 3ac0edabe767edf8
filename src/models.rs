use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Calendar month, serialized as its English full name ("January").
///
/// Variant order is calendar order, so `BTreeMap<Month, _>` iterates
/// January through December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }

    pub fn short_name(self) -> &'static str {
        &self.as_str()[..3]
    }

    /// 1-based month number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(number: u32) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index as usize).copied())
    }

    /// January through `self`, inclusive.
    pub fn up_to(self) -> impl Iterator<Item = Month> {
        Self::ALL.into_iter().take(self.number() as usize)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Month {
    type Err = String;

    /// Accepts full ("April") or short ("Apr") names, any case.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|month| {
                let name = month.as_str().to_ascii_lowercase();
                name == needle || (needle.len() == 3 && name.starts_with(&needle))
            })
            .ok_or_else(|| format!("unknown month '{}'", raw.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TenantStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    #[serde(alias = "Partially Paid")]
    Partial,
    #[default]
    Pending,
    Overdue,
}

impl PaymentStatus {
    pub fn is_paid(self) -> bool {
        self == Self::Paid
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tenant {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub status: TenantStatus,
    pub agreement_date: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DuesInfo {
    pub total_dues: f64,
    pub due_months: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlyData {
    pub rent: f64,
    pub paid: f64,
    pub status: PaymentStatus,
    pub date: String,
    pub advance_used: f64,
}

impl MonthlyData {
    pub fn pending(rent: f64) -> Self {
        Self {
            rent,
            ..Self::default()
        }
    }

    /// The month's own rent, or the shop rent when the month carries none.
    pub fn effective_rent(&self, shop_rent: f64) -> f64 {
        if self.rent > 0.0 {
            self.rent
        } else {
            shop_rent
        }
    }

    pub fn outstanding(&self, shop_rent: f64) -> f64 {
        (self.effective_rent(shop_rent) - self.paid).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
    pub rent_amount: f64,
    pub advance_amount: f64,
    pub previous_year_dues: DuesInfo,
    pub current_year_dues: DuesInfo,
    pub total_dues_balance: f64,
    pub monthly_data: BTreeMap<Month, MonthlyData>,
}

impl ShopData {
    /// A fresh year for a shop: twelve pending months at `rent`.
    pub fn with_pending_year(tenant: Tenant, rent: f64, advance: f64) -> Self {
        Self {
            tenant: Some(tenant),
            rent_amount: rent,
            advance_amount: advance,
            monthly_data: Month::ALL
                .into_iter()
                .map(|month| (month, MonthlyData::pending(rent)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.tenant
            .as_ref()
            .is_some_and(|tenant| tenant.status == TenantStatus::Active)
    }

    pub fn tenant_name(&self) -> &str {
        self.tenant
            .as_ref()
            .map(|tenant| tenant.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown")
    }

    pub fn tenant_status(&self) -> Option<TenantStatus> {
        self.tenant.as_ref().map(|tenant| tenant.status)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YearData {
    pub shops: BTreeMap<String, ShopData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Deduction,
    #[serde(rename = "Advance Deduction")]
    AdvanceDeduction,
}

impl TransactionType {
    pub fn is_deduction(self) -> bool {
        matches!(self, Self::Deduction | Self::AdvanceDeduction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl AdvanceTransaction {
    pub fn new(
        transaction_type: TransactionType,
        amount: f64,
        date: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            transaction_type,
            amount,
            date: date.into(),
            description: description.into(),
            phone_number: None,
            email: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: String,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "sub_category")]
    pub sub_category: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Backing record for `/tenants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub shop_no: String,
    pub tenant: Tenant,
    pub monthly_rent: f64,
    #[serde(default)]
    pub advance_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Year-keyed shop ledger plus the per-shop advance lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentLedgerData {
    pub years: BTreeMap<String, YearData>,
    pub advance_transactions: BTreeMap<String, Vec<AdvanceTransaction>>,
}

impl RentLedgerData {
    pub fn shop(&self, year: &str, shop_number: &str) -> Option<&ShopData> {
        self.years.get(year)?.shops.get(shop_number)
    }

    pub fn shop_mut(&mut self, year: &str, shop_number: &str) -> Option<&mut ShopData> {
        self.years.get_mut(year)?.shops.get_mut(shop_number)
    }

    /// Loaded years in ascending numeric order. Keys that are not numbers are skipped.
    pub fn sorted_years(&self) -> Vec<(i32, String)> {
        let mut years = self
            .years
            .keys()
            .filter_map(|key| key.trim().parse::<i32>().ok().map(|year| (year, key.clone())))
            .collect::<Vec<_>>();
        years.sort_unstable_by_key(|(year, _)| *year);
        years
    }

    pub fn advance_transactions_for(&self, shop_number: &str) -> &[AdvanceTransaction] {
        self.advance_transactions
            .get(shop_number)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
