use crate::models::{
    AdvanceTransaction, Expense, Month, MonthlyData, PaymentStatus, RentLedgerData, ShopData,
    Tenant, TenantRecord, TenantStatus, TransactionType, YearData,
};
use crate::services::dues::refresh_shop_dues;

struct BaseShop {
    number: &'static str,
    name: &'static str,
    phone: &'static str,
    agreement: bool,
    total_advance: f64,
    advance_remaining: f64,
    rent: f64,
    paid_months: usize,
}

const BASE_SHOPS: [BaseShop; 5] = [
    BaseShop {
        number: "1",
        name: "Amit Kumar",
        phone: "9876543210",
        agreement: true,
        total_advance: 20000.0,
        advance_remaining: 10000.0,
        rent: 3400.0,
        paid_months: 3,
    },
    BaseShop {
        number: "2",
        name: "Priya Singh",
        phone: "9123456780",
        agreement: false,
        total_advance: 15000.0,
        advance_remaining: 5000.0,
        rent: 4000.0,
        paid_months: 2,
    },
    BaseShop {
        number: "3",
        name: "Ravi Patel",
        phone: "9988776655",
        agreement: true,
        total_advance: 18000.0,
        advance_remaining: 8000.0,
        rent: 3200.0,
        paid_months: 4,
    },
    BaseShop {
        number: "4",
        name: "Sunita Sharma",
        phone: "9001122334",
        agreement: true,
        total_advance: 25000.0,
        advance_remaining: 15000.0,
        rent: 3500.0,
        paid_months: 5,
    },
    BaseShop {
        number: "5",
        name: "Vikas Gupta",
        phone: "9112233445",
        agreement: false,
        total_advance: 12000.0,
        advance_remaining: 2000.0,
        rent: 3000.0,
        paid_months: 0,
    },
];

fn tenant(base: &BaseShop, first_year: i32) -> Tenant {
    Tenant {
        name: base.name.to_string(),
        phone_number: base.phone.to_string(),
        status: TenantStatus::Active,
        agreement_date: if base.agreement {
            format!("{first_year}-01-01")
        } else {
            String::new()
        },
        ..Tenant::default()
    }
}

fn sample_shop(base: &BaseShop, year: i32, first_year: i32) -> ShopData {
    let mut shop = ShopData::with_pending_year(tenant(base, first_year), base.rent, base.total_advance);
    for month in Month::ALL.into_iter().take(base.paid_months) {
        shop.monthly_data.insert(
            month,
            MonthlyData {
                rent: base.rent,
                paid: base.rent,
                status: PaymentStatus::Paid,
                date: format!("{year}-{:02}-05", month.number()),
                advance_used: 0.0,
            },
        );
    }
    shop
}

/// The bundled dataset: the five base shops repeated for every year, with
/// prior-year dues rolled up from the earlier years.
pub fn sample_dataset(years: &[i32]) -> RentLedgerData {
    let mut data = RentLedgerData::default();
    let Some(&first_year) = years.iter().min() else {
        return data;
    };

    for &year in years {
        let shops = BASE_SHOPS
            .iter()
            .map(|base| (base.number.to_string(), sample_shop(base, year, first_year)))
            .collect();
        data.years.insert(year.to_string(), YearData { shops });
    }

    for base in &BASE_SHOPS {
        refresh_shop_dues(&mut data, base.number, first_year);

        let deposit_date = format!("{first_year}-01-01");
        data.advance_transactions.insert(
            base.number.to_string(),
            vec![
                AdvanceTransaction::new(
                    TransactionType::Deposit,
                    base.total_advance,
                    deposit_date.clone(),
                    "Initial advance deposit",
                ),
                AdvanceTransaction::new(
                    TransactionType::AdvanceDeduction,
                    base.total_advance - base.advance_remaining,
                    deposit_date,
                    "Advance adjusted against dues",
                ),
            ],
        );
    }
    data
}

/// Registry rows for the base shops, created at `timestamp`.
pub fn sample_tenants(timestamp: &str) -> Vec<TenantRecord> {
    BASE_SHOPS
        .iter()
        .enumerate()
        .map(|(index, base)| TenantRecord {
            id: format!("sample-tenant-{}", index + 1),
            shop_no: base.number.to_string(),
            tenant: tenant(base, 2022),
            monthly_rent: base.rent,
            advance_amount: base.total_advance,
            agreement_status: Some(if base.agreement { "Active" } else { "Pending" }.to_string()),
            comment: None,
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
        })
        .collect()
}

pub fn sample_expenses(year: i32) -> Vec<Expense> {
    let rows: [(&str, f64, &str, &str, &str, &str); 8] = [
        ("01-04", 2400.0, "Utilities", "Electricity", "Electricity bill", "UPI"),
        ("01-12", 850.0, "Maintenance", "Plumbing", "Tap repair in shop 3", "Cash"),
        ("02-02", 1200.0, "Utilities", "Water", "Water tanker", "Cash"),
        ("02-18", 6500.0, "Taxes", "Property", "Municipal property tax", "Bank Transfer"),
        ("03-07", 450.0, "Office", "Stationery", "Receipt books", "Cash"),
        ("03-21", 2300.0, "Utilities", "Electricity", "Electricity bill", "UPI"),
        ("04-09", 30000.0, "Maintenance", "Painting", "Exterior painting", "Bank Transfer"),
        ("04-15", 900.0, "Maintenance", "Cleaning", "Drain cleaning", "UPI"),
    ];
    rows.iter()
        .enumerate()
        .map(|(index, (day, amount, category, sub_category, description, method))| Expense {
            id: Some(format!("sample-expense-{year}-{}", index + 1)),
            date: format!("{year}-{day}"),
            amount: *amount,
            category: category.to_string(),
            description: description.to_string(),
            sub_category: sub_category.to_string(),
            payment_method: method.to_string(),
            tags: Vec::new(),
        })
        .collect()
}
