pub mod advance;
pub mod allocation;
pub mod dashboard;
pub mod dues;
pub mod expense_analytics;
pub mod ledger_client;
pub mod passkey;
pub mod reports;
pub mod sample_data;
pub mod shop_numbers;
pub mod tenant_history;
pub mod year_loader;
