//! Seeds a default chart of accounts for one tenant.
//!
//! Usage: `seeder [TENANT_ID]`
//!
//! The tenant comes from the first argument, then `TALLY_SEED_TENANT`, then a
//! fixed development id. Existing codes are left untouched, so reruns are safe.

use anyhow::Context;
use tally_core::accounts::{Account, AccountType};
use tally_db::{PgStore, connect_with};
use tally_shared::AppConfig;
use tally_shared::telemetry::init_tracing;
use tally_shared::types::TenantId;
use tracing::info;
use uuid::Uuid;

/// Development tenant used when none is given.
const DEV_TENANT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

const DEFAULT_CHART: [(&str, &str, AccountType); 6] = [
    ("1000", "Cash", AccountType::Asset),
    ("1200", "Accounts Receivable", AccountType::Asset),
    ("2000", "Accounts Payable", AccountType::Liability),
    ("3000", "Owner's Equity", AccountType::Equity),
    ("4000", "Revenue", AccountType::Revenue),
    ("5000", "Operating Expenses", AccountType::Expense),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let tenant_id = seed_tenant()?;

    let db = connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    let store = PgStore::new(db);

    let mut created = 0usize;
    for (code, name, account_type) in DEFAULT_CHART {
        let account = Account::new(tenant_id, code, name, account_type);
        if store
            .insert_account(&account)
            .await
            .with_context(|| format!("failed to insert account {code}"))?
        {
            created += 1;
            info!(%tenant_id, code, name, "account created");
        } else {
            info!(%tenant_id, code, "account exists, skipping");
        }
    }

    info!(%tenant_id, created, "seeding complete");
    Ok(())
}

fn seed_tenant() -> anyhow::Result<TenantId> {
    let raw = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TALLY_SEED_TENANT").ok());
    match raw {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid tenant id {raw:?}")),
        None => Ok(TenantId::from_uuid(DEV_TENANT_ID)),
    }
}
