//! Example: Pulling a snapshot of masters and recent vouchers from Tally
//!
//! Reads connection settings the same way an embedding service would
//! (`tally.toml`/`tally.json` plus `TALLY_*` variables), checks the server is
//! up, then exports ledgers and the last week of vouchers.
//!
//! Run against a live Tally with the XML server enabled:
//!
//! ```bash
//! TALLY_HOST=192.168.1.20 TALLY_COMPANY="Acme Clinic" \
//!     cargo run -p tallybridge-infra --example sync_snapshot
//! ```

use std::time::Duration;

use chrono::{Duration as DateSpan, Local};
use tallybridge_infra::config;
use tallybridge_infra::integrations::tally::{CallContext, TallyClient};
use tallybridge_infra::observability::{init_tracing, DEFAULT_FILTER};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(DEFAULT_FILTER, false);

    let config = config::load()?;
    let client = TallyClient::new(config)?;
    let ctx = CallContext::with_timeout(Duration::from_secs(120));

    client.ping(&ctx).await?;
    let companies = client.get_companies(&ctx).await?;
    println!("Companies loaded in Tally: {}", companies.join(", "));

    let ledgers = client.get_ledgers(&ctx, &[]).await?;
    println!("{} ledgers ({:?})", ledgers.ledgers.len(), ledgers.sources.ledgers);

    let today = Local::now().date_naive();
    let vouchers = client.get_vouchers(&ctx, today - DateSpan::days(7), today, &[]).await?;
    for voucher in &vouchers.vouchers {
        println!(
            "{:<12} {:<10} {}",
            voucher.type_name().unwrap_or("?"),
            voucher.voucher_number.as_deref().unwrap_or("-"),
            voucher.party_name.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
