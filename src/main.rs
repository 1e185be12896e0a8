//! Entry point for the Commission Engine binary.
//!
//! Without arguments the binary starts an HTTP server that serves the
//! commission split rules (validation, confirmation preview and record
//! audit).  `commission_engine audit <user_id>...` instead fetches the
//! payout commission that applies to each user from the PayBazaar
//! backend and prints an audit report as JSON.
//!
//! Configuration is read from the environment, or from a `.env` file in
//! the working directory; see [`commission_engine::config::ConsoleConfig`].

use commission_engine::audit::audit_records;
use commission_engine::config::ConsoleConfig;
use commission_engine::models::PAYOUT_SERVICE;
use commission_engine::{CommissionBackend, HttpBackend};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commission_engine=info")),
        )
        .with_target(false)
        .init();

    let config = ConsoleConfig::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.split_first() {
        Some((command, user_ids)) if command == "audit" => audit(&config, user_ids).await,
        Some((command, _)) => anyhow::bail!("unknown command: {command}"),
        None => {
            tracing::info!(api_url = %config.api_url, "starting commission engine");
            commission_engine::api::serve(config.bind_addr).await
        }
    }
}

async fn audit(config: &ConsoleConfig, user_ids: &[String]) -> anyhow::Result<()> {
    if user_ids.is_empty() {
        anyhow::bail!("usage: commission_engine audit <user_id>...");
    }
    let backend = HttpBackend::from_config(config)?;
    let mut records = Vec::new();
    for user_id in user_ids {
        match backend.get_commission(user_id, PAYOUT_SERVICE).await? {
            Some(record) => records.push(record),
            None => tracing::warn!(user_id = %user_id, "no commission configured"),
        }
    }
    let report = audit_records(&records);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
