//! Verification retry command: `launchpad verify <campaign>`.

use anyhow::{Context, Result};
use console::style;

use launchpad::config::LaunchConfig;
use launchpad::ui::icons::{CHECK, LINK};

use super::setup::build_orchestrator;

pub async fn cmd_verify(config: &LaunchConfig, campaign_id: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config, false)?;
    let outcome = orchestrator
        .retry_verification(campaign_id)
        .await
        .with_context(|| format!("Verification for campaign {campaign_id} failed"))?;

    println!("{}{} verified", CHECK, style(campaign_id).bold());
    if let Some(url) = outcome.explorer_url {
        println!("   {}{}", LINK, url);
    }
    Ok(())
}
