//! Progress query command: `launchpad status <campaign>`.

use anyhow::{Context, Result};
use console::style;

use launchpad::config::LaunchConfig;
use launchpad::progress::DeploymentProgress;
use launchpad::ui::icons::{CHECK, PROGRESS};

use super::setup::open_stores;

pub async fn cmd_status(config: &LaunchConfig, campaign_id: &str, json: bool) -> Result<()> {
    let stores = open_stores(config)?;
    let campaign = stores
        .campaigns
        .campaign(campaign_id)
        .await
        .with_context(|| format!("Failed to load campaign {campaign_id}"))?;
    let progress = stores
        .progress
        .load(campaign_id)
        .await
        .with_context(|| format!("Failed to load progress for {campaign_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }

    println!();
    println!(
        "{}{} ({})",
        PROGRESS,
        style(&campaign.name).bold(),
        style(campaign_id).dim()
    );
    println!(
        "  Step:     {} ({}% complete)",
        style(progress.current_step).cyan(),
        progress.percent_complete()
    );
    print_checkpoints(&progress);
    println!();
    Ok(())
}

fn print_checkpoints(progress: &DeploymentProgress) {
    match &progress.assets {
        Some(assets) => println!("  {}Assets:     {}", CHECK, assets.base_uri),
        None => println!("  {}", style("Assets:     pending").dim()),
    }
    match &progress.commitment {
        Some(commitment) => println!(
            "  {}Allowlist:  {} members, root {}",
            CHECK, commitment.member_count, commitment.root
        ),
        None => println!("  {}", style("Allowlist:  pending").dim()),
    }
    match &progress.deployment {
        Some(deployment) => {
            println!(
                "  {}Contract:   {} on {}",
                CHECK, deployment.contract_address, deployment.network
            );
            let verified = match deployment.verified {
                Some(true) => deployment
                    .explorer_url
                    .clone()
                    .unwrap_or_else(|| "yes".to_string()),
                Some(false) => "failed".to_string(),
                None => "not attempted".to_string(),
            };
            println!("    Verified: {verified}");
        }
        None => println!("  {}", style("Contract:   pending").dim()),
    }
    if let Some(pending) = &progress.pending_deployment {
        println!(
            "  {}",
            style(format!(
                "Broadcast {} on {} awaiting confirmation",
                pending.tx_hash, pending.network
            ))
            .yellow()
        );
    }
}
