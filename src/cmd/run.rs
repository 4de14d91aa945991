//! Deployment run command: `launchpad run <campaign>`.

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;

use launchpad::config::LaunchConfig;
use launchpad::ui::DeploymentUI;

use super::setup::build_orchestrator;

pub async fn cmd_run(config: &LaunchConfig, campaign_id: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config, true)?;
    let ui = DeploymentUI::new(campaign_id, config.verbose);
    let mut events = orchestrator.subscribe();

    let run = orchestrator.run(campaign_id);
    tokio::pin!(run);
    let result = loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => ui.handle(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "progress display fell behind");
                }
                Err(RecvError::Closed) => {}
            },
            result = &mut run => break result,
        }
    };
    while let Ok(event) = events.try_recv() {
        ui.handle(&event);
    }

    match result {
        Ok(summary) => {
            ui.finish_success(&summary);
            Ok(())
        }
        Err(failure) => {
            ui.finish_failure(&failure);
            Err(anyhow::Error::new(failure)
                .context(format!("Deployment run for campaign {campaign_id} failed")))
        }
    }
}
