use crate::orchestrator::{RunEvent, RunFailure, RunSummary};
use crate::steps::Step;
use crate::ui::icons::{CHECK, CROSS, LINK, ROCKET, SKIP, WARN};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal rendering of a deployment run, driven by `RunEvent`s.
///
/// Two bars are stacked: the step bar counts steps finished or skipped out
/// of the fixed five, and a spinner shows the step in flight. Per-step lines
/// are printed above the bars.
pub struct DeploymentUI {
    multi: MultiProgress,
    step_bar: ProgressBar,
    spinner: ProgressBar,
    verbose: bool,
}

impl DeploymentUI {
    pub fn new(campaign_id: &str, verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let step_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░");
        let step_bar = multi.add(ProgressBar::new(Step::ORDER.len() as u64));
        step_bar.set_style(step_style);
        step_bar.set_prefix("Steps");
        step_bar.set_message(style(campaign_id).yellow().to_string());

        let spinner_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner = multi.add(ProgressBar::new_spinner());
        spinner.set_style(spinner_style);
        spinner.set_prefix("  Now");

        Self {
            multi,
            step_bar,
            spinner,
            verbose,
        }
    }

    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    pub fn handle(&self, event: &RunEvent) {
        match event {
            RunEvent::StepStarted { step, .. } => {
                self.spinner
                    .set_message(format!("{}...", style(step.label()).cyan()));
                self.spinner.enable_steady_tick(Duration::from_millis(100));
            }
            RunEvent::StepSkipped { step, .. } => {
                self.step_bar.inc(1);
                if self.verbose {
                    self.print_line(describe(event));
                } else {
                    self.print_line(format!("  {}{}", SKIP, style(step.label()).dim()));
                }
            }
            RunEvent::StepCompleted { .. } | RunEvent::Warning { .. } => {
                if matches!(event, RunEvent::StepCompleted { .. }) {
                    self.step_bar.inc(1);
                    self.spinner.set_message("");
                }
                self.print_line(describe(event));
            }
            RunEvent::Finished { .. } => {
                self.spinner.finish_and_clear();
            }
        }
    }

    pub fn finish_success(&self, summary: &RunSummary) {
        self.spinner.finish_and_clear();
        self.step_bar.finish_with_message("done");
        println!();
        println!(
            "{}{} deployed to {}",
            ROCKET,
            style(&summary.campaign_id).bold(),
            style(&summary.network).cyan()
        );
        println!("   Contract:   {}", style(&summary.contract_address).green());
        println!("   Tx:         {}", summary.tx_hash);
        println!("   Base URI:   {}", summary.base_uri);
        println!(
            "   Allowlist:  {} members, root {}",
            summary.member_count, summary.commitment_root
        );
        match (summary.verified, &summary.explorer_url) {
            (Some(true), Some(url)) => println!("   {}Verified:  {}", LINK, url),
            (Some(true), None) => println!("   Verified:   yes"),
            (Some(false), _) => println!(
                "   Verified:   {} (retry with `launchpad verify {}`)",
                style("no").yellow(),
                summary.campaign_id
            ),
            (None, _) => println!("   Verified:   {}", style("skipped").dim()),
        }
        for warning in &summary.warnings {
            println!("   {}{}", WARN, style(warning).yellow());
        }
    }

    pub fn finish_failure(&self, failure: &RunFailure) {
        self.spinner.finish_and_clear();
        self.step_bar.abandon_with_message(style("failed").red().to_string());
        eprintln!();
        eprintln!("{}{}", CROSS, style(&failure.error).red());
        eprintln!(
            "   Last completed step: {}. Re-run to resume from there.",
            failure.last_completed_step
        );
    }
}

/// One-line description of an event, as printed above the bars.
pub fn describe(event: &RunEvent) -> String {
    match event {
        RunEvent::StepStarted { step, .. } => format!("  {}...", step.label()),
        RunEvent::StepSkipped { step, .. } => {
            format!("  {}{} (already checkpointed)", SKIP, step.label())
        }
        RunEvent::StepCompleted { step, detail, .. } => match detail {
            Some(detail) => format!("  {}{}: {}", CHECK, step.label(), style(detail).dim()),
            None => format!("  {}{}", CHECK, step.label()),
        },
        RunEvent::Warning { warning, .. } => {
            format!("  {}{}", WARN, style(warning).yellow())
        }
        RunEvent::Finished {
            success,
            current_step,
            ..
        } => {
            if *success {
                format!("  {}finished at {}", CHECK, current_step)
            } else {
                format!("  {}stopped at {}", CROSS, current_step)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::RunWarning;
    use crate::progress::DeploymentStep;

    #[test]
    fn test_describe_completed_with_detail() {
        let line = describe(&RunEvent::StepCompleted {
            campaign_id: "camp-1".into(),
            step: Step::Assets,
            detail: Some("ipfs://X/".into()),
        });
        assert!(line.contains("Publish assets"));
        assert!(line.contains("ipfs://X/"));
    }

    #[test]
    fn test_describe_skipped() {
        let line = describe(&RunEvent::StepSkipped {
            campaign_id: "camp-1".into(),
            step: Step::Commitment,
        });
        assert!(line.contains("already checkpointed"));
    }

    #[test]
    fn test_describe_warning_and_finish() {
        let warning = describe(&RunEvent::Warning {
            campaign_id: "camp-1".into(),
            warning: RunWarning::Verification {
                message: "explorer down".into(),
            },
        });
        assert!(warning.contains("explorer down"));

        let finished = describe(&RunEvent::Finished {
            campaign_id: "camp-1".into(),
            success: false,
            current_step: DeploymentStep::CommitmentGenerated,
        });
        assert!(finished.contains("stopped at commitmentGenerated"));
    }

    #[test]
    fn test_handle_does_not_panic_without_terminal() {
        let ui = DeploymentUI::new("camp-1", true);
        for step in Step::ORDER {
            ui.handle(&RunEvent::StepStarted {
                campaign_id: "camp-1".into(),
                step,
            });
            ui.handle(&RunEvent::StepCompleted {
                campaign_id: "camp-1".into(),
                step,
                detail: None,
            });
        }
        ui.handle(&RunEvent::Finished {
            campaign_id: "camp-1".into(),
            success: true,
            current_step: DeploymentStep::Complete,
        });
        assert_eq!(ui.step_bar.position(), 5);
    }
}
