//! Configuration view and validation commands: `launchpad config`.

use anyhow::{Context, Result};

use launchpad::config::{CONFIG_DIR, CONFIG_FILE, LaunchConfig, LaunchToml};

use super::super::ConfigCommands;

pub fn cmd_config(config: &LaunchConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Launchpad Configuration");
            println!("=======================");
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}", CONFIG_FILE, config_path.display());
                println!("Using defaults. Run 'launchpad config init' to create one.");
            }
            println!();
            println!("Effective values (with env/CLI overrides):");
            println!();
            let rendered = toml::to_string_pretty(&config.toml)
                .context("Failed to render configuration")?;
            for line in rendered.lines() {
                println!("  {line}");
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                return Ok(());
            }
            std::fs::create_dir_all(&config.launch_dir).with_context(|| {
                format!("Failed to create {} directory", CONFIG_DIR)
            })?;
            LaunchToml::default().save(&config_path)?;
            println!("Created {}", config_path.display());
        }
    }

    Ok(())
}
