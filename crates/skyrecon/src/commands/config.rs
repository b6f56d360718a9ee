use clap::Subcommand;
use colored::Colorize;
use skyrecon_config::{ConfigError, ReconConfig};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as YAML
    Show,
    /// Print which config file is in use
    Path,
}

pub fn handle(
    cmd: &ConfigCommands,
    config: &ReconConfig,
    explicit: Option<&Path>,
    region: Option<&str>,
) -> anyhow::Result<()> {
    let source = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => match skyrecon_config::find_config_file() {
            Ok(path) => Some(path),
            Err(ConfigError::ConfigFileNotFound) => None,
            Err(e) => return Err(e.into()),
        },
    };

    match cmd {
        ConfigCommands::Path => {
            match source {
                Some(path) => println!("{}", path.display()),
                None => eprintln!("{}", "no config file found, using defaults".yellow()),
            }
            Ok(())
        }
        ConfigCommands::Show => {
            match &source {
                Some(path) => eprintln!("📄 {}", path.display().to_string().cyan()),
                None => eprintln!("📄 {}", "built-in defaults".dimmed()),
            }

            let mut effective = config.clone();
            if let Some(region) = region.filter(|r| !r.trim().is_empty()) {
                let settings = config.aws_settings(Some(region));
                effective.provider.region = settings.region;
                effective.provider.zone = Some(settings.zone).filter(|z| !z.is_empty());
            }
            print!("{}", serde_yaml::to_string(&effective)?);
            Ok(())
        }
    }
}
