//! cv-role-selector: classify a job description and pick its CV template

use clap::Parser;
use cv_role_selector::cli::{self, Cli, Commands, ConfigAction, RoleAction};
use cv_role_selector::config::Config;
use cv_role_selector::error::{Result, SelectorError};
use cv_role_selector::input::{InputManager, JobSource};
use cv_role_selector::output::formatter::formatter_for;
use cv_role_selector::output::report::ClassificationReport;
use cv_role_selector::processing::classifier::RoleClassifier;
use log::{error, info};
use std::io::Read;
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", config_path.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Classify {
            job,
            text,
            output,
            threshold,
            templates,
            detailed,
        } => {
            let format = match output {
                Some(format) => {
                    cli::parse_output_format(&format).map_err(SelectorError::InvalidInput)?
                }
                None => config.output.format,
            };
            let threshold = match threshold {
                Some(t) => cli::validate_threshold(t).map_err(SelectorError::InvalidInput)?,
                None => config.classifier.breakdown_threshold,
            };

            let source = match (job, text) {
                (Some(path), _) => JobSource::File(path),
                (None, Some(text)) => JobSource::Text(text),
                (None, None) => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    JobSource::Text(buffer)
                }
            };

            let mut input_manager = InputManager::new();
            let job_text = input_manager.load(&source).await?;
            info!("Loaded job description ({} characters)", job_text.len());

            let templates_dir = templates.unwrap_or_else(|| config.templates.templates_dir.clone());
            let classifier =
                RoleClassifier::from_config_with_templates(&config, templates_dir.clone())?;

            let report = ClassificationReport::build(&classifier, &job_text, threshold);
            let formatter = formatter_for(
                format,
                config.output.color_output,
                detailed || config.output.detailed,
            );
            println!("{}", formatter.format_report(&report)?);

            if !report.is_renderable() {
                return Err(SelectorError::TemplateUnavailable(format!(
                    "no role has a usable CV template under {}",
                    templates_dir.display()
                )));
            }
        }

        Commands::Roles { action } => match action {
            RoleAction::List { keywords } => {
                let catalog = config.catalog()?;
                println!("Role categories (default: {})\n", catalog.default_key());

                let mut roles: Vec<_> = catalog.roles().iter().collect();
                roles.sort_by_key(|r| r.priority);

                for role in roles {
                    let mut gates = Vec::new();
                    if let Some(share) = role.min_share {
                        gates.push(format!("min share {:.0}%", share));
                    }
                    if let Some(required) = role.required_alignment_hits() {
                        gates.push(format!("{} distinguishing keywords", required));
                    }

                    println!(
                        "  • {} - {} (priority {}, {} keywords{}{})",
                        role.key,
                        role.display_name,
                        role.priority,
                        role.keywords.len(),
                        if gates.is_empty() { "" } else { ", " },
                        gates.join(", ")
                    );
                    if keywords {
                        println!("    {}", role.keywords.join(", "));
                    }
                }
            }
        },

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("Configuration file: {}\n", config_path.display());
                println!("{}", config.to_toml()?);
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }

            Some(ConfigAction::Reset) => {
                let config = Config::defaults_for(&config_path);
                config.save_to(&config_path)?;
                config.ensure_templates_dir()?;
                println!("Configuration reset: {}", config_path.display());
            }
        },
    }

    Ok(())
}
