use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use stillwave::app::{run_parse_command, run_play_command, run_render_command};
use stillwave::audio::output::list_output_devices;
use stillwave::cli::{Cli, Commands, ConfigAction};
use stillwave::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            script,
            start_at,
            build,
        } => {
            let config = load_config(cli.config.as_deref())?;
            stillwave::logging::init(cli.quiet, cli.verbose, config.debug);
            run_play_command(config, &script, start_at, build, cli.quiet, cli.verbose).await?;
        }
        Commands::Render {
            script,
            output,
            build,
        } => {
            let config = load_config(cli.config.as_deref())?;
            stillwave::logging::init(cli.quiet, cli.verbose, config.debug);
            run_render_command(config, &script, &output, build, cli.quiet, cli.verbose).await?;
        }
        Commands::Parse { script, json } => {
            let config = load_config(cli.config.as_deref())?;
            stillwave::logging::init(cli.quiet, cli.verbose, config.debug);
            run_parse_command(&config, &script, json)?;
        }
        Commands::Devices => {
            stillwave::logging::init(cli.quiet, cli.verbose, false);
            list_audio_devices()?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "stillwave",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/stillwave/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path()?;
        Config::load_or_default(&default_path)?
    };

    Ok(config.with_env_overrides())
}

/// List available audio output devices.
fn list_audio_devices() -> Result<()> {
    let devices = list_output_devices()?;

    if devices.is_empty() {
        eprintln!("No audio output devices found");
        std::process::exit(1);
    }

    println!("Available audio output devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&std::path::Path>) -> Result<()> {
    let config_path = match custom_path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            if let Err(e) = config.validate() {
                eprintln!("{} {}", "Warning:".yellow(), e);
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let marker = if config_path.exists() {
                "exists".green().to_string()
            } else {
                "not created".dimmed().to_string()
            };
            println!("{} ({})", config_path.display(), marker);
        }
    }

    Ok(())
}
