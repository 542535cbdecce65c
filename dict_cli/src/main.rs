use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::collections::BTreeMap;

use dict_cli::config::{AppConfig, ConfigManager};
use dict_cli::error::CliError;
use dict_cli::output::{OutputFormat, OutputFormatter, create_formatter};
use dict_cli::terminal;
use dict_client_core::{DictSession, ResultSet};

#[derive(Parser)]
#[command(name = "dict")]
#[command(author, version, about = "DICT client - dictionary lookups over RFC 2229", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Server host (overrides server.host)
    #[arg(short = 'H', long, global = true, value_name = "HOST")]
    host: Option<String>,

    /// Server port (overrides server.port)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Output format (defaults to output.default_format)
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the databases offered by the server
    Databases,

    /// List the match strategies offered by the server
    Strategies,

    /// Look up definitions of a word
    Define {
        word: String,

        /// Database to search (`*` for all, `!` for first match)
        #[arg(short = 'd', long)]
        database: Option<String>,

        /// Don't suggest similar words when nothing is found
        #[arg(long)]
        no_fallback: bool,
    },

    /// Find words matching a pattern
    Match {
        word: String,

        /// Database to search (`*` for all, `!` for first match)
        #[arg(short = 'd', long)]
        database: Option<String>,

        /// Match strategy (defaults to server.strategy)
        #[arg(short = 's', long)]
        strategy: Option<String>,
    },

    /// Show information about a database
    Info { database: String },

    /// Show information about the server
    Server,

    /// Show the server's status line
    Status,

    /// Show the server's command summary
    ServerHelp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g., server.host)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., server.host)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,

    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("dict_client_core", log::LevelFilter::Debug)
            .filter_module("dict_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let debug = cli.debug;
    if let Err(e) = run(cli).await {
        let error = CliError::from_anyhow(&e);
        eprint!("{}", error.format_for_user(debug));
        std::process::exit(error.exit_code() as i32);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Commands::Config { command } => return config_command(command),
        Commands::Completions { shell } => {
            generate_completions(shell);
            return Ok(());
        }
        other => other,
    };

    let mut config = ConfigManager::new()
        .load()
        .context("Failed to load configuration")?;
    config.apply_cli_overrides(cli.host, cli.port);

    let format = match cli.format {
        Some(format) => format,
        None => OutputFormat::from_string(&config.output.default_format)?,
    };
    let use_color = format == OutputFormat::Text && terminal::use_color(config.output.color_enabled);
    colored::control::set_override(use_color);
    let formatter = create_formatter(format, use_color);

    let session_config = config.session_config();
    session_config.validate()?;
    log::debug!(
        "Using DICT server {}:{}",
        session_config.host,
        session_config.port
    );

    let mut session = DictSession::new(session_config);
    let result = lookup(&mut session, &config, command, formatter.as_ref()).await;
    if let Err(e) = session.close().await {
        log::warn!("Failed to close DICT session: {e}");
    }

    println!("{}", result?.trim_end());
    Ok(())
}

async fn lookup(
    session: &mut DictSession,
    config: &AppConfig,
    command: Commands,
    formatter: &dyn OutputFormatter,
) -> Result<String> {
    match command {
        Commands::Databases => formatter.databases(&session.databases().await?),
        Commands::Strategies => formatter.strategies(&session.strategies().await?),
        Commands::Define {
            word,
            database,
            no_fallback,
        } => {
            let database = database.unwrap_or_else(|| config.server.database.clone());
            match session.definitions(&database, &word).await {
                Ok(definitions) => formatter.definitions(&word, &definitions),
                Err(e) if e.is_no_match() && !no_fallback => {
                    log::debug!("No definitions for {word:?}, falling back to MATCH");
                    let suggestions = session.matches(&database, None, &word).await?;
                    formatter.suggestions(&word, &suggestions)
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Match {
            word,
            database,
            strategy,
        } => {
            let database = database.unwrap_or_else(|| config.server.database.clone());
            let matches = session
                .matches(&database, strategy.as_deref(), &word)
                .await?;
            formatter.matches(&word, &matches)
        }
        Commands::Info { database } => {
            let name = session
                .resolve_database_name(&database)
                .await?
                .unwrap_or_else(|| database.clone());
            let info = session.show_info(&database).await?;
            formatter.text(
                &format!("Information on {name} [{database}]"),
                &lines_of(&info),
            )
        }
        Commands::Server => {
            let info = session.show_server().await?;
            formatter.text("Server information", &lines_of(&info))
        }
        Commands::Status => {
            let status = session.status().await?;
            formatter.text("Server status", &[status])
        }
        Commands::ServerHelp => {
            let help = session.help().await?;
            formatter.text("Server help", &lines_of(&help))
        }
        Commands::Config { .. } | Commands::Completions { .. } => {
            anyhow::bail!("command does not talk to a server")
        }
    }
}

fn lines_of(set: &ResultSet) -> Vec<String> {
    set.all_lines().map(str::to_string).collect()
}

fn config_command(command: ConfigCommand) -> Result<()> {
    let mut manager = ConfigManager::new();

    match command {
        ConfigCommand::Get { key } => {
            let value = manager.get(&key)?;
            println!("{value}");
        }
        ConfigCommand::Set { key, value } => {
            manager
                .set(&key, &value)
                .with_context(|| format!("Failed to set {key}"))?;
            eprintln!("{}", format!("Set {key} = {value}").green());
            eprintln!(
                "Configuration saved to: {}",
                manager.get_config_path().display()
            );
        }
        ConfigCommand::List => {
            let items = manager.list()?;
            eprintln!("{}", "Configuration:".bold().blue());
            eprintln!("Config file: {}", manager.get_config_path().display());
            eprintln!();

            // Group items by section
            let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
            for (key, value) in items {
                let (section, name) = key.split_once('.').unwrap_or(("general", key.as_str()));
                sections
                    .entry(section.to_string())
                    .or_default()
                    .push((name.to_string(), value));
            }

            for (section, items) in sections {
                println!("[{}]", section.yellow());
                for (key, value) in items {
                    println!("  {} = {}", key.cyan(), value);
                }
                println!();
            }
        }
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
