//! devcfgctl entry point.
//!
//! Inspects and configures a device over NETCONF using the settings file
//! (`/etc/devcfg/devcfg.toml` by default) and the `DEVCFG_*` environment
//! switches.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use devcfg_codec::{tokenize, Statement, Verb};
use devcfg_resource::config::DEFAULT_CONFIG_PATH;
use devcfg_resource::objects::{Application, Applications, RadiusServer};
use devcfg_resource::{
    Connector, Controller, DevcfgConfig, ManagedObject, NetconfConnector, Response,
};
use devcfg_session::{exists, Session};

/// Line-configured device client
#[derive(Parser, Debug)]
#[command(name = "devcfgctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Device host, overriding the settings file
    #[arg(long)]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configuration under a path in `set` form
    Show {
        /// Print lines relative to the path
        #[arg(long)]
        relative: bool,

        /// Path words, e.g. `system radius-server`
        path: Vec<String>,
    },

    /// Exit with 0 if configuration exists under a path, 1 otherwise
    Exists {
        /// Path words
        #[arg(required = true)]
        path: Vec<String>,
    },

    /// Load a file of set/delete statements and commit it as one transaction
    Apply {
        /// Statement file, one statement per line
        file: PathBuf,

        /// Commit log message
        #[arg(short = 'm', long)]
        message: Option<String>,
    },

    /// Read one object and print it as JSON
    Read {
        /// Object type
        kind: Kind,

        /// Application name or server address
        id: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Application,
    Applications,
    RadiusServer,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_logging(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn load_settings(args: &Args) -> Result<DevcfgConfig> {
    let mut config = DevcfgConfig::load_or_default(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?
        .with_env();
    if let Some(host) = &args.host {
        config.device.host = host.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = load_settings(&args)?;
    let connector = NetconfConnector::from_config(&config);
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    match args.command {
        Command::Show { relative, path } => {
            let mut session = open(&connector, &cancel).await?;
            let output = session.show_config(&path, relative).await;
            close(&mut session).await;
            print!("{}", output?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Exists { path } => {
            let mut session = open(&connector, &cancel).await?;
            let found = exists(&mut session, &path).await;
            close(&mut session).await;
            if found? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
        Command::Apply { file, message } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let statements = parse_statements(&text)?;
            let message = message.unwrap_or_else(|| config.session.commit_message.clone());

            let mut session = open(&connector, &cancel).await?;
            let result = apply(&mut session, &statements, &message).await;
            print_warnings(&session.release().await);
            close(&mut session).await;
            result?;
            info!(statements = statements.len(), "configuration applied");
            Ok(ExitCode::SUCCESS)
        }
        Command::Read { kind, id } => {
            let controller =
                Controller::from_config(connector, &config).with_cancellation(cancel);
            let value = match kind {
                Kind::Application => {
                    let id = require_id(kind, id)?;
                    read_json(&controller, &Application::named(id)).await?
                }
                Kind::Applications => read_json(&controller, &Applications::default()).await?,
                Kind::RadiusServer => {
                    let id = require_id(kind, id)?;
                    read_json(&controller, &RadiusServer::new(id)).await?
                }
            };
            match value {
                Some(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("not found");
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, abandoning the current operation");
            cancel.cancel();
        }
    });
}

async fn open(connector: &NetconfConnector, cancel: &CancellationToken) -> Result<Session> {
    let session = connector
        .connect()
        .await
        .context("failed to connect to device")?;
    Ok(session.with_cancellation(cancel.clone()))
}

async fn close(session: &mut Session) {
    if let Err(err) = session.close().await {
        warn!(error = %err, "failed to close session");
    }
}

async fn apply(session: &mut Session, statements: &[Statement], message: &str) -> Result<()> {
    session.lock().await?;
    session.submit(statements).await?;
    let outcome = session.commit(message).await;
    print_warnings(&outcome.warnings);
    outcome.result?;
    Ok(())
}

async fn read_json<C, O>(controller: &Controller<C>, id: &O) -> Result<Option<serde_json::Value>>
where
    C: Connector,
    O: ManagedObject + Serialize,
{
    let Response { result, warnings } = controller.read(id).await;
    print_warnings(&warnings);
    match result? {
        Some(object) => Ok(Some(serde_json::to_value(&object)?)),
        None => Ok(None),
    }
}

fn require_id(kind: Kind, id: Option<String>) -> Result<String> {
    id.ok_or_else(|| anyhow!("{kind:?} needs an identifier"))
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Parses a statement file. Blank lines and `#` comments are skipped.
fn parse_statements(text: &str) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let words = tokenize(line);
        let (verb, path) = match words.split_first() {
            Some((verb, path)) if !path.is_empty() => (verb, path),
            _ => bail!("line {}: expected a verb followed by a path", index + 1),
        };
        let verb = match verb.as_str() {
            "set" => Verb::Set,
            "delete" => Verb::Delete,
            other => bail!("line {}: unknown verb '{other}'", index + 1),
        };
        statements.push(Statement::new(verb, path.iter().cloned()));
    }

    if statements.is_empty() {
        bail!("no statements to apply");
    }
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_read_command() {
        let args = Args::try_parse_from(["devcfgctl", "read", "radius-server", "192.0.2.1"]).unwrap();
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        match args.command {
            Command::Read { kind, id } => {
                assert_eq!(kind, Kind::RadiusServer);
                assert_eq!(id.as_deref(), Some("192.0.2.1"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_exists_requires_path() {
        assert!(Args::try_parse_from(["devcfgctl", "exists"]).is_err());
    }

    #[test]
    fn test_parse_statements() {
        let text = "# lab radius\n\
                    set system radius-server 192.0.2.1 secret \"two words\"\n\
                    \n\
                    delete system radius-server 192.0.2.1 timeout\n";
        let statements = parse_statements(text).unwrap();
        let lines: Vec<String> = statements.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "set system radius-server 192.0.2.1 secret \"two words\"",
                "delete system radius-server 192.0.2.1 timeout",
            ]
        );
    }

    #[test]
    fn test_parse_statements_rejects_bad_lines() {
        let err = parse_statements("set system\nactivate system\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = parse_statements("set\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));

        assert!(parse_statements("# nothing\n").is_err());
    }
}
