//! LinkPulse — WAN Link Telemetry CLI
//!
//! Runs the collection daemon or one-shot operations:
//! - Timer-driven telemetry sweeps (ICMP + SNMP)
//! - One-off collection passes
//! - PPPoE subscriber and corporate VLAN topology lookups
//! - Link/event status dumps

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use linkpulse::database::queries;
use linkpulse::{
    Collector, Database, DEFAULT_COLLECT_INTERVAL, MAX_COLLECT_INTERVAL, MIN_COLLECT_INTERVAL,
    lookup_corporate_link_info, lookup_pppoe_sessions,
};

/// Logs a message to stderr
macro_rules! log_stderr {
    ($($arg:tt)*) => {
        linkpulse::log_stderr!($($arg)*);
    };
}

/// Logs an error message to stderr
macro_rules! log_error {
    ($($arg:tt)*) => {
        linkpulse::log_error!($($arg)*);
    };
}

#[derive(Debug, PartialEq, Eq)]
enum CliCommand {
    Daemon {
        interval: u64,
    },
    Collect,
    PppoeLookup {
        concentrator: String,
        usernames: Vec<String>,
    },
    CorporateLookup {
        concentrator: String,
        vlan: String,
    },
    Status,
    Help,
    Version,
}

fn version_text() -> String {
    format!("linkpulse {}", env!("CARGO_PKG_VERSION"))
}

fn usage_text() -> String {
    format!(
        "{version}
LinkPulse — WAN Link Telemetry CLI

Usage:
  linkpulse [daemon] [--interval <SECS>] [--db <PATH>]
  linkpulse collect [--db <PATH>]
  linkpulse pppoe-lookup --concentrator <ID|NAME> --user <NAME>... [--db <PATH>]
  linkpulse corporate-lookup --concentrator <ID|NAME> --vlan <INTERFACE> [--db <PATH>]
  linkpulse status [--db <PATH>]
  linkpulse --help
  linkpulse --version

Options:
      --interval <SECS>       Sweep interval in seconds (default: {default_interval}, range {min}-{max})
      --db <PATH>             Database file (default: platform data directory)
      --concentrator <IDENT>  Concentrator to query, by numeric id or exact name
      --user <NAME>           PPPoE username to locate (repeatable)
      --vlan <INTERFACE>      VLAN interface name to locate (e.g. vlan100)
  -h, --help                  Show this help text
  -V, --version               Show version",
        version = version_text(),
        default_interval = DEFAULT_COLLECT_INTERVAL,
        min = MIN_COLLECT_INTERVAL,
        max = MAX_COLLECT_INTERVAL
    )
}

fn parse_interval_arg(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .ok()
        .filter(|v| (MIN_COLLECT_INTERVAL..=MAX_COLLECT_INTERVAL).contains(v))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid value for --interval: '{}'. Expected {}-{} seconds.\n\n{}",
                raw,
                MIN_COLLECT_INTERVAL,
                MAX_COLLECT_INTERVAL,
                usage_text()
            )
        })
}

#[derive(Debug)]
struct ParsedArgs {
    command: CliCommand,
    db_path: Option<PathBuf>,
}

fn parse_cli_args<I, S>(args: I) -> Result<ParsedArgs>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut iter = args.into_iter();
    let _program_name = iter.next();

    let mut command: Option<String> = None;
    let mut interval: Option<u64> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut concentrator: Option<String> = None;
    let mut usernames: Vec<String> = Vec::new();
    let mut vlan: Option<String> = None;

    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        match arg {
            "-h" | "--help" => {
                return Ok(ParsedArgs {
                    command: CliCommand::Help,
                    db_path: None,
                });
            }
            "-V" | "--version" => {
                return Ok(ParsedArgs {
                    command: CliCommand::Version,
                    db_path: None,
                });
            }
            "daemon" | "collect" | "pppoe-lookup" | "corporate-lookup" | "status" => {
                if command.as_deref().is_some_and(|existing| existing != arg) {
                    return Err(anyhow::anyhow!(
                        "Multiple commands provided. Use only one command.\n\n{}",
                        usage_text()
                    ));
                }
                command = Some(arg.to_string());
            }
            "--interval" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("Missing value for --interval.\n\n{}", usage_text())
                })?;
                interval = Some(parse_interval_arg(value.as_ref())?);
            }
            "--db" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("Missing value for --db.\n\n{}", usage_text())
                })?;
                db_path = Some(PathBuf::from(value.as_ref()));
            }
            "--concentrator" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("Missing value for --concentrator.\n\n{}", usage_text())
                })?;
                concentrator = Some(value.as_ref().to_string());
            }
            "--user" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("Missing value for --user.\n\n{}", usage_text())
                })?;
                usernames.push(value.as_ref().to_string());
            }
            "--vlan" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("Missing value for --vlan.\n\n{}", usage_text())
                })?;
                vlan = Some(value.as_ref().to_string());
            }
            _ if arg.starts_with("--interval=") => {
                let value = arg.split_once('=').map(|(_, v)| v).unwrap_or_default();
                if value.is_empty() {
                    return Err(anyhow::anyhow!(
                        "Missing value for --interval.\n\n{}",
                        usage_text()
                    ));
                }
                interval = Some(parse_interval_arg(value)?);
            }
            _ if arg.starts_with("--db=") => {
                let value = arg.split_once('=').map(|(_, v)| v).unwrap_or_default();
                if value.is_empty() {
                    return Err(anyhow::anyhow!("Missing value for --db.\n\n{}", usage_text()));
                }
                db_path = Some(PathBuf::from(value));
            }
            _ => {
                return Err(anyhow::anyhow!(
                    "Unknown argument: {arg}\n\n{}",
                    usage_text()
                ));
            }
        }
    }

    let command = match command.as_deref().unwrap_or("daemon") {
        "daemon" => {
            if concentrator.is_some() || !usernames.is_empty() || vlan.is_some() {
                return Err(anyhow::anyhow!(
                    "--concentrator/--user/--vlan are only valid with the lookup commands.\n\n{}",
                    usage_text()
                ));
            }
            CliCommand::Daemon {
                interval: interval.unwrap_or(DEFAULT_COLLECT_INTERVAL),
            }
        }
        "collect" => {
            if interval.is_some() || concentrator.is_some() || !usernames.is_empty() || vlan.is_some()
            {
                return Err(anyhow::anyhow!(
                    "collect takes no options besides --db.\n\n{}",
                    usage_text()
                ));
            }
            CliCommand::Collect
        }
        "pppoe-lookup" => {
            let concentrator = concentrator.ok_or_else(|| {
                anyhow::anyhow!("pppoe-lookup requires --concentrator.\n\n{}", usage_text())
            })?;
            if usernames.is_empty() {
                return Err(anyhow::anyhow!(
                    "pppoe-lookup requires at least one --user.\n\n{}",
                    usage_text()
                ));
            }
            CliCommand::PppoeLookup {
                concentrator,
                usernames,
            }
        }
        "corporate-lookup" => {
            let concentrator = concentrator.ok_or_else(|| {
                anyhow::anyhow!(
                    "corporate-lookup requires --concentrator.\n\n{}",
                    usage_text()
                )
            })?;
            let vlan = vlan.ok_or_else(|| {
                anyhow::anyhow!("corporate-lookup requires --vlan.\n\n{}", usage_text())
            })?;
            CliCommand::CorporateLookup { concentrator, vlan }
        }
        "status" => {
            if interval.is_some() || concentrator.is_some() || !usernames.is_empty() || vlan.is_some()
            {
                return Err(anyhow::anyhow!(
                    "status takes no options besides --db.\n\n{}",
                    usage_text()
                ));
            }
            CliCommand::Status
        }
        _ => unreachable!(),
    };

    Ok(ParsedArgs { command, db_path })
}

#[derive(Debug, Serialize)]
struct StatusReport {
    links: Vec<linkpulse::Link>,
    recent_events: Vec<linkpulse::EventRecord>,
}

fn open_database(db_path: Option<PathBuf>) -> Result<Database> {
    let path = db_path.unwrap_or_else(Database::default_path);
    Database::new(path)
}

/// Loads a concentrator and its SNMP profile for the lookup commands
fn load_lookup_target(
    db: &Database,
    ident: &str,
) -> Result<(linkpulse::Concentrator, linkpulse::SnmpProfile)> {
    let concentrator = db
        .with_conn(|conn| queries::find_concentrator(conn, ident))?
        .with_context(|| format!("No concentrator matches '{}'", ident))?;
    let profile_id = concentrator
        .snmp_profile_id
        .with_context(|| format!("Concentrator '{}' has no SNMP profile", concentrator.name))?;
    let profile = db
        .with_conn(|conn| queries::get_snmp_profile(conn, profile_id))?
        .with_context(|| format!("SNMP profile {} not found", profile_id))?;
    Ok((concentrator, profile))
}

#[tokio::main]
async fn main() {
    if let Err(e) = linkpulse::logging::init_logging() {
        eprintln!("[WARN] Failed to initialize structured logging: {}", e);
    }

    match run(std::env::args()).await {
        Ok(()) => {}
        Err(e) => {
            log_error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Main entry point
async fn run<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = parse_cli_args(args)?;
    match parsed.command {
        CliCommand::Help => {
            println!("{}", usage_text());
            Ok(())
        }
        CliCommand::Version => {
            println!("{}", version_text());
            Ok(())
        }
        CliCommand::Daemon { interval } => {
            log_stderr!(
                "LinkPulse v{} — collection daemon, sweep every {}s",
                env!("CARGO_PKG_VERSION"),
                interval
            );
            let db = open_database(parsed.db_path)?;
            log_stderr!("Database: {}", db.path().display());
            let collector = Collector::new(db);
            collector.run(interval).await;
            Ok(())
        }
        CliCommand::Collect => {
            log_stderr!("LinkPulse v{} — one-shot sweep", env!("CARGO_PKG_VERSION"));
            let db = open_database(parsed.db_path)?;
            let collector = Collector::new(db.clone());
            collector.collect_all().await;

            let links = db.with_conn(queries::list_enabled_links)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&links).context("Failed to serialize link states")?
            );
            Ok(())
        }
        CliCommand::PppoeLookup {
            concentrator,
            usernames,
        } => {
            let db = open_database(parsed.db_path)?;
            let (concentrator, profile) = load_lookup_target(&db, &concentrator)?;
            log_stderr!(
                "Resolving {} subscriber(s) on {} ({})",
                usernames.len(),
                concentrator.name,
                concentrator.ip_address
            );

            let sessions = lookup_pppoe_sessions(&concentrator, &profile, &usernames).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&sessions)
                    .context("Failed to serialize session lookup")?
            );
            Ok(())
        }
        CliCommand::CorporateLookup { concentrator, vlan } => {
            let db = open_database(parsed.db_path)?;
            let (concentrator, profile) = load_lookup_target(&db, &concentrator)?;
            log_stderr!(
                "Resolving {} on {} ({})",
                vlan,
                concentrator.name,
                concentrator.ip_address
            );

            let info = lookup_corporate_link_info(&concentrator, &profile, &vlan).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&info)
                    .context("Failed to serialize corporate lookup")?
            );
            Ok(())
        }
        CliCommand::Status => {
            let db = open_database(parsed.db_path)?;
            let report = db.with_conn(|conn| {
                Ok(StatusReport {
                    links: queries::list_enabled_links(conn)?,
                    recent_events: queries::list_recent_events(conn, 50)?,
                })
            })?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize status")?
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_help_flag() {
        let parsed = parse_cli_args(["linkpulse", "--help"]).expect("help args should parse");
        assert_eq!(parsed.command, CliCommand::Help);
    }

    #[test]
    fn parse_version_flag() {
        let parsed = parse_cli_args(["linkpulse", "--version"]).expect("version args should parse");
        assert_eq!(parsed.command, CliCommand::Version);
    }

    #[test]
    fn parse_default_daemon_command() {
        let parsed = parse_cli_args(["linkpulse"]).expect("default args should parse");
        assert_eq!(
            parsed.command,
            CliCommand::Daemon {
                interval: DEFAULT_COLLECT_INTERVAL
            }
        );
        assert!(parsed.db_path.is_none());
    }

    #[test]
    fn parse_daemon_with_interval() {
        let parsed = parse_cli_args(["linkpulse", "daemon", "--interval", "60"])
            .expect("daemon with interval should parse");
        assert_eq!(parsed.command, CliCommand::Daemon { interval: 60 });
    }

    #[test]
    fn parse_interval_rejects_out_of_range() {
        let err = parse_cli_args(["linkpulse", "daemon", "--interval", "2"])
            .expect_err("interval below the minimum should fail");
        assert!(err.to_string().contains("Invalid value for --interval"));
    }

    #[test]
    fn parse_collect_command() {
        let parsed = parse_cli_args(["linkpulse", "collect"]).expect("collect should parse");
        assert_eq!(parsed.command, CliCommand::Collect);
    }

    #[test]
    fn parse_collect_rejects_daemon_options() {
        let err = parse_cli_args(["linkpulse", "collect", "--interval", "60"])
            .expect_err("collect should reject --interval");
        assert!(err.to_string().contains("collect takes no options"));
    }

    #[test]
    fn parse_pppoe_lookup_with_repeated_users() {
        let parsed = parse_cli_args([
            "linkpulse",
            "pppoe-lookup",
            "--concentrator",
            "bng-01",
            "--user",
            "alice@isp",
            "--user",
            "bob@isp",
        ])
        .expect("pppoe-lookup should parse");
        assert_eq!(
            parsed.command,
            CliCommand::PppoeLookup {
                concentrator: "bng-01".to_string(),
                usernames: vec!["alice@isp".to_string(), "bob@isp".to_string()],
            }
        );
    }

    #[test]
    fn parse_pppoe_lookup_requires_user() {
        let err = parse_cli_args(["linkpulse", "pppoe-lookup", "--concentrator", "bng-01"])
            .expect_err("pppoe-lookup without --user should fail");
        assert!(err.to_string().contains("at least one --user"));
    }

    #[test]
    fn parse_corporate_lookup() {
        let parsed = parse_cli_args([
            "linkpulse",
            "corporate-lookup",
            "--concentrator",
            "7",
            "--vlan",
            "vlan100",
        ])
        .expect("corporate-lookup should parse");
        assert_eq!(
            parsed.command,
            CliCommand::CorporateLookup {
                concentrator: "7".to_string(),
                vlan: "vlan100".to_string(),
            }
        );
    }

    #[test]
    fn parse_db_flag_with_equals_form() {
        let parsed = parse_cli_args(["linkpulse", "status", "--db=/tmp/linkpulse.db"])
            .expect("status with --db= should parse");
        assert_eq!(parsed.command, CliCommand::Status);
        assert_eq!(parsed.db_path, Some(PathBuf::from("/tmp/linkpulse.db")));
    }

    #[test]
    fn parse_unknown_argument_errors() {
        let err = parse_cli_args(["linkpulse", "--unknown"]).expect_err("unknown flag should fail");
        assert!(err.to_string().contains("Unknown argument"));
    }
}
