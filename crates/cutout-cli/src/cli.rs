//! Command-line surface

use crate::logging::LogFormat;
use anyhow::{anyhow, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "CUTOUT_API_KEY";

/// Build the `cutout` command
#[must_use]
pub fn command() -> Command {
    Command::new("cutout")
        .version(crate::VERSION)
        .about("Non-destructive background removal for editor costumes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .global(true)
                .env(API_KEY_ENV)
                .hide_env_values(true)
                .help("API key for the removal service"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .global(true)
                .help("Removal service URL"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Log output format"),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove the background of an image file")
                .arg(
                    Arg::new("src")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Input image"),
                )
                .arg(
                    Arg::new("dst")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (default: <stem>-cutout.<ext> next to the input)"),
                ),
        )
        .subcommand(
            Command::new("costume")
                .about("Run the full pipeline on an image loaded as a costume")
                .arg(
                    Arg::new("src")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Input image"),
                )
                .arg(Arg::new("name").long("name").help("Costume name (default: file stem)"))
                .arg(
                    Arg::new("legacy")
                        .long("legacy")
                        .action(ArgAction::SetTrue)
                        .help("Treat the target as having no variant list"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory receiving the new asset"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the relay proxy")
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .value_parser(value_parser!(SocketAddr))
                        .help("Listen address (default 127.0.0.1:3001)"),
                )
                .arg(
                    Arg::new("save-dir")
                        .long("save-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for saved copies (default ./saved)"),
                ),
        )
}

/// Options shared by every subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub log_format: LogFormat,
}

/// What to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Remove {
        src: PathBuf,
        dst: Option<PathBuf>,
    },
    Costume {
        src: PathBuf,
        name: Option<String>,
        legacy: bool,
        out: Option<PathBuf>,
    },
    Serve {
        bind: Option<SocketAddr>,
        save_dir: Option<PathBuf>,
    },
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub global: GlobalArgs,
    pub action: Action,
}

impl Invocation {
    /// Convert clap matches into an invocation
    ///
    /// # Errors
    /// Returns error if no known subcommand was given
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let global = GlobalArgs {
            config: matches.get_one::<PathBuf>("config").cloned(),
            api_key: matches.get_one::<String>("api-key").cloned(),
            endpoint: matches.get_one::<String>("endpoint").cloned(),
            log_format: match matches.get_one::<String>("log-format").map(String::as_str) {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        };

        let action = match matches.subcommand() {
            Some(("remove", args)) => Action::Remove {
                src: required_path(args, "src")?,
                dst: args.get_one::<PathBuf>("dst").cloned(),
            },
            Some(("costume", args)) => Action::Costume {
                src: required_path(args, "src")?,
                name: args.get_one::<String>("name").cloned(),
                legacy: args.get_flag("legacy"),
                out: args.get_one::<PathBuf>("out").cloned(),
            },
            Some(("serve", args)) => Action::Serve {
                bind: args.get_one::<SocketAddr>("bind").copied(),
                save_dir: args.get_one::<PathBuf>("save-dir").cloned(),
            },
            Some((other, _)) => return Err(anyhow!("unknown command: {other}")),
            None => return Err(anyhow!("no command given")),
        };

        Ok(Self { global, action })
    }
}

fn required_path(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing <{name}>"))
}
