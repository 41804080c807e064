//! cutout command-line tool
//!
//! Three entry points over the removal pipeline:
//! - `cutout remove <SRC> [DST]` sends one file and writes the result
//! - `cutout costume <SRC>` runs the full pipeline against an in-memory host
//! - `cutout serve` runs the relay proxy used by browser editors

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod proxy;

use anyhow::Result;
use cli::{Action, Invocation};
use commands::{run_costume, run_remove, CostumeRun};
use config::FileConfig;
use cutout_core::InstallMode;
use cutout_transform::HttpTransformClient;
use proxy::ProxyState;
use std::sync::Arc;

pub use cli::{command, GlobalArgs};
pub use logging::{init_logging, LogFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Execute a parsed invocation
///
/// # Errors
/// Returns error if configuration is incomplete or the command fails
pub async fn run(invocation: Invocation) -> Result<()> {
    let Invocation { global, action } = invocation;
    let file = FileConfig::from_args(&global)?;

    match action {
        Action::Remove { src, dst } => {
            let client = HttpTransformClient::new(file.transform_config(&global, true)?)?;
            let written = run_remove(&client, &src, dst.as_deref()).await?;
            println!("{}", written.display());
        }
        Action::Costume { src, name, legacy, out } => {
            let client = HttpTransformClient::new(file.transform_config(&global, false)?)?;
            let run = CostumeRun { src, name, legacy, out };
            let report = run_costume(Arc::new(client), &file.pipeline, &run).await?;

            let placement = match report.outcome.mode {
                InstallMode::Appended { index } => format!("appended at #{index} of {}", report.variants),
                InstallMode::Rebound => "bound onto the drawable".to_string(),
            };
            println!("{}: {placement}", report.outcome.costume.name());
            println!("  asset: {}", report.outcome.asset_id);
            println!("  saved: {}", report.saved.display());
        }
        Action::Serve { bind, save_dir } => {
            let mut proxy = file.proxy.clone();
            if let Some(bind) = bind {
                proxy.bind = bind;
            }
            if let Some(save_dir) = save_dir {
                proxy.save_dir = save_dir;
            }
            let client = HttpTransformClient::new(file.transform_config(&global, false)?)?;
            let state = Arc::new(ProxyState::new(Arc::new(client), proxy.save_dir.clone()));
            proxy::serve(state, &proxy).await?;
        }
    }

    Ok(())
}
