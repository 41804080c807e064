//! `cutout` binary entry point

use cutout_cli::cli::{command, Invocation};
use cutout_cli::{init_logging, run};

#[tokio::main]
async fn main() {
    let matches = command().get_matches();

    let invocation = match Invocation::from_matches(&matches) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = init_logging(invocation.global.log_format) {
        eprintln!("warning: {e:#}");
    }

    if let Err(e) = run(invocation).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
