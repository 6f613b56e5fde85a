// src/main.rs

use panopticon::logging::{self, LogTarget};
use panopticon::{cli, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("panopticon error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let target = if args.verbose {
        LogTarget::File(&args.log_file)
    } else {
        LogTarget::Stderr
    };
    logging::init_logging(args.log_level, target)?;
    run(args).await
}
