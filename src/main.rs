// src/main.rs

use shellpipe::{cli, config, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("shellpipe error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    let cfg = config::load_or_default(args.config.as_deref())?;
    logging::init_logging(args.log_level, cfg.log_level)?;
    run(args, cfg).await
}
