// src/main.rs

use std::time::Instant;

use paver::{cli, logging, run};

#[tokio::main]
async fn main() {
    let started = Instant::now();
    let result = run_main().await;
    eprintln!("Elapsed time: {:?}", started.elapsed());

    if let Err(err) = result {
        eprintln!("paver error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await?;
    Ok(())
}
