// src/main.rs

use rollout::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("rollout error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await.map_err(|err| {
        let phase = err.phase();
        anyhow::Error::new(err).context(format!("{phase} phase failed"))
    })
}
