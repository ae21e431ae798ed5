use anyhow::{Context, Result};
use tracing::info;

use openjudge::JudgeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("openjudge=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("JUDGE_CONFIG").ok())
        .unwrap_or_else(|| "./judge.toml".into());

    let mut config = JudgeConfig::load(&config_path)?;
    config.apply_env_overrides()?;
    info!("Loaded judge config from {}", config_path);

    let mut judge = config.build_judge().await?;
    judge.run().await.context("Judge run failed")?;

    let summary = judge.summary();
    if std::env::var("JUDGE_OUTPUT").as_deref() == Ok("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    info!(
        "Finished: {}/{} accepted ({:.3}ms total)",
        summary.accepted, summary.total, summary.total_elapsed_ms
    );

    if !summary.all_accepted() {
        std::process::exit(1);
    }
    Ok(())
}
