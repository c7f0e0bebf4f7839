//! scavenger-donor 主入口
//! 读取助记词 CSV，为每个钱包签名并提交捐赠证明

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use scavenger_donor::{
    config::Config,
    infrastructure::{logging::init_logging, seed_source::read_phrases_from_path},
    service::{
        batch_runner::{BatchRunner, RunnerConfig},
        submission::{HttpTransport, SubmissionClient},
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (TOML)
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Seeds CSV file (overrides config)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Destination address (overrides config)
    #[arg(short, long)]
    destination: Option<String>,

    /// Run with bounded concurrency
    #[arg(short, long)]
    parallel: bool,

    /// Concurrency ceiling when --parallel is set
    #[arg(short, long)]
    max_concurrent: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Donation run aborted");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // 1. 环境变量
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // 2. 配置（文件优先于环境变量，命令行优先于文件）
    let mut config = Config::from_env_and_file(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.normalize();

    // 3. 日志
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    config.validate().context("Invalid configuration")?;
    tracing::info!(
        destination = %config.donation.destination_address,
        api_base = %config.donation.api_base,
        mode = ?config.batch.mode(),
        "Configuration loaded"
    );

    // 4. 输入
    let phrases = read_phrases_from_path(&config.input.csv_file, &config.input.column)?;
    if phrases.is_empty() {
        anyhow::bail!("No mnemonics found in CSV: {}", config.input.csv_file);
    }

    // 5. 提交
    let transport = HttpTransport::new(config.donation.api_base.clone(), &config.http)?;
    let client = SubmissionClient::new(Arc::new(transport), config.retry.policy());
    let runner = BatchRunner::new(
        RunnerConfig {
            destination_address: config.donation.destination_address.clone(),
            message: config.donation.message(),
            mode: config.batch.mode(),
            network: config.donation.network,
        },
        client,
    );

    let report = runner.run(phrases).await;
    report.log_summary();

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(csv) = &args.csv {
        config.input.csv_file = csv.display().to_string();
    }
    if let Some(destination) = &args.destination {
        config.donation.destination_address = destination.clone();
    }
    if args.parallel {
        config.batch.parallel = true;
    }
    if let Some(max) = args.max_concurrent {
        config.batch.max_concurrent = max;
    }
    if args.verbose {
        config.logging.level = "debug".into();
    }
}
