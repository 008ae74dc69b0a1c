use anyhow::Context;
use clap::Parser;
use eod_balance::utils::{logger, validation::Validate};
use eod_balance::{CliArgs, EodConfig, EodEngine, TomlConfig};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 先讀設定檔才知道要用哪種 log 格式
    let (config, json_logs) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting eod-balance");
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let monitor_enabled = config.monitor;
    let engine = EodEngine::new_with_monitoring(config, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            println!("done in {} seconds", summary.elapsed_secs_ceil());
        }
        Err(e) => {
            tracing::error!(
                "❌ EOD run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }
}

fn load_config(args: &CliArgs) -> anyhow::Result<(EodConfig, bool)> {
    let (base, json_logs) = match &args.config {
        Some(path) => {
            let file = TomlConfig::from_file(path)
                .with_context(|| format!("Failed to load config file '{}'", path.display()))?;
            (file.to_eod_config(), file.json_logs())
        }
        None => (EodConfig::default(), false),
    };

    Ok((args.apply_to(base), json_logs || args.json_logs))
}
