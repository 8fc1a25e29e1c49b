//! Bot Monitor Binary
//!
//! Loads the bot's monitoring feed and positions snapshot, derives the
//! dashboard metrics and either serves them over HTTP or prints one report.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin bot_monitor -- config.toml "1 day"
//! ```
//!
//! Settings can be overridden through the environment, e.g.
//! `APP__FEED__SOURCE=remote`. A `.env` file is loaded if present.

use bot_monitor::{MonitorRunner, Period};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let default_config = "config.toml".to_string();
    let config_path = args.get(1).unwrap_or(&default_config);
    if !std::path::Path::new(config_path).exists() {
        eprintln!(
            "Config file '{}' not found. Please create one.",
            config_path
        );
        std::process::exit(1);
    }

    let period = match args.get(2).map(|p| p.parse::<Period>()).transpose() {
        Ok(period) => period,
        Err(e) => {
            eprintln!("{}. Choose one of: {}", e, labels());
            std::process::exit(2);
        }
    };

    let runner = MonitorRunner::new(config_path)?;

    if let Err(e) = runner.run(period).await {
        eprintln!("Monitor error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn labels() -> String {
    Period::ALL
        .iter()
        .map(|p| format!("'{}'", p))
        .collect::<Vec<_>>()
        .join(", ")
}
