use clap::Parser;
use confab::LogLevel;
use confab::core::config;
use confab::tui;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "confab", about = "Terminal client for the IT support chat backend")]
struct Args {
    /// Chat backend base URL (overrides CONFAB_BASE_URL and the config file)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Log level written to confab.log
    #[arg(short, long, default_value_t, value_enum)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to confab.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("confab.log") {
        let _ = WriteLogger::init(args.log_level.into(), log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {e}, using defaults");
            log::warn!("Config error: {}", e);
            config::ConfabConfig::default()
        }
    };
    let resolved = config::resolve(&file_config, args.base_url.as_deref());

    log::info!("Confab starting up against {}", resolved.base_url);

    tui::run(resolved)
}
