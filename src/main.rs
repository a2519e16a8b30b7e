use portfolio::config::{load_settings, print_schema};
use portfolio::startup;
use portfolio::utils::logger::init_logging;
use tracing::error;

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--print-schema") {
        if let Err(e) = print_schema() {
            eprintln!("Error printing schema: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(settings.environment, &settings.logging) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = startup::run(settings).await {
        error!("Startup failed: {}", e);
        eprintln!("Startup failed: {}", e);
        std::process::exit(1);
    }
}
