mod achievements;
mod cli;
mod config;
mod conversation;
mod model;
mod report;
mod services;
mod storage;
mod survey;
mod user;

use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use storage::Storage;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "juka=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let root = Storage::default_root().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let storage = match Storage::new(root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, &storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
