use anyhow::{Context, Result};
use std::path::PathBuf;

use clipsort::config::Config;
use clipsort::{logging, server};

#[derive(Default)]
struct Args {
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    foreground: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("clipsort {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--foreground" | "-f" => {
                parsed.foreground = true;
            }
            "--config" | "-c" | "--host" | "--port" | "-p" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: {} requires an argument", args[i]);
                    std::process::exit(1);
                };
                match args[i].as_str() {
                    "--config" | "-c" => parsed.config_path = Some(PathBuf::from(value)),
                    "--host" => parsed.host = Some(value.clone()),
                    _ => match value.parse() {
                        Ok(port) => parsed.port = Some(port),
                        Err(_) => {
                            eprintln!("Error: invalid port {:?}", value);
                            std::process::exit(1);
                        }
                    },
                }
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"clipsort - group and classify images and prompts with CLIP

USAGE:
    clipsort [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --host HOST         Listen address (overrides config)
    --port, -p PORT     Listen port (overrides config)
    --foreground, -f    Also log to stderr
    --version, -V       Show version
    --help, -h          Show this help message

ENDPOINTS:
    POST /group-threshold       {{"texts": [...], "images": [...]}}
    POST /classify-art-style    {{"images": [...]}}
    POST /classify-mood-theme   {{"texts": [...], "images": [...]}}
    GET  /health

ENVIRONMENT:
    CLIPSORT_CONFIG     Path to config file (overrides default location)
    CLIPSORT_LOG        Log filter (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/clipsort/config.toml"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    let _ = logging::init(Some(Config::config_dir().join("logs")), args.foreground);

    let mut config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!(models = ?config.models.dir, "Loading models...");
    let load_config = config.clone();
    let state = tokio::task::spawn_blocking(move || server::AppState::load(&load_config))
        .await
        .context("Model loading task panicked")??;

    server::serve(state, &config.server).await
}
