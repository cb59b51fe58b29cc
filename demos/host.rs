//! Playback host example
//!
//! Publishes a playback service driving a headless player and logs every
//! state change the controllers cause.
//!
//! Run with: cargo run --example host [NAME] [MEDIA] [PORT] [SERVICE]
//!
//! Examples:
//!   cargo run --example host                              # host "stage", port 1099, "theatre"
//!   cargo run --example host lobby intro.mp4              # custom name and media
//!   cargo run --example host lobby intro.mp4 2000 screen  # custom port and service name
//!
//! Commands typed on stdin act on the local player directly:
//!   play | pause | restart | status | quit

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use remote_playback::playback::{HeadlessPlayer, PlaybackService};
use remote_playback::registry::ServiceRegistry;
use remote_playback::server::{HostConfig, ServerConfig};
use remote_playback::PlaybackCommand;

fn print_usage() {
    eprintln!("Usage: host [NAME] [MEDIA] [PORT] [SERVICE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  NAME       Display name of this host (default: stage)");
    eprintln!("  MEDIA      Media loaded into the player (default: demo.mp4)");
    eprintln!("  PORT       Registry port (default: 1099)");
    eprintln!("  SERVICE    Name the service is bound under (default: theatre)");
}

fn parse_args(args: &[String]) -> Result<HostConfig, String> {
    let mut config = HostConfig::new(
        args.get(1).map(String::as_str).unwrap_or("stage"),
        "localhost",
    )
    .media(args.get(2).map(String::as_str).unwrap_or("demo.mp4"));

    if let Some(port) = args.get(3) {
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("Invalid port: '{}'", port))?;
        config = config.port(port);
    }
    if let Some(service) = args.get(4) {
        config = config.service_name(service.as_str());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> remote_playback::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    // RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("remote_playback=info,host=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    let service = PlaybackService::new(config.name.as_str())?;
    let (player, mut status) = HeadlessPlayer::new(config.media.as_str());
    service.set_player(player)?;

    // Report every state change
    let host_name = config.name.clone();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            tracing::info!(
                host = %host_name,
                media = %current.media,
                state = %current.state,
                position = ?current.position,
                restarts = current.restarts,
                "Player status"
            );
        }
    });

    let registry = ServiceRegistry::with_config(ServerConfig::default());
    registry
        .publish(config.port, &config.service_name, service.clone())
        .await?;

    let address = config.address()?;
    println!("Host '{}' serving {} at {}", config.name, config.media, address.url());
    println!("Type play, pause, restart, status or quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                match input {
                    "" => {}
                    "quit" | "exit" => break,
                    "status" => {
                        let bound = registry.list(config.port).await;
                        println!("Bound on port {}: {:?}", config.port, bound);
                    }
                    other => match other.parse::<PlaybackCommand>() {
                        Ok(command) => service.execute(command)?,
                        Err(_) => println!("Unknown command: {}", other),
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    registry.unpublish(config.port, &config.service_name).await;
    registry.shutdown().await;
    service.shutdown();
    service.join();

    Ok(())
}
