//! Controller example
//!
//! Interactive menu that connects to playback hosts and sends them commands.
//!
//! Run with: cargo run --example controller
//!
//! Menu commands:
//!   connect HOST PORT SERVICE    connect to HOST:PORT/SERVICE
//!   connect HOST:PORT/SERVICE    same, single argument form
//!   browse HOST [PORT]           list services bound on a registry
//!   list                         numbered list of sessions
//!   play N | pause N | restart N send a command to session N
//!   disconnect N                 drop session N
//!   quit

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use remote_playback::client::{ClientConfig, TcpTransport};
use remote_playback::protocol::constants::DEFAULT_REGISTRY_PORT;
use remote_playback::session::{CommandDispatcher, SessionId, SessionRegistry};
use remote_playback::{PlaybackCommand, ServiceAddress};

type Sessions = SessionRegistry<TcpTransport>;

fn print_help() {
    println!("Commands:");
    println!("  connect HOST PORT SERVICE | connect HOST:PORT/SERVICE");
    println!("  browse HOST [PORT]");
    println!("  list");
    println!("  play N | pause N | restart N");
    println!("  disconnect N");
    println!("  quit");
}

/// Session selected by its 1-based menu number
async fn select(sessions: &Sessions, arg: Option<&str>) -> Option<SessionId> {
    let Some(index) = arg.and_then(|a| a.parse::<usize>().ok()) else {
        println!("Expected a session number");
        return None;
    };

    match index.checked_sub(1) {
        Some(i) => match sessions.nth(i).await {
            Some(id) => Some(id),
            None => {
                println!("No session number {}", index);
                None
            }
        },
        None => {
            println!("Session numbers start at 1");
            None
        }
    }
}

async fn connect(sessions: &Sessions, args: &[&str]) {
    let address = match args {
        [single] => single.parse::<ServiceAddress>().map_err(|e| e.to_string()),
        [host, port, service] => match port.parse::<u16>() {
            Ok(port) => ServiceAddress::new(host, port, service).map_err(|e| e.to_string()),
            Err(_) => Err(format!("invalid port '{}'", port)),
        },
        _ => Err(String::from("usage: connect HOST PORT SERVICE")),
    };

    let address = match address {
        Ok(address) => address,
        Err(e) => {
            println!("Cannot connect: {}", e);
            return;
        }
    };

    match sessions.connect_address(&address).await {
        Ok(id) => println!("Connected to {}", id),
        Err(e) if e.is_already_connected() => println!("{}", e),
        Err(e) => println!("Connection failed: {}", e),
    }
}

async fn list(sessions: &Sessions) {
    let infos = sessions.sessions().await;
    if infos.is_empty() {
        println!("No sessions");
        return;
    }
    for (i, info) in infos.iter().enumerate() {
        println!("  {}. {} (connected {}s ago)", i + 1, info.id, info.age.as_secs());
    }
}

async fn browse(sessions: &Sessions, args: &[&str]) {
    let Some(host) = args.first() else {
        println!("usage: browse HOST [PORT]");
        return;
    };
    let port = match args.get(1).map(|p| p.parse::<u16>()) {
        None => DEFAULT_REGISTRY_PORT,
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            println!("Invalid port");
            return;
        }
    };

    match sessions.browse(host, port).await {
        Ok(names) if names.is_empty() => println!("Nothing bound on {}:{}", host, port),
        Ok(names) => {
            for name in names {
                println!("  {}:{}/{}", host, port, name);
            }
        }
        Err(e) => println!("Browse failed: {}", e),
    }
}

#[tokio::main]
async fn main() -> remote_playback::Result<()> {
    // RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("remote_playback=info,controller=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let transport = TcpTransport::new(
        ClientConfig::new()
            .connect_timeout(Duration::from_secs(3))
            .call_timeout(Duration::from_secs(5)),
    );
    let sessions = Arc::new(SessionRegistry::new(transport));
    let dispatcher = CommandDispatcher::new(Arc::clone(&sessions));

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = words.split_first() else {
            continue;
        };

        match *command {
            "connect" => connect(&sessions, args).await,
            "browse" => browse(&sessions, args).await,
            "list" => list(&sessions).await,
            "disconnect" => {
                if let Some(id) = select(&sessions, args.first().copied()).await {
                    sessions.evict(&id).await;
                    println!("Disconnected {}", id);
                }
            }
            "help" => print_help(),
            "quit" | "exit" => break,
            other => match other.parse::<PlaybackCommand>() {
                Ok(playback) => {
                    if let Some(id) = select(&sessions, args.first().copied()).await {
                        match dispatcher.send(&id, playback).await {
                            Ok(()) => println!("{} sent to {}", playback.operation(), id),
                            Err(e) => println!("{}", e),
                        }
                    }
                }
                Err(_) => {
                    println!("Unknown command: {}", other);
                    print_help();
                }
            },
        }
    }

    Ok(())
}
