//! CLI for chatroom
//!
//! Subcommands:
//! - `server`: run the chat room server
//! - `client`: send one message to a running room and print the first reply

use std::io;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use chatroom::config::{Settings, TraceTarget, load_config, validate};
use chatroom::room::Room;
use chatroom::trace::{LogTracer, NullTracer, Tracer, WriterTracer};
use chatroom::transport::start_websocket_server;
use chatroom::utils::logging;

#[derive(Parser)]
#[command(name = "chatroom")]
enum Command {
    /// Start the chat room server
    Server {
        /// Listen address, overriding the configured host and port (e.g. 0.0.0.0:8080)
        #[arg(long)]
        addr: Option<String>,
        /// Log level: error, warn, info, debug or trace
        #[arg(long, default_value = "info")]
        log_level: String,
    },
    /// Send one message to a room and print the first message received back
    Client {
        /// Room URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080/room")]
        url: String,
        /// Text to send
        #[arg(long, default_value = "hello")]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    match Command::parse() {
        Command::Server { addr, log_level } => {
            logging::init(&log_level);
            if let Err(e) = run_server(addr).await {
                error!("Server failed: {}", e);
            }
        }
        Command::Client { url, message } => {
            logging::init("info");
            if let Err(e) = run_client(&url, message).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

fn apply_addr(settings: &mut Settings, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid address '{addr}', expected HOST:PORT"))?;
    settings.server.port = port.parse()?;
    if !host.is_empty() {
        settings.server.host = host.to_string();
    }
    Ok(())
}

fn tracer_for(target: TraceTarget) -> Arc<dyn Tracer> {
    match target {
        TraceTarget::Log => Arc::new(LogTracer),
        TraceTarget::Stdout => Arc::new(WriterTracer::new(io::stdout())),
        TraceTarget::Off => Arc::new(NullTracer),
    }
}

async fn run_server(addr: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = load_config()?;
    if let Some(addr) = addr {
        apply_addr(&mut settings, &addr)?;
        validate(&settings)?;
    }

    let (mut room, handle) = Room::new(tracer_for(settings.room.trace));
    tokio::spawn(async move { room.run().await });

    info!("Starting chat room on {}", settings.addr());
    tokio::select! {
        result = start_websocket_server(settings, handle) => {
            result?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
        }
    }

    Ok(())
}

async fn run_client(url: &str, message: String) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::connect_async;
    use tungstenite::protocol::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;
    ws_stream.send(WsMessage::text(message)).await?;

    if let Some(Ok(incoming)) = ws_stream.next().await {
        println!("Incoming: {}", String::from_utf8_lossy(&incoming.into_data()));
    }
    ws_stream.close(None).await?;
    Ok(())
}
