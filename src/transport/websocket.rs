//! WebSocket transport
//!
//! This file implements the accept side of the chat server. Responsibilities:
//! - Accept TCP connections and upgrade them to WebSockets, only on the
//!   configured room path
//! - Create one `Client` per upgraded connection and let it serve until the
//!   connection ends
//!
//! A failed accept or handshake affects only that one connection.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async_with_config;
use tracing::{debug, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol::WebSocketConfig;

use crate::client::Client;
use crate::config::Settings;
use crate::room::RoomHandle;
use crate::transport::connection;
use crate::utils::error::ServerError;

/// Bind the configured address and serve connections into `room` forever.
pub async fn start_websocket_server(
    settings: Settings,
    room: RoomHandle,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(settings.addr()).await?;
    info!(
        "chat room listening on ws://{}{}",
        listener.local_addr()?,
        settings.server.path
    );
    serve(listener, room, settings).await;
    Ok(())
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, room: RoomHandle, settings: Settings) {
    let settings = Arc::new(settings);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };

        let room = room.clone();
        let settings = settings.clone();
        tokio::spawn(async move {
            handle_connection(stream, peer, room, &settings).await;
        });
    }
}

fn ws_config(settings: &Settings) -> WebSocketConfig {
    WebSocketConfig::default()
        .read_buffer_size(settings.room.socket_buffer_size)
        .write_buffer_size(settings.room.socket_buffer_size)
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    room: RoomHandle,
    settings: &Settings,
) {
    let room_path = settings.server.path.clone();
    let check_path = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() == room_path {
            Ok(resp)
        } else {
            let body = format!("no room at {}", req.uri().path());
            let mut rejection = ErrorResponse::new(Some(body));
            *rejection.status_mut() = StatusCode::NOT_FOUND;
            Err(rejection)
        }
    };

    let config = Some(ws_config(settings));
    let ws_stream = match accept_hdr_async_with_config(stream, check_path, config).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("websocket handshake with {peer} failed: {e}");
            return;
        }
    };

    let (reader, writer) = connection::split(ws_stream);
    let client = Client::new(room, settings.room.message_buffer_size);
    let client_id = client.id();
    debug!("client {client_id} connected from {peer}");

    if let Err(e) = client.serve(reader, writer).await {
        warn!("client {client_id} from {peer} dropped: {e}");
    }
}
