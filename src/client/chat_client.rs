//! Client lifecycle
//!
//! `created -> joined -> left -> closed`. `serve` walks a client through the
//! whole sequence exactly once:
//! - join the room, handing it the only sender of the outbound queue
//! - spawn the outbound pump and run the inbound pump on the current task
//! - whichever pump stops first ends the connection; then leave the room,
//!   stop the outbound pump if it is still running, and close the writer

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::room::{ClientId, Member, Message, RoomHandle};
use crate::transport::{MessageReader, MessageWriter};
use crate::utils::error::RoomClosed;

/// How long the close handshake may take before the connection is dropped.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Client {
    id: ClientId,
    room: RoomHandle,
    queue: mpsc::Sender<Message>,
    outbound: mpsc::Receiver<Message>,
}

impl Client {
    /// Create a client whose outbound queue holds `capacity` messages.
    /// Tokio channels need a positive bound, so zero is raised to one.
    pub fn new(room: RoomHandle, capacity: usize) -> Self {
        let (queue, outbound) = mpsc::channel(capacity.max(1));
        Self {
            id: ClientId::new(),
            room,
            queue,
            outbound,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Drive this client until its connection ends.
    ///
    /// Returns `RoomClosed` without touching the connection if the room has
    /// stopped before the client could join.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<(), RoomClosed>
    where
        R: MessageReader,
        W: MessageWriter + 'static,
    {
        let Client {
            id,
            room,
            queue,
            outbound,
        } = self;

        room.join(Member { id, queue }).await?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let mut writer_task = tokio::spawn(write_pump(id, outbound, writer, shutdown_rx));
        let writer_result = tokio::select! {
            () = read_pump(id, reader, &room) => None,
            result = &mut writer_task => Some(result),
        };

        room.leave(id).await;
        let writer_result = match writer_result {
            Some(result) => result,
            None => {
                // The read side is gone: release the connection even if a
                // write is stuck on a peer that stopped reading.
                let _ = shutdown.send(());
                writer_task.await
            }
        };
        if let Err(e) = writer_result {
            tracing::warn!("outbound pump of client {id} failed: {e}");
        }
        tracing::debug!("client {id} closed");
        Ok(())
    }
}

/// Inbound pump: connection -> room. Hands each payload to the room and
/// waits for it to be accepted, which throttles only this client.
async fn read_pump<R: MessageReader>(id: ClientId, mut reader: R, room: &RoomHandle) {
    loop {
        match reader.read().await {
            Ok(message) => {
                if room.broadcast(message).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("read from client {id} ended: {e}");
                break;
            }
        }
    }
}

/// Outbound pump: queue -> connection. Stops when the room closes the queue
/// (after draining it), when a write fails, or when the inbound side has
/// ended, and closes the writer in every case.
async fn write_pump<W: MessageWriter>(
    id: ClientId,
    mut outbound: mpsc::Receiver<Message>,
    mut writer: W,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            message = outbound.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let written = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            written = writer.write(message) => written,
        };
        if let Err(e) = written {
            tracing::debug!("write to client {id} failed: {e}");
            break;
        }
    }

    // A peer that stopped reading can stall the close handshake too.
    if tokio::time::timeout(CLOSE_GRACE, writer.close()).await.is_err() {
        tracing::debug!("close of client {id} timed out, dropping connection");
    }
}
