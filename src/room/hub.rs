//! Room engine
//!
//! The room is the single authority over who is connected. It owns:
//! - the membership map, keyed by `ClientId`, holding each member's outbound queue sender
//! - the receiving ends of three intake channels: join, leave and broadcast
//!
//! Concurrency and usage notes:
//! - `Room::run` is the only code that touches the membership map while the
//!   server is live. Clients talk to it exclusively through a `RoomHandle`, so
//!   there is no lock around the map.
//! - The map holds the only sender of each member's outbound queue. Dropping
//!   the entry closes the queue, which is how the client's write pump learns
//!   it has to stop.
//! - Fan-out never waits on a member. A full queue means the member is not
//!   keeping up and it is evicted on the spot, with no retry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::room::message::Message;
use crate::trace::Tracer;
use crate::utils::error::RoomClosed;

/// Buffer size of each intake channel. One slot keeps the hand-off as close
/// to a rendezvous as tokio channels allow.
const INTAKE_CAPACITY: usize = 1;

/// Identity of one connection. Never reused, so two clients are never equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A join request: the client's identity plus the sending half of its
/// outbound queue. Ownership of the sender moves into the room.
#[derive(Debug)]
pub struct Member {
    pub id: ClientId,
    pub queue: mpsc::Sender<Message>,
}

/// Cloneable intake side of a [`Room`]. Every call hands a request to the
/// room's loop and waits only for buffer space, never for the fan-out.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    join: mpsc::Sender<Member>,
    leave: mpsc::Sender<ClientId>,
    forward: mpsc::Sender<Message>,
}

impl RoomHandle {
    /// Submit a join request.
    pub async fn join(&self, member: Member) -> Result<(), RoomClosed> {
        self.join.send(member).await.map_err(|_| RoomClosed)
    }

    /// Ask the room to drop `id`. Leaving a room that has already stopped is
    /// not an error: there is no membership left to undo.
    pub async fn leave(&self, id: ClientId) {
        let _ = self.leave.send(id).await;
    }

    /// Submit a payload for fan-out to every member.
    pub async fn broadcast(&self, message: Message) -> Result<(), RoomClosed> {
        self.forward.send(message).await.map_err(|_| RoomClosed)
    }
}

struct Intake {
    join: mpsc::Receiver<Member>,
    leave: mpsc::Receiver<ClientId>,
    forward: mpsc::Receiver<Message>,
}

/// The membership authority. See the module docs for the concurrency model.
pub struct Room {
    members: HashMap<ClientId, mpsc::Sender<Message>>,
    intake: Intake,
    tracer: Arc<dyn Tracer>,
}

impl Room {
    /// Create a room and the handle clients use to reach it.
    pub fn new(tracer: Arc<dyn Tracer>) -> (Self, RoomHandle) {
        let (join_tx, join_rx) = mpsc::channel(INTAKE_CAPACITY);
        let (leave_tx, leave_rx) = mpsc::channel(INTAKE_CAPACITY);
        let (forward_tx, forward_rx) = mpsc::channel(INTAKE_CAPACITY);

        let room = Self {
            members: HashMap::new(),
            intake: Intake {
                join: join_rx,
                leave: leave_rx,
                forward: forward_rx,
            },
            tracer,
        };
        let handle = RoomHandle {
            join: join_tx,
            leave: leave_tx,
            forward: forward_tx,
        };
        (room, handle)
    }

    /// Process intake requests one at a time until every handle is gone.
    ///
    /// The select is biased towards joins, then leaves, then broadcasts. A
    /// client always sends its join before its leave, so checking the join
    /// channel first means a leave can never overtake the join it undoes.
    pub async fn run(&mut self) {
        loop {
            tokio::select! {
                biased;
                Some(member) = self.intake.join.recv() => self.join(member),
                Some(id) = self.intake.leave.recv() => self.leave(&id),
                Some(message) = self.intake.forward.recv() => self.broadcast(message),
                else => break,
            }
        }
        tracing::debug!("room intake closed, {} members remain", self.members.len());
    }

    /// Add a member. Its queue sender now belongs to the room.
    pub fn join(&mut self, member: Member) {
        self.members.insert(member.id, member.queue);
        self.tracer.trace(&format!("client {} joined", member.id));
    }

    /// Remove a member and close its queue. Unknown ids are ignored.
    pub fn leave(&mut self, id: &ClientId) {
        // Removing the entry drops the last sender, which closes the queue.
        if self.members.remove(id).is_some() {
            self.tracer.trace(&format!("client {id} left"));
        }
    }

    /// Offer `message` to every member without waiting; evict any member
    /// whose queue is full or closed.
    pub fn broadcast(&mut self, message: Message) {
        let tracer = &self.tracer;
        tracer.trace(&format!("message received: {}", message.to_text_lossy()));

        self.members
            .retain(|id, queue| match queue.try_send(message.clone()) {
                Ok(()) => {
                    tracer.trace(&format!("sent to client {id}"));
                    true
                }
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                    tracer.trace(&format!("failed to send to client {id}, cleaned up"));
                    false
                }
            });
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, id: &ClientId) -> bool {
        self.members.contains_key(id)
    }
}
