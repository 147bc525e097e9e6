use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, error::TryRecvError};

use super::{ClientId, Member, Message, Room};
use crate::trace::MemoryTracer;
use crate::utils::error::RoomClosed;

fn new_room() -> (Room, Arc<MemoryTracer>) {
    let tracer = Arc::new(MemoryTracer::new());
    let (room, _handle) = Room::new(tracer.clone());
    (room, tracer)
}

fn member(capacity: usize) -> (Member, mpsc::Receiver<Message>) {
    let (queue, rx) = mpsc::channel(capacity);
    (
        Member {
            id: ClientId::new(),
            queue,
        },
        rx,
    )
}

#[test]
fn test_client_ids_are_unique() {
    let ids: HashSet<ClientId> = (0..100).map(|_| ClientId::new()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn test_room_new() {
    let (room, tracer) = new_room();
    assert_eq!(room.member_count(), 0);
    assert!(tracer.events().is_empty());
}

#[test]
fn test_join_and_leave() {
    let (mut room, tracer) = new_room();
    let (a, mut rx) = member(4);
    let id = a.id;

    room.join(a);
    assert!(room.is_member(&id));
    assert_eq!(tracer.events(), vec![format!("client {id} joined")]);

    room.leave(&id);
    assert!(!room.is_member(&id));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    assert_eq!(tracer.count_prefixed(&format!("client {id} left")), 1);
}

#[test]
fn test_leave_twice_is_a_no_op() {
    let (mut room, tracer) = new_room();
    let (a, _rx) = member(4);
    let id = a.id;
    room.join(a);

    room.leave(&id);
    room.leave(&id);
    assert_eq!(room.member_count(), 0);
    assert_eq!(tracer.count_prefixed(&format!("client {id} left")), 1);
}

#[test]
fn test_leave_of_unknown_client_is_ignored() {
    let (mut room, tracer) = new_room();
    let (a, _rx) = member(4);
    room.join(a);

    room.leave(&ClientId::new());
    assert_eq!(room.member_count(), 1);
    assert_eq!(tracer.events().len(), 1);
}

#[test]
fn test_broadcast_reaches_every_member_unmodified() {
    let (mut room, tracer) = new_room();
    let mut receivers = Vec::new();
    for _ in 0..5 {
        let (m, rx) = member(4);
        room.join(m);
        receivers.push(rx);
    }

    let payload = Message::from(vec![0x00, 0xff, b'h', b'i', 0x80]);
    room.broadcast(payload.clone());

    for rx in &mut receivers {
        assert_eq!(rx.try_recv(), Ok(payload.clone()));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }
    assert_eq!(room.member_count(), 5);
    assert_eq!(tracer.count_prefixed("sent to client"), 5);
    assert_eq!(tracer.count_prefixed("failed to send"), 0);
}

#[test]
fn test_broadcast_to_empty_room() {
    let (mut room, tracer) = new_room();
    room.broadcast(Message::from("nobody home"));
    assert_eq!(tracer.events(), vec!["message received: nobody home"]);
}

#[test]
fn test_full_queue_evicts_member() {
    let (mut room, tracer) = new_room();
    let (slow, mut slow_rx) = member(2);
    let slow_id = slow.id;

    // Fill the queue to capacity, then give up the extra sender so the
    // room holds the only one.
    let filler = slow.queue.clone();
    filler.try_send(Message::from("one")).unwrap();
    filler.try_send(Message::from("two")).unwrap();
    drop(filler);
    room.join(slow);

    room.broadcast(Message::from("three"));

    assert!(!room.is_member(&slow_id));
    assert_eq!(tracer.count_prefixed("failed to send"), 1);
    // Queued messages still drain, then the queue reports closed.
    assert_eq!(slow_rx.try_recv(), Ok(Message::from("one")));
    assert_eq!(slow_rx.try_recv(), Ok(Message::from("two")));
    assert_eq!(slow_rx.try_recv(), Err(TryRecvError::Disconnected));
}

#[test]
fn test_closed_queue_evicts_member() {
    let (mut room, tracer) = new_room();
    let (gone, gone_rx) = member(2);
    let gone_id = gone.id;
    room.join(gone);
    drop(gone_rx);

    room.broadcast(Message::from("anyone?"));
    assert!(!room.is_member(&gone_id));
    assert_eq!(tracer.count_prefixed("failed to send"), 1);
}

#[test]
fn test_stalled_member_does_not_block_producer() {
    let (mut room, tracer) = new_room();
    let messages = 50;

    let mut healthy = Vec::new();
    for _ in 0..200 {
        let (m, rx) = member(messages);
        room.join(m);
        healthy.push(rx);
    }
    // Never drained.
    let (stalled, _stalled_rx) = member(1);
    let stalled_id = stalled.id;
    room.join(stalled);

    let started = Instant::now();
    for i in 0..messages {
        room.broadcast(Message::from(format!("msg {i}")));
    }
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(!room.is_member(&stalled_id));
    assert_eq!(room.member_count(), 200);
    // Evicted on the first saturation, never retried.
    assert_eq!(tracer.count_prefixed("failed to send"), 1);
    for rx in &healthy {
        assert_eq!(rx.len(), messages);
    }
}

#[test]
fn test_three_client_scenario() {
    let (mut room, tracer) = new_room();
    let (a, mut a_rx) = member(2);
    let (b, mut b_rx) = member(2);
    let (c, mut c_rx) = member(2);
    let b_id = b.id;
    let b_filler = b.queue.clone();
    room.join(a);
    room.join(b);
    room.join(c);

    // A sends "hello": everyone, A included, receives it.
    room.broadcast(Message::from("hello"));
    assert_eq!(a_rx.try_recv(), Ok(Message::from("hello")));
    assert_eq!(b_rx.try_recv(), Ok(Message::from("hello")));
    assert_eq!(c_rx.try_recv(), Ok(Message::from("hello")));

    // B stops reading: its queue is filled to capacity.
    b_filler.try_send(Message::from("backlog 1")).unwrap();
    b_filler.try_send(Message::from("backlog 2")).unwrap();
    drop(b_filler);

    // C sends "world".
    room.broadcast(Message::from("world"));

    assert!(!room.is_member(&b_id));
    assert_eq!(room.member_count(), 2);
    assert_eq!(a_rx.try_recv(), Ok(Message::from("world")));
    assert_eq!(c_rx.try_recv(), Ok(Message::from("world")));
    assert_eq!(b_rx.try_recv(), Ok(Message::from("backlog 1")));
    assert_eq!(b_rx.try_recv(), Ok(Message::from("backlog 2")));
    assert_eq!(b_rx.try_recv(), Err(TryRecvError::Disconnected));
    assert_eq!(tracer.count_prefixed("failed to send"), 1);
}

#[tokio::test]
async fn test_run_serializes_concurrent_joins_and_leaves() {
    let tracer = Arc::new(MemoryTracer::new());
    let (mut room, handle) = Room::new(tracer.clone());
    let room_task = tokio::spawn(async move {
        room.run().await;
        room
    });

    let mut tasks = Vec::new();
    let mut receivers = Vec::new();
    for i in 0..64 {
        let (m, rx) = member(4);
        receivers.push((m.id, i % 2 == 0, rx));
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            let id = m.id;
            handle.join(m).await.unwrap();
            if i % 2 == 0 {
                handle.leave(id).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    drop(handle);
    let room = tokio::time::timeout(Duration::from_secs(5), room_task)
        .await
        .expect("room did not stop")
        .unwrap();

    assert_eq!(room.member_count(), 32);
    for (id, left, _rx) in &receivers {
        assert_eq!(room.is_member(id), !left);
    }
    assert_eq!(tracer.events().iter().filter(|e| e.ends_with(" joined")).count(), 64);
    assert_eq!(tracer.events().iter().filter(|e| e.ends_with(" left")).count(), 32);
}

#[tokio::test]
async fn test_run_fans_out_broadcasts() {
    let (mut room, handle) = Room::new(Arc::new(MemoryTracer::new()));
    tokio::spawn(async move { room.run().await });

    let (a, mut a_rx) = member(4);
    let (b, mut b_rx) = member(4);
    handle.join(a).await.unwrap();
    handle.join(b).await.unwrap();
    handle.broadcast(Message::from("hello")).await.unwrap();

    assert_eq!(a_rx.recv().await, Some(Message::from("hello")));
    assert_eq!(b_rx.recv().await, Some(Message::from("hello")));
}

#[tokio::test]
async fn test_handle_reports_stopped_room() {
    let (room, handle) = Room::new(Arc::new(MemoryTracer::new()));
    drop(room);

    let (a, _rx) = member(1);
    assert_eq!(handle.join(a).await, Err(RoomClosed));
    assert_eq!(handle.broadcast(Message::from("x")).await, Err(RoomClosed));
    // Leaving a stopped room is silent.
    handle.leave(ClientId::new()).await;
}
