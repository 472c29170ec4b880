use crate::consts::EVENT_QUEUE_DEPTH;
use core::sync::atomic::{AtomicU64, Ordering};
use display_api_types::window::{ListenerKind, WindowEvent};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one client connection.
pub type ClientId = u64;
pub type ChannelId = u64;

pub fn next_client_id() -> ClientId {
    NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Outbound event sink of one client.
///
/// Sending never blocks: a full or closed queue drops the event, so a wedged
/// client cannot stall the compositor while it holds its lock.
#[derive(Clone, Debug)]
pub struct EventChannel {
    id: ChannelId,
    client: ClientId,
    sender: SyncSender<WindowEvent>,
}

impl EventChannel {
    pub fn new(client: ClientId) -> (Self, Receiver<WindowEvent>) {
        Self::with_capacity(client, EVENT_QUEUE_DEPTH)
    }

    pub fn with_capacity(client: ClientId, capacity: usize) -> (Self, Receiver<WindowEvent>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        let channel = Self {
            id: NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed),
            client,
            sender,
        };
        (channel, receiver)
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    /// Best-effort delivery. Returns whether the event was queued.
    pub fn try_send(&self, event: WindowEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::warn!(
                    "event queue of client {} full, dropping event for window {}",
                    self.client,
                    event.window()
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

struct Listener {
    channel: EventChannel,
    kind: ListenerKind,
}

/// Subscriptions to lifecycle notifications, keyed by (channel, kind).
#[derive(Default)]
pub struct Listeners {
    entries: Vec<Listener>,
}

impl Listeners {
    /// Register `channel` for `kind`. Registering twice has no effect.
    pub fn add(&mut self, channel: &EventChannel, kind: ListenerKind) {
        if self
            .entries
            .iter()
            .any(|l| l.channel.id == channel.id && l.kind == kind)
        {
            return;
        }
        self.entries.push(Listener {
            channel: channel.clone(),
            kind,
        });
    }

    pub fn remove(&mut self, channel: ChannelId, kind: ListenerKind) {
        self.entries
            .retain(|l| !(l.channel.id == channel && l.kind == kind));
    }

    pub fn remove_channel(&mut self, channel: ChannelId) {
        self.entries.retain(|l| l.channel.id != channel);
    }

    pub fn remove_client(&mut self, client: ClientId) {
        self.entries.retain(|l| l.channel.client != client);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notify(&self, kind: ListenerKind, event: &WindowEvent) {
        for listener in self.entries.iter().filter(|l| l.kind == kind) {
            listener.channel.try_send(event.clone());
        }
    }
}
