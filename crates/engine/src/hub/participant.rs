//! One registered connection and everything the hub tracks about it.

use tokio::sync::mpsc;
use tokio::time::Instant;

use connect4_domain::{ConnectionId, GameId};
use connect4_shared::ServerFrame;

use super::timers::{ArmedTimer, TimerKind};

#[derive(Debug)]
pub(crate) struct Participant {
    pub(crate) connection_id: ConnectionId,
    /// Set by the first accepted `join`
    pub(crate) username: Option<String>,
    pub(crate) session_id: Option<GameId>,
    /// Start of the reconnect grace window
    pub(crate) disconnected_at: Option<Instant>,
    sender: Option<mpsc::Sender<ServerFrame>>,
    fallback_timer: Option<ArmedTimer>,
    takeover_timer: Option<ArmedTimer>,
    teardown_timer: Option<ArmedTimer>,
}

impl Participant {
    pub(crate) fn new(connection_id: ConnectionId, sender: mpsc::Sender<ServerFrame>) -> Self {
        Self {
            connection_id,
            username: None,
            session_id: None,
            disconnected_at: None,
            sender: Some(sender),
            fallback_timer: None,
            takeover_timer: None,
            teardown_timer: None,
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue a frame without waiting. A full or closed queue drops the frame.
    pub(crate) fn send(&self, frame: ServerFrame) {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(e) = sender.try_send(frame) {
            tracing::warn!(
                connection_id = %self.connection_id,
                error = %e,
                "Dropping frame, channel full or closed"
            );
        }
    }

    /// Drop the outbound sender so the writer task drains and exits. Idempotent.
    pub(crate) fn close(&mut self) {
        self.sender = None;
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<ArmedTimer> {
        match kind {
            TimerKind::MatchmakingFallback => &mut self.fallback_timer,
            TimerKind::BotTakeover => &mut self.takeover_timer,
            TimerKind::Teardown => &mut self.teardown_timer,
        }
    }

    /// Install a timer, cancelling whatever was armed in the same slot.
    pub(crate) fn arm(&mut self, kind: TimerKind, timer: ArmedTimer) {
        if let Some(previous) = self.slot(kind).replace(timer) {
            previous.cancel();
        }
    }

    pub(crate) fn cancel_timer(&mut self, kind: TimerKind) {
        if let Some(timer) = self.slot(kind).take() {
            timer.cancel();
        }
    }

    pub(crate) fn cancel_timers(&mut self) {
        for kind in [
            TimerKind::MatchmakingFallback,
            TimerKind::BotTakeover,
            TimerKind::Teardown,
        ] {
            self.cancel_timer(kind);
        }
    }

    /// Clear the slot if it still holds timer `id`. Returns `false` for a stale firing.
    pub(crate) fn claim_timer(&mut self, kind: TimerKind, id: u64) -> bool {
        let slot = self.slot(kind);
        if slot.as_ref().is_some_and(|t| t.id == id) {
            // Running callback; dropping the handle detaches it
            slot.take();
            true
        } else {
            false
        }
    }
}
