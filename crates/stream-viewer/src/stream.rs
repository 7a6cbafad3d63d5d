//! Events flowing from the network thread to the render thread, and the
//! render-side inbox that applies them.

use crate::data::PointCloud;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// Lifecycle of the single stream connection. There is no way back from
/// `Closed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    /// Socket is up and the request token has been sent.
    Open,
    /// At least one point payload has arrived.
    Streaming,
    Closed,
    Failed(String),
}

impl ConnectionState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Streaming => f.write_str("streaming"),
            Self::Closed => f.write_str("closed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Where the network side reports to. The viewer's own sink is
/// [`StreamSender`]; anything else that wants the raw event sequence can
/// implement this too.
pub trait EventSink {
    fn state(&self, state: ConnectionState);

    /// Hands over a full replacement vertex buffer, `3N` floats.
    /// Returns false once nobody is listening any more.
    fn points(&self, vertices: Vec<f32>) -> bool;
}

/// Holds at most one point payload: the newest one no frame has taken yet.
#[derive(Debug, Default)]
struct Slot {
    latest: Option<Vec<f32>>,
    received: u64,
}

/// Writer half of the point slot. Publishing overwrites whatever is
/// pending, so a viewer that stops drawing holds one payload, not a backlog.
#[derive(Debug, Clone)]
pub struct PointSlot {
    slot: Weak<Mutex<Slot>>,
}

impl PointSlot {
    /// Returns false once the inbox has been dropped.
    pub fn publish(&self, vertices: Vec<f32>) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };

        let mut slot = slot.lock();
        slot.received += 1;
        slot.latest = Some(vertices);
        true
    }
}

/// Network-thread end of the stream.
#[derive(Debug, Clone)]
pub struct StreamSender {
    states: Sender<ConnectionState>,
    points: PointSlot,
}

impl StreamSender {
    /// A points-only handle. It does not keep the connection state alive, so
    /// the inbox still notices when the network thread goes away.
    pub fn point_slot(&self) -> PointSlot {
        self.points.clone()
    }
}

impl EventSink for StreamSender {
    fn state(&self, state: ConnectionState) {
        // A missing receiver only means the viewer already exited.
        let _ = self.states.send(state);
    }

    fn points(&self, vertices: Vec<f32>) -> bool {
        self.points.publish(vertices)
    }
}

/// Creates the link between the network thread and a render-side inbox.
pub fn channel() -> (StreamSender, StreamInbox) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let slot = Arc::new(Mutex::new(Slot::default()));

    let sender = StreamSender {
        states: tx,
        points: PointSlot {
            slot: Arc::downgrade(&slot),
        },
    };

    (sender, StreamInbox::new(rx, slot))
}

/// Render-thread end of the stream. Drained once per frame.
pub struct StreamInbox {
    states: Receiver<ConnectionState>,
    slot: Arc<Mutex<Slot>>,
    state: ConnectionState,
    messages: u64,
}

impl StreamInbox {
    fn new(states: Receiver<ConnectionState>, slot: Arc<Mutex<Slot>>) -> Self {
        Self {
            states,
            slot,
            state: ConnectionState::Connecting,
            messages: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Point payloads received so far, including ones superseded before a frame.
    #[inline]
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Applies every pending state change in order, then moves the newest
    /// point payload, if any, into `cloud`.
    /// Returns whether the cloud was replaced.
    pub fn drain_into(&mut self, cloud: &mut PointCloud) -> bool {
        loop {
            match self.states.try_recv() {
                Ok(state) => {
                    log::info!("Stream {}", state);
                    self.state = state;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.state.is_terminal() {
                        log::warn!("Network thread ended without closing the stream");
                        self.state = ConnectionState::Failed("network thread ended".into());
                    }
                    break;
                }
            }
        }

        let latest = {
            let mut slot = self.slot.lock();
            self.messages = slot.received;
            slot.latest.take()
        };

        match latest {
            Some(vertices) => {
                log::debug!("Replacing point cloud with {} points", vertices.len() / 3);
                cloud.replace(vertices);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_payload_wins() {
        let (tx, mut inbox) = channel();
        let mut cloud = PointCloud::new();

        assert!(tx.points(vec![1.0, 1.0, 1.0]));
        assert!(tx.points(vec![2.0, 2.0, 2.0, 3.0, 3.0, 3.0]));

        assert!(inbox.drain_into(&mut cloud));
        assert_eq!(cloud.vertices(), &[2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(cloud.generation(), 1);
        assert_eq!(inbox.messages(), 2);
    }

    #[test]
    fn idle_frame_leaves_cloud_alone() {
        let (_tx, mut inbox) = channel();
        let mut cloud = PointCloud::from_points(&[[1.0, 2.0, 3.0]]);
        cloud.mark_uploaded();

        assert!(!inbox.drain_into(&mut cloud));
        assert!(!cloud.needs_update());
        assert_eq!(cloud.point_count(), 1);
    }

    #[test]
    fn messages_do_not_accumulate_across_frames() {
        let (tx, mut inbox) = channel();
        let mut cloud = PointCloud::new();

        assert!(tx.points(vec![0.0; 9]));
        inbox.drain_into(&mut cloud);
        assert!(tx.points(vec![5.0; 3]));
        inbox.drain_into(&mut cloud);

        assert_eq!(cloud.vertices(), &[5.0, 5.0, 5.0]);
    }

    #[test]
    fn empty_payload_clears_cloud() {
        let (tx, mut inbox) = channel();
        let mut cloud = PointCloud::from_points(&[[1.0, 2.0, 3.0]]);

        assert!(tx.points(Vec::new()));
        assert!(inbox.drain_into(&mut cloud));
        assert!(cloud.is_empty());
        assert!(cloud.needs_update());
    }

    #[test]
    fn state_changes_apply_in_order() {
        let (tx, mut inbox) = channel();
        let mut cloud = PointCloud::new();

        tx.state(ConnectionState::Open);
        tx.state(ConnectionState::Streaming);
        tx.state(ConnectionState::Closed);
        inbox.drain_into(&mut cloud);

        assert_eq!(inbox.state(), &ConnectionState::Closed);
    }

    #[test]
    fn vanished_network_thread_is_a_failure() {
        let (tx, mut inbox) = channel();
        let mut cloud = PointCloud::new();

        tx.state(ConnectionState::Open);
        drop(tx);
        inbox.drain_into(&mut cloud);

        assert!(matches!(inbox.state(), ConnectionState::Failed(_)));
    }

    #[test]
    fn closed_stays_closed_after_disconnect() {
        let (tx, mut inbox) = channel();
        let mut cloud = PointCloud::new();

        tx.state(ConnectionState::Closed);
        drop(tx);
        inbox.drain_into(&mut cloud);
        inbox.drain_into(&mut cloud);

        assert_eq!(inbox.state(), &ConnectionState::Closed);
    }

    #[test]
    fn undrained_payloads_hold_only_the_newest() {
        let (tx, mut inbox) = channel();

        for i in 0..100 {
            assert!(tx.points(vec![i as f32; 3_000]));
        }

        {
            let slot = inbox.slot.lock();
            assert_eq!(slot.received, 100);
            assert_eq!(slot.latest.as_ref().map(|v| v[0]), Some(99.0));
        }

        let mut cloud = PointCloud::new();
        assert!(inbox.drain_into(&mut cloud));
        assert_eq!(cloud.point_count(), 1_000);
        assert_eq!(cloud.vertices()[0], 99.0);
        assert_eq!(inbox.messages(), 100);
        assert!(inbox.slot.lock().latest.is_none());
    }

    #[test]
    fn publishing_after_inbox_dropped_reports_gone() {
        let (tx, inbox) = channel();
        let slot = tx.point_slot();
        drop(inbox);

        assert!(!tx.points(vec![1.0, 2.0, 3.0]));
        assert!(!slot.publish(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn point_slot_does_not_keep_connection_alive() {
        let (tx, mut inbox) = channel();
        let slot = tx.point_slot();
        let mut cloud = PointCloud::new();

        drop(tx);
        assert!(slot.publish(vec![4.0, 5.0, 6.0]));
        assert!(inbox.drain_into(&mut cloud));

        assert_eq!(cloud.vertices(), &[4.0, 5.0, 6.0]);
        assert!(matches!(inbox.state(), ConnectionState::Failed(_)));
    }
}
