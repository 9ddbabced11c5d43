//! Session: a reassembler bound to the peer's notify subscription.

use crate::protocol::{Ack, MsgId};
use crate::reassembler::TransferReassembler;
use crate::wire;

/// Outbound notify primitive supplied by the host.
pub trait NotifySink {
    /// Deliver one encoded acknowledgment to the subscribed peer.
    fn send(&mut self, bytes: &[u8]);
}

/// Collects notifications in memory.
impl NotifySink for Vec<Vec<u8>> {
    fn send(&mut self, bytes: &[u8]) {
        self.push(bytes.to_vec());
    }
}

/// One peer connection. Acknowledgments go to the attached sink, or are dropped if none is attached.
pub struct Session<S> {
    reassembler: TransferReassembler,
    sink: Option<S>,
}

impl<S: NotifySink> Session<S> {
    pub fn new(reassembler: TransferReassembler) -> Self {
        Self {
            reassembler,
            sink: None,
        }
    }

    /// Peer enabled notifications. Replaces any previous sink.
    pub fn subscribe(&mut self, sink: S) {
        self.sink = Some(sink);
    }

    /// Peer disabled notifications. Returns the detached sink.
    pub fn unsubscribe(&mut self) -> Option<S> {
        self.sink.take()
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.is_some()
    }

    /// Host delivers one characteristic write.
    pub fn on_inbound_write(&mut self, bytes: &[u8]) {
        if let Some(ack) = self.reassembler.on_inbound_write(bytes) {
            self.notify(&ack);
        }
    }

    /// Periodic expiry sweep. Expired transfers are not acknowledged.
    pub fn tick(&mut self) -> Vec<MsgId> {
        self.reassembler.tick()
    }

    pub fn reassembler(&self) -> &TransferReassembler {
        &self.reassembler
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    fn notify(&mut self, ack: &Ack) {
        let Some(sink) = self.sink.as_mut() else {
            tracing::debug!(?ack, "no subscriber, dropping ack");
            return;
        };
        match wire::encode_ack(ack) {
            Ok(bytes) => sink.send(&bytes),
            Err(e) => tracing::warn!(error = %e, "failed to encode ack"),
        }
    }
}
