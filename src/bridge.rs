//! Single-assignment bridge between asynchronous delivery and a blocking
//! caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::message::Message;
use crate::status::Status;

/// Outcome of one call: a reply message or a terminal status.
pub type CallOutcome = Result<Message, Status>;

/// Create a pending-reply pair: the resolver half is handed to the
/// asynchronous delivery path, the waiter half to the caller.
///
/// The resolver may be cloned freely across delivery and error paths; only
/// the first resolution wins, every later attempt is dropped. The waiter
/// observes the outcome exactly once.
pub fn pending_reply() -> (ReplyResolver, PendingReply) {
    let (tx, rx) = bounded(1);
    let resolver = ReplyResolver {
        resolved: Arc::new(AtomicBool::new(false)),
        tx,
    };
    (resolver, PendingReply { rx })
}

/// Write half of the bridge. First writer wins.
#[derive(Clone)]
pub struct ReplyResolver {
    resolved: Arc<AtomicBool>,
    tx: Sender<CallOutcome>,
}

impl ReplyResolver {
    /// Resolve the bridge. Returns `false` if it was already resolved, in
    /// which case the outcome is dropped.
    pub fn resolve(&self, outcome: CallOutcome) -> bool {
        if self.resolved.swap(true, Ordering::AcqRel) {
            return false;
        }
        // Capacity 1 and the flag above guarantee this send succeeds
        // unless the waiter is already gone, which is fine either way.
        let _ = self.tx.send(outcome);
        true
    }

    /// Whether a resolution has already been recorded.
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

/// Read half of the bridge.
pub struct PendingReply {
    rx: Receiver<CallOutcome>,
}

impl PendingReply {
    /// Block the calling thread until the bridge resolves.
    ///
    /// If every resolver was dropped without resolving, this surfaces an
    /// internal error rather than blocking forever.
    pub fn wait(self) -> CallOutcome {
        match self.rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(Status::internal("call dropped without a reply")),
        }
    }
}
