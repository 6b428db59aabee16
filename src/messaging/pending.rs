use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use uuid::Uuid;

use super::wire::{ReplyOutcome, ValidateProductsReply};

/// Requests waiting for a reply, keyed by correlation id.
#[derive(Default)]
pub(crate) struct PendingReplies {
    waiters: Mutex<HashMap<Uuid, oneshot::Sender<ReplyOutcome>>>,
}

/// A registered request. Dropping it, whether the reply arrived, timed out
/// or the caller went away, removes the entry.
pub(crate) struct Waiter<'a> {
    pending: &'a PendingReplies,
    correlation_id: Uuid,
    reply: oneshot::Receiver<ReplyOutcome>,
}

impl Waiter<'_> {
    pub fn reply(&mut self) -> &mut oneshot::Receiver<ReplyOutcome> {
        &mut self.reply
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.pending.waiters().remove(&self.correlation_id);
    }
}

impl PendingReplies {
    pub fn register(&self, correlation_id: Uuid) -> Waiter<'_> {
        let (tx, rx) = oneshot::channel();
        self.waiters().insert(correlation_id, tx);
        Waiter {
            pending: self,
            correlation_id,
            reply: rx,
        }
    }

    /// Hand a reply to its waiter. Returns false for late or foreign replies.
    pub fn complete(&self, reply: ValidateProductsReply) -> bool {
        let waiter = self.waiters().remove(&reply.correlation_id);
        match waiter {
            Some(tx) => tx.send(reply.outcome).is_ok(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.waiters().len()
    }

    // Never held across an await
    fn waiters(&self) -> MutexGuard<'_, HashMap<Uuid, oneshot::Sender<ReplyOutcome>>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
