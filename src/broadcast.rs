use crate::message::Message;
use crate::registry::{Registry, SessionId};
use log::trace;

/// Pushes `message` onto every other live session's outbound queue.
/// Fire-and-forget: a recipient whose queue is already closed is skipped and
/// delivery to the remaining recipients continues. That recipient's own
/// session loop notices its dead connection and tears itself down; nothing
/// propagates back to the sender.
pub fn broadcast(registry: &Registry, sender_id: SessionId, message: &Message) {
    registry.for_each_live_except(sender_id, |tx| {
        if tx.send(message.clone()).is_err() {
            trace!("Dropped broadcast to a closing session");
        }
    });
}
