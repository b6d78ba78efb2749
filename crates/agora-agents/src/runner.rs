//! Async driver that runs a [`Negotiation`] against a transport and mailbox

use agora_bus::{Mailbox, Transport};
use agora_core::Message;
use tokio::time::Instant;

use crate::negotiation::Negotiation;

/// Drive `negotiation` until it reaches a terminal outcome.
///
/// When no matching reply is queued the driver suspends on the mailbox (and
/// on the phase deadline, if configured) instead of polling. Replies that
/// arrive for this negotiation after it ends are purged from the mailbox.
pub async fn drive(
    mut negotiation: Negotiation,
    transport: &dyn Transport,
    mailbox: &Mailbox,
) -> Negotiation {
    let mut watcher = mailbox.watch();
    watcher.mark_seen();

    dispatch(transport, negotiation.start()).await;

    let timeout = negotiation.config().phase_timeout;
    let mut phase = negotiation.phase();
    let mut deadline = timeout.map(|t| Instant::now() + t);

    while !negotiation.is_done() {
        watcher.mark_seen();
        let template = negotiation.reply_template();

        if let Some(message) = mailbox.try_receive(&template) {
            let outgoing = negotiation.on_message(message);
            dispatch(transport, outgoing).await;
        } else {
            match deadline {
                Some(at) => {
                    tokio::select! {
                        _ = watcher.changed() => {}
                        _ = tokio::time::sleep_until(at) => {
                            let outgoing = negotiation.on_deadline();
                            dispatch(transport, outgoing).await;
                        }
                    }
                }
                None => watcher.changed().await,
            }
        }

        if negotiation.phase() != phase {
            phase = negotiation.phase();
            deadline = timeout.map(|t| Instant::now() + t);
        }
    }

    let purged = mailbox.discard(&negotiation.reply_template());
    if purged > 0 {
        tracing::debug!(negotiation = %negotiation.id(), purged, "late replies purged");
    }
    negotiation
}

async fn dispatch(transport: &dyn Transport, outgoing: Vec<Message>) {
    for message in outgoing {
        let performative = message.performative;
        if let Err(e) = transport.send(message).await {
            tracing::warn!(performative = %performative, error = %e, "message not fully delivered");
        }
    }
}
