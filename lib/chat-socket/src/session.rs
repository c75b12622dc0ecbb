use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use stoa_campus::data_access::DataAccess;
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::messenger::{Messenger, SendMessageError};
use stoa_messenger::{MessageDelivery, UserId};
use stoa_utils::async_utils;
use stoa_utils::utils::log_internal_error;

use crate::events::{ClientEvent, PrivateMessage, ServerEvent};

/// Runs one client connection from accept to EOF.
///
/// A session starts anonymous. Each `login` line registers a fresh delivery
/// channel for the announced user and pipes it into this connection's
/// outbound stream as `new message` events; a session may announce any
/// number of identities. The write half belongs to a single writer task, so
/// deliveries and send responses never interleave mid-line. Whatever ends
/// the session, every channel it registered is retired before returning.
pub async fn handle_connection<S, RW>(messenger: Messenger<S>, stream: RW) -> Result<()>
where
    S: DataAccess + MessageStore,
    RW: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);

    let (outbound, outbound_receiver) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(write_half, outbound_receiver));

    let mut registered: Vec<UnboundedSender<MessageDelivery>> = Vec::new();
    let mut lines = BufReader::new(read_half).lines();

    let result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(anyhow::Error::new(e).context("Chat connection failed")),
        };

        let event: ClientEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(_) => {
                tracing::warn!("Ignoring unparseable chat event");
                continue;
            }
        };

        match event {
            ClientEvent::Login(user_id) => {
                let user_id: UserId = match user_id.parse() {
                    Ok(user_id) => user_id,
                    Err(_) => {
                        tracing::warn!("Ignoring login with malformed user id: {user_id}");
                        continue;
                    }
                };

                let (delivery_sender, delivery_receiver) = mpsc::unbounded_channel();
                if let Err(e) = messenger.registry().register(user_id, delivery_sender.clone()) {
                    log_internal_error(e);
                    continue;
                }
                registered.push(delivery_sender);

                async_utils::forward_unbounded_channel(delivery_receiver, outbound.clone(), |delivery| {
                    Some(ServerEvent::NewMessage(delivery))
                });
            }
            ClientEvent::PrivateMessage(submission) => {
                let response = submit_message(&messenger, submission).await;
                if outbound.send(response).is_err() {
                    // writer is gone, so the socket is too
                    break Ok(());
                }
            }
        }
    };

    for channel in &registered {
        if let Err(e) = messenger.registry().deregister(channel) {
            log_internal_error(e);
        }
    }
    drop(registered);
    drop(outbound);
    let _ = writer.await;

    result
}

/// Validates and executes one send, phrasing the outcome as the event the
/// submitting connection gets back. The receiver's copy travels through the
/// registry inside the messenger.
async fn submit_message<S>(messenger: &Messenger<S>, submission: PrivateMessage) -> ServerEvent
where
    S: DataAccess + MessageStore,
{
    let (from, to) = match parse_submission(&submission) {
        Some(ids) => ids,
        None => return ServerEvent::MessageError("Invalid message data".to_owned()),
    };

    match messenger.send_message(from, to, submission.content).await {
        Ok(delivery) => ServerEvent::MessageSent(delivery),
        Err(e @ SendMessageError::NotPermitted) => ServerEvent::MessageError(e.to_string()),
        Err(SendMessageError::Internal(e)) => {
            log_internal_error(&e);
            ServerEvent::MessageError(format!("{e:#}"))
        }
    }
}

fn parse_submission(submission: &PrivateMessage) -> Option<(UserId, UserId)> {
    if submission.content.is_empty() {
        return None;
    }
    let from = submission.from.parse().ok()?;
    let to = submission.to.parse().ok()?;
    Some((from, to))
}

async fn write_events<W>(mut write_half: W, mut events: UnboundedReceiver<ServerEvent>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let mut line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                log_internal_error(e);
                continue;
            }
        };
        line.push('\n');

        if write_half.write_all(line.as_bytes()).await.is_err() {
            break;
        }
        if write_half.flush().await.is_err() {
            break;
        }
    }
}
