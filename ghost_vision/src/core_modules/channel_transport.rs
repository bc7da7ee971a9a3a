// THEORY:
// `ChannelTransport` is the bundled `Transport`: it owns a stream of inbound
// messages and, on registration, spawns a tokio task that pumps the stream
// into the observer. The stream can be handed out exactly once.
//
// Registration requires a running tokio runtime. Without one it reports
// `NotReady` and keeps the stream, so a later attempt can succeed.

use crate::error::TransportError;
use crate::host::{InboundMessage, InboundObserver, Transport};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type MessageStream = BoxStream<'static, InboundMessage>;

pub struct ChannelTransport {
    stream: Mutex<Option<MessageStream>>,
    forwarder: Mutex<Option<JoinHandle<u64>>>,
}

impl ChannelTransport {
    pub fn new<S>(messages: S) -> Self
    where
        S: futures::Stream<Item = InboundMessage> + Send + 'static,
    {
        Self {
            stream: Mutex::new(Some(messages.boxed())),
            forwarder: Mutex::new(None),
        }
    }

    /// A transport fed by the returned sender.
    pub fn unbounded() -> (mpsc::UnboundedSender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let messages = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        });
        (tx, Self::new(messages))
    }

    /// Takes the forwarding task, if registration spawned one. The task
    /// resolves to the number of messages delivered once the stream ends.
    pub fn take_forwarder(&self) -> Option<JoinHandle<u64>> {
        self.forwarder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Transport for ChannelTransport {
    fn register(&self, observer: Arc<dyn InboundObserver>) -> Result<(), TransportError> {
        let handle = Handle::try_current().map_err(|e| TransportError::NotReady(e.to_string()))?;
        let mut messages = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(TransportError::AlreadyTaken)?;

        let task = handle.spawn(async move {
            let mut delivered = 0u64;
            while let Some(message) = messages.next().await {
                observer.on_message(&message);
                delivered += 1;
            }
            tracing::debug!(delivered, "Inbound stream ended");
            delivered
        });
        *self.forwarder.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        Ok(())
    }
}
