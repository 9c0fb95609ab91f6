//! Cancellable fragment stream
//!
//! A producer task pulls fragments from the upstream source and hands them to
//! the consumer through a bounded, in-order channel. The consumer sees a plain
//! `Stream<Item = String>` that ends either cleanly or with one final
//! `"Error: <message>"` fragment. Dropping the stream aborts the producer.

use crate::error::{AppError, AppResult};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

const NO_CONTENT: &str = "generation service returned no content";

/// Terminal state of a [`FragmentStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Fragments may still arrive
    Open,
    /// The service signalled completion
    Ended,
    /// The service failed after the stream began; the last fragment was the error marker
    Faulted,
}

enum StreamEvent {
    Fragment(String),
    Faulted(String),
}

/// Lazily produced, finite, non-restartable sequence of text fragments
pub struct FragmentStream {
    receiver: mpsc::Receiver<StreamEvent>,
    producer: Option<AbortHandle>,
    state: StreamState,
}

impl FragmentStream {
    /// Spawn a producer draining `source` into a channel of `buffer` slots
    ///
    /// Empty fragments are skipped. The first `Err` ends the stream in the
    /// `Faulted` state.
    pub fn spawn<S>(source: S, buffer: usize) -> Self
    where
        S: Stream<Item = AppResult<String>> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(buffer.max(1));

        let handle = tokio::spawn(async move {
            let mut source = Box::pin(source);
            let mut fragments_sent = 0usize;

            while let Some(item) = source.next().await {
                let event = match item {
                    Ok(text) if text.is_empty() => continue,
                    Ok(text) => StreamEvent::Fragment(text),
                    Err(e) => {
                        tracing::warn!(
                            fragments_sent = fragments_sent,
                            error = %e,
                            "Generation stream failed mid-response"
                        );
                        let _ = sender.send(StreamEvent::Faulted(fault_message(&e))).await;
                        return;
                    }
                };

                if sender.send(event).await.is_err() {
                    tracing::debug!(
                        fragments_sent = fragments_sent,
                        "Stream consumer went away, abandoning upstream call"
                    );
                    return;
                }
                fragments_sent += 1;
            }

            tracing::debug!(fragments_sent = fragments_sent, "Generation stream ended");
        });

        Self {
            receiver,
            producer: Some(handle.abort_handle()),
            state: StreamState::Open,
        }
    }

    /// Wait for the first fragment, then spawn the producer for the rest
    ///
    /// A failure, or an end without any text, before the first fragment is
    /// returned as `Err`: nothing has been sent yet, so callers can still
    /// answer with an ordinary error.
    pub async fn start<S>(source: S, buffer: usize) -> AppResult<Self>
    where
        S: Stream<Item = AppResult<String>> + Send + 'static,
    {
        let mut source = Box::pin(source);
        loop {
            match source.next().await {
                Some(Ok(text)) if text.is_empty() => continue,
                Some(Ok(first)) => {
                    let rest =
                        futures::stream::iter([Ok::<String, AppError>(first)]).chain(source);
                    return Ok(Self::spawn(rest, buffer));
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Generation stream failed before the first fragment");
                    return Err(e);
                }
                None => return Err(AppError::upstream(NO_CONTENT)),
            }
        }
    }

    /// Stream over an already-known list of fragments
    pub fn from_fragments(fragments: Vec<String>, buffer: usize) -> Self {
        Self::spawn(futures::stream::iter(fragments.into_iter().map(Ok)), buffer)
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Drain the stream into one string
    ///
    /// # Errors
    ///
    /// `UpstreamUnavailable` carrying the upstream message if the stream
    /// faulted (the partial text is discarded) or produced no text at all.
    pub async fn collect_text(mut self) -> AppResult<String> {
        let mut text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Fragment(fragment) => text.push_str(&fragment),
                StreamEvent::Faulted(message) => {
                    self.state = StreamState::Faulted;
                    return Err(AppError::upstream(message));
                }
            }
        }
        self.state = StreamState::Ended;
        if text.is_empty() {
            return Err(AppError::upstream(NO_CONTENT));
        }
        Ok(text)
    }
}

fn fault_message(error: &AppError) -> String {
    match error {
        AppError::UpstreamUnavailable { reason } => reason.clone(),
        other => other.to_string(),
    }
}

impl Stream for FragmentStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.state != StreamState::Open {
            return Poll::Ready(None);
        }

        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(StreamEvent::Fragment(fragment))) => Poll::Ready(Some(fragment)),
            Poll::Ready(Some(StreamEvent::Faulted(message))) => {
                self.state = StreamState::Faulted;
                Poll::Ready(Some(format!("Error: {}", message)))
            }
            Poll::Ready(None) => {
                self.state = StreamState::Ended;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for FragmentStream {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}
