//! Push-style delivery of a single request's lifecycle.
//!
//! # Design
//! The exchange runs on a spawned tokio task and reports through one mpsc
//! channel, which is the only place events are delivered. A request always
//! emits `Started`, then either `Value` followed by `Completed`, or `Failed`.
//! Exactly one terminal event is sent, after which the stream ends.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::classifier::{HttpError, StatusCodes};
use crate::error::ApiError;

/// One lifecycle event of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestEvent<T> {
    /// The request is about to be sent.
    Started,
    /// The decoded result; always followed by `Completed`.
    Value(T),
    /// Terminal event after a successful `Value`.
    Completed,
    /// Terminal event carrying the failure.
    Failed(ApiError),
}

impl<T> RequestEvent<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestEvent::Completed | RequestEvent::Failed(_))
    }
}

/// Stream of `RequestEvent`s for one request.
#[derive(Debug)]
pub struct ResponseStream<T> {
    rx: mpsc::Receiver<RequestEvent<T>>,
}

impl<T: Send + 'static> ResponseStream<T> {
    /// Run `exchange` on the current tokio runtime and stream its outcome.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub(crate) fn spawn<F>(exchange: F) -> Self
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(3);
        tokio::spawn(async move {
            if tx.send(RequestEvent::Started).await.is_err() {
                return;
            }
            match exchange.await {
                Ok(value) => {
                    if tx.send(RequestEvent::Value(value)).await.is_ok() {
                        let _ = tx.send(RequestEvent::Completed).await;
                    }
                }
                Err(err) => {
                    let _ = tx.send(RequestEvent::Failed(err)).await;
                }
            }
        });
        Self { rx }
    }

    /// A stream that fails without touching the network.
    pub(crate) fn failed(err: ApiError) -> Self {
        let (tx, rx) = mpsc::channel(2);
        let _ = tx.try_send(RequestEvent::Started);
        let _ = tx.try_send(RequestEvent::Failed(err));
        Self { rx }
    }
}

impl<T> ResponseStream<T> {
    pub async fn next_event(&mut self) -> Option<RequestEvent<T>> {
        self.rx.recv().await
    }

    /// Drain the stream and return the single value or the failure.
    pub async fn into_result(mut self) -> Result<T, ApiError> {
        let mut value = None;
        while let Some(event) = self.rx.recv().await {
            match event {
                RequestEvent::Started => {}
                RequestEvent::Value(v) => value = Some(v),
                RequestEvent::Failed(err) => return Err(err),
                RequestEvent::Completed => break,
            }
        }
        value.ok_or_else(|| {
            ApiError::Transport(HttpError::new(
                "",
                StatusCodes::INTERNAL_SERVER_ERROR,
                "request ended without a value",
            ))
        })
    }
}

impl<T> Stream for ResponseStream<T> {
    type Item = RequestEvent<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
