// client/src/mux/mod.rs
//
// Multiplexed market-data streams. A stream is handed out as a `StreamTask`:
// the reader half for the consumer plus a worker future that nobody polls
// until the caller launches it on whatever thread it wants.

pub mod envelope;
pub mod sources;

use crate::error::{Result, RuntimeError};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{sleep_until, Instant};

/// Lines buffered between the worker and the reader.
pub const STREAM_BUFFER: usize = 256;

/// Decoded lines produced by a transport, in arrival order.
pub type FrameStream = BoxStream<'static, Result<String>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MuxOptions {
    pub max_messages: Option<u32>,
    pub timeout: Option<Duration>,
}

impl MuxOptions {
    /// Zero means "no bound" for either value.
    pub fn bounded(max_messages: u32, timeout_seconds: u64) -> Self {
        Self {
            max_messages: (max_messages > 0).then_some(max_messages),
            timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
        }
    }
}

/// Why a worker stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuxOutcome {
    Completed,
    MaxMessages,
    TimedOut,
    Abandoned,
    ReadFailed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    Pending,
    Closed,
}

/// Receiving half of a stream. Never blocks.
#[derive(Debug)]
pub struct StreamReader {
    rx: mpsc::Receiver<Result<String>>,
}

impl StreamReader {
    pub fn try_read(&mut self) -> Result<ReadOutcome> {
        match self.rx.try_recv() {
            Ok(Ok(line)) => Ok(ReadOutcome::Line(line)),
            Ok(Err(err)) => Err(err),
            Err(TryRecvError::Empty) => Ok(ReadOutcome::Pending),
            Err(TryRecvError::Disconnected) => Ok(ReadOutcome::Closed),
        }
    }
}

pub struct StreamTask {
    pub label: String,
    pub reader: StreamReader,
    pub worker: BoxFuture<'static, MuxOutcome>,
}

impl StreamTask {
    /// Wraps a transport that still has to be opened. The timeout covers the
    /// opening as well as the reads.
    pub fn from_opening<F>(label: impl Into<String>, opening: F, options: MuxOptions) -> Self
    where
        F: Future<Output = Result<FrameStream>> + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let worker_label = label.clone();

        let worker = async move {
            let deadline = options.timeout.map(|t| Instant::now() + t);
            let expiry = sleep_until(deadline.unwrap_or_else(Instant::now));
            tokio::pin!(expiry);

            let opened = tokio::select! {
                _ = &mut expiry, if deadline.is_some() => return MuxOutcome::TimedOut,
                _ = tx.closed() => return MuxOutcome::Abandoned,
                opened = opening => opened,
            };

            let outcome = match opened {
                Ok(frames) => pump(frames, &tx, options.max_messages, deadline).await,
                Err(err) => {
                    log::warn!("[{worker_label}] stream failed to open: {err}");
                    if err.is_decode() {
                        tokio::select! {
                            _ = &mut expiry, if deadline.is_some() => MuxOutcome::TimedOut,
                            _ = tx.send(Err(err)) => MuxOutcome::ReadFailed,
                        }
                    } else {
                        MuxOutcome::Failed
                    }
                }
            };
            log::info!("[{worker_label}] stream finished: {outcome:?}");
            outcome
        }
        .boxed();

        Self {
            label,
            reader: StreamReader { rx },
            worker,
        }
    }

    /// A task whose worker ends immediately; the reader sees a closed stream.
    pub fn failed(label: impl Into<String>, err: RuntimeError) -> Self {
        Self::from_opening(label, async move { Err(err) }, MuxOptions::default())
    }

    pub fn into_parts(self) -> (StreamReader, BoxFuture<'static, MuxOutcome>) {
        (self.reader, self.worker)
    }
}

/// Forwards lines until a bound is hit, the producer ends, or the reader
/// goes away. Decode failures are forwarded once; transport failures only
/// end the stream.
pub async fn pump(
    mut frames: FrameStream,
    tx: &mpsc::Sender<Result<String>>,
    max_messages: Option<u32>,
    deadline: Option<Instant>,
) -> MuxOutcome {
    let expiry = sleep_until(deadline.unwrap_or_else(Instant::now));
    tokio::pin!(expiry);
    let mut sent: u32 = 0;

    loop {
        if max_messages.is_some_and(|max| sent >= max) {
            return MuxOutcome::MaxMessages;
        }

        let item = tokio::select! {
            _ = &mut expiry, if deadline.is_some() => return MuxOutcome::TimedOut,
            _ = tx.closed() => return MuxOutcome::Abandoned,
            item = frames.next() => item,
        };

        match item {
            None => return MuxOutcome::Completed,
            Some(Ok(line)) => {
                let delivered = tokio::select! {
                    _ = &mut expiry, if deadline.is_some() => return MuxOutcome::TimedOut,
                    res = tx.send(Ok(line)) => res.is_ok(),
                };
                if !delivered {
                    return MuxOutcome::Abandoned;
                }
                sent += 1;
            }
            Some(Err(err)) if err.is_decode() => {
                log::warn!("stream decode failure: {err}");
                return tokio::select! {
                    _ = &mut expiry, if deadline.is_some() => MuxOutcome::TimedOut,
                    _ = tx.send(Err(err)) => MuxOutcome::ReadFailed,
                };
            }
            Some(Err(err)) => {
                log::warn!("stream transport failure: {err}");
                return MuxOutcome::Failed;
            }
        }
    }
}
