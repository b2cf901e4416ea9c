//! Block-scoped touch event stream.
//!
//! One producer (the engine's blocking task) writes into a bounded queue
//! through a [`TouchSink`]; one consumer (the replay driver) drains the
//! [`TouchStream`]. The sink is not cloneable and is dropped when the engine
//! call returns, so "queue closed" means "the producer's last send is already
//! queued". Draining until closed therefore never loses buffered events, even
//! when the completion signal arrives first.

use crate::utils::error::EngineError;
use alloy_primitives::{Address, TxHash, B256};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One storage or account access observed during execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TouchEvent {
    /// Transaction that performed the access
    pub tx_hash: TxHash,
    /// Account whose state was accessed
    pub address: Address,
    /// Storage slot, or the zero key for account-level accesses
    pub storage_key: B256,
}

/// Producer half handed to the execution engine
#[derive(Debug)]
pub struct TouchSink {
    sender: mpsc::Sender<TouchEvent>,
    cancel: CancellationToken,
}

impl TouchSink {
    /// Queue one event, blocking while the queue is full
    ///
    /// Must be called from a blocking context (the engine's task), never from
    /// inside an async task.
    ///
    /// # Errors
    /// * `EngineError::StreamClosed` - consumer abandoned the block
    pub fn emit(&self, event: TouchEvent) -> Result<(), EngineError> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::StreamClosed);
        }
        self.sender
            .blocking_send(event)
            .map_err(|_| EngineError::StreamClosed)
    }

    /// Whether the consumer has asked the producer to stop
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// How a drain ended
#[derive(Debug)]
pub enum DrainStatus {
    /// Queue closed and the engine reported its result
    Completed(Result<(), EngineError>),
    /// Per-block deadline elapsed before the producer finished
    TimedOut,
    /// Run-wide cancellation fired
    Cancelled,
}

/// Outcome of draining one block's stream
#[derive(Debug)]
pub struct DrainReport {
    /// Events handed to the consumer callback
    pub delivered: u64,
    pub status: DrainStatus,
}

/// Consumer half owned by the replay driver
#[derive(Debug)]
pub struct TouchStream {
    receiver: mpsc::Receiver<TouchEvent>,
    cancel: CancellationToken,
}

/// Create a fresh stream for one block
///
/// `cancel` should be a block-scoped token (a child of the run token): it is
/// cancelled when the consumer abandons the block.
pub fn touch_stream(capacity: usize, cancel: CancellationToken) -> (TouchSink, TouchStream) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        TouchSink {
            sender,
            cancel: cancel.clone(),
        },
        TouchStream { receiver, cancel },
    )
}

impl TouchStream {
    /// Drain every event, then wait for the producer's completion signal
    ///
    /// **Public** - the consumption loop of a block replay
    ///
    /// # Arguments
    /// * `completion` - resolves once, with the engine's result, after the engine call returns
    /// * `deadline` - abandon the block if the producer has not finished by then
    /// * `on_event` - invoked synchronously for every event, in queue order
    ///
    /// # Termination
    /// Normal termination requires the queue to be closed *and* empty; the
    /// completion result is awaited only afterwards. On timeout or
    /// cancellation the queue is closed so the producer's next `emit` fails.
    pub async fn drain<C, F>(
        mut self,
        completion: C,
        deadline: Option<Duration>,
        mut on_event: F,
    ) -> DrainReport
    where
        C: Future<Output = Result<(), EngineError>>,
        F: FnMut(TouchEvent),
    {
        let mut delivered = 0u64;

        let timer = tokio::time::sleep(deadline.unwrap_or_default());
        tokio::pin!(timer);
        tokio::pin!(completion);

        // Phase 1: events until the producer closes the queue
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    return self.abandon(delivered, DrainStatus::Cancelled);
                }
                _ = &mut timer, if deadline.is_some() => {
                    return self.abandon(delivered, DrainStatus::TimedOut);
                }
                event = self.receiver.recv() => {
                    match event {
                        Some(event) => {
                            delivered += 1;
                            on_event(event);
                        }
                        None => break,
                    }
                }
            }
        }

        debug!("Touch stream closed after {} events", delivered);

        // Phase 2: the completion signal; a finished producer wins over the deadline
        tokio::select! {
            biased;

            result = &mut completion => DrainReport {
                delivered,
                status: DrainStatus::Completed(result),
            },
            _ = self.cancel.cancelled() => self.abandon(delivered, DrainStatus::Cancelled),
            _ = &mut timer, if deadline.is_some() => self.abandon(delivered, DrainStatus::TimedOut),
        }
    }

    fn abandon(mut self, delivered: u64, status: DrainStatus) -> DrainReport {
        if matches!(status, DrainStatus::TimedOut) {
            warn!("Abandoning block stream after {} events: deadline elapsed", delivered);
        }
        self.cancel.cancel();
        self.receiver.close();
        DrainReport { delivered, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;

    fn event(n: u8) -> TouchEvent {
        TouchEvent {
            tx_hash: B256::repeat_byte(1),
            address: Address::repeat_byte(n),
            storage_key: B256::repeat_byte(n),
        }
    }

    #[tokio::test]
    async fn test_events_buffered_before_completion_are_all_delivered() {
        let (sink, stream) = touch_stream(64, CancellationToken::new());

        // Producer finishes entirely (completion happened) before any dequeue.
        std::thread::spawn(move || {
            for n in 0..50 {
                sink.emit(event(n)).unwrap();
            }
        })
        .join()
        .unwrap();

        let mut seen = Vec::new();
        let report = stream
            .drain(future::ready(Ok(())), None, |event| seen.push(event))
            .await;

        assert_eq!(report.delivered, 50);
        assert!(matches!(report.status, DrainStatus::Completed(Ok(()))));
        assert_eq!(seen.len(), 50);
        assert_eq!(seen[0], event(0));
        assert_eq!(seen[49], event(49));
    }

    #[tokio::test]
    async fn test_engine_error_reported_after_drain() {
        let (sink, stream) = touch_stream(8, CancellationToken::new());
        std::thread::spawn(move || sink.emit(event(1)).unwrap())
            .join()
            .unwrap();

        let completion = future::ready(Err(EngineError::ProcessingFailed {
            block: 9,
            reason: "bad block".to_string(),
        }));
        let report = stream.drain(completion, None, |_| {}).await;

        assert_eq!(report.delivered, 1);
        assert!(matches!(
            report.status,
            DrainStatus::Completed(Err(EngineError::ProcessingFailed { block: 9, .. }))
        ));
    }

    #[tokio::test]
    async fn test_deadline_abandons_silent_producer() {
        let (sink, stream) = touch_stream(8, CancellationToken::new());

        let report = stream
            .drain(
                future::pending::<Result<(), EngineError>>(),
                Some(Duration::from_millis(20)),
                |_| {},
            )
            .await;

        assert!(matches!(report.status, DrainStatus::TimedOut));
        assert!(sink.is_cancelled());
        assert!(matches!(sink.emit(event(1)), Err(EngineError::StreamClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_at_deadline_after_close_is_not_a_timeout() {
        let (sink, stream) = touch_stream(8, CancellationToken::new());
        std::thread::spawn(move || sink.emit(event(1)).unwrap())
            .join()
            .unwrap();

        let completion = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<(), EngineError>(())
        };
        let report = stream
            .drain(completion, Some(Duration::from_millis(20)), |_| {})
            .await;

        assert_eq!(report.delivered, 1);
        assert!(matches!(report.status, DrainStatus::Completed(Ok(()))));
    }

    #[tokio::test]
    async fn test_run_cancellation_stops_drain() {
        let run = CancellationToken::new();
        let (_sink, stream) = touch_stream(8, run.child_token());
        run.cancel();

        let report = stream
            .drain(future::pending::<Result<(), EngineError>>(), None, |_| {})
            .await;

        assert!(matches!(report.status, DrainStatus::Cancelled));
        assert_eq!(report.delivered, 0);
    }
}
