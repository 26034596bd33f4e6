//! Handoff queue - bridges suspended HTTP handlers to the pulling consumer.
//!
//! Flow:
//! 1. HTTP handler parses a registration and calls [`HandoffSender::submit`]
//! 2. `submit` enqueues the registration with a oneshot responder and waits
//! 3. Consumer calls [`HandoffReceiver::next`] and gets the registration plus
//!    an [`AckHandle`] wrapping the responder
//! 4. Consumer calls `ack()` or `nack()`; the waiting handler wakes with a
//!    [`Delivery`] and writes the HTTP response

use crate::domain::error::{AckError, AdapterError, NackReason};
use crate::domain::handoff_id::HandoffId;
use shared_types::{DevAddr, Registration};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tracing::{debug, warn};

/// Consumer verdict carried back to the handler
#[derive(Debug)]
enum AckOutcome {
    Ack,
    Nack(NackReason),
}

/// A queued registration and the channel its handler waits on
struct Handoff {
    id: HandoffId,
    registration: Registration,
    responder: oneshot::Sender<AckOutcome>,
}

/// How a submitted registration ended, from the HTTP handler's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Consumer called `ack()`
    Acked,
    /// Consumer called `nack(reason)`
    Nacked(NackReason),
    /// Intake shut down before the consumer answered
    Shutdown,
    /// Consumer dropped the [`AckHandle`] without answering
    Abandoned,
    /// Configured `ack_timeout` elapsed
    TimedOut,
}

/// Create a handoff queue.
///
/// Setting `shutdown` to `true` (or dropping its sender) fails pending and
/// future `submit`/`next` calls with a shutdown result.
pub fn handoff_channel(
    capacity: usize,
    ack_timeout: Option<Duration>,
    shutdown: watch::Receiver<bool>,
) -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        HandoffSender {
            tx,
            shutdown: shutdown.clone(),
            ack_timeout,
        },
        HandoffReceiver {
            rx: Mutex::new(rx),
            shutdown,
        },
    )
}

/// Producer side, cloned into every HTTP handler
#[derive(Clone)]
pub struct HandoffSender {
    tx: mpsc::Sender<Handoff>,
    shutdown: watch::Receiver<bool>,
    ack_timeout: Option<Duration>,
}

impl HandoffSender {
    /// Enqueue `registration` and wait until the consumer answers.
    ///
    /// Enqueue order is delivery order. Waits for queue space when the
    /// queue is full.
    pub async fn submit(&self, registration: Registration) -> Delivery {
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return Delivery::Shutdown;
        }

        let id = HandoffId::new();
        let dev_addr = registration.dev_addr;
        let (responder, outcome) = oneshot::channel();
        let handoff = Handoff {
            id,
            registration,
            responder,
        };

        tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => return Delivery::Shutdown,
            sent = self.tx.send(handoff) => {
                if sent.is_err() {
                    return Delivery::Shutdown;
                }
            }
        }

        debug!(
            handoff_id = %id,
            dev_addr = %dev_addr,
            "Registration queued for consumer"
        );

        let wait = async {
            tokio::select! {
                biased;
                outcome = outcome => match outcome {
                    Ok(AckOutcome::Ack) => Delivery::Acked,
                    Ok(AckOutcome::Nack(reason)) => Delivery::Nacked(reason),
                    Err(_) if *shutdown.borrow() => Delivery::Shutdown,
                    Err(_) => Delivery::Abandoned,
                },
                _ = wait_for_shutdown(&mut shutdown) => Delivery::Shutdown,
            }
        };

        match self.ack_timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.unwrap_or_else(|_| {
                warn!(
                    handoff_id = %id,
                    dev_addr = %dev_addr,
                    timeout_ms = limit.as_millis() as u64,
                    "Consumer did not acknowledge registration in time"
                );
                Delivery::TimedOut
            }),
            None => wait.await,
        }
    }
}

/// Consumer side, owned by the adapter
pub struct HandoffReceiver {
    rx: Mutex<mpsc::Receiver<Handoff>>,
    shutdown: watch::Receiver<bool>,
}

impl HandoffReceiver {
    /// Wait for the next registration.
    ///
    /// Concurrent callers are served one at a time; every registration goes
    /// to exactly one of them. Registrations whose handler already stopped
    /// waiting are skipped.
    pub async fn next(&self) -> Result<(Registration, AckHandle), AdapterError> {
        let mut shutdown = self.shutdown.clone();

        let mut rx = tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => return Err(AdapterError::Shutdown),
            guard = self.rx.lock() => guard,
        };

        loop {
            let handoff = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => return Err(AdapterError::Shutdown),
                next = rx.recv() => next.ok_or(AdapterError::Shutdown)?,
            };

            if handoff.responder.is_closed() {
                debug!(
                    handoff_id = %handoff.id,
                    dev_addr = %handoff.registration.dev_addr,
                    "Skipping registration whose request is gone"
                );
                continue;
            }

            debug!(
                handoff_id = %handoff.id,
                dev_addr = %handoff.registration.dev_addr,
                "Delivering registration to consumer"
            );

            let ack = AckHandle {
                id: handoff.id,
                dev_addr: handoff.registration.dev_addr,
                responder: Some(handoff.responder),
            };
            return Ok((handoff.registration, ack));
        }
    }
}

/// One-shot acknowledgement for a delivered registration.
///
/// Exactly one of [`ack`](Self::ack) or [`nack`](Self::nack) must be called.
/// Later calls return [`AckError::AlreadySignalled`] and never produce a
/// second response. Dropping the handle unsignalled answers the HTTP request
/// with `500`.
#[derive(Debug)]
#[must_use = "an AckHandle must be acked or nacked"]
pub struct AckHandle {
    id: HandoffId,
    dev_addr: DevAddr,
    responder: Option<oneshot::Sender<AckOutcome>>,
}

impl AckHandle {
    /// Accept the registration; the HTTP request is answered `200`.
    pub fn ack(&mut self) -> Result<(), AckError> {
        self.signal(AckOutcome::Ack)
    }

    /// Refuse the registration; the HTTP request is answered with the
    /// status mapped from `reason`.
    pub fn nack(&mut self, reason: NackReason) -> Result<(), AckError> {
        self.signal(AckOutcome::Nack(reason))
    }

    /// Whether `ack` or `nack` has been called.
    pub fn is_signalled(&self) -> bool {
        self.responder.is_none()
    }

    pub fn id(&self) -> HandoffId {
        self.id
    }

    fn signal(&mut self, outcome: AckOutcome) -> Result<(), AckError> {
        let responder = self.responder.take().ok_or(AckError::AlreadySignalled)?;

        debug!(
            handoff_id = %self.id,
            dev_addr = %self.dev_addr,
            outcome = ?outcome,
            "Signalling registration outcome"
        );

        responder.send(outcome).map_err(|_| AckError::ResponderGone)
    }
}

impl Drop for AckHandle {
    fn drop(&mut self) {
        if self.responder.is_some() {
            warn!(
                handoff_id = %self.id,
                dev_addr = %self.dev_addr,
                "AckHandle dropped without ack or nack"
            );
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // Err means the sender is gone, which is a shutdown as well
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}
