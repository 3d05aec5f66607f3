//! The single decision point for revealing a contact.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rolodex_shared::constants::DAILY_LIMIT;

use crate::error::{ApiError, ClientError, Result};
use crate::reconciler::QuotaReconciler;
use crate::store::QuotaStore;

/// How a reveal request ended. Infrastructure failures that need the
/// caller's attention come back as [`ClientError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Counted against today's quota.
    Revealed { remaining: u32 },
    /// Already counted today; nothing was spent.
    AlreadyRevealed,
    /// No quota left today. Further reveals should be disabled.
    LimitExceeded,
    /// The server could not be reached or failed. Nothing was spent and the
    /// request may be retried.
    TransientError(String),
}

/// Counts a commit as in flight until it is finished or dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }

    /// Returns `true` if no other commit was still in flight.
    fn finish(self) -> bool {
        let sole = self.0.fetch_sub(1, Ordering::SeqCst) == 1;
        std::mem::forget(self);
        sole
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct RevealGate {
    store: Arc<QuotaStore>,
    reconciler: QuotaReconciler,
    ticks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    in_flight: Arc<AtomicUsize>,
    /// Set when overlapping answers disagreed with the ledger; cleared by a
    /// full resync once nothing is in flight.
    needs_resync: Arc<AtomicBool>,
}

impl RevealGate {
    pub fn new(store: Arc<QuotaStore>, reconciler: QuotaReconciler) -> Self {
        Self {
            store,
            reconciler,
            ticks: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            needs_resync: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The daily limit last reported by the server.
    pub fn limit(&self) -> u32 {
        self.reconciler.daily_limit().unwrap_or(DAILY_LIMIT)
    }

    /// Reveals left today according to the local cache.
    pub fn remaining(&self) -> u32 {
        self.store.read_current().remaining(self.limit())
    }

    /// Whether a new reveal would currently be attempted at all.
    pub fn can_reveal(&self) -> bool {
        self.store.is_active() && self.remaining() > 0
    }

    pub fn is_revealed(&self, contact_id: &str) -> bool {
        self.store.read_current().is_viewed(contact_id)
    }

    /// Try to reveal `contact_id`.
    ///
    /// Each call is validated against the cache as it is when the call
    /// starts; the server then re-validates against its own counter and its
    /// verdict decides the outcome.
    pub async fn request_reveal(&self, contact_id: &str) -> Result<RevealOutcome> {
        let contact_id = contact_id.trim();
        if contact_id.is_empty() {
            return Err(ClientError::MissingContactId);
        }
        if !self.store.is_active() {
            return Err(ClientError::Unauthenticated);
        }

        self.store.apply_rollover();
        let snapshot = self.store.read();
        if snapshot.is_viewed(contact_id) {
            return Ok(RevealOutcome::AlreadyRevealed);
        }
        if snapshot.has_exceeded(self.limit()) {
            debug!(contact = %contact_id, "Reveal refused locally: daily limit reached");
            return Ok(RevealOutcome::LimitExceeded);
        }

        let in_flight = InFlight::enter(&self.in_flight);
        let result = self.reconciler.commit_increment(contact_id).await;
        let sole = in_flight.finish();

        match result {
            Ok(commit) => {
                // Another call may have landed the same id while this one
                // was in flight; the ledger only counts it once.
                let disagreed = self.store.apply_confirmed(contact_id, &commit.record, sole);
                if disagreed && !sole {
                    self.needs_resync.store(true, Ordering::SeqCst);
                } else if sole && self.needs_resync.swap(false, Ordering::SeqCst) {
                    self.resync().await;
                }

                if commit.already_viewed {
                    debug!(contact = %contact_id, "Reveal already counted by server");
                    return Ok(RevealOutcome::AlreadyRevealed);
                }

                self.spawn_weekly_tick();
                let remaining = self.remaining();
                info!(contact = %contact_id, remaining, "Contact revealed");
                Ok(RevealOutcome::Revealed { remaining })
            }
            Err(ApiError::LimitExceeded {
                snapshot: remote,
                daily_limit,
            }) => {
                info!(
                    contact = %contact_id,
                    daily_views = remote.daily_views,
                    daily_limit,
                    "Server refused reveal: daily limit reached"
                );
                self.store.adopt_remote_counters(&remote);
                self.needs_resync.store(false, Ordering::SeqCst);
                self.resync().await;
                Ok(RevealOutcome::LimitExceeded)
            }
            Err(ApiError::Unauthenticated) => Err(ClientError::Unauthenticated),
            Err(e) => {
                warn!(contact = %contact_id, "Reveal failed: {e}");
                Ok(RevealOutcome::TransientError(e.to_string()))
            }
        }
    }

    /// Wait for all weekly ticks spawned so far.
    pub async fn settle(&self) {
        let pending = {
            let mut ticks = self.ticks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *ticks)
        };
        for result in join_all(pending).await {
            if let Err(e) = result {
                debug!("Weekly tick task ended abnormally: {e}");
            }
        }
    }

    async fn resync(&self) {
        match self.reconciler.load_from_remote().await {
            Ok(record) => self.store.apply_server_snapshot(record),
            Err(e) => debug!("Quota resync after refusal failed: {e}"),
        }
    }

    fn spawn_weekly_tick(&self) {
        let reconciler = self.reconciler.clone();
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            match reconciler.commit_weekly_tick().await {
                Ok(history) => store.apply_week_history(history),
                Err(e) => debug!("Weekly views tick failed: {e}"),
            }
        });

        let mut ticks = self.ticks.lock().unwrap_or_else(PoisonError::into_inner);
        ticks.retain(|tick| !tick.is_finished());
        ticks.push(handle);
    }
}
