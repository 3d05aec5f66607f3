//! Local quota cache.
//!
//! A read-through/write-through mirror of the authoritative record, used
//! for instant feedback. It is rebuilt from the server on session start
//! and discarded on sign-out. The store records what it is told and never
//! enforces the daily limit.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use rolodex_shared::clock::Clock;
use rolodex_shared::quota::{QuotaRecord, WeekBucket};
use rolodex_shared::rollover::Rollover;

#[derive(Debug, Default)]
struct Cached {
    record: QuotaRecord,
    /// Set once a server snapshot has been applied; cleared on discard.
    active: bool,
}

pub struct QuotaStore {
    cached: Mutex<Cached>,
    clock: Arc<dyn Clock>,
    cache_path: Option<PathBuf>,
}

impl QuotaStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cached: Mutex::new(Cached::default()),
            clock,
            cache_path: None,
        }
    }

    /// A store mirrored to `path`. A snapshot left there by an earlier run
    /// is loaded as a provisional value until the server answers.
    pub fn with_cache_file(clock: Arc<dyn Clock>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = read_cache_file(&path).unwrap_or_default();
        Self {
            cached: Mutex::new(Cached {
                record,
                active: false,
            }),
            clock,
            cache_path: Some(path),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cached> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Whether a signed-in session currently owns this cache.
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn read(&self) -> QuotaRecord {
        self.lock().record.clone()
    }

    /// Snapshot brought up to today without storing the rollover.
    pub fn read_current(&self) -> QuotaRecord {
        let mut record = self.read();
        record.roll_over(self.clock.today());
        record
    }

    /// Count a reveal of `contact_id`, starting a fresh day first if the
    /// cached date is not today.
    ///
    /// Returns `false` if the id was already counted today.
    pub fn apply_increment(&self, contact_id: &str) -> bool {
        let today = self.clock.today();
        let mut cached = self.lock();
        let counted = cached.record.record_view(contact_id, today);
        self.persist(&cached.record);
        counted
    }

    /// Zero today's counters.
    pub fn apply_reset(&self) {
        let today = self.clock.today();
        let mut cached = self.lock();
        cached.record.reset(today);
        self.persist(&cached.record);
    }

    /// Apply the day-rollover policy to the cached record.
    pub fn apply_rollover(&self) -> Rollover {
        let today = self.clock.today();
        let mut cached = self.lock();
        let action = cached.record.roll_over(today);
        if action.is_required() {
            debug!(?action, %today, "Local quota rolled over");
            self.persist(&cached.record);
        }
        action
    }

    /// Replace the cached record with one fetched from the server.
    pub fn apply_server_snapshot(&self, remote: QuotaRecord) {
        let mut cached = self.lock();
        cached.record = remote;
        cached.active = true;
        self.persist(&cached.record);
    }

    /// Count a reveal the server has confirmed and reconcile today's
    /// counters with the ones it answered with. The cached weekly history is
    /// kept.
    ///
    /// An answer dated before today was counted on a day that is already
    /// over, so nothing is charged against today. For today's answers,
    /// `authoritative` means no other commit was in flight: the server's
    /// counters then replace the local ones outright, dropping anything the
    /// server no longer counts. Answers that may have crossed others in
    /// flight only add the ids the server reports.
    ///
    /// Returns `true` if the ledger disagreed with the server.
    pub fn apply_confirmed(
        &self,
        contact_id: &str,
        remote: &QuotaRecord,
        authoritative: bool,
    ) -> bool {
        let today = self.clock.today();
        let mut cached = self.lock();
        cached.record.roll_over(today);

        if remote.last_reset_date.is_some_and(|date| date < today) {
            debug!(contact = %contact_id, "Reveal was counted on a previous day");
            self.persist(&cached.record);
            return false;
        }

        cached.record.record_view(contact_id, today);
        let disagreed = reconcile(&mut cached.record, remote, authoritative);
        if disagreed {
            debug!(
                contact = %contact_id,
                local = cached.record.daily_views,
                remote = remote.daily_views,
                authoritative,
                "Local quota reconciled with server"
            );
        }
        self.persist(&cached.record);
        disagreed
    }

    /// Take the server's daily counters as they are. Used when the server
    /// refused a reveal; the weekly history is kept.
    pub fn adopt_remote_counters(&self, remote: &QuotaRecord) {
        let mut cached = self.lock();
        set_counters(&mut cached.record, remote);
        self.persist(&cached.record);
    }

    /// Replace the weekly history. Ignored once the session has been
    /// discarded, since analytics ticks may complete after sign-out.
    pub fn apply_week_history(&self, history: Vec<WeekBucket>) {
        let mut cached = self.lock();
        if !cached.active {
            return;
        }
        cached.record.week_history = history;
        self.persist(&cached.record);
    }

    /// Forget everything and delete the on-device copy.
    pub fn discard(&self) {
        let mut cached = self.lock();
        *cached = Cached::default();
        if let Some(path) = &self.cache_path {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed quota cache"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove quota cache: {e}"),
            }
        }
    }

    fn persist(&self, record: &QuotaRecord) {
        let Some(path) = &self.cache_path else {
            return;
        };
        if let Err(e) = write_cache_file(path, record) {
            warn!(path = %path.display(), "Failed to write quota cache: {e}");
        }
    }
}

fn reconcile(local: &mut QuotaRecord, remote: &QuotaRecord, authoritative: bool) -> bool {
    if remote.last_reset_date != local.last_reset_date {
        return false;
    }
    if local.daily_views == remote.daily_views && local.viewed_ids == remote.viewed_ids {
        return false;
    }

    if authoritative {
        set_counters(local, remote);
    } else {
        local.viewed_ids.extend(remote.viewed_ids.iter().cloned());
        local.daily_views = remote.daily_views.max(local.viewed_ids.len() as u32);
    }
    true
}

fn set_counters(local: &mut QuotaRecord, remote: &QuotaRecord) {
    local.daily_views = remote.daily_views;
    local.last_reset_date = remote.last_reset_date;
    local.viewed_ids = remote.viewed_ids.clone();
}

fn read_cache_file(path: &Path) -> Option<QuotaRecord> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), "Ignoring unreadable quota cache: {e}");
            None
        }
    }
}

fn write_cache_file(path: &Path, record: &QuotaRecord) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(record)?;
    std::fs::write(path, json)
}
