//! In-process stand-in for the profile API, mirroring the server's rules.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use rolodex_shared::clock::{Clock, ManualClock};
use rolodex_shared::protocol::{TrackViewResponse, ViewStatus};
use rolodex_shared::quota::{record_week_tick, QuotaRecord, WeekBucket};

use crate::api::ProfileApi;
use crate::error::ApiError;

pub(crate) struct FakeProfileApi {
    record: Mutex<QuotaRecord>,
    clock: ManualClock,
    limit: AtomicU32,
    pub fail_track: AtomicBool,
    /// Advance the shared clock one day after the next `track-view` has
    /// been counted but before its answer is returned.
    pub midnight_in_flight: AtomicBool,
    pub fail_week: AtomicBool,
    pub signed_out: AtomicBool,
    pub track_calls: AtomicUsize,
    pub week_calls: AtomicUsize,
}

impl FakeProfileApi {
    pub fn new(clock: ManualClock, limit: u32) -> Self {
        Self {
            record: Mutex::new(QuotaRecord::default()),
            clock,
            limit: AtomicU32::new(limit),
            fail_track: AtomicBool::new(false),
            midnight_in_flight: AtomicBool::new(false),
            fail_week: AtomicBool::new(false),
            signed_out: AtomicBool::new(false),
            track_calls: AtomicUsize::new(0),
            week_calls: AtomicUsize::new(0),
        }
    }

    /// A reveal made by the same user from another device.
    pub fn reveal_elsewhere(&self, id: &str) {
        let today = self.clock.today();
        self.record.lock().unwrap().record_view(id, today);
    }

    /// Zero today's counters the way an operator reset does.
    pub fn reset_elsewhere(&self) {
        let today = self.clock.today();
        self.record.lock().unwrap().reset(today);
    }

    pub fn set_limit(&self, limit: u32) {
        self.limit.store(limit, Ordering::SeqCst);
    }

    fn limit(&self) -> u32 {
        self.limit.load(Ordering::SeqCst)
    }

    pub fn record(&self) -> QuotaRecord {
        self.record.lock().unwrap().clone()
    }

    fn check_session(&self) -> Result<(), ApiError> {
        if self.signed_out.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthenticated);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileApi for FakeProfileApi {
    async fn view_status(&self) -> Result<ViewStatus, ApiError> {
        tokio::task::yield_now().await;
        self.check_session()?;

        let today = self.clock.today();
        let mut record = self.record.lock().unwrap();
        record.roll_over(today);
        Ok(ViewStatus::from_record(&record, self.limit(), today))
    }

    async fn track_view(&self, contact_id: &str) -> Result<TrackViewResponse, ApiError> {
        // Let concurrent callers get their requests in flight first.
        tokio::task::yield_now().await;
        self.check_session()?;
        self.track_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_track.load(Ordering::SeqCst) {
            return Err(ApiError::Transient("connection reset".into()));
        }

        let limit = self.limit();
        let today = self.clock.today();
        let mut record = self.record.lock().unwrap();
        record.roll_over(today);
        if record.is_viewed(contact_id) {
            return Ok(TrackViewResponse::from_record(&record, limit, true));
        }
        if record.has_exceeded(limit) {
            return Err(ApiError::LimitExceeded {
                snapshot: Box::new(record.clone()),
                daily_limit: limit,
            });
        }
        record.record_view(contact_id, today);
        if self.midnight_in_flight.swap(false, Ordering::SeqCst) {
            self.clock.advance_days(1);
        }
        Ok(TrackViewResponse::from_record(&record, limit, false))
    }

    async fn week_views(&self) -> Result<Vec<WeekBucket>, ApiError> {
        tokio::task::yield_now().await;
        self.check_session()?;
        self.week_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_week.load(Ordering::SeqCst) {
            return Err(ApiError::Transient("HTTP 500".into()));
        }

        let mut record = self.record.lock().unwrap();
        record_week_tick(&mut record.week_history, self.clock.now());
        Ok(record.week_history.clone())
    }
}
