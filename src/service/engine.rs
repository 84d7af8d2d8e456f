//! Async entry points.
//!
//! [`TimetableEngine`] wires the pure pipeline and reconciliation
//! functions to the collaborators. Each request:
//!
//! 1. takes the per-key lock (bounded wait),
//! 2. reads the snapshot and current timetable,
//! 3. runs the CPU-bound work on a blocking worker, at most
//!    `max_concurrent_runs` at a time,
//! 4. writes the result only if the run succeeded and changed something.
//!
//! Requests on different keys proceed in parallel.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::info;

use super::lock::KeyLocks;
use super::store::{SnapshotProvider, TimetableStore};
use crate::config::EngineConfig;
use crate::error::{Result, TimetableError};
use crate::models::{
    EntitySnapshot, LeaveRequest, RequestStatus, RescheduleRequest, RescheduleTarget, TimeRange,
    Timetable, TimetableKey, TimetableStatus,
};
use crate::reconcile::{self, Reconciliation};
use crate::scheduler::generate_timetable;
use crate::validation::{ValidationIssue, ValidationIssueKind};

/// Timetable generation and reconciliation service.
pub struct TimetableEngine {
    snapshots: Arc<dyn SnapshotProvider>,
    store: Arc<dyn TimetableStore>,
    config: EngineConfig,
    locks: KeyLocks,
    permits: Arc<Semaphore>,
}

impl TimetableEngine {
    /// Creates an engine.
    ///
    /// # Errors
    /// [`TimetableError::Config`] if `config` is inconsistent.
    pub fn new(
        snapshots: Arc<dyn SnapshotProvider>,
        store: Arc<dyn TimetableStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            snapshots,
            store,
            locks: KeyLocks::new(config.lock_wait()),
            permits: Arc::new(Semaphore::new(config.max_concurrent_runs)),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates and stores a timetable for `key`.
    ///
    /// Replaces any draft, generated, or archived timetable under the key.
    /// A published timetable must be archived first; it only changes
    /// through reconciliation.
    pub async fn generate(&self, key: &TimetableKey) -> Result<Timetable> {
        let _guard = self.locks.acquire(key).await?;

        let previous = self.store.get(key).await?;
        if let Some(existing) = &previous {
            if matches!(
                existing.status,
                TimetableStatus::Published | TimetableStatus::Reconciling
            ) {
                return Err(TimetableError::InvalidState {
                    key: key.to_string(),
                    from: existing.status,
                    to: TimetableStatus::Generated,
                });
            }
        }

        let snapshot = self.snapshots.snapshot(key).await?;
        let config = self.config.clone();
        let run_key = key.clone();
        let mut timetable = self
            .run_blocking(move || generate_timetable(run_key, &snapshot, &config))
            .await?;
        if let Some(existing) = previous {
            timetable.revision = existing.revision + 1;
        }

        self.store.put(timetable.clone()).await?;
        Ok(timetable)
    }

    /// Current timetable for `key`.
    pub async fn get(&self, key: &TimetableKey) -> Result<Timetable> {
        self.store
            .get(key)
            .await?
            .ok_or_else(|| TimetableError::NotFound(format!("timetable '{key}'")))
    }

    /// Moves a generated timetable to published.
    pub async fn publish(&self, key: &TimetableKey) -> Result<Timetable> {
        self.transition(key, TimetableStatus::Published).await
    }

    /// Retires a generated or published timetable.
    pub async fn archive(&self, key: &TimetableKey) -> Result<Timetable> {
        self.transition(key, TimetableStatus::Archived).await
    }

    /// Applies approved leave for `faculty_id` over `range`.
    pub async fn apply_leave(
        &self,
        key: &TimetableKey,
        faculty_id: &str,
        range: TimeRange,
    ) -> Result<Timetable> {
        self.reconcile(key, {
            let faculty_id = faculty_id.to_string();
            move |tt: &Timetable, snapshot: &EntitySnapshot, config: &EngineConfig| {
                reconcile::apply_leave(tt, snapshot, config, &faculty_id, range)
            }
        })
        .await
    }

    /// Moves one session to `target`.
    pub async fn apply_reschedule(
        &self,
        key: &TimetableKey,
        session_id: &str,
        target: RescheduleTarget,
    ) -> Result<Timetable> {
        self.reconcile(key, {
            let session_id = session_id.to_string();
            move |tt: &Timetable, snapshot: &EntitySnapshot, config: &EngineConfig| {
                reconcile::apply_reschedule(tt, snapshot, config, &session_id, &target)
            }
        })
        .await
    }

    /// Applies every range of an approved leave request, all or nothing.
    pub async fn apply_leave_request(
        &self,
        key: &TimetableKey,
        request: &LeaveRequest,
    ) -> Result<Timetable> {
        ensure_approved(&request.id, request.status)?;
        let faculty_id = request.faculty_id.clone();
        let ranges = request.ranges.clone();
        let op = move |tt: &Timetable,
                       snapshot: &EntitySnapshot,
                       config: &EngineConfig|
              -> Result<Reconciliation> {
            let mut current = Reconciliation {
                timetable: tt.clone(),
                moved: Vec::new(),
                changed: false,
            };
            for range in ranges {
                let step =
                    reconcile::apply_leave(&current.timetable, snapshot, config, &faculty_id, range)?;
                current.changed |= step.changed;
                current.moved.extend(step.moved);
                current.timetable = step.timetable;
            }
            Ok(current)
        };
        self.reconcile(key, op).await
    }

    /// Applies an approved reschedule request.
    pub async fn apply_reschedule_request(
        &self,
        key: &TimetableKey,
        request: &RescheduleRequest,
    ) -> Result<Timetable> {
        ensure_approved(&request.id, request.status)?;
        self.apply_reschedule(key, &request.session_id, request.target.clone())
            .await
    }

    async fn transition(&self, key: &TimetableKey, next: TimetableStatus) -> Result<Timetable> {
        let _guard = self.locks.acquire(key).await?;
        let mut timetable = self.get(key).await?;
        timetable.transition(next)?;
        self.store.put(timetable.clone()).await?;
        info!(event = "timetable_transition", key = %key, status = ?next);
        Ok(timetable)
    }

    async fn reconcile<F>(&self, key: &TimetableKey, op: F) -> Result<Timetable>
    where
        F: FnOnce(&Timetable, &EntitySnapshot, &EngineConfig) -> Result<Reconciliation>
            + Send
            + 'static,
    {
        let _guard = self.locks.acquire(key).await?;
        let current = self.get(key).await?;
        let snapshot = self.snapshots.snapshot(key).await?;
        let config = self.config.clone();

        let result = self
            .run_blocking(move || op(&current, &snapshot, &config))
            .await?;
        if result.changed {
            self.store.put(result.timetable.clone()).await?;
        }
        Ok(result.timetable)
    }

    /// Runs CPU-bound work on the blocking pool under the concurrency limit.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| TimetableError::Worker(e.to_string()))?;
        tokio::task::spawn_blocking(work)
            .await
            .map_err(|e| TimetableError::Worker(e.to_string()))?
    }
}

fn ensure_approved(request_id: &str, status: RequestStatus) -> Result<()> {
    if status == RequestStatus::Approved {
        Ok(())
    } else {
        Err(TimetableError::Validation(vec![ValidationIssue::new(
            ValidationIssueKind::RequestNotApproved,
            format!("request '{request_id}' is {status:?}, not approved"),
        )]))
    }
}
