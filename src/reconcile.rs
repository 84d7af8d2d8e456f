//! Incremental reconciliation of published timetables.
//!
//! Applies an approved leave or reschedule to a published [`Timetable`]
//! without regenerating it. Both operations are pure: they take the
//! current timetable by reference and return a new one, so a failed
//! attempt leaves the caller's copy untouched. The service layer commits
//! the result under the per-key lock.
//!
//! # Leave
//!
//! 1. Mark the faculty member unavailable for the range.
//! 2. Collect their sessions inside the range.
//! 3. Re-place each one alone, with the original faculty member excluded,
//!    using only slots and resources nothing else occupies.
//! 4. Commit only if every affected session found a place and no new
//!    blocking conflict appears.
//!
//! # Reschedule
//!
//! Moves one session to a requested (slot, classroom, faculty) triple and
//! commits only if the move introduces no new blocking conflict.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::constraint::ConstraintModel;
use crate::error::{
    ConflictError, InfeasibleError, InfeasibleReason, LimitingResource, Result, TimetableError,
};
use crate::models::{
    Conflict, EntitySnapshot, FacultyLeave, RescheduleTarget, Session, Slot, TimeRange, Timetable,
    TimetableStatus,
};
use crate::scheduler::{ConflictDetector, Occupancy, ScoreEvaluator, SlotAllocator};
use crate::validation::{ValidationIssue, ValidationIssueKind};

/// Outcome of a reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The reconciled timetable (a copy of the input when nothing changed).
    pub timetable: Timetable,
    /// Ids of sessions that moved or changed hands.
    pub moved: Vec<String>,
    /// Whether the result differs from the input and must be stored.
    pub changed: bool,
}

/// Applies an approved leave to a published timetable.
///
/// Re-applying a leave that is already recorded and affects no session is
/// a no-op (`changed == false`).
///
/// # Errors
/// - [`TimetableError::InvalidState`] unless the timetable is published.
/// - [`TimetableError::NotFound`] if the faculty member is unknown.
/// - [`TimetableError::Validation`] for an empty range.
/// - [`TimetableError::Infeasible`] (`NoAlternative`) if any affected session
///   cannot be re-placed; `unplaced` lists them and nothing is committed.
/// - [`TimetableError::Conflict`] if the replacement set would add blocking conflicts.
pub fn apply_leave(
    timetable: &Timetable,
    snapshot: &EntitySnapshot,
    config: &EngineConfig,
    faculty_id: &str,
    range: TimeRange,
) -> Result<Reconciliation> {
    let started = Instant::now();
    ensure_reconcilable(timetable)?;
    if range.is_empty() {
        return Err(TimetableError::Validation(vec![ValidationIssue::new(
            ValidationIssueKind::NoCandidateSlot,
            format!("leave range {range} is empty"),
        )]));
    }
    if snapshot.faculty_member(faculty_id).is_none() {
        return Err(TimetableError::NotFound(format!("faculty '{faculty_id}'")));
    }

    let leave = FacultyLeave {
        faculty_id: faculty_id.to_string(),
        range,
    };
    let already_recorded = timetable.faculty_leave.contains(&leave);

    let mut model = model_with_leave(timetable, snapshot, config)?;
    model.add_unavailability(faculty_id, range);

    let affected: Vec<&Session> = timetable
        .sessions
        .iter()
        .filter(|s| s.faculty_id == faculty_id && s.slot.intersects(&range))
        .collect();

    if affected.is_empty() {
        if already_recorded {
            info!(
                event = "reconcile_noop",
                key = %timetable.key,
                faculty = faculty_id,
            );
            return Ok(Reconciliation {
                timetable: timetable.clone(),
                moved: Vec::new(),
                changed: false,
            });
        }
        let mut next = timetable.clone();
        next.faculty_leave.push(leave);
        return commit(next, &model, Vec::new(), started);
    }

    let deadline = started.checked_add(config.reconcile_timeout());
    let allocator = SlotAllocator::new(&model);
    let mut occupancy =
        Occupancy::from_sessions(&model, timetable.sessions.iter().filter(|s| !affected.contains(s)));
    let excluded: Vec<usize> = model.faculty_index(faculty_id).into_iter().collect();

    let mut replacements = Vec::with_capacity(affected.len());
    let mut unplaced = Vec::new();
    for session in &affected {
        if deadline.map_or(false, |d| Instant::now() >= d) {
            return Err(timed_out(timetable, &affected, replacements, config.reconcile_timeout()));
        }
        let placement = model.unit_index(&session.id).and_then(|unit| {
            allocator
                .place_single(unit, &occupancy, &excluded)
                .map(|p| (unit, p))
        });
        match placement {
            Some((unit, p)) => {
                occupancy.place(&model, unit, p);
                replacements.push(allocator.session_for(unit, &p));
            }
            None => unplaced.push(session.id.clone()),
        }
    }

    if !unplaced.is_empty() {
        warn!(
            event = "reconcile_rejected",
            key = %timetable.key,
            faculty = faculty_id,
            unplaced = ?unplaced,
        );
        return Err(TimetableError::Infeasible(InfeasibleError {
            reason: InfeasibleReason::NoAlternative,
            unplaced,
            limiting: LimitingResource::Faculty(vec![faculty_id.to_string()]),
            best_partial: replacements,
        }));
    }

    let moved: Vec<String> = replacements.iter().map(|s| s.id.clone()).collect();
    let after: Vec<Session> = timetable
        .sessions
        .iter()
        .filter(|s| !moved.contains(&s.id))
        .cloned()
        .chain(replacements)
        .collect();

    let detector = ConflictDetector::new(&model);
    let fresh = blocking(detector.new_conflicts(&timetable.sessions, &after));
    if !fresh.is_empty() {
        warn!(
            event = "reconcile_rejected",
            key = %timetable.key,
            faculty = faculty_id,
            conflicts = fresh.len(),
        );
        return Err(TimetableError::Conflict(ConflictError {
            session_id: moved.first().cloned().unwrap_or_default(),
            conflicts: fresh,
        }));
    }

    let mut next = timetable.clone();
    next.sessions = after;
    if !already_recorded {
        next.faculty_leave.push(leave);
    }
    commit(next, &model, moved, started)
}

/// Moves one session of a published timetable to `target`.
///
/// # Errors
/// - [`TimetableError::InvalidState`] unless the timetable is published.
/// - [`TimetableError::NotFound`] for an unknown session, faculty, or classroom.
/// - [`TimetableError::Validation`] if the target lies outside the time grid.
/// - [`TimetableError::Conflict`] naming the sessions the move would collide with.
pub fn apply_reschedule(
    timetable: &Timetable,
    snapshot: &EntitySnapshot,
    config: &EngineConfig,
    session_id: &str,
    target: &RescheduleTarget,
) -> Result<Reconciliation> {
    let started = Instant::now();
    ensure_reconcilable(timetable)?;

    let current = timetable
        .session(session_id)
        .ok_or_else(|| TimetableError::NotFound(format!("session '{session_id}'")))?;
    if snapshot.faculty_member(&target.faculty_id).is_none() {
        return Err(TimetableError::NotFound(format!("faculty '{}'", target.faculty_id)));
    }
    if snapshot.classroom(&target.classroom_id).is_none() {
        return Err(TimetableError::NotFound(format!(
            "classroom '{}'",
            target.classroom_id
        )));
    }

    let model = model_with_leave(timetable, snapshot, config)?;
    let slot = Slot::starting_at(target.day, target.start, current.duration_minutes())
        .filter(|s| model.grid().contains(s))
        .ok_or_else(|| {
            TimetableError::Validation(vec![ValidationIssue::new(
                ValidationIssueKind::NoCandidateSlot,
                format!(
                    "{} {} is outside the teaching grid for a {}-minute session",
                    target.day,
                    target.start,
                    current.duration_minutes()
                ),
            )])
        })?;

    let mut moved = current.clone();
    moved.slot = slot;
    moved.faculty_id = target.faculty_id.clone();
    moved.classroom_id = target.classroom_id.clone();

    if moved == *current {
        return Ok(Reconciliation {
            timetable: timetable.clone(),
            moved: Vec::new(),
            changed: false,
        });
    }

    let after: Vec<Session> = timetable
        .sessions
        .iter()
        .map(|s| if s.id == session_id { moved.clone() } else { s.clone() })
        .collect();

    let fresh = blocking(ConflictDetector::new(&model).new_conflicts(&timetable.sessions, &after));
    if !fresh.is_empty() {
        let err = ConflictError {
            session_id: session_id.to_string(),
            conflicts: fresh,
        };
        warn!(
            event = "reconcile_rejected",
            key = %timetable.key,
            session = session_id,
            colliding = ?err.colliding_sessions(),
        );
        return Err(TimetableError::Conflict(err));
    }

    if started.elapsed() > config.reconcile_timeout() {
        return Err(timed_out(timetable, &[current], Vec::new(), config.reconcile_timeout()));
    }

    let mut next = timetable.clone();
    next.sessions = after;
    commit(next, &model, vec![session_id.to_string()], started)
}

fn ensure_reconcilable(timetable: &Timetable) -> Result<()> {
    if timetable.status.can_transition_to(TimetableStatus::Reconciling) {
        Ok(())
    } else {
        Err(TimetableError::InvalidState {
            key: timetable.key.to_string(),
            from: timetable.status,
            to: TimetableStatus::Reconciling,
        })
    }
}

/// Model of the snapshot with every recorded leave applied.
fn model_with_leave(
    timetable: &Timetable,
    snapshot: &EntitySnapshot,
    config: &EngineConfig,
) -> Result<ConstraintModel> {
    let mut model = ConstraintModel::build(snapshot, config)?;
    for leave in &timetable.faculty_leave {
        model.add_unavailability(&leave.faculty_id, leave.range);
    }
    Ok(model)
}

fn blocking(conflicts: Vec<Conflict>) -> Vec<Conflict> {
    conflicts.into_iter().filter(|c| c.is_blocking()).collect()
}

fn timed_out(
    timetable: &Timetable,
    affected: &[&Session],
    best_partial: Vec<Session>,
    timeout: Duration,
) -> TimetableError {
    warn!(
        event = "reconcile_deadline",
        key = %timetable.key,
        timeout_ms = timeout.as_millis() as u64,
    );
    TimetableError::Infeasible(InfeasibleError {
        reason: InfeasibleReason::TimeBudgetExceeded,
        unplaced: affected.iter().map(|s| s.id.clone()).collect(),
        limiting: LimitingResource::Time,
        best_partial,
    })
}

/// Re-evaluates, bumps the revision, and walks Published → Reconciling → Published.
fn commit(
    mut next: Timetable,
    model: &ConstraintModel,
    moved: Vec<String>,
    started: Instant,
) -> Result<Reconciliation> {
    next.transition(TimetableStatus::Reconciling)?;
    next.normalize();
    next.conflicts = ConflictDetector::new(model).detect(&next.sessions);
    next.score = ScoreEvaluator::new(model)
        .evaluate(&next.sessions, &next.conflicts)
        .score;
    next.revision += 1;
    next.transition(TimetableStatus::Published)?;

    info!(
        event = "reconcile_commit",
        key = %next.key,
        revision = next.revision,
        moved = moved.len(),
        score = next.score,
        elapsed_ms = started.elapsed().as_millis() as u64,
    );
    Ok(Reconciliation {
        timetable: next,
        moved,
        changed: true,
    })
}
