//! Slot allocator.
//!
//! # Algorithm
//!
//! 1. Order demand units most-constrained first (fewest faculty × room ×
//!    slot combinations), ties by batch, subject, and index.
//! 2. For each unit, enumerate feasible (slot, faculty, classroom) triples
//!    and keep the one minimizing, in order: the faculty member's same-day
//!    load variance after placement, a room change for the batch that day,
//!    the slot's position in the grid, faculty index, classroom index.
//! 3. When a unit has no feasible triple, undo the most recent placement
//!    sharing its batch, an eligible faculty member, or an eligible room,
//!    forbid the undone unit its previous slot, and retry the stuck unit
//!    first.
//! 4. Give up once backtracks exceed the configured bound or the time
//!    budget runs out.
//!
//! Every step is a pure function of the model, so identical inputs yield
//! identical timetables.
//!
//! # Complexity
//! O((n + b) · s · f · r) where n = units, b = backtracks, s = candidate
//! slots, f = eligible faculty, r = eligible classrooms.
//!
//! # Reference
//! Carter & Laporte (1998), "Recent Developments in Practical Course
//! Timetabling", PATAT II, §3 (sequential heuristics with backtracking)

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::occupancy::{Occupancy, Placement};
use crate::constraint::ConstraintModel;
use crate::error::{InfeasibleError, InfeasibleReason, LimitingResource, Result, TimetableError};
use crate::models::{Session, Slot};

/// Ordering key of a candidate triple; smaller is better.
type CandidateKey = (u64, u8, usize, usize, usize);

/// A complete assignment.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Sessions in chronological order.
    pub sessions: Vec<Session>,
    /// Backtracks performed.
    pub backtracks: usize,
}

/// Assigns every demand unit of a model to a slot, faculty member, and room.
///
/// # Example
///
/// ```
/// use u_timetable::config::EngineConfig;
/// use u_timetable::constraint::ConstraintModel;
/// use u_timetable::models::{Batch, Classroom, Designation, EntitySnapshot, Faculty, Subject};
/// use u_timetable::scheduler::SlotAllocator;
///
/// let snapshot = EntitySnapshot::new()
///     .with_subject(Subject::theory("CS301", "CSE").with_sessions_per_week(3))
///     .with_faculty(Faculty::new("F1", Designation::Professor))
///     .with_classroom(Classroom::lecture_hall("LH-1", 60))
///     .with_batch(Batch::new("A", 40).with_subject("CS301"));
///
/// let model = ConstraintModel::build(&snapshot, &EngineConfig::default()).unwrap();
/// let allocation = SlotAllocator::new(&model).allocate().unwrap();
/// assert_eq!(allocation.sessions.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SlotAllocator<'a> {
    model: &'a ConstraintModel,
    backtrack_bound: usize,
    time_budget: Duration,
}

impl<'a> SlotAllocator<'a> {
    /// Creates an allocator using the model's configured bound and budget.
    pub fn new(model: &'a ConstraintModel) -> Self {
        let config = model.config();
        Self {
            model,
            backtrack_bound: config.backtrack_bound(model.units().len()),
            time_budget: config.time_budget(),
        }
    }

    /// Overrides the backtrack bound.
    pub fn with_backtrack_bound(mut self, bound: usize) -> Self {
        self.backtrack_bound = bound;
        self
    }

    /// Overrides the time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Places every demand unit.
    ///
    /// # Errors
    /// [`TimetableError::Infeasible`] when the backtrack bound or the time
    /// budget is exhausted, naming the unplaced units and the resource that
    /// ran out.
    pub fn allocate(&self) -> Result<Allocation> {
        let model = self.model;
        let started = Instant::now();
        let deadline = started.checked_add(self.time_budget);
        let n = model.units().len();

        let mut pending: VecDeque<usize> = model.placement_order().into();
        let mut placed: Vec<Option<Placement>> = vec![None; n];
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut excluded: Vec<Vec<Slot>> = vec![Vec::new(); n];
        let mut occ = Occupancy::new(model);
        let mut backtracks = 0usize;
        let mut best: Vec<(usize, Placement)> = Vec::new();

        while let Some(u) = pending.pop_front() {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                pending.push_front(u);
                warn!(
                    event = "allocation_deadline",
                    placed = stack.len(),
                    unplaced = pending.len(),
                    budget_ms = self.time_budget.as_millis() as u64,
                );
                return Err(self.infeasible(
                    InfeasibleReason::TimeBudgetExceeded,
                    &pending,
                    LimitingResource::Time,
                    &best,
                ));
            }

            if let Some(p) = self.best_candidate(u, &occ, &excluded[u], &[]) {
                occ.place(model, u, p);
                placed[u] = Some(p);
                stack.push(u);
                if stack.len() > best.len() {
                    best = stack
                        .iter()
                        .filter_map(|&i| placed[i].map(|p| (i, p)))
                        .collect();
                }
                continue;
            }

            backtracks += 1;
            let victim = stack.iter().rposition(|&v| {
                placed[v].map_or(false, |p| self.shares_resource(u, v, &p))
            });

            if backtracks > self.backtrack_bound || (victim.is_none() && excluded[u].is_empty()) {
                let reason = if backtracks > self.backtrack_bound {
                    InfeasibleReason::BacktrackLimit
                } else {
                    InfeasibleReason::NoCandidate
                };
                let limiting = self.limiting_resource(u, &occ);
                pending.push_front(u);
                warn!(
                    event = "allocation_infeasible",
                    reason = ?reason,
                    stuck = %model.unit(u).id,
                    limiting = %limiting,
                    backtracks,
                );
                return Err(self.infeasible(reason, &pending, limiting, &best));
            }

            match victim {
                Some(pos) => {
                    let v = stack.remove(pos);
                    if let Some(p) = placed[v].take() {
                        occ.remove(model, v, p);
                        excluded[v].push(p.slot);
                        debug!(
                            event = "backtrack",
                            stuck = %model.unit(u).id,
                            undone = %model.unit(v).id,
                            slot = %p.slot,
                            backtracks,
                        );
                    }
                    pending.push_front(v);
                }
                // Nothing left to undo; only the unit's own exclusions block it.
                None => excluded[u].clear(),
            }
            pending.push_front(u);
        }

        let mut sessions: Vec<Session> = stack
            .iter()
            .filter_map(|&u| placed[u].map(|p| self.session_for(u, &p)))
            .collect();
        sessions.sort_by(|a, b| a.chronological_cmp(b));

        debug!(
            event = "allocation_complete",
            units = n,
            backtracks,
            elapsed_ms = started.elapsed().as_millis() as u64,
        );

        Ok(Allocation {
            sessions,
            backtracks,
        })
    }

    /// Best placement for a single unit against an existing ledger.
    ///
    /// Used by reconciliation: only free slots and resources are considered,
    /// so nothing already booked is disturbed. Faculty in `excluded_faculty`
    /// are skipped.
    pub fn place_single(
        &self,
        unit: usize,
        occupancy: &Occupancy,
        excluded_faculty: &[usize],
    ) -> Option<Placement> {
        self.best_candidate(unit, occupancy, &[], excluded_faculty)
    }

    /// Session a placed unit becomes.
    pub fn session_for(&self, unit: usize, placement: &Placement) -> Session {
        let u = self.model.unit(unit);
        Session::new(
            &u.subject_code,
            &u.batch_id,
            u.index,
            &self.model.faculty(placement.faculty).id,
            &self.model.classroom(placement.classroom).id,
            placement.slot,
        )
    }

    fn best_candidate(
        &self,
        u: usize,
        occ: &Occupancy,
        excluded_slots: &[Slot],
        excluded_faculty: &[usize],
    ) -> Option<Placement> {
        let unit = self.model.unit(u);
        let grid = self.model.grid();
        let mut best: Option<(CandidateKey, Placement)> = None;

        for (si, slot) in unit.candidate_slots.iter().enumerate() {
            if excluded_slots.contains(slot) || !occ.batch_free(&unit.batch_id, slot) {
                continue;
            }
            let Some(day) = grid.day_index(slot.day) else {
                continue;
            };
            for &f in &unit.eligible_faculty {
                if excluded_faculty.contains(&f) || !self.faculty_can_take(f, slot, occ) {
                    continue;
                }
                let variance = occ.scaled_variance_with(f, day);
                for &r in &unit.eligible_classrooms {
                    if !occ.classroom_free(r, slot) {
                        continue;
                    }
                    let room_change = u8::from(!occ.batch_uses_classroom_on(&unit.batch_id, r, slot));
                    let key = (variance, room_change, si, f, r);
                    if best.as_ref().map_or(true, |(k, _)| key < *k) {
                        best = Some((
                            key,
                            Placement {
                                slot: *slot,
                                faculty: f,
                                classroom: r,
                            },
                        ));
                    }
                }
            }
        }
        best.map(|(_, p)| p)
    }

    fn faculty_can_take(&self, f: usize, slot: &Slot, occ: &Occupancy) -> bool {
        self.model.faculty(f).is_available(slot)
            && occ.faculty_free(f, slot)
            && occ.within_load(self.model, f, slot)
    }

    fn shares_resource(&self, u: usize, v: usize, p: &Placement) -> bool {
        let stuck = self.model.unit(u);
        stuck.batch_id == self.model.unit(v).batch_id
            || stuck.eligible_faculty.contains(&p.faculty)
            || stuck.eligible_classrooms.contains(&p.classroom)
    }

    /// The resource class blocking most of the stuck unit's candidate slots.
    fn limiting_resource(&self, u: usize, occ: &Occupancy) -> LimitingResource {
        let unit = self.model.unit(u);
        let (mut batch, mut faculty, mut rooms) = (0usize, 0usize, 0usize);

        for slot in &unit.candidate_slots {
            if !occ.batch_free(&unit.batch_id, slot) {
                batch += 1;
            }
            if !unit
                .eligible_faculty
                .iter()
                .any(|&f| self.faculty_can_take(f, slot, occ))
            {
                faculty += 1;
            }
            if !unit
                .eligible_classrooms
                .iter()
                .any(|&r| occ.classroom_free(r, slot))
            {
                rooms += 1;
            }
        }

        if rooms >= faculty && rooms >= batch {
            LimitingResource::Classroom(
                unit.eligible_classrooms
                    .iter()
                    .map(|&r| self.model.classroom(r).id.clone())
                    .collect(),
            )
        } else if faculty >= batch {
            LimitingResource::Faculty(
                unit.eligible_faculty
                    .iter()
                    .map(|&f| self.model.faculty(f).id.clone())
                    .collect(),
            )
        } else {
            LimitingResource::Batch(vec![unit.batch_id.clone()])
        }
    }

    fn infeasible(
        &self,
        reason: InfeasibleReason,
        unplaced: &VecDeque<usize>,
        limiting: LimitingResource,
        best: &[(usize, Placement)],
    ) -> TimetableError {
        let mut best_partial: Vec<Session> =
            best.iter().map(|(u, p)| self.session_for(*u, p)).collect();
        best_partial.sort_by(|a, b| a.chronological_cmp(b));
        TimetableError::Infeasible(InfeasibleError {
            reason,
            unplaced: unplaced
                .iter()
                .map(|&u| self.model.unit(u).id.clone())
                .collect(),
            limiting,
            best_partial,
        })
    }
}
