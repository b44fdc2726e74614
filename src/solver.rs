//! Route construction: the optimization core.
//!
//! `optimize` is the sole entry point. It builds the travel matrix,
//! selects a strategy (greedy multi-start with composite scoring, or
//! exact bitmask DP for small instances), refines the winner with
//! 2-opt, and reports an explicit infeasible result when nothing can
//! be scheduled even after a relaxed retry.

use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::availability::{is_open, next_open};
use crate::deadline::Deadline;
use crate::error::PlanError;
use crate::model::{DistanceRecord, Place, SchedulingPreferences};
use crate::provider::{TravelMatrix, TravelTimeProvider};
use crate::refine::two_opt;
use crate::traits::TravelTimeSource;

/// Budget inflation applied by the relaxed retry pass.
const RELAXED_BUDGET_FACTOR: f64 = 1.5;
/// Bonus added to a start candidate's rank when it is open at the
/// trip's start instant.
const OPEN_AT_START_BONUS: f64 = 1.0;
/// Aggregate-score penalty per hour of travel in a finished run.
const TRAVEL_PENALTY_PER_HOUR: f64 = 0.5;
/// Proximity scoring half-life: a leg this long scores 0.5.
const PROXIMITY_SCALE_MIN: f64 = 30.0;
/// Ratings are normalized against this maximum.
const MAX_RATING: f64 = 5.0;

/// Route construction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Greedy multi-start; exact DP consulted as a tie-breaker when
    /// the instance is small enough.
    Auto,
    Greedy,
    /// Exact bitmask DP. Transparently falls back to greedy above the
    /// DP ceiling.
    Exact,
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub strategy: Strategy,
    /// Hard ceiling on candidates considered; excess candidates are
    /// skipped by lowest rating.
    pub max_places: usize,
    /// Largest instance the O(2^n * n^2) exact strategy will accept.
    pub dp_ceiling: usize,
    /// Number of greedy starting places tried.
    pub multi_start: usize,
    /// 2-opt pass ceiling.
    pub refine_passes: usize,
    /// Wall-clock budget for the whole optimization call.
    pub timeout: Duration,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            max_places: 25,
            dp_ceiling: 11,
            multi_start: 4,
            refine_passes: 50,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Why a candidate place was left out of the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No opening instant inside the look-ahead horizon.
    NeverOpens,
    /// Would not fit the remaining time budget (waits included).
    BudgetExhausted,
    /// Candidate list exceeded `max_places`; dropped by rating.
    OverCapacity,
}

#[derive(Debug, Clone)]
pub struct SkippedPlace {
    pub id: String,
    pub reason: SkipReason,
}

/// Outcome of an optimization call. Created fresh per call and never
/// mutated afterwards; itinerary rendering is a read-only transform.
#[derive(Debug, Clone)]
pub struct RouteResult {
    /// Visited places in visiting order.
    pub places: Vec<Place>,
    /// Travel legs between consecutive places (`places.len() - 1`).
    pub legs: Vec<DistanceRecord>,
    /// Minutes from trip start to last departure.
    pub total_time_min: f64,
    pub total_travel_min: f64,
    pub total_distance_km: f64,
    /// True iff at least one place was scheduled.
    pub feasible: bool,
    /// Visited places over total candidates supplied.
    pub efficiency: f64,
    /// Strategy that produced the winning route.
    pub strategy: Strategy,
    /// True when the route only exists thanks to the relaxed retry.
    pub relaxed: bool,
    pub skipped: Vec<SkippedPlace>,
}

/// Admission verdict for one place at a projected arrival.
struct Admission {
    wait_min: i64,
    open_on_arrival: bool,
}

/// Shared schedule-simulation context for one optimization call.
struct Sim<'a> {
    places: &'a [Place],
    matrix: &'a TravelMatrix,
    prefs: &'a SchedulingPreferences,
    /// Relaxed mode: opening hours advisory, no waits enforced.
    relaxed: bool,
    budget_min: i64,
}

/// A scheduled walk of some ordering: the stops that fit, in order.
struct Schedule {
    kept: Vec<usize>,
    legs: Vec<DistanceRecord>,
    elapsed_min: i64,
    travel_min: f64,
    distance_km: f64,
    dropped: Vec<(usize, SkipReason)>,
}

impl<'a> Sim<'a> {
    fn new(
        places: &'a [Place],
        matrix: &'a TravelMatrix,
        prefs: &'a SchedulingPreferences,
        relaxed: bool,
    ) -> Self {
        let budget = f64::from(prefs.budget_min);
        let budget_min = if relaxed {
            (budget * RELAXED_BUDGET_FACTOR).round() as i64
        } else {
            budget as i64
        };
        Self {
            places,
            matrix,
            prefs,
            relaxed,
            budget_min,
        }
    }

    /// Whole-minute (ceiled) travel time used by the running clock.
    fn travel_min(&self, from: usize, to: usize) -> i64 {
        self.matrix.get(from, to).duration_min.ceil() as i64
    }

    /// Can `place` admit a visitor arriving `elapsed` minutes into the
    /// trip? Waiting for the next opening inside the look-ahead
    /// horizon is allowed; beyond it the place never opens.
    fn admit(&self, place: usize, elapsed: i64) -> Result<Admission, SkipReason> {
        let arrival = self.prefs.start.plus_minutes(elapsed);
        let hours = &self.places[place].opening_hours;

        if is_open(hours, &arrival) {
            return Ok(Admission {
                wait_min: 0,
                open_on_arrival: true,
            });
        }

        match next_open(hours, &arrival) {
            // Relaxed mode treats hours as advisory: the place does
            // open eventually, so admit without the wait. A place that
            // never opens is refused in both modes.
            Some(_) if self.relaxed => Ok(Admission {
                wait_min: 0,
                open_on_arrival: false,
            }),
            Some(opening) => Ok(Admission {
                wait_min: arrival.minutes_until(&opening),
                open_on_arrival: false,
            }),
            None => Err(SkipReason::NeverOpens),
        }
    }

    /// Attempts to schedule `place` after `last` with the clock at
    /// `elapsed`. Returns the new clock value on success.
    fn try_visit(
        &self,
        last: Option<usize>,
        place: usize,
        elapsed: i64,
    ) -> Result<VisitFit, SkipReason> {
        let travel = last.map_or(0, |l| self.travel_min(l, place));
        let arrival = elapsed + travel;
        let admission = self.admit(place, arrival)?;
        let departure =
            arrival + admission.wait_min + i64::from(self.places[place].visit_duration_min);

        if departure > self.budget_min {
            return Err(SkipReason::BudgetExhausted);
        }

        Ok(VisitFit {
            travel_min: travel,
            departure,
            open_on_arrival: admission.open_on_arrival,
        })
    }

    /// Walks a fixed ordering, keeping every stop that still fits and
    /// dropping (with a reason) every stop that does not.
    fn schedule(&self, order: &[usize]) -> Schedule {
        let mut kept = Vec::with_capacity(order.len());
        let mut legs = Vec::new();
        let mut dropped = Vec::new();
        let mut elapsed = 0i64;
        let mut travel_min = 0.0;
        let mut distance_km = 0.0;
        let mut last: Option<usize> = None;

        for &place in order {
            match self.try_visit(last, place, elapsed) {
                Ok(fit) => {
                    if let Some(from) = last {
                        let leg = self.matrix.get(from, place);
                        travel_min += leg.duration_min;
                        distance_km += leg.distance_km;
                        legs.push(leg);
                    }
                    kept.push(place);
                    elapsed = fit.departure;
                    last = Some(place);
                }
                Err(reason) => dropped.push((place, reason)),
            }
        }

        Schedule {
            kept,
            legs,
            elapsed_min: elapsed,
            travel_min,
            distance_km,
            dropped,
        }
    }
}

struct VisitFit {
    travel_min: i64,
    departure: i64,
    open_on_arrival: bool,
}

/// One finished greedy run.
struct GreedyRun {
    schedule: Schedule,
    aggregate: f64,
}

/// Grows a route step by step from `start`, always appending the
/// highest-scoring eligible candidate (ties broken by lower travel).
fn greedy_run(sim: &Sim<'_>, start: usize, deadline: Deadline) -> Result<GreedyRun, PlanError> {
    let n = sim.places.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut elapsed = 0i64;
    let mut last: Option<usize> = None;

    // The seeded start gets first claim, subject to the same admission
    // rules as any stop. An inadmissible seed does not end the run.
    if let Ok(fit) = sim.try_visit(None, start, 0) {
        visited[start] = true;
        order.push(start);
        elapsed = fit.departure;
        last = Some(start);
    }

    loop {
        deadline.check()?;

        let mut best: Option<(usize, f64, VisitFit)> = None;
        for candidate in 0..n {
            if visited[candidate] {
                continue;
            }
            if let Ok(fit) = sim.try_visit(last, candidate, elapsed) {
                let score = step_score(sim, candidate, &fit);
                let better = match &best {
                    None => true,
                    Some((_, best_score, best_fit)) => {
                        score > *best_score
                            || (score == *best_score && fit.travel_min < best_fit.travel_min)
                    }
                };
                if better {
                    best = Some((candidate, score, fit));
                }
            }
        }

        let Some((candidate, _, fit)) = best else {
            break;
        };
        visited[candidate] = true;
        order.push(candidate);
        elapsed = fit.departure;
        last = Some(candidate);
    }

    let mut schedule = sim.schedule(&order);
    // Everything unvisited was ineligible when the loop ended; record
    // why, probed from the route's final state.
    for candidate in 0..n {
        if !visited[candidate] {
            let reason = sim
                .try_visit(last, candidate, elapsed)
                .err()
                .unwrap_or(SkipReason::BudgetExhausted);
            schedule.dropped.push((candidate, reason));
        }
    }

    let value: f64 = schedule.kept.iter().map(|&i| sim.places[i].rating).sum();
    let aggregate = value - TRAVEL_PENALTY_PER_HOUR * schedule.travel_min / 60.0;

    Ok(GreedyRun { schedule, aggregate })
}

/// Composite step score per the preference weights: rating, proximity
/// of the travel leg, and opening-hours compatibility at arrival.
fn step_score(sim: &Sim<'_>, candidate: usize, fit: &VisitFit) -> f64 {
    let weights = sim.prefs.weights;
    let rating = (sim.places[candidate].rating / MAX_RATING).clamp(0.0, 1.0);
    let proximity = 1.0 / (1.0 + fit.travel_min as f64 / PROXIMITY_SCALE_MIN);
    let hours = if fit.open_on_arrival { 1.0 } else { 0.0 };

    weights.rating * rating + weights.proximity * proximity + weights.hours * hours
}

/// Start candidates ranked by rating blended with an open-now bonus.
fn rank_starts(sim: &Sim<'_>, count: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = (0..sim.places.len())
        .map(|i| {
            let mut rank = sim.places[i].rating;
            if is_open(&sim.places[i].opening_hours, &sim.prefs.start) {
                rank += OPEN_AT_START_BONUS;
            }
            (i, rank)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(count.max(1)).map(|(i, _)| i).collect()
}

/// Tries every ranked start in parallel and keeps the run with the
/// highest aggregate score.
fn best_greedy(sim: &Sim<'_>, options: &SolveOptions, deadline: Deadline) -> Result<GreedyRun, PlanError> {
    let starts = rank_starts(sim, options.multi_start);
    let runs = starts
        .par_iter()
        .map(|&start| greedy_run(sim, start, deadline))
        .collect::<Result<Vec<_>, _>>()?;

    runs.into_iter()
        .max_by(|a, b| a.aggregate.total_cmp(&b.aggregate))
        .ok_or(PlanError::NoCandidates)
}

/// Exact minimum-travel Hamiltonian path over all starts, by bitmask
/// DP over (visited set, last stop). Ignores time windows; the caller
/// re-walks the ordering through `Sim::schedule`.
fn exact_order(matrix: &TravelMatrix, deadline: Deadline) -> Result<Vec<usize>, PlanError> {
    let n = matrix.len();
    if n <= 1 {
        return Ok((0..n).collect());
    }

    let full = 1usize << n;
    let mut cost = vec![f64::INFINITY; full * n];
    let mut parent = vec![usize::MAX; full * n];

    for start in 0..n {
        cost[(1 << start) * n + start] = 0.0;
    }

    for mask in 1..full {
        if mask % 1024 == 0 {
            deadline.check()?;
        }
        for last in 0..n {
            if mask & (1 << last) == 0 {
                continue;
            }
            let here = cost[mask * n + last];
            if !here.is_finite() {
                continue;
            }
            for next in 0..n {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let next_mask = mask | (1 << next);
                let candidate = here + matrix.get(last, next).duration_min;
                if candidate < cost[next_mask * n + next] {
                    cost[next_mask * n + next] = candidate;
                    parent[next_mask * n + next] = last;
                }
            }
        }
    }

    let full_mask = full - 1;
    let mut end = 0;
    for last in 1..n {
        if cost[full_mask * n + last] < cost[full_mask * n + end] {
            end = last;
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut mask = full_mask;
    let mut at = end;
    while at != usize::MAX {
        order.push(at);
        let prev = parent[mask * n + at];
        mask &= !(1 << at);
        at = prev;
    }
    order.reverse();
    Ok(order)
}

/// Candidate indices kept under the `max_places` ceiling (highest
/// rating first wins), plus the skipped overflow.
fn cap_candidates(places: &[Place], ceiling: usize) -> (Vec<usize>, Vec<SkippedPlace>) {
    if places.len() <= ceiling {
        return ((0..places.len()).collect(), Vec::new());
    }

    let mut by_rating: Vec<usize> = (0..places.len()).collect();
    by_rating.sort_by(|&a, &b| places[b].rating.total_cmp(&places[a].rating));

    let mut kept: Vec<usize> = by_rating[..ceiling].to_vec();
    kept.sort_unstable();
    let skipped = by_rating[ceiling..]
        .iter()
        .map(|&i| SkippedPlace {
            id: places[i].id.clone(),
            reason: SkipReason::OverCapacity,
        })
        .collect();
    (kept, skipped)
}

/// Plans a route through `places` within the preferences' budget.
///
/// Deterministic modulo external-provider availability and cache
/// state. Infeasibility (zero places schedulable, even after the
/// relaxed retry) is reported as a `feasible == false` result, not an
/// error.
pub fn optimize<S: TravelTimeSource>(
    places: &[Place],
    prefs: &SchedulingPreferences,
    provider: &TravelTimeProvider<S>,
    options: &SolveOptions,
) -> Result<RouteResult, PlanError> {
    prefs.validate()?;
    if places.is_empty() {
        return Err(PlanError::NoCandidates);
    }
    for place in places {
        place.coordinates.validate()?;
        if place.visit_duration_min == 0 {
            return Err(PlanError::InvalidPreferences(format!(
                "place {} has zero visit duration",
                place.id
            )));
        }
    }

    let deadline = Deadline::new(options.timeout);
    let (candidate_idx, mut over_capacity) = cap_candidates(places, options.max_places.max(1));
    let candidates: Vec<Place> = candidate_idx.iter().map(|&i| places[i].clone()).collect();
    let coords: Vec<_> = candidates.iter().map(|p| p.coordinates).collect();

    let matrix = provider.matrix_for(&coords, deadline)?;
    debug!(candidates = candidates.len(), "matrix built");
    deadline.check()?;

    let sim = Sim::new(&candidates, &matrix, prefs, false);

    let use_exact = matches!(options.strategy, Strategy::Exact | Strategy::Auto)
        && candidates.len() <= options.dp_ceiling;
    if matches!(options.strategy, Strategy::Exact) && !use_exact {
        warn!(
            n = candidates.len(),
            ceiling = options.dp_ceiling,
            "instance too large for exact strategy, falling back to greedy"
        );
    }

    let greedy = if use_exact && matches!(options.strategy, Strategy::Exact) {
        None
    } else {
        Some(best_greedy(&sim, options, deadline)?)
    };
    let exact = if use_exact {
        let order = exact_order(&matrix, deadline)?;
        Some(sim.schedule(&order))
    } else {
        None
    };
    debug!("candidates generated");
    deadline.check()?;

    // Pick the winner: more places scheduled, then less travel.
    let (mut schedule, mut strategy) = match (greedy, exact) {
        (Some(run), None) => (run.schedule, Strategy::Greedy),
        (None, Some(schedule)) => (schedule, Strategy::Exact),
        (Some(run), Some(exact_schedule)) => {
            let exact_wins = exact_schedule.kept.len() > run.schedule.kept.len()
                || (exact_schedule.kept.len() == run.schedule.kept.len()
                    && exact_schedule.travel_min < run.schedule.travel_min);
            if exact_wins {
                (exact_schedule, Strategy::Exact)
            } else {
                (run.schedule, Strategy::Greedy)
            }
        }
        (None, None) => return Err(PlanError::NoCandidates),
    };
    debug!(strategy = ?strategy, kept = schedule.kept.len(), "best selected");

    // Relaxed retry: inflated budget, opening hours advisory.
    let mut relaxed = false;
    if schedule.kept.is_empty() {
        warn!("no feasible route under strict constraints, retrying relaxed");
        let relaxed_sim = Sim::new(&candidates, &matrix, prefs, true);
        let run = best_greedy(&relaxed_sim, options, deadline)?;
        if !run.schedule.kept.is_empty() {
            schedule = run.schedule;
            strategy = Strategy::Greedy;
            relaxed = true;
        }
    }
    deadline.check()?;

    // 2-opt refinement; accept only if the refined ordering still
    // schedules the same stop set without more travel.
    if schedule.kept.len() >= 3 {
        let refined_order = two_opt(&schedule.kept, &matrix, options.refine_passes);
        let accept_sim = Sim::new(&candidates, &matrix, prefs, relaxed);
        let mut refined = accept_sim.schedule(&refined_order);
        if refined.kept.len() == schedule.kept.len() && refined.travel_min <= schedule.travel_min {
            // The refined walk only covers kept stops; the skip
            // reasons belong to the pre-refinement schedule.
            refined.dropped = std::mem::take(&mut schedule.dropped);
            schedule = refined;
            debug!("refinement accepted");
        } else {
            debug!("refinement rejected, keeping original order");
        }
    }
    deadline.check()?;

    let mut skipped: Vec<SkippedPlace> = schedule
        .dropped
        .iter()
        .map(|&(i, reason)| SkippedPlace {
            id: candidates[i].id.clone(),
            reason,
        })
        .collect();
    skipped.append(&mut over_capacity);

    let visited: Vec<Place> = schedule.kept.iter().map(|&i| candidates[i].clone()).collect();
    let feasible = !visited.is_empty();
    let result = RouteResult {
        efficiency: visited.len() as f64 / places.len() as f64,
        total_time_min: schedule.elapsed_min as f64,
        total_travel_min: schedule.travel_min,
        total_distance_km: schedule.distance_km,
        places: visited,
        legs: schedule.legs,
        feasible,
        strategy,
        relaxed,
        skipped,
    };
    debug!(
        visited = result.places.len(),
        feasible = result.feasible,
        total_travel_min = result.total_travel_min,
        "assembled"
    );
    Ok(result)
}
