//! 2-opt local search over a fixed stop set.
//!
//! Reverses the segment whose reversal saves the most travel time,
//! once per pass, until no improving reversal exists or the pass
//! ceiling is reached. Only the ordering changes; the stop set is
//! invariant. Feasibility re-validation after reordering is the
//! solver's job, not this module's.

use tracing::debug;

use crate::provider::TravelMatrix;

const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Returns a reordering of `order` with total inter-stop travel time
/// no greater than the input's.
pub fn two_opt(order: &[usize], matrix: &TravelMatrix, max_passes: usize) -> Vec<usize> {
    let mut route = order.to_vec();
    if route.len() < 3 {
        return route;
    }

    for pass in 0..max_passes {
        match best_reversal(&route, matrix) {
            Some((i, j, saving)) => {
                route[i..=j].reverse();
                debug!(pass, i, j, saving, "applied 2-opt reversal");
            }
            None => break,
        }
    }

    route
}

/// The single reversal `route[i..=j]` with the largest positive travel
/// saving, if any.
fn best_reversal(route: &[usize], matrix: &TravelMatrix) -> Option<(usize, usize, f64)> {
    let n = route.len();
    let mut best: Option<(usize, usize, f64)> = None;

    for i in 0..n - 1 {
        for j in i + 1..n {
            let saving = reversal_saving(route, matrix, i, j);
            if saving > IMPROVEMENT_EPSILON
                && best.map_or(true, |(_, _, best_saving)| saving > best_saving)
            {
                best = Some((i, j, saving));
            }
        }
    }

    best
}

/// Travel-time delta of reversing `route[i..=j]`. Only the boundary
/// legs change; with an asymmetric matrix the interior legs flip
/// direction too, so those are re-summed.
fn reversal_saving(route: &[usize], matrix: &TravelMatrix, i: usize, j: usize) -> f64 {
    let before_in = if i > 0 {
        matrix.get(route[i - 1], route[i]).duration_min
    } else {
        0.0
    };
    let before_out = if j + 1 < route.len() {
        matrix.get(route[j], route[j + 1]).duration_min
    } else {
        0.0
    };
    let after_in = if i > 0 {
        matrix.get(route[i - 1], route[j]).duration_min
    } else {
        0.0
    };
    let after_out = if j + 1 < route.len() {
        matrix.get(route[i], route[j + 1]).duration_min
    } else {
        0.0
    };

    let mut interior_before = 0.0;
    let mut interior_after = 0.0;
    for k in i..j {
        interior_before += matrix.get(route[k], route[k + 1]).duration_min;
        interior_after += matrix.get(route[k + 1], route[k]).duration_min;
    }

    (before_in + before_out + interior_before) - (after_in + after_out + interior_after)
}
