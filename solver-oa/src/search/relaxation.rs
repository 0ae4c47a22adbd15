//! Interval relaxation of a node.
//!
//! Integer variables are relaxed to their node domains. Rows are checked with
//! interval arithmetic over those domains, and because a row holds at most
//! one continuous variable, every row turns into a bound on that variable.
//! The objective is separable, so the relaxation decomposes into one 1-D
//! convex minimization per variable. With all integers fixed the relaxation
//! is exact.

use super::{Row, Sense, Variable};

/// Outcome of a node relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationStatus {
    /// Finite optimum found.
    Optimal,

    /// Some row cannot be satisfied within the node domains.
    Infeasible,

    /// Objective is unbounded below.
    Unbounded,
}

/// Relaxation solution at a node.
#[derive(Debug, Clone)]
pub struct Relaxation {
    /// Status.
    pub status: RelaxationStatus,

    /// Objective lower bound (-inf if unbounded, +inf if infeasible).
    pub bound: f64,

    /// Minimizing point (finite even when unbounded).
    pub x: Vec<f64>,
}

impl Relaxation {
    fn infeasible(n: usize) -> Self {
        Self {
            status: RelaxationStatus::Infeasible,
            bound: f64::INFINITY,
            x: vec![0.0; n],
        }
    }
}

/// Range of a row's integer part over the node domains, plus its continuous
/// variable (if any) with coefficient.
fn row_activity(row: &Row, vars: &[Variable], lb: &[f64], ub: &[f64]) -> (f64, f64, Option<(usize, f64)>) {
    let mut lo = 0.0;
    let mut hi = 0.0;
    let mut continuous = None;

    for (i, &a) in row.coefs.iter() {
        if !vars[i].var_type.is_integral() {
            continuous = Some((i, a));
            continue;
        }
        if a > 0.0 {
            lo += a * lb[i];
            hi += a * ub[i];
        } else {
            lo += a * ub[i];
            hi += a * lb[i];
        }
    }

    (lo, hi, continuous)
}

/// Solve the interval relaxation for integer domains `lb..=ub`.
///
/// Entries of `lb`/`ub` for continuous variables are their model bounds and
/// get tightened by row propagation.
pub fn solve_relaxation(
    vars: &[Variable],
    rows: &[Row],
    lb: &[f64],
    ub: &[f64],
    feas_tol: f64,
) -> Relaxation {
    let n = vars.len();
    let mut lo_c = lb.to_vec();
    let mut hi_c = ub.to_vec();

    for row in rows {
        let (lo, hi, continuous) = row_activity(row, vars, lb, ub);
        let (below, above) = match row.sense {
            Sense::Le => (true, false),
            Sense::Ge => (false, true),
            Sense::Eq => (true, true),
        };

        match continuous {
            None => {
                if (below && lo > row.rhs + feas_tol) || (above && hi < row.rhs - feas_tol) {
                    return Relaxation::infeasible(n);
                }
            }
            Some((c, a)) => {
                // a*c <= rhs - lo   and/or   a*c >= rhs - hi
                if below {
                    let limit = (row.rhs - lo) / a;
                    if a > 0.0 {
                        hi_c[c] = hi_c[c].min(limit);
                    } else {
                        lo_c[c] = lo_c[c].max(limit);
                    }
                }
                if above {
                    let limit = (row.rhs - hi) / a;
                    if a > 0.0 {
                        lo_c[c] = lo_c[c].max(limit);
                    } else {
                        hi_c[c] = hi_c[c].min(limit);
                    }
                }
            }
        }
    }

    let mut x = vec![0.0; n];
    let mut bound = 0.0;
    let mut unbounded = false;

    for (i, var) in vars.iter().enumerate() {
        let (l, u) = if var.var_type.is_integral() {
            (lb[i], ub[i])
        } else {
            (lo_c[i], hi_c[i])
        };
        if l > u + feas_tol {
            return Relaxation::infeasible(n);
        }
        // Collapse tolerance-sized crossings
        let u = u.max(l);

        match var.minimize(l, u) {
            Some((xi, value)) => {
                x[i] = xi;
                bound += value;
            }
            None => {
                unbounded = true;
                x[i] = 0.0_f64.max(l).min(u);
            }
        }
    }

    if unbounded {
        Relaxation {
            status: RelaxationStatus::Unbounded,
            bound: f64::NEG_INFINITY,
            x,
        }
    } else {
        Relaxation {
            status: RelaxationStatus::Optimal,
            bound,
            x,
        }
    }
}
