//! Initial value problems with a single state variable.
//!
//! Problems implement [`IVP`] and carry every parameter the derivative needs,
//! so that independent problems can be integrated without any shared state.
//! Integration uses the adaptive Dormand-Prince 5(4) scheme from `ode_solvers`.

use crate::errors::{RunoffError, RunoffResult};
use crate::units::{FloatValue, Time};
use log::error;
use ode_solvers::{Dopri5, System, Vector1};
use serde::{Deserialize, Serialize};

/// State vector used by the solver
pub type ScalarState = Vector1<FloatValue>;

/// A first order ODE `dy/dt = f(t, y)`.
pub trait IVP {
    fn calculate_dy_dt(&self, t: Time, y: FloatValue) -> FloatValue;
}

/// Tolerances handed to the adaptive integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Relative tolerance
    pub rtol: FloatValue,
    /// Absolute tolerance
    pub atol: FloatValue,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            rtol: 1.0e-4,
            atol: 1.0e-4,
        }
    }
}

/// Adapter exposing an [`IVP`] as an `ode_solvers` system.
struct IVPSystem<'a, P> {
    problem: &'a P,
}

impl<P: IVP> System<Time, ScalarState> for IVPSystem<'_, P> {
    fn system(&self, t: Time, y: &ScalarState, dy: &mut ScalarState) {
        dy[0] = self.problem.calculate_dy_dt(t, y[0]);
    }
}

/// Integrate `problem` from `t_start` to `t_end` starting at `y0`.
///
/// Returns the state at `t_end`. A failure to converge (step size underflow,
/// stiffness or too many steps) is returned as [`RunoffError::IntegrationFailed`].
pub fn solve_ivp<P: IVP>(
    problem: &P,
    t_start: Time,
    t_end: Time,
    y0: FloatValue,
    options: &SolverOptions,
) -> RunoffResult<FloatValue> {
    if t_end <= t_start {
        return Ok(y0);
    }

    let system = IVPSystem { problem };
    let mut solver = Dopri5::new(
        system,
        t_start,
        t_end,
        t_end - t_start,
        ScalarState::new(y0),
        options.rtol,
        options.atol,
    );

    if let Err(e) = solver.integrate() {
        error!("ODE integration over [{t_start}, {t_end}] failed: {e:?}");
        return Err(RunoffError::IntegrationFailed {
            t_start,
            t_end,
            reason: format!("{:?}", e),
        });
    }

    match solver.y_out().last() {
        Some(y) => Ok(y[0]),
        None => Err(RunoffError::IntegrationFailed {
            t_start,
            t_end,
            reason: "solver produced no output".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Decay {
        rate: FloatValue,
    }

    impl IVP for Decay {
        fn calculate_dy_dt(&self, _t: Time, y: FloatValue) -> FloatValue {
            -self.rate * y
        }
    }

    struct Constant {
        slope: FloatValue,
    }

    impl IVP for Constant {
        fn calculate_dy_dt(&self, _t: Time, _y: FloatValue) -> FloatValue {
            self.slope
        }
    }

    #[test]
    fn test_exponential_decay() {
        let problem = Decay { rate: 0.5 };
        let y = solve_ivp(&problem, 0.0, 2.0, 1.0, &SolverOptions::default()).unwrap();

        assert_relative_eq!(y, (-1.0_f64).exp(), max_relative = 1e-3);
    }

    #[test]
    fn test_constant_slope_is_exact() {
        let problem = Constant { slope: 0.25 };
        let y = solve_ivp(&problem, 10.0, 50.0, 1.0, &SolverOptions::default()).unwrap();

        assert_relative_eq!(y, 11.0, epsilon = 1e-10);
    }

    #[test]
    fn test_empty_interval_returns_initial_value() {
        let problem = Decay { rate: 1.0 };
        let y = solve_ivp(&problem, 5.0, 5.0, 3.0, &SolverOptions::default()).unwrap();

        assert_eq!(y, 3.0);
    }

    #[test]
    fn test_default_tolerances() {
        let options = SolverOptions::default();
        assert_eq!(options.rtol, 1.0e-4);
        assert_eq!(options.atol, 1.0e-4);
    }
}
