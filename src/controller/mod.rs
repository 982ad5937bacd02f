//! Controllers turning an analysis into control inputs.

pub(crate) mod layers;
mod layered;
mod simple;

use std::collections::HashMap;

use nalgebra::DVector;

use crate::analysis::Analysis;
use crate::automaton::Objective;
use crate::error::Error;
use crate::system::Abstraction;

pub use layered::LayeredController;
pub use layers::Onion;
pub use simple::{RandomController, RoundRobinController};

/// The names of the controllers in the registry, in the order accepted by
/// [`build`].
pub const NAMES: [&str; 3] = ["random", "round-robin", "layered-transition"];

/// A region-indexed control policy.
///
/// Controllers are queried with the current continuous point, its system
/// state and the current automaton state, and answer with a control
/// vector from the control polytope.
pub trait Controller {
    /// Clears the per-trace caches of this controller.
    fn reset(&mut self);
    /// Returns a control vector for the given origin point.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the controller is queried outside its
    /// configured domain, e.g. without an onion for the automaton state
    /// or in a state without actions.
    fn control(
        &mut self,
        x: &DVector<f64>,
        state: &str,
        automaton_state: &str,
    ) -> Result<DVector<f64>, Error>;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn reset(&mut self) {
        (**self).reset();
    }

    fn control(
        &mut self,
        x: &DVector<f64>,
        state: &str,
        automaton_state: &str,
    ) -> Result<DVector<f64>, Error> {
        (**self).control(x, state, automaton_state)
    }
}

/// Builds the controller registered under the given name.
///
/// The analysis is required by the `round-robin` and `layered-transition`
/// controllers; the transition map (automaton state to desired successor)
/// only by `layered-transition`.
///
/// # Errors
///
/// Returns a configuration error for an unknown name or missing
/// controller-specific inputs.
pub fn build<'a, A: Abstraction>(
    name: &str,
    abstraction: &'a A,
    objective: &'a Objective,
    analysis: Option<&'a Analysis>,
    transitions: Option<&HashMap<String, String>>,
) -> Result<Box<dyn Controller + 'a>, Error> {
    match name {
        "random" => Ok(Box::new(RandomController::new(abstraction))),
        "round-robin" => {
            let analysis = analysis.ok_or_else(|| {
                Error::configuration("round-robin controller requires an analysis")
            })?;
            Ok(Box::new(RoundRobinController::new(
                abstraction,
                objective,
                analysis,
            )))
        }
        "layered-transition" => {
            let analysis = analysis.ok_or_else(|| {
                Error::configuration("layered-transition controller requires an analysis")
            })?;
            let transitions = transitions.ok_or_else(|| {
                Error::configuration("layered-transition controller requires a transition map")
            })?;
            Ok(Box::new(LayeredController::new(
                abstraction,
                objective,
                analysis,
                transitions,
            )?))
        }
        _ => Err(Error::configuration(format!(
            "unknown controller {:?}",
            name
        ))),
    }
}
