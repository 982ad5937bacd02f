//! Baseline controllers.

use std::collections::HashMap;

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::Analysis;
use crate::automaton::Objective;
use crate::controller::Controller;
use crate::error::Error;
use crate::system::{Abstraction, PolytopeUnion};

/// A controller sampling uniformly from the global control polytope.
pub struct RandomController<'a, A: Abstraction> {
    abstraction: &'a A,
    rng: StdRng,
}

impl<'a, A: Abstraction> RandomController<'a, A> {
    pub fn new(abstraction: &'a A) -> Self {
        Self {
            abstraction,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reseeds the sampling of this controller, for reproducible traces.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl<'a, A: Abstraction> Controller for RandomController<'a, A> {
    fn reset(&mut self) {}

    fn control(
        &mut self,
        _x: &DVector<f64>,
        _state: &str,
        _automaton_state: &str,
    ) -> Result<DVector<f64>, Error> {
        Ok(self.abstraction.control_space().sample(&mut self.rng))
    }
}

/// A controller cycling through the actions of a state.
///
/// Actions whose every support target is classified `yes` for the next
/// automaton state are preferred; the cursor of the cycle is kept per
/// `(state, automaton state)`.
pub struct RoundRobinController<'a, A: Abstraction> {
    abstraction: &'a A,
    objective: &'a Objective,
    analysis: &'a Analysis,
    cursor: HashMap<(String, String), usize>,
    rng: StdRng,
}

impl<'a, A: Abstraction> RoundRobinController<'a, A> {
    pub fn new(abstraction: &'a A, objective: &'a Objective, analysis: &'a Analysis) -> Self {
        Self {
            abstraction,
            objective,
            analysis,
            cursor: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Reseeds the sampling of this controller, for reproducible traces.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Returns whether every target of every support of the action is
    /// classified `yes` for the given automaton state.
    fn robust(&self, state: &str, action: usize, automaton_state: &str) -> bool {
        (0..self.abstraction.support_count_of(state, action)).all(|support| {
            self.abstraction
                .target_labels_of(state, action, support)
                .iter()
                .all(|target| self.analysis.is_yes(target, automaton_state))
        })
    }
}

impl<'a, A: Abstraction> Controller for RoundRobinController<'a, A> {
    fn reset(&mut self) {
        self.cursor.clear();
    }

    fn control(
        &mut self,
        _x: &DVector<f64>,
        state: &str,
        automaton_state: &str,
    ) -> Result<DVector<f64>, Error> {
        let actions = self.abstraction.action_count_of(state);
        if actions == 0 {
            return Err(Error::transient(format!(
                "state {:?} has no actions",
                state
            )));
        }
        let predicates = self.abstraction.predicate_labels_of(state);
        let successor = self
            .objective
            .successor(automaton_state, &predicates)
            .ok_or_else(|| {
                Error::transient(format!(
                    "automaton state {:?} has no successor in state {:?}",
                    automaton_state, state
                ))
            })?
            .to_owned();

        let key = (state.to_owned(), automaton_state.to_owned());
        let start = self.cursor.get(&key).map_or(0, |&last| (last + 1) % actions);
        let mut chosen = start;
        for offset in 0..actions {
            let action = (start + offset) % actions;
            if self.robust(state, action, &successor) {
                chosen = action;
                break;
            }
        }
        self.cursor.insert(key, chosen);
        Ok(self
            .abstraction
            .controls_of(state, chosen)
            .sample(&mut self.rng))
    }
}
