//! The layered-transition controller.

use std::collections::HashMap;

use log::trace;
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::Analysis;
use crate::automaton::Objective;
use crate::controller::layers::{no_region, transition_region, Onion};
use crate::controller::Controller;
use crate::error::Error;
use crate::system::{Abstraction, PolytopeUnion};

/// The cost weight of the one-step reachable volume outside every layer.
const OUTSIDE_WEIGHT: f64 = 9999.0;

/// A controller following a per-automaton-transition layered
/// decomposition.
///
/// For every automaton state `q` in the transition map an onion is grown
/// around the region whose states move the automaton to the desired
/// successor. An action is scored by partitioning its one-step reachable
/// set through the layers, weighting volume by layer index; the chosen
/// action's control polytope is memoised per `(state, q)` and sampled on
/// every later query.
pub struct LayeredController<'a, A: Abstraction> {
    abstraction: &'a A,
    onions: HashMap<String, Onion<A::Set>>,
    cache: HashMap<(String, String), A::Set>,
    rng: StdRng,
}

impl<'a, A: Abstraction> LayeredController<'a, A> {
    /// Creates the controller for the given transition map from automaton
    /// states to their desired successors.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the transition map references
    /// unknown automaton states.
    pub fn new(
        abstraction: &'a A,
        objective: &'a Objective,
        analysis: &'a Analysis,
        transitions: &HashMap<String, String>,
    ) -> Result<Self, Error> {
        let mut onions = HashMap::new();
        for (from, to) in transitions {
            if !objective.automaton().has_state(from) || !objective.automaton().has_state(to) {
                return Err(Error::configuration(format!(
                    "transition {} -> {} references unknown automaton states",
                    from, to
                )));
            }
            let target = transition_region(abstraction, analysis, from, to);
            let avoid = no_region(abstraction, analysis, from);
            onions.insert(from.clone(), Onion::grow(abstraction, &target, &avoid));
        }
        Ok(Self {
            abstraction,
            onions,
            cache: HashMap::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Reseeds the sampling of this controller, for reproducible traces.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Scores all actions of the given state through the onion of the
    /// given automaton state and returns the control polytope of the best
    /// one.
    fn choose(&self, state: &str, automaton_state: &str) -> Result<A::Set, Error> {
        let onion = self.onions.get(automaton_state).ok_or_else(|| {
            Error::transient(format!(
                "no onion configured for automaton state {:?}",
                automaton_state
            ))
        })?;
        let polytope = self.abstraction.polytope_of(state);
        let mut best: Option<(f64, A::Set)> = None;
        for action in 0..self.abstraction.action_count_of(state) {
            let controls = self.abstraction.controls_of(state, action);
            let mut residual = self.abstraction.post(&polytope, &controls);
            let total = residual.volume();
            if total <= 0.0 {
                continue;
            }
            let mut cost = 0.0;
            for (index, layer) in onion.layers().iter().enumerate() {
                cost += residual.intersect(layer).volume() * index as f64;
                residual = residual.remove(layer);
            }
            cost += residual.volume() * OUTSIDE_WEIGHT;
            let score = -cost / total;
            trace!("action {} of ({}, {}) scores {}", action, state, automaton_state, score);
            if best.as_ref().map_or(true, |&(b, _)| score > b) {
                best = Some((score, controls));
            }
        }
        best.map(|(_, controls)| controls).ok_or_else(|| {
            Error::transient(format!("state {:?} admits no scorable action", state))
        })
    }
}

impl<'a, A: Abstraction> Controller for LayeredController<'a, A> {
    fn reset(&mut self) {
        self.cache.clear();
    }

    fn control(
        &mut self,
        _x: &DVector<f64>,
        state: &str,
        automaton_state: &str,
    ) -> Result<DVector<f64>, Error> {
        let key = (state.to_owned(), automaton_state.to_owned());
        if !self.cache.contains_key(&key) {
            let controls = self.choose(state, automaton_state)?;
            self.cache.insert(key.clone(), controls);
        }
        Ok(self.cache[&key].sample(&mut self.rng))
    }
}
