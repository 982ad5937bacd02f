//! Closed-loop execution of a controller on the system dynamics.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::automaton::Objective;
use crate::controller::Controller;
use crate::error::Error;
use crate::system::{Abstraction, PolytopeUnion};

/// The reason a trace stopped producing steps.
///
/// Termination is a first-class value, distinct from errors: a terminated
/// trace is a valid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The trace entered an outer state and left the bounded state space.
    Outer,
    /// The automaton reached a final state under the co-safe
    /// interpretation; the objective is satisfied.
    Final,
    /// The automaton has no successor for the current predicates.
    NoSuccessor,
}

/// The result of one step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A step was taken and recorded.
    Taken,
    /// The trace terminated; no step was recorded.
    Finished(Termination),
}

/// One recorded step of a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep {
    /// The continuous origin point.
    pub origin: DVector<f64>,
    /// The system state of the origin point.
    pub origin_state: String,
    /// The automaton state before the step.
    pub origin_automaton: String,
    /// The control input applied.
    pub control: DVector<f64>,
    /// The disturbance sampled from the random polytope.
    pub disturbance: DVector<f64>,
    /// The continuous successor point.
    pub target: DVector<f64>,
    /// The system state of the successor point.
    pub target_state: String,
    /// The automaton state after the step.
    pub target_automaton: String,
}

/// An executor driving the system through a controller, recording every
/// step.
pub struct Trace<'a, A: Abstraction, C: Controller> {
    abstraction: &'a A,
    objective: &'a Objective,
    controller: C,
    x: DVector<f64>,
    state: String,
    automaton_state: String,
    steps: Vec<TraceStep>,
    rng: StdRng,
}

impl<'a, A: Abstraction, C: Controller> Trace<'a, A, C> {
    /// Starts a trace at the given point.
    ///
    /// A given system state is checked for consistency with the point; a
    /// missing one is looked up by point location. A missing automaton
    /// state defaults to the initial state.
    ///
    /// # Errors
    ///
    /// Returns an invariant error if the point lies outside the given
    /// state or outside every state, and a configuration error for an
    /// unknown automaton state.
    pub fn new(
        abstraction: &'a A,
        objective: &'a Objective,
        controller: C,
        x: DVector<f64>,
        state: Option<&str>,
        automaton_state: Option<&str>,
    ) -> Result<Self, Error> {
        let state = match state {
            Some(label) => {
                if !abstraction.polytope_of(label).contains(&x) {
                    return Err(Error::invariant(format!(
                        "origin point lies outside state {:?}",
                        label
                    )));
                }
                label.to_owned()
            }
            None => abstraction
                .state_at(&x)
                .ok_or_else(|| Error::invariant("origin point lies outside every state"))?,
        };
        let automaton_state = match automaton_state {
            Some(label) => {
                if !objective.automaton().has_state(label) {
                    return Err(Error::configuration(format!(
                        "unknown automaton state {:?}",
                        label
                    )));
                }
                label.to_owned()
            }
            None => objective.automaton().initial().to_owned(),
        };
        Ok(Self {
            abstraction,
            objective,
            controller,
            x,
            state,
            automaton_state,
            steps: Vec::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Reseeds the disturbance sampling of this trace, for reproducible
    /// runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Returns the recorded steps.
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Returns the current continuous point.
    pub fn point(&self) -> &DVector<f64> {
        &self.x
    }

    /// Returns the current system state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the current automaton state.
    pub fn automaton_state(&self) -> &str {
        &self.automaton_state
    }

    /// Attempts one closed-loop step.
    ///
    /// # Errors
    ///
    /// Propagates controller errors, and returns an invariant error if
    /// the successor point lies outside every state.
    pub fn step(&mut self) -> Result<Step, Error> {
        if self.abstraction.is_outer(&self.state) {
            return Ok(Step::Finished(Termination::Outer));
        }
        if self.objective.co_safe() && self.objective.automaton().in_f(&self.automaton_state) {
            return Ok(Step::Finished(Termination::Final));
        }
        let predicates = self.abstraction.predicate_labels_of(&self.state);
        let successor = match self.objective.successor(&self.automaton_state, &predicates) {
            Some(successor) => successor.to_owned(),
            None => return Ok(Step::Finished(Termination::NoSuccessor)),
        };

        let control = self
            .controller
            .control(&self.x, &self.state, &self.automaton_state)?;
        let disturbance = self.abstraction.random_space().sample(&mut self.rng);
        let target = self
            .abstraction
            .dynamics()
            .step(&self.x, &control, &disturbance);
        let target_state = self.abstraction.state_at(&target).ok_or_else(|| {
            Error::invariant("successor point lies outside every state")
        })?;

        self.steps.push(TraceStep {
            origin: self.x.clone(),
            origin_state: self.state.clone(),
            origin_automaton: self.automaton_state.clone(),
            control,
            disturbance,
            target: target.clone(),
            target_state: target_state.clone(),
            target_automaton: successor.clone(),
        });
        self.x = target;
        self.state = target_state;
        self.automaton_state = successor;
        Ok(Step::Taken)
    }

    /// Applies [`step`](Self::step) up to `n` times, stopping early on
    /// termination.
    ///
    /// Returns the termination reason, or `None` if all `n` steps were
    /// taken.
    ///
    /// # Errors
    ///
    /// See [`step`](Self::step).
    pub fn step_for(&mut self, n: usize) -> Result<Option<Termination>, Error> {
        for _ in 0..n {
            if let Step::Finished(termination) = self.step()? {
                return Ok(Some(termination));
            }
        }
        Ok(None)
    }
}
