//! Interfaces to the abstracted system and its polytopic geometry.
//!
//! The partitioning of the continuous state space, the polytope
//! computations and the probability structure all live outside the core;
//! this module fixes the contracts the core consumes. Game construction
//! and solving only need the [`GameGraph`] view, while controllers, traces
//! and refinement additionally need the geometric side of [`Abstraction`].

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};
use rand::RngCore;

/// The graph view of an abstracted linear stochastic system.
///
/// System states are identified by labels. Inner states carry a non-empty
/// ordered action list; each action carries an ordered support list; each
/// support yields the set of possible successor states. Outer states
/// (traces that left the bounded state space) have no actions.
pub trait GameGraph {
    /// Returns the labels of all system states, in a stable order.
    fn state_labels(&self) -> Vec<String>;
    /// Returns the predicate labels satisfied by every point of the given
    /// state's polytope.
    fn predicate_labels_of(&self, label: &str) -> BTreeSet<String>;
    /// Returns the number of actions of the given state; `0` for outer
    /// states.
    fn action_count_of(&self, label: &str) -> usize;
    /// Returns the number of supports of the given action.
    fn support_count_of(&self, label: &str, action: usize) -> usize;
    /// Returns the labels of the states reachable under the given support.
    fn target_labels_of(&self, label: &str, action: usize, support: usize) -> BTreeSet<String>;
}

/// A union of convex polytopes, value-like and immutable.
///
/// The implementation is the geometry collaborator's; the core only relies
/// on the set algebra below being closed over unions of convex polytopes.
pub trait PolytopeUnion: Clone {
    /// Returns the empty union.
    fn empty() -> Self;
    /// Returns whether this union has no volume.
    fn is_empty(&self) -> bool;
    /// Returns the volume of this union.
    fn volume(&self) -> f64;
    /// Returns the union of this and the other set.
    fn union(&self, other: &Self) -> Self;
    /// Returns the intersection of this and the other set.
    fn intersect(&self, other: &Self) -> Self;
    /// Returns this set with the other set removed.
    fn remove(&self, other: &Self) -> Self;
    /// Returns whether this set covers the other set.
    fn covers(&self, other: &Self) -> bool;
    /// Returns whether the given point lies in this set.
    fn contains(&self, point: &DVector<f64>) -> bool;
    /// Samples a point uniformly from this set.
    fn sample(&self, rng: &mut dyn RngCore) -> DVector<f64>;
}

/// The dynamics matrices of a discrete-time affine system
/// `x_{t+1} = A x_t + B u_t + w_t`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearDynamics {
    a: DMatrix<f64>,
    b: DMatrix<f64>,
}

impl LinearDynamics {
    /// Creates the dynamics from the state matrix `A` and input matrix `B`.
    pub fn new(a: DMatrix<f64>, b: DMatrix<f64>) -> Self {
        assert_eq!(a.nrows(), a.ncols());
        assert_eq!(a.nrows(), b.nrows());
        Self { a, b }
    }

    /// Returns the dimension of the state space.
    pub fn dimension(&self) -> usize {
        self.a.nrows()
    }

    /// Applies one step of the dynamics to the given state, control and
    /// disturbance vectors.
    pub fn step(&self, x: &DVector<f64>, u: &DVector<f64>, w: &DVector<f64>) -> DVector<f64> {
        &self.a * x + &self.b * u + w
    }
}

/// The full interface of an abstracted linear stochastic system, adding
/// the geometric side to the graph view.
pub trait Abstraction: GameGraph {
    /// The set representation of the geometry collaborator.
    type Set: PolytopeUnion;

    /// Returns the dynamics matrices of the system.
    fn dynamics(&self) -> &LinearDynamics;
    /// Returns whether the given state is an outer state.
    fn is_outer(&self, label: &str) -> bool;
    /// Returns the polytope of the given state.
    fn polytope_of(&self, label: &str) -> Self::Set;
    /// Returns the control polytope of the given action.
    fn controls_of(&self, label: &str, action: usize) -> Self::Set;
    /// Returns the bounded state-space polytope.
    fn state_space(&self) -> Self::Set;
    /// Returns the global control polytope.
    fn control_space(&self) -> Self::Set;
    /// Returns the bounded random-disturbance polytope.
    fn random_space(&self) -> Self::Set;
    /// Returns the label of the state containing the given point.
    fn state_at(&self, point: &DVector<f64>) -> Option<String>;
    /// Returns the set reachable in one step from `origin` under controls
    /// in `controls` and any disturbance.
    fn post(&self, origin: &Self::Set, controls: &Self::Set) -> Self::Set;
    /// Returns the robust predecessor of `target` within `within`: the
    /// points from which, for every disturbance, some control in
    /// `controls` drives the next state into `target`.
    fn pre_r(&self, within: &Self::Set, controls: &Self::Set, target: &Self::Set) -> Self::Set;
}
