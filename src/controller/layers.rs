//! Layered robust-predecessor decompositions.

use log::debug;

use crate::analysis::Analysis;
use crate::system::{Abstraction, PolytopeUnion};

/// The monotone sequence of `preR` layers around a target region.
///
/// Layer `0` is the target with the avoid region removed; every further
/// layer is the robust predecessor of the previous one, again with the
/// avoid region removed. The sequence stops as soon as a layer is covered
/// by its predecessor, which happens after finitely many steps on finite
/// polytopic descriptions. Controllers rank actions by the index of the
/// layer their one-step reachable set falls into.
pub struct Onion<S> {
    layers: Vec<S>,
}

impl<S: PolytopeUnion> Onion<S> {
    /// Grows the layer sequence around `target`, avoiding `avoid`, inside
    /// the system's state space and under its global control polytope.
    pub fn grow<A: Abstraction<Set = S>>(abstraction: &A, target: &S, avoid: &S) -> Self {
        let state_space = abstraction.state_space();
        let controls = abstraction.control_space();
        let mut layers = Vec::new();
        let mut current = target.remove(avoid);
        loop {
            let next = abstraction
                .pre_r(&state_space, &controls, &current)
                .remove(avoid);
            let done = current.covers(&next);
            layers.push(current);
            if done {
                break;
            }
            current = next;
        }
        debug!("onion grown with {} layers", layers.len());
        Self { layers }
    }

    /// Returns the layers, innermost first.
    pub fn layers(&self) -> &[S] {
        &self.layers
    }
}

/// Returns the union of the polytopes of the non-outer states whose
/// automaton successor under `from` is `to`.
pub(crate) fn transition_region<A: Abstraction>(
    abstraction: &A,
    analysis: &Analysis,
    from: &str,
    to: &str,
) -> A::Set {
    collect_region(abstraction, analysis, |state| {
        state.next.get(from).map(String::as_str) == Some(to)
    })
}

/// Returns the union of the polytopes of the non-outer states classified
/// `no` for the given automaton state.
pub(crate) fn no_region<A: Abstraction>(
    abstraction: &A,
    analysis: &Analysis,
    automaton_state: &str,
) -> A::Set {
    collect_region(abstraction, analysis, |state| {
        state.no.contains(automaton_state)
    })
}

/// Returns the union of the polytopes of the non-outer states classified
/// `yes` for the given automaton state.
pub(crate) fn yes_region<A: Abstraction>(
    abstraction: &A,
    analysis: &Analysis,
    automaton_state: &str,
) -> A::Set {
    collect_region(abstraction, analysis, |state| {
        state.yes.contains(automaton_state)
    })
}

fn collect_region<A: Abstraction, P: Fn(&crate::analysis::StateAnalysis) -> bool>(
    abstraction: &A,
    analysis: &Analysis,
    include: P,
) -> A::Set {
    let mut region = A::Set::empty();
    for (label, state) in analysis.states() {
        if !abstraction.is_outer(label) && include(state) {
            region = region.union(&abstraction.polytope_of(label));
        }
    }
    region
}
