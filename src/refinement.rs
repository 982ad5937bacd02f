//! Refinement of undecided states driven by the layered decomposition.

use log::info;

use crate::analysis::Analysis;
use crate::automaton::Objective;
use crate::controller::layers::{no_region, yes_region, Onion};
use crate::error::Error;
use crate::system::{Abstraction, PolytopeUnion};

/// A suggested split of one undecided system state.
#[derive(Debug, Clone)]
pub struct Refinement<S> {
    /// The label of the state to split.
    pub label: String,
    /// The pieces of the state's polytope, one per onion layer hit plus
    /// the residual outside all layers.
    pub pieces: Vec<S>,
}

/// Suggests splits of the states classified `maybe` for the given
/// automaton state, by partitioning their polytopes through an onion
/// grown around the `yes` region.
///
/// States whose polytope falls into a single piece are left alone. The
/// caller rebuilds the abstraction from the returned pieces; a rebuilt
/// abstraction invalidates any controller onions grown before.
///
/// # Errors
///
/// Returns a configuration error for an unknown automaton state.
pub fn refine<A: Abstraction>(
    abstraction: &A,
    objective: &Objective,
    analysis: &Analysis,
    automaton_state: &str,
) -> Result<Vec<Refinement<A::Set>>, Error> {
    if !objective.automaton().has_state(automaton_state) {
        return Err(Error::configuration(format!(
            "unknown automaton state {:?}",
            automaton_state
        )));
    }
    let target = yes_region(abstraction, analysis, automaton_state);
    let avoid = no_region(abstraction, analysis, automaton_state);
    let onion = Onion::grow(abstraction, &target, &avoid);

    let mut refinements = Vec::new();
    for (label, state) in analysis.states() {
        if abstraction.is_outer(label) || !state.maybe.contains(automaton_state) {
            continue;
        }
        let mut residual = abstraction.polytope_of(label);
        let mut pieces = Vec::new();
        for layer in onion.layers() {
            let piece = residual.intersect(layer);
            if !piece.is_empty() {
                pieces.push(piece);
            }
            residual = residual.remove(layer);
            if residual.is_empty() {
                break;
            }
        }
        if !residual.is_empty() {
            pieces.push(residual);
        }
        if pieces.len() > 1 {
            refinements.push(Refinement {
                label: label.to_owned(),
                pieces,
            });
        }
    }
    info!(
        "refinement for {:?} splits {} states",
        automaton_state,
        refinements.len()
    );
    Ok(refinements)
}

/// Returns the total volume of the states classified `maybe` for the
/// given automaton state, the quantity refinement drives down.
pub fn undecided_volume<A: Abstraction>(
    abstraction: &A,
    analysis: &Analysis,
    automaton_state: &str,
) -> f64 {
    analysis
        .states()
        .filter(|(label, state)| {
            !abstraction.is_outer(label) && state.maybe.contains(automaton_state)
        })
        .map(|(label, _)| abstraction.polytope_of(label).volume())
        .sum()
}
