//! Library crate for the analysis of linear stochastic systems against
//! omega-regular objectives.
//!
//! Given the finite-state abstraction of a discrete-time affine system
//! and a temporal objective as a one-pair Streett automaton, the crate
//! builds the synchronous product game, solves it as a 2½-player parity-3
//! game in an adversarial and a cooperative variant, and classifies every
//! system state as winning, losing or undecided. On top of the analysis
//! it synthesises layered robust-predecessor controllers, executes
//! closed-loop traces and suggests refinements of undecided states.

mod analysis;
mod constructor;
pub mod automaton;
pub mod controller;
pub mod error;
pub mod game;
pub mod logic;
pub mod options;
pub mod refinement;
pub mod system;
pub mod trace;

use log::{debug, info};

use constructor::queue::{BfsQueue, DfsQueue};
use constructor::GameConstructor;
use game::solver;

pub use analysis::{Analysis, StateAnalysis};
pub use automaton::{Automaton, Objective};
pub use error::Error;
pub use logic::Proposition;
pub use options::{AnalysisOptions, ExplorationStrategy};
pub use system::{Abstraction, GameGraph, LinearDynamics, PolytopeUnion};

/// Analyses the given game-graph view against the given objective.
///
/// Returns the per-state classification. This function uses the default
/// values for [`AnalysisOptions`].
///
/// # Errors
///
/// Returns a configuration error for a malformed objective and an
/// invariant error if the view violates its contract or the solver
/// results are contradictory.
pub fn analyse<G: GameGraph>(view: &G, objective: &Objective) -> Result<Analysis, Error> {
    analyse_with(view, objective, &AnalysisOptions::default())
}

/// Analyses the given game-graph view against the given objective, using
/// the given analysis options.
///
/// Returns the per-state classification.
///
/// # Errors
///
/// See [`analyse`].
pub fn analyse_with<G: GameGraph>(
    view: &G,
    objective: &Objective,
    options: &AnalysisOptions,
) -> Result<Analysis, Error> {
    info!("constructing product game");
    let game = match options.exploration_strategy {
        ExplorationStrategy::Bfs => {
            GameConstructor::new(view, objective, BfsQueue::with_capacity(4096)).construct()?
        }
        ExplorationStrategy::Dfs => {
            GameConstructor::new(view, objective, DfsQueue::with_capacity(4096)).construct()?
        }
    };
    debug!("product game has {} nodes", game.num_nodes());

    info!("solving product game");
    let win = solver::solve(&game);
    let win_cooperative = solver::solve_cooperative(&game);
    debug!(
        "winning regions: |adversarial| = {}, |cooperative| = {}",
        win.size(),
        win_cooperative.size()
    );

    Analysis::assemble(view, objective, &game, &win, &win_cooperative)
}
