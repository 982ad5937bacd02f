//! Classification of system states from the solved product game.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::automaton::Objective;
use crate::error::Error;
use crate::game::{NodeId, ProductGame, Region};
use crate::system::GameGraph;

/// The classification of one system state against the objective.
///
/// The automaton states reachable as product partners of the system state
/// are partitioned into `yes` (player 1 always wins), `no` (player 1 never
/// wins) and `maybe` (winning only with a cooperative player 2). The
/// `next` mapping records the automaton successor taken from the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAnalysis {
    /// The initial automaton state.
    pub init: String,
    /// Automaton states from which player 1 wins against any player 2.
    pub yes: BTreeSet<String>,
    /// Automaton states from which player 1 never wins.
    pub no: BTreeSet<String>,
    /// Automaton states winning only with a cooperative player 2.
    pub maybe: BTreeSet<String>,
    /// The automaton successor for each classified automaton state.
    pub next: BTreeMap<String, String>,
}

impl StateAnalysis {
    fn new(init: &str) -> Self {
        Self {
            init: init.to_owned(),
            yes: BTreeSet::new(),
            no: BTreeSet::new(),
            maybe: BTreeSet::new(),
            next: BTreeMap::new(),
        }
    }
}

/// The analysis of all system states, keyed by system-state label.
///
/// Serialises with sets as arrays and maps as objects, so results can be
/// exchanged as JSON with the hosting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    states: BTreeMap<String, StateAnalysis>,
}

impl Analysis {
    /// Returns the classification of the given system state.
    pub fn of(&self, label: &str) -> Option<&StateAnalysis> {
        self.states.get(label)
    }

    /// Returns an iterator over all per-state classifications.
    pub fn states(&self) -> impl Iterator<Item = (&str, &StateAnalysis)> {
        self.states.iter().map(|(label, state)| (label.as_str(), state))
    }

    /// Returns whether player 1 always wins from the given product state.
    pub fn is_yes(&self, label: &str, automaton_state: &str) -> bool {
        self.of(label).map_or(false, |s| s.yes.contains(automaton_state))
    }

    /// Returns whether player 1 never wins from the given product state.
    pub fn is_no(&self, label: &str, automaton_state: &str) -> bool {
        self.of(label).map_or(false, |s| s.no.contains(automaton_state))
    }

    /// Returns whether the given product state wins only cooperatively.
    pub fn is_maybe(&self, label: &str, automaton_state: &str) -> bool {
        self.of(label)
            .map_or(false, |s| s.maybe.contains(automaton_state))
    }

    /// Assembles the analysis from the solved product game.
    ///
    /// Classification covers every non-sink player-1 node; the `next`
    /// mapping is computed directly from the automaton successor of the
    /// system state's predicates, so it never references the reserved sink
    /// labels. Under the co-safe interpretation every system state is
    /// additionally pre-seeded with the accepting states as `yes`,
    /// self-looping in `next`.
    pub(crate) fn assemble<G: GameGraph>(
        view: &G,
        objective: &Objective,
        game: &ProductGame,
        win: &Region,
        win_cooperative: &Region,
    ) -> Result<Self, Error> {
        if !win.is_subset(win_cooperative) {
            return Err(Error::invariant(
                "adversarial winning region exceeds the cooperative one",
            ));
        }

        let initial = objective.automaton().initial();
        let mut states: BTreeMap<String, StateAnalysis> = BTreeMap::new();
        for label in view.state_labels() {
            states.insert(label, StateAnalysis::new(initial));
        }

        for index in game.node_indices() {
            let id = game[index].id();
            let (system, automaton_state) = match id {
                NodeId::P1 { system, automaton } if !system.is_empty() => (system, automaton),
                _ => continue,
            };
            let entry = states.get_mut(system).ok_or_else(|| {
                Error::invariant(format!("product node {} outside the game graph", id))
            })?;
            if win[index] {
                entry.yes.insert(automaton_state.clone());
            } else if win_cooperative[index] {
                entry.maybe.insert(automaton_state.clone());
            } else {
                entry.no.insert(automaton_state.clone());
            }
            let predicates = view.predicate_labels_of(system);
            if let Some(successor) = objective.successor(automaton_state, &predicates) {
                entry
                    .next
                    .insert(automaton_state.clone(), successor.to_owned());
            }
        }

        if objective.co_safe() {
            let accepting: Vec<String> = objective
                .automaton()
                .f_labels()
                .map(str::to_owned)
                .collect();
            for entry in states.values_mut() {
                for accept in &accepting {
                    entry.yes.insert(accept.clone());
                    entry.maybe.remove(accept);
                    entry.no.remove(accept);
                    entry.next.insert(accept.clone(), accept.clone());
                }
            }
        }

        Ok(Self { states })
    }
}
