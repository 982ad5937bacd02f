//! Construction of the product game from the abstraction's graph view and
//! the objective automaton.

pub(crate) mod queue;

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::automaton::{END_LABEL, SAT_LABEL};
use crate::automaton::Objective;
use crate::error::Error;
use crate::game::{Move, NodeId, NodeIndex, ProductGame};
use crate::system::GameGraph;
use queue::ExplorationQueue;

/// Builds the synchronous product of the system's game graph with the
/// objective automaton.
///
/// All node creation goes through the arena mapping, so each product state
/// exists exactly once; the move list of a player-1 node is indexed by the
/// system action, the move list of a player-2 node by the support.
pub(crate) struct GameConstructor<'a, G, Q> {
    view: &'a G,
    objective: &'a Objective,
    predicates: HashMap<String, BTreeSet<String>>,
    game: ProductGame,
    queue: Q,
    end_sink: NodeIndex,
    sat_sink: Option<NodeIndex>,
}

impl<'a, G: GameGraph, Q: ExplorationQueue<NodeIndex>> GameConstructor<'a, G, Q> {
    pub(crate) fn new(view: &'a G, objective: &'a Objective, mut queue: Q) -> Self {
        let mut game = ProductGame::default();

        // two-phase sink construction: allocate the pair, then wire the loop
        let (end_p1, _) = game.take(NodeId::p1("", END_LABEL), 1);
        let (end_p2, _) = game.take(NodeId::p2("", 0, END_LABEL), 1);
        game.add_move(end_p1, std::iter::once(end_p2).collect());
        game.add_move(end_p2, std::iter::once(end_p1).collect());

        let sat_sink = if objective.co_safe() {
            let (sat_p1, _) = game.take(NodeId::p1("", SAT_LABEL), 0);
            let (sat_p2, _) = game.take(NodeId::p2("", 0, SAT_LABEL), 0);
            game.add_move(sat_p1, std::iter::once(sat_p2).collect());
            game.add_move(sat_p2, std::iter::once(sat_p1).collect());
            Some(sat_p1)
        } else {
            None
        };

        let mut predicates = HashMap::new();
        let initial_label = objective.automaton().initial().to_owned();
        let initial_priority = priority_of(objective, &initial_label);
        for label in view.state_labels() {
            predicates.insert(label.clone(), view.predicate_labels_of(&label));
            let (index, new_node) = game.take(NodeId::p1(label, &initial_label), initial_priority);
            if new_node {
                game.add_initial(index);
                queue.push(index);
            }
        }

        Self {
            view,
            objective,
            predicates,
            game,
            queue,
            end_sink: end_p1,
            sat_sink,
        }
    }

    /// Explores all reachable product states and returns the validated
    /// game.
    ///
    /// # Errors
    ///
    /// Returns an invariant error if the view references unknown state
    /// labels or the constructed game fails validation.
    pub(crate) fn construct(mut self) -> Result<ProductGame, Error> {
        while let Some(index) = self.queue.pop() {
            match self.game[index].id().clone() {
                NodeId::P1 { system, automaton } => self.expand_p1(index, &system, &automaton)?,
                NodeId::P2 {
                    system, action, automaton,
                } => self.expand_p2(index, &system, action, &automaton)?,
            }
        }
        debug!(
            "product game constructed with {} nodes",
            self.game.num_nodes()
        );
        self.game.validate()?;
        Ok(self.game)
    }

    fn predicates_of(&self, label: &str) -> Result<&BTreeSet<String>, Error> {
        self.predicates.get(label).ok_or_else(|| {
            Error::invariant(format!("state label {:?} not part of the game graph", label))
        })
    }

    fn expand_p1(&mut self, index: NodeIndex, system: &str, automaton: &str) -> Result<(), Error> {
        let predicates = self.predicates_of(system)?;
        let successor = self
            .objective
            .successor(automaton, predicates)
            .map(str::to_owned);

        if let Some(successor) = successor {
            let priority = priority_of(self.objective, &successor);
            if self.objective.co_safe() && self.objective.automaton().in_f(&successor) {
                // the objective is decided; short-circuit into the
                // accepting sink instead of exploring further
                let sat_sink = self.sat_sink.expect("co-safe game without __SAT__ sink");
                let (wire, new_node) = self.game.take(NodeId::p2(system, 0, successor), priority);
                if new_node {
                    self.game.add_move(wire, std::iter::once(sat_sink).collect());
                }
                self.game.add_move(index, std::iter::once(wire).collect());
            } else {
                for action in 0..self.view.action_count_of(system) {
                    let (p2, new_node) = self
                        .game
                        .take(NodeId::p2(system, action, successor.as_str()), priority);
                    self.game.add_move(index, std::iter::once(p2).collect());
                    if new_node {
                        self.queue.push(p2);
                    }
                }
            }
        }

        if self.game[index].moves().is_empty() {
            // no automaton successor or no actions: absorb into __END__
            let (wire, new_node) = self.game.take(NodeId::p2(system, 0, ""), 2);
            if new_node {
                self.game
                    .add_move(wire, std::iter::once(self.end_sink).collect());
            }
            self.game.add_move(index, std::iter::once(wire).collect());
        }
        Ok(())
    }

    fn expand_p2(
        &mut self,
        index: NodeIndex,
        system: &str,
        action: usize,
        automaton: &str,
    ) -> Result<(), Error> {
        let priority = priority_of(self.objective, automaton);
        for support in 0..self.view.support_count_of(system, action) {
            let mut targets: BTreeSet<NodeIndex> = BTreeSet::new();
            for target in self.view.target_labels_of(system, action, support) {
                self.predicates_of(&target)?;
                let (p1, new_node) = self.game.take(NodeId::p1(target, automaton), priority);
                if new_node {
                    self.queue.push(p1);
                }
                targets.insert(p1);
            }
            self.game
                .add_move(index, targets.into_iter().collect::<Move>());
        }
        Ok(())
    }
}

/// Assigns the parity-3 priority of a product node from its automaton
/// label: `F` states 0, other `E` states 1, everything else 2, with the
/// reserved sinks overriding.
fn priority_of(objective: &Objective, automaton_label: &str) -> usize {
    if automaton_label == SAT_LABEL {
        0
    } else if automaton_label == END_LABEL {
        1
    } else if objective.automaton().in_f(automaton_label) {
        0
    } else if objective.automaton().in_e(automaton_label) {
        1
    } else {
        2
    }
}
