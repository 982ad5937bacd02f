//! The 2½-player parity-3 product game.

pub(crate) mod solver;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use fixedbitset::FixedBitSet;
use tinyvec::TinyVec;

use crate::error::Error;

/// The type for an index of a node in the product game.
pub type NodeIndex = usize;

/// The number of priorities of the parity-3 acceptance condition.
pub const NUM_PRIORITIES: usize = 3;

/// A move of a game node: the non-empty set of successor nodes that all
/// have positive probability once the move is taken.
pub type Move = TinyVec<[NodeIndex; 4]>;

/// A player in the product game.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Player {
    /// The controller, choosing actions in `P1` nodes.
    One,
    /// The environment, choosing supports in `P2` nodes.
    Two,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Self::One => "player 1",
            Self::Two => "player 2",
        };
        write!(f, "{}", string)
    }
}

/// The identity of a product game node.
///
/// Equality and hashing are by the identifying tuple; all creation goes
/// through [`ProductGame::take`] so node indices are canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// A player-1 node: system state and automaton state.
    P1 {
        /// The system-state label; empty for sink nodes.
        system: String,
        /// The automaton-state label, possibly reserved.
        automaton: String,
    },
    /// A player-2 node: system state with chosen action and automaton state.
    P2 {
        /// The system-state label; empty for sink nodes.
        system: String,
        /// The index of the chosen action.
        action: usize,
        /// The automaton-state label, possibly reserved or empty.
        automaton: String,
    },
}

impl NodeId {
    pub(crate) fn p1<S: Into<String>, Q: Into<String>>(system: S, automaton: Q) -> Self {
        Self::P1 {
            system: system.into(),
            automaton: automaton.into(),
        }
    }

    pub(crate) fn p2<S: Into<String>, Q: Into<String>>(system: S, action: usize, automaton: Q) -> Self {
        Self::P2 {
            system: system.into(),
            action,
            automaton: automaton.into(),
        }
    }

    /// Returns the player owning nodes with this identity.
    pub fn owner(&self) -> Player {
        match self {
            Self::P1 { .. } => Player::One,
            Self::P2 { .. } => Player::Two,
        }
    }

    /// Returns the system-state label of this node.
    pub fn system(&self) -> &str {
        match self {
            Self::P1 { system, .. } | Self::P2 { system, .. } => system,
        }
    }

    /// Returns the automaton-state label of this node.
    pub fn automaton(&self) -> &str {
        match self {
            Self::P1 { automaton, .. } | Self::P2 { automaton, .. } => automaton,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P1 { system, automaton } => write!(f, "({}, {})", system, automaton),
            Self::P2 {
                system,
                action,
                automaton,
            } => write!(f, "({}, {}, {})", system, action, automaton),
        }
    }
}

/// A node of the product game.
#[derive(Debug)]
pub struct GameNode {
    id: NodeId,
    priority: usize,
    moves: Vec<Move>,
}

impl GameNode {
    /// Returns the identity of this node.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the player owning this node.
    pub fn owner(&self) -> Player {
        self.id.owner()
    }

    /// Returns the priority of this node.
    pub fn priority(&self) -> usize {
        self.priority
    }

    /// Returns the moves of this node. For player-1 nodes the move at
    /// index `a` corresponds to the system action `a`.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
}

/// A region of the product game: a set of nodes indexed by arena position.
///
/// Fixed-point iterations over regions are word-parallel unions and
/// subset tests on the underlying bitset.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Region {
    data: FixedBitSet,
}

impl Index<NodeIndex> for Region {
    type Output = bool;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.data[index]
    }
}

impl Region {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            data: FixedBitSet::with_capacity(n),
        }
    }

    pub(crate) fn full(n: usize) -> Self {
        let mut data = FixedBitSet::with_capacity(n);
        data.insert_range(..);
        Self { data }
    }

    pub(crate) fn insert(&mut self, index: NodeIndex) {
        self.data.insert(index);
    }

    /// Returns an iterator over the nodes in this region.
    pub fn nodes(&self) -> fixedbitset::Ones<'_> {
        self.data.ones()
    }

    /// Returns the number of nodes in this region.
    pub fn size(&self) -> usize {
        self.data.count_ones(..)
    }

    /// Returns whether this region is a subset of the other region.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.data.is_subset(&other.data)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for index in self.data.ones() {
            write!(f, " {}", index)?;
        }
        write!(f, " }}")
    }
}

/// The product game of an abstracted system and a Streett automaton.
///
/// Nodes live in a single arena; moves reference their targets by index,
/// so the mutually-pointing sink pair needs no cyclic ownership.
#[derive(Debug)]
pub struct ProductGame {
    nodes: Vec<GameNode>,
    mapping: HashMap<NodeId, NodeIndex>,
    priority_map: [Vec<NodeIndex>; NUM_PRIORITIES],
    initial: Vec<NodeIndex>,
}

impl Default for ProductGame {
    fn default() -> Self {
        Self {
            nodes: Vec::with_capacity(4096),
            mapping: HashMap::with_capacity(4096),
            priority_map: [Vec::new(), Vec::new(), Vec::new()],
            initial: Vec::new(),
        }
    }
}

impl ProductGame {
    /// Returns the canonical node index for the given identity, creating
    /// the node with the given priority if it is new.
    pub(crate) fn take(&mut self, id: NodeId, priority: usize) -> (NodeIndex, bool) {
        debug_assert!(priority < NUM_PRIORITIES);
        match self.mapping.entry(id) {
            Entry::Occupied(entry) => {
                let index = *entry.get();
                debug_assert_eq!(self.nodes[index].priority, priority);
                (index, false)
            }
            Entry::Vacant(entry) => {
                let node = GameNode {
                    id: entry.key().clone(),
                    priority,
                    moves: Vec::new(),
                };
                let index = self.nodes.len();
                self.nodes.push(node);
                self.priority_map[priority].push(index);
                entry.insert(index);
                (index, true)
            }
        }
    }

    pub(crate) fn add_move(&mut self, from: NodeIndex, targets: Move) {
        self.nodes[from].moves.push(targets);
    }

    pub(crate) fn add_initial(&mut self, index: NodeIndex) {
        self.initial.push(index);
    }

    /// Returns the number of nodes in the game.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the index of the node with the given identity.
    pub fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.mapping.get(id).copied()
    }

    /// Returns an iterator over all node indices.
    pub fn node_indices(&self) -> std::ops::Range<NodeIndex> {
        0..self.nodes.len()
    }

    /// Returns an iterator over the indices of nodes with the given
    /// priority.
    pub fn nodes_with_priority(&self, priority: usize) -> impl Iterator<Item = NodeIndex> + '_ {
        self.priority_map[priority].iter().copied()
    }

    /// Returns the indices of the initial player-1 nodes.
    pub fn initial_nodes(&self) -> &[NodeIndex] {
        &self.initial
    }

    /// Checks the structural invariants of a fully constructed game:
    /// every node carries exactly one priority, every node has at least
    /// one move and every move is non-empty, and the initial nodes are
    /// player-1 nodes present in the arena.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        let assigned: usize = self.priority_map.iter().map(Vec::len).sum();
        if assigned != self.nodes.len() {
            return Err(Error::invariant(format!(
                "{} priority assignments for {} nodes",
                assigned,
                self.nodes.len()
            )));
        }
        for (priority, nodes) in self.priority_map.iter().enumerate() {
            for &index in nodes {
                if self.nodes[index].priority != priority {
                    return Err(Error::invariant(format!(
                        "node {} recorded under priority {} but carries {}",
                        self.nodes[index].id, priority, self.nodes[index].priority
                    )));
                }
            }
        }
        for node in &self.nodes {
            if node.moves.is_empty() {
                return Err(Error::invariant(format!("dead-end node {}", node.id)));
            }
            if node.moves.iter().any(|targets| targets.is_empty()) {
                return Err(Error::invariant(format!("empty move in node {}", node.id)));
            }
        }
        for &index in &self.initial {
            let node = &self.nodes[index];
            if node.owner() != Player::One {
                return Err(Error::invariant(format!(
                    "initial node {} is not a player-1 node",
                    node.id
                )));
            }
            if self.mapping.get(&node.id) != Some(&index) {
                return Err(Error::invariant(format!(
                    "initial node {} is not in the game",
                    node.id
                )));
            }
        }
        Ok(())
    }
}

impl Index<NodeIndex> for ProductGame {
    type Output = GameNode;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

impl fmt::Display for ProductGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "parity {};", self.num_nodes())?;
        for index in self.node_indices() {
            let node = &self[index];
            write!(f, "{} {} ", index, node.priority())?;
            for (m, targets) in node.moves().iter().enumerate() {
                if m > 0 {
                    write!(f, " / ")?;
                }
                for (t, target) in targets.iter().enumerate() {
                    if t > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", target)?;
                }
            }
            writeln!(f, " \"{}\";", node.id())?;
        }
        Ok(())
    }
}
