//! One-pair Streett automata and temporal objectives.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use fixedbitset::FixedBitSet;

use crate::error::Error;
use crate::logic::Proposition;

/// Reserved automaton label for the dead-end sink of the product game.
pub const END_LABEL: &str = "__END__";
/// Reserved automaton label for the accepting sink of the product game.
pub const SAT_LABEL: &str = "__SAT__";

/// The type for an index of a state in an automaton.
pub type StateIndex = usize;

/// A state of a one-pair Streett automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    label: String,
    /// Transitions in declaration order; the first label accepted by the
    /// predicate test wins.
    transitions: Vec<(String, StateIndex)>,
    default: Option<StateIndex>,
}

impl State {
    fn new(label: String) -> Self {
        Self {
            label,
            transitions: Vec::new(),
            default: None,
        }
    }
}

/// A deterministic one-pair Streett automaton with acceptance pair `(E, F)`.
///
/// A run is accepting iff whenever it visits `E` infinitely often it also
/// visits `F` infinitely often; mapped to parity-3 in the product game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    states: Vec<State>,
    index: HashMap<String, StateIndex>,
    initial: StateIndex,
    e_set: FixedBitSet,
    f_set: FixedBitSet,
}

impl Automaton {
    /// Parses an automaton from the textual form
    /// `TRANSITIONS | INIT | E | F`, where `TRANSITIONS` is a
    /// comma-separated list of `ORIGIN > LABEL > TARGET` entries and an
    /// empty `LABEL` denotes the default transition. Whitespace around
    /// delimiters is insignificant.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on a malformed entry, a duplicate
    /// transition label or default within a state, an undefined initial
    /// state, an acceptance label outside the state set, or a state label
    /// colliding with the reserved sink labels.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let sections: Vec<&str> = text.split('|').collect();
        if sections.len() != 4 {
            return Err(Error::configuration(format!(
                "expected 4 sections separated by '|', got {}",
                sections.len()
            )));
        }

        let mut states: Vec<State> = Vec::new();
        let mut index: HashMap<String, StateIndex> = HashMap::new();
        let intern = |states: &mut Vec<State>,
                          index: &mut HashMap<String, StateIndex>,
                          label: &str|
         -> Result<StateIndex, Error> {
            if label.is_empty() || label == END_LABEL || label == SAT_LABEL {
                return Err(Error::configuration(format!(
                    "state label {:?} is reserved",
                    label
                )));
            }
            Ok(*index.entry(label.to_owned()).or_insert_with(|| {
                states.push(State::new(label.to_owned()));
                states.len() - 1
            }))
        };

        for entry in sections[0].split(',') {
            if entry.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = entry.split('>').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(Error::configuration(format!(
                    "malformed transition {:?}",
                    entry.trim()
                )));
            }
            let origin = intern(&mut states, &mut index, parts[0])?;
            let target = intern(&mut states, &mut index, parts[2])?;
            let label = parts[1];
            if label.is_empty() {
                if states[origin].default.is_some() {
                    return Err(Error::configuration(format!(
                        "duplicate default transition in state {}",
                        states[origin].label
                    )));
                }
                states[origin].default = Some(target);
            } else {
                if states[origin].transitions.iter().any(|(l, _)| l == label) {
                    return Err(Error::configuration(format!(
                        "duplicate transition label {:?} in state {}",
                        label, states[origin].label
                    )));
                }
                states[origin].transitions.push((label.to_owned(), target));
            }
        }

        let initial_label = sections[1].trim();
        let initial = *index.get(initial_label).ok_or_else(|| {
            Error::configuration(format!("undefined initial state {:?}", initial_label))
        })?;

        let acceptance = |section: &str| -> Result<FixedBitSet, Error> {
            let mut set = FixedBitSet::with_capacity(states.len());
            for label in section.split(',').map(str::trim) {
                if label.is_empty() {
                    continue;
                }
                let state = *index.get(label).ok_or_else(|| {
                    Error::configuration(format!("acceptance label {:?} is not a state", label))
                })?;
                set.insert(state);
            }
            Ok(set)
        };
        let e_set = acceptance(sections[2])?;
        let f_set = acceptance(sections[3])?;

        Ok(Self {
            states,
            index,
            initial,
            e_set,
            f_set,
        })
    }

    /// Returns the textual form of this automaton; [`parse`](Self::parse)
    /// of the result reconstructs the automaton structurally.
    pub fn stringify(&self) -> String {
        self.to_string()
    }

    /// Returns the label of the initial state.
    pub fn initial(&self) -> &str {
        &self.states[self.initial].label
    }

    /// Returns an iterator over the state labels in declaration order.
    pub fn state_labels(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.label.as_str())
    }

    /// Returns whether the given label names a state of this automaton.
    pub fn has_state(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Returns whether the given state is in the acceptance set `E`.
    pub fn in_e(&self, label: &str) -> bool {
        self.index.get(label).map_or(false, |&q| self.e_set[q])
    }

    /// Returns whether the given state is in the acceptance set `F`.
    pub fn in_f(&self, label: &str) -> bool {
        self.index.get(label).map_or(false, |&q| self.f_set[q])
    }

    /// Returns the labels of the states in the acceptance set `F`.
    pub fn f_labels(&self) -> impl Iterator<Item = &str> {
        self.f_set.ones().map(move |q| self.states[q].label.as_str())
    }

    /// Returns the successor of the given state under the given predicate
    /// test.
    ///
    /// Declared transition labels are tried in declaration order and the
    /// first label accepted by the test wins; otherwise the default
    /// transition is taken; otherwise there is no successor.
    pub fn successor<T: Fn(&str) -> bool>(&self, from: &str, test: T) -> Option<&str> {
        let &q = self.index.get(from)?;
        let state = &self.states[q];
        let target = state
            .transitions
            .iter()
            .find(|(label, _)| test(label))
            .map(|&(_, target)| target)
            .or(state.default)?;
        Some(&self.states[target].label)
    }

    /// Returns whether every `F`-state is absorbing, i.e. all of its
    /// declared targets and its default, if present, stay in `F`.
    ///
    /// This must hold for the automaton to admit a co-safe interpretation.
    pub fn is_co_safe_compatible(&self) -> bool {
        self.f_set.ones().all(|q| {
            let state = &self.states[q];
            state
                .transitions
                .iter()
                .map(|&(_, target)| target)
                .chain(state.default)
                .all(|target| self.f_set[target])
        })
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for state in &self.states {
            for (label, target) in &state.transitions {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{} > {} > {}", state.label, label, self.states[*target].label)?;
            }
            if let Some(target) = state.default {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{} > > {}", state.label, self.states[target].label)?;
            }
        }
        let labels = |set: &FixedBitSet| {
            set.ones()
                .map(|q| self.states[q].label.clone())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            " | {} | {} | {}",
            self.initial(),
            labels(&self.e_set),
            labels(&self.f_set)
        )
    }
}

/// A temporal objective: an automaton together with the mapping from its
/// transition labels to propositional formulas and the interpretation flag.
///
/// The atomic-to-proposition mapping stays the caller's concern; the core
/// only ever evaluates transition labels through [`Objective::test`].
#[derive(Debug, Clone)]
pub struct Objective {
    automaton: Automaton,
    alphabet: HashMap<String, Proposition>,
    co_safe: bool,
}

impl Objective {
    /// Creates an objective from an automaton, the alphabet mapping its
    /// transition labels to propositions, and the co-safe flag.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a transition label has no entry in
    /// the alphabet, or if a co-safe interpretation is requested for an
    /// automaton that is not co-safe compatible.
    pub fn new(
        automaton: Automaton,
        alphabet: HashMap<String, Proposition>,
        co_safe: bool,
    ) -> Result<Self, Error> {
        for state in &automaton.states {
            for (label, _) in &state.transitions {
                if !alphabet.contains_key(label) {
                    return Err(Error::configuration(format!(
                        "transition label {:?} missing from alphabet",
                        label
                    )));
                }
            }
        }
        if co_safe && !automaton.is_co_safe_compatible() {
            return Err(Error::configuration(
                "co-safe interpretation requested but an F-state is not absorbing",
            ));
        }
        Ok(Self {
            automaton,
            alphabet,
            co_safe,
        })
    }

    /// Returns the automaton of this objective.
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Returns whether this objective uses the co-safe interpretation.
    pub fn co_safe(&self) -> bool {
        self.co_safe
    }

    /// Evaluates the proposition behind the given transition label under
    /// membership in the given predicate set.
    pub fn test(&self, label: &str, predicates: &BTreeSet<String>) -> bool {
        self.alphabet
            .get(label)
            .map_or(false, |formula| formula.eval(&|atom| predicates.contains(atom)))
    }

    /// Returns the automaton successor of `from` for a system state with
    /// the given predicate labels.
    pub fn successor(&self, from: &str, predicates: &BTreeSet<String>) -> Option<&str> {
        self.automaton
            .successor(from, |label| self.test(label, predicates))
    }
}
