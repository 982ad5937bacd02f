//! A box-geometry collaborator for the end-to-end tests.
//!
//! Implements the consumed interfaces with unions of axis-aligned 2D
//! boxes. The geometric operators assume identity dynamics, which all
//! scenarios driven through controllers and traces use; analysis-only
//! scenarios may override the dynamics freely since classification never
//! touches the geometry.

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};
use rand::{Rng, RngCore};

use lssa::{Abstraction, GameGraph, LinearDynamics, PolytopeUnion};

const EPS: f64 = 1e-9;

/// An axis-aligned box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box2 {
    lo: [f64; 2],
    hi: [f64; 2],
}

impl Box2 {
    pub fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self {
            lo: [x0, y0],
            hi: [x1, y1],
        }
    }

    fn is_empty(&self) -> bool {
        (0..2).any(|d| self.hi[d] - self.lo[d] <= EPS)
    }

    fn volume(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.hi[0] - self.lo[0]) * (self.hi[1] - self.lo[1])
        }
    }

    fn intersect(&self, other: &Self) -> Self {
        Self {
            lo: [self.lo[0].max(other.lo[0]), self.lo[1].max(other.lo[1])],
            hi: [self.hi[0].min(other.hi[0]), self.hi[1].min(other.hi[1])],
        }
    }

    fn contains(&self, point: &DVector<f64>) -> bool {
        (0..2).all(|d| point[d] >= self.lo[d] && point[d] <= self.hi[d])
    }

    /// Minkowski sum.
    fn sum(&self, other: &Self) -> Self {
        Self {
            lo: [self.lo[0] + other.lo[0], self.lo[1] + other.lo[1]],
            hi: [self.hi[0] + other.hi[0], self.hi[1] + other.hi[1]],
        }
    }

    /// Erosion: the points that stay inside `self` under every offset
    /// from `other`.
    fn erode(&self, other: &Self) -> Self {
        Self {
            lo: [self.lo[0] - other.lo[0], self.lo[1] - other.lo[1]],
            hi: [self.hi[0] - other.hi[0], self.hi[1] - other.hi[1]],
        }
    }

    /// The points from which some offset in `other` lands inside `self`.
    fn back_reach(&self, other: &Self) -> Self {
        Self {
            lo: [self.lo[0] - other.hi[0], self.lo[1] - other.hi[1]],
            hi: [self.hi[0] - other.lo[0], self.hi[1] - other.lo[1]],
        }
    }

    fn subtract(&self, other: &Self) -> Vec<Self> {
        let cut = self.intersect(other);
        if cut.is_empty() {
            return vec![*self];
        }
        vec![
            Self::new(self.lo[0], cut.lo[0], self.lo[1], self.hi[1]),
            Self::new(cut.hi[0], self.hi[0], self.lo[1], self.hi[1]),
            Self::new(cut.lo[0], cut.hi[0], self.lo[1], cut.lo[1]),
            Self::new(cut.lo[0], cut.hi[0], cut.hi[1], self.hi[1]),
        ]
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect()
    }
}

/// A disjoint union of axis-aligned boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSet(Vec<Box2>);

impl BoxSet {
    pub fn from_boxes(boxes: Vec<Box2>) -> Self {
        let mut set = Self(Vec::new());
        for b in boxes {
            set = set.union(&Self(vec![b]));
        }
        set
    }

    pub fn of(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self::from_boxes(vec![Box2::new(x0, x1, y0, y1)])
    }
}

impl PolytopeUnion for BoxSet {
    fn empty() -> Self {
        Self(Vec::new())
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn volume(&self) -> f64 {
        self.0.iter().map(Box2::volume).sum()
    }

    fn union(&self, other: &Self) -> Self {
        let mut boxes = self.0.clone();
        boxes.extend(other.remove(self).0);
        Self(boxes)
    }

    fn intersect(&self, other: &Self) -> Self {
        let boxes = self
            .0
            .iter()
            .flat_map(|a| other.0.iter().map(move |b| a.intersect(b)))
            .filter(|piece| !piece.is_empty())
            .collect();
        Self(boxes)
    }

    fn remove(&self, other: &Self) -> Self {
        let mut boxes = self.0.clone();
        for cut in &other.0 {
            boxes = boxes.iter().flat_map(|b| b.subtract(cut)).collect();
        }
        Self(boxes)
    }

    fn covers(&self, other: &Self) -> bool {
        other.remove(self).is_empty()
    }

    fn contains(&self, point: &DVector<f64>) -> bool {
        self.0.iter().any(|b| b.contains(point))
    }

    fn sample(&self, rng: &mut dyn RngCore) -> DVector<f64> {
        let total = self.volume();
        assert!(total > 0.0, "sampling from an empty set");
        let mut remaining = rng.gen::<f64>() * total;
        let mut chosen = self.0[self.0.len() - 1];
        for b in &self.0 {
            let volume = b.volume();
            if remaining < volume {
                chosen = *b;
                break;
            }
            remaining -= volume;
        }
        let x = chosen.lo[0] + rng.gen::<f64>() * (chosen.hi[0] - chosen.lo[0]);
        let y = chosen.lo[1] + rng.gen::<f64>() * (chosen.hi[1] - chosen.lo[1]);
        DVector::from_vec(vec![x, y])
    }
}

struct BoxAction {
    controls: BoxSet,
    supports: Vec<BTreeSet<String>>,
}

struct BoxState {
    label: String,
    polytope: BoxSet,
    predicates: BTreeSet<String>,
    outer: bool,
    actions: Vec<BoxAction>,
}

/// A hand-built abstracted system over box geometry.
pub struct BoxSystem {
    dynamics: LinearDynamics,
    state_space: BoxSet,
    control_space: BoxSet,
    random_space: BoxSet,
    states: Vec<BoxState>,
}

impl BoxSystem {
    pub fn new(state_space: BoxSet, control_space: BoxSet, random_space: BoxSet) -> Self {
        Self {
            dynamics: LinearDynamics::new(DMatrix::identity(2, 2), DMatrix::identity(2, 2)),
            state_space,
            control_space,
            random_space,
            states: Vec::new(),
        }
    }

    pub fn with_dynamics(mut self, dynamics: LinearDynamics) -> Self {
        self.dynamics = dynamics;
        self
    }

    pub fn state(mut self, label: &str, polytope: BoxSet, predicates: &[&str]) -> Self {
        self.states.push(BoxState {
            label: label.to_owned(),
            polytope,
            predicates: predicates.iter().map(|p| (*p).to_owned()).collect(),
            outer: false,
            actions: Vec::new(),
        });
        self
    }

    pub fn outer(mut self, label: &str, polytope: BoxSet) -> Self {
        self.states.push(BoxState {
            label: label.to_owned(),
            polytope,
            predicates: BTreeSet::new(),
            outer: true,
            actions: Vec::new(),
        });
        self
    }

    /// Appends an action to the most recently added state.
    pub fn action(mut self, controls: BoxSet, supports: &[&[&str]]) -> Self {
        let state = self.states.last_mut().expect("no state to attach action to");
        assert!(!state.outer, "outer states have no actions");
        state.actions.push(BoxAction {
            controls,
            supports: supports
                .iter()
                .map(|targets| targets.iter().map(|t| (*t).to_owned()).collect())
                .collect(),
        });
        self
    }

    fn find(&self, label: &str) -> &BoxState {
        self.states
            .iter()
            .find(|s| s.label == label)
            .expect("unknown state label")
    }
}

impl GameGraph for BoxSystem {
    fn state_labels(&self) -> Vec<String> {
        self.states.iter().map(|s| s.label.clone()).collect()
    }

    fn predicate_labels_of(&self, label: &str) -> BTreeSet<String> {
        self.find(label).predicates.clone()
    }

    fn action_count_of(&self, label: &str) -> usize {
        self.find(label).actions.len()
    }

    fn support_count_of(&self, label: &str, action: usize) -> usize {
        self.find(label).actions[action].supports.len()
    }

    fn target_labels_of(&self, label: &str, action: usize, support: usize) -> BTreeSet<String> {
        self.find(label).actions[action].supports[support].clone()
    }
}

impl Abstraction for BoxSystem {
    type Set = BoxSet;

    fn dynamics(&self) -> &LinearDynamics {
        &self.dynamics
    }

    fn is_outer(&self, label: &str) -> bool {
        self.find(label).outer
    }

    fn polytope_of(&self, label: &str) -> BoxSet {
        self.find(label).polytope.clone()
    }

    fn controls_of(&self, label: &str, action: usize) -> BoxSet {
        self.find(label).actions[action].controls.clone()
    }

    fn state_space(&self) -> BoxSet {
        self.state_space.clone()
    }

    fn control_space(&self) -> BoxSet {
        self.control_space.clone()
    }

    fn random_space(&self) -> BoxSet {
        self.random_space.clone()
    }

    fn state_at(&self, point: &DVector<f64>) -> Option<String> {
        self.states
            .iter()
            .find(|s| s.polytope.contains(point))
            .map(|s| s.label.clone())
    }

    fn post(&self, origin: &BoxSet, controls: &BoxSet) -> BoxSet {
        let mut reach = BoxSet::empty();
        for o in &origin.0 {
            for c in &controls.0 {
                for w in &self.random_space.0 {
                    reach = reach.union(&BoxSet(vec![o.sum(c).sum(w)]));
                }
            }
        }
        reach
    }

    fn pre_r(&self, within: &BoxSet, controls: &BoxSet, target: &BoxSet) -> BoxSet {
        let mut origins = BoxSet::empty();
        for t in &target.0 {
            for w in &self.random_space.0 {
                let eroded = t.erode(w);
                if eroded.is_empty() {
                    continue;
                }
                for c in &controls.0 {
                    let back = eroded.back_reach(c);
                    if !back.is_empty() {
                        origins = origins.union(&BoxSet(vec![back]));
                    }
                }
            }
        }
        origins.intersect(within)
    }
}
