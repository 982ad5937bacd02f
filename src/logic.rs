//! Propositional formulas over predicate labels.

use std::fmt;

/// A propositional formula over atomic predicate labels.
///
/// Formulas are immutable expression trees; the abstract syntax is fixed
/// here while parsing from text is the concern of the hosting application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposition {
    /// An atomic predicate label.
    Atom(String),
    /// Negation.
    Not(Box<Proposition>),
    /// Conjunction.
    And(Box<Proposition>, Box<Proposition>),
    /// Disjunction.
    Or(Box<Proposition>, Box<Proposition>),
    /// Implication.
    Implies(Box<Proposition>, Box<Proposition>),
}

impl Proposition {
    /// Returns an atom with the given predicate label.
    pub fn atom<S: Into<String>>(label: S) -> Self {
        Self::Atom(label.into())
    }

    /// Returns the negation of the given formula.
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Returns the conjunction of the given formulas.
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Returns the disjunction of the given formulas.
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Returns the implication from the first to the second formula.
    pub fn implies(left: Self, right: Self) -> Self {
        Self::Implies(Box::new(left), Box::new(right))
    }

    /// Evaluates this formula with respect to the given valuation of
    /// atomic predicate labels.
    pub fn eval<V: Fn(&str) -> bool>(&self, valuation: &V) -> bool {
        match self {
            Self::Atom(label) => valuation(label),
            Self::Not(inner) => !inner.eval(valuation),
            Self::And(left, right) => left.eval(valuation) && right.eval(valuation),
            Self::Or(left, right) => left.eval(valuation) || right.eval(valuation),
            Self::Implies(left, right) => !left.eval(valuation) || right.eval(valuation),
        }
    }

    /// Visits every node of this formula exactly once, parents before
    /// children, regardless of how evaluation would short-circuit.
    pub fn traverse<'a, V: FnMut(&'a Proposition)>(&'a self, visit: &mut V) {
        visit(self);
        match self {
            Self::Atom(_) => (),
            Self::Not(inner) => inner.traverse(visit),
            Self::And(left, right) | Self::Or(left, right) | Self::Implies(left, right) => {
                left.traverse(visit);
                right.traverse(visit);
            }
        }
    }

    /// Returns the number of nodes of this formula.
    pub fn size(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |_| count += 1);
        count
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(label) => write!(f, "{}", label),
            Self::Not(inner) => write!(f, "!({})", inner),
            Self::And(left, right) => write!(f, "({} & {})", left, right),
            Self::Or(left, right) => write!(f, "({} | {})", left, right),
            Self::Implies(left, right) => write!(f, "({} -> {})", left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor_formula() -> Proposition {
        // (h1 | h2) & v1 & v2
        Proposition::and(
            Proposition::and(
                Proposition::or(Proposition::atom("h1"), Proposition::atom("h2")),
                Proposition::atom("v1"),
            ),
            Proposition::atom("v2"),
        )
    }

    #[test]
    fn test_eval() {
        let formula = corridor_formula();
        let holds = |labels: &[&str]| {
            let labels: Vec<String> = labels.iter().map(|s| (*s).to_owned()).collect();
            formula.eval(&|atom: &str| labels.iter().any(|l| l == atom))
        };
        assert!(holds(&["h1", "v1", "v2"]));
        assert!(holds(&["h2", "v1", "v2"]));
        assert!(!holds(&["h1", "v1"]));
        assert!(!holds(&["v1", "v2"]));
    }

    #[test]
    fn test_eval_implies() {
        let formula = Proposition::implies(Proposition::atom("p"), Proposition::atom("q"));
        assert!(formula.eval(&|_| false));
        assert!(formula.eval(&|atom| atom == "q"));
        assert!(!formula.eval(&|atom| atom == "p"));
    }

    #[test]
    fn test_traversal_visits_every_node() {
        let formula = corridor_formula();
        // (h1|h2), v1, v2, two ands, one or and four atoms
        assert_eq!(formula.size(), 7);

        let negated = Proposition::not(formula);
        let mut atoms = 0;
        negated.traverse(&mut |node| {
            if matches!(node, Proposition::Atom(_)) {
                atoms += 1;
            }
        });
        assert_eq!(atoms, 4);
        assert_eq!(negated.size(), 8);
    }
}
