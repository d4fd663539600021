use std::fmt::{self, Debug, Display};

/// A Linear Temporal Logic (LTL) formula over discrete steps.
///
/// Formulae are immutable values:
/// progressing a formula through a step never mutates it,
/// but produces a new residual formula instead (see [`crate::evaluate`]).
/// Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ltl<V> {
    /// A constant truth value.
    Const(bool),
    /// An atomic proposition, resolved through a [`crate::Lookup`] at evaluation time.
    Var(V),
    /// Logical negation of a formula.
    Not(Box<Ltl<V>>),
    /// Logical conjunction of a left and a right formula.
    And(Box<(Ltl<V>, Ltl<V>)>),
    /// Logical disjunction of a left and a right formula.
    Or(Box<(Ltl<V>, Ltl<V>)>),
    /// The formula holds starting from the following step.
    Next(Box<Ltl<V>>),
    /// The formula holds at the current step or at some future step.
    Eventually(Box<Ltl<V>>),
    /// The formula holds at the current step and at every future step.
    Always(Box<Ltl<V>>),
    /// The left formula holds until the right formula becomes true,
    /// and the right formula has to become true eventually.
    Until(Box<(Ltl<V>, Ltl<V>)>),
}

impl<V> Ltl<V> {
    /// The constant true formula.
    pub const TRUE: Self = Ltl::Const(true);
    /// The constant false formula.
    pub const FALSE: Self = Ltl::Const(false);

    /// Creates an atomic proposition.
    pub fn var(var: impl Into<V>) -> Self {
        Ltl::Var(var.into())
    }

    /// Creates the negation `!f` of a formula.
    pub fn not(formula: Self) -> Self {
        Ltl::Not(Box::new(formula))
    }

    /// Creates the conjunction `lhs & rhs`.
    pub fn and(lhs: Self, rhs: Self) -> Self {
        Ltl::And(Box::new((lhs, rhs)))
    }

    /// Creates the disjunction `lhs | rhs`.
    pub fn or(lhs: Self, rhs: Self) -> Self {
        Ltl::Or(Box::new((lhs, rhs)))
    }

    /// Creates the formula `X f`.
    pub fn next(formula: Self) -> Self {
        Ltl::Next(Box::new(formula))
    }

    /// Creates the formula `F f`.
    pub fn eventually(formula: Self) -> Self {
        Ltl::Eventually(Box::new(formula))
    }

    /// Creates the formula `G f`.
    pub fn always(formula: Self) -> Self {
        Ltl::Always(Box::new(formula))
    }

    /// Creates the formula `lhs U rhs`.
    pub fn until(lhs: Self, rhs: Self) -> Self {
        Ltl::Until(Box::new((lhs, rhs)))
    }

    /// Returns the atomic propositions of the formula,
    /// in pre-order and left-to-right on binary operators.
    ///
    /// Repeated propositions are listed once per occurrence.
    ///
    /// ```
    /// # use ltlmon_core::Ltl;
    /// let formula = Ltl::<&str>::eventually(Ltl::and(Ltl::var("a"), Ltl::eventually(Ltl::var("b"))));
    /// assert_eq!(formula.variables(), [&"a", &"b"]);
    /// ```
    pub fn variables(&self) -> Vec<&V> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables<'a>(&'a self, vars: &mut Vec<&'a V>) {
        match self {
            Ltl::Const(_) => {}
            Ltl::Var(var) => vars.push(var),
            Ltl::Not(sub) | Ltl::Next(sub) | Ltl::Eventually(sub) | Ltl::Always(sub) => {
                sub.collect_variables(vars)
            }
            Ltl::And(subs) | Ltl::Or(subs) | Ltl::Until(subs) => {
                subs.0.collect_variables(vars);
                subs.1.collect_variables(vars);
            }
        }
    }

    /// Number of nodes in the formula tree.
    pub fn size(&self) -> usize {
        match self {
            Ltl::Const(_) | Ltl::Var(_) => 1,
            Ltl::Not(sub) | Ltl::Next(sub) | Ltl::Eventually(sub) | Ltl::Always(sub) => {
                1 + sub.size()
            }
            Ltl::And(subs) | Ltl::Or(subs) | Ltl::Until(subs) => {
                1 + subs.0.size() + subs.1.size()
            }
        }
    }

    /// Length of the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        match self {
            Ltl::Const(_) | Ltl::Var(_) => 1,
            Ltl::Not(sub) | Ltl::Next(sub) | Ltl::Eventually(sub) | Ltl::Always(sub) => {
                1 + sub.depth()
            }
            Ltl::And(subs) | Ltl::Or(subs) | Ltl::Until(subs) => {
                1 + subs.0.depth().max(subs.1.depth())
            }
        }
    }

    /// Replaces every atomic proposition with the one returned by `f`,
    /// preserving the structure of the formula.
    ///
    /// Loaders use this to move from variable names to dense indices.
    pub fn map_vars<W, F>(&self, f: &mut F) -> Ltl<W>
    where
        F: FnMut(&V) -> W,
    {
        match self {
            Ltl::Const(b) => Ltl::Const(*b),
            Ltl::Var(var) => Ltl::Var(f(var)),
            Ltl::Not(sub) => Ltl::not(sub.map_vars(f)),
            Ltl::And(subs) => Ltl::and(subs.0.map_vars(f), subs.1.map_vars(f)),
            Ltl::Or(subs) => Ltl::or(subs.0.map_vars(f), subs.1.map_vars(f)),
            Ltl::Next(sub) => Ltl::next(sub.map_vars(f)),
            Ltl::Eventually(sub) => Ltl::eventually(sub.map_vars(f)),
            Ltl::Always(sub) => Ltl::always(sub.map_vars(f)),
            Ltl::Until(subs) => Ltl::until(subs.0.map_vars(f), subs.1.map_vars(f)),
        }
    }
}

impl<V> From<bool> for Ltl<V> {
    fn from(value: bool) -> Self {
        Ltl::Const(value)
    }
}

impl<V: Debug> Display for Ltl<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ltl::Const(b) => write!(f, "Const({b})"),
            // Debug formatting quotes strings, e.g., `Var("a")`.
            Ltl::Var(var) => write!(f, "Var({var:?})"),
            Ltl::Not(sub) => write!(f, "Not({sub})"),
            Ltl::And(subs) => write!(f, "And({}, {})", subs.0, subs.1),
            Ltl::Or(subs) => write!(f, "Or({}, {})", subs.0, subs.1),
            Ltl::Next(sub) => write!(f, "Next({sub})"),
            Ltl::Eventually(sub) => write!(f, "Eventually({sub})"),
            Ltl::Always(sub) => write!(f, "Always({sub})"),
            Ltl::Until(subs) => write!(f, "Until({}, {})", subs.0, subs.1),
        }
    }
}
