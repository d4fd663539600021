//! Step-wise progression of [`Ltl`] formulae.
//!
//! Progressing a formula through a step consumes the observations of that step
//! and either settles the formula to a truth value,
//! or rewrites it into the residual obligation still open for the following steps.

use crate::Ltl;
use log::trace;
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    convert::Infallible,
    hash::{BuildHasher, Hash},
};

/// The result of progressing an [`Ltl`] formula through a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progression<V> {
    /// The formula is settled, no further step can change its truth value.
    Verdict(bool),
    /// The obligation that is left to be checked from the next step onward.
    Residual(Ltl<V>),
}

impl<V> Progression<V> {
    /// Returns the verdict, if reached.
    pub fn verdict(&self) -> Option<bool> {
        match self {
            Progression::Verdict(b) => Some(*b),
            Progression::Residual(_) => None,
        }
    }

    /// Returns the residual formula, if any.
    pub fn residual(&self) -> Option<&Ltl<V>> {
        match self {
            Progression::Verdict(_) => None,
            Progression::Residual(ltl) => Some(ltl),
        }
    }

    /// Turns the progression back into a formula,
    /// with verdicts becoming constant formulae.
    pub fn into_formula(self) -> Ltl<V> {
        match self {
            Progression::Verdict(b) => Ltl::Const(b),
            Progression::Residual(ltl) => ltl,
        }
    }
}

impl<V> From<bool> for Progression<V> {
    fn from(value: bool) -> Self {
        Progression::Verdict(value)
    }
}

/// The observations of a single step,
/// mapping atomic propositions to their truth values.
pub trait Lookup<V> {
    /// The error returned when the value of a proposition cannot be established.
    type Error;

    /// Returns the value of the given proposition,
    /// or `None` if the proposition is not observed in the current step.
    fn lookup(&mut self, var: &V) -> Result<Option<bool>, Self::Error>;
}

impl<V, L> Lookup<V> for &mut L
where
    L: Lookup<V> + ?Sized,
{
    type Error = L::Error;

    fn lookup(&mut self, var: &V) -> Result<Option<bool>, Self::Error> {
        (**self).lookup(var)
    }
}

impl<V, S> Lookup<V> for HashMap<V, bool, S>
where
    V: Eq + Hash,
    S: BuildHasher,
{
    type Error = Infallible;

    fn lookup(&mut self, var: &V) -> Result<Option<bool>, Self::Error> {
        Ok(self.get(var).copied())
    }
}

impl<V: Ord> Lookup<V> for BTreeMap<V, bool> {
    type Error = Infallible;

    fn lookup(&mut self, var: &V) -> Result<Option<bool>, Self::Error> {
        Ok(self.get(var).copied())
    }
}

/// Dense observations, indexed by proposition.
/// Out-of-range indices are not observed.
impl Lookup<usize> for &[Option<bool>] {
    type Error = Infallible;

    fn lookup(&mut self, var: &usize) -> Result<Option<bool>, Self::Error> {
        Ok(self.get(*var).copied().flatten())
    }
}

/// A zero-argument, possibly side-effecting, function computing the value of a proposition.
pub type Probe<'p, E> = Box<dyn FnMut() -> Result<bool, E> + 'p>;

/// The binding of a proposition in a lookup table.
pub enum Binding<'p, E> {
    /// The proposition has a known value.
    Value(bool),
    /// The value of the proposition is computed on demand.
    ///
    /// A probe is only invoked if its proposition is actually needed during evaluation,
    /// and at most once per evaluation.
    Probe(Probe<'p, E>),
}

impl<'p, E> Binding<'p, E> {
    /// Binds a proposition to a probe.
    pub fn probe<F>(probe: F) -> Self
    where
        F: FnMut() -> Result<bool, E> + 'p,
    {
        Binding::Probe(Box::new(probe))
    }
}

impl<E> From<bool> for Binding<'_, E> {
    fn from(value: bool) -> Self {
        Binding::Value(value)
    }
}

impl<E> std::fmt::Debug for Binding<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Value(b) => f.debug_tuple("Value").field(b).finish(),
            Binding::Probe(_) => f.write_str("Probe(..)"),
        }
    }
}

impl<V, E, S> Lookup<V> for HashMap<V, Binding<'_, E>, S>
where
    V: Eq + Hash,
    S: BuildHasher,
{
    type Error = E;

    fn lookup(&mut self, var: &V) -> Result<Option<bool>, Self::Error> {
        match self.get_mut(var) {
            None => Ok(None),
            Some(Binding::Value(b)) => Ok(Some(*b)),
            Some(Binding::Probe(probe)) => probe().map(Some),
        }
    }
}

/// Progresses `formula` through a single step.
///
/// The `lookup` provider is invoked at most once,
/// and only if an atomic proposition actually has to be evaluated.
/// On the final step of a trace (`is_final`),
/// pending `Eventually` and `Until` obligations are settled as false
/// and pending `Always` obligations as true.
///
/// Errors of the lookup provider or of its probes are returned unchanged;
/// the formula is never modified, so the step can be retried.
///
/// ```
/// # use ltlmon_core::{evaluate, Ltl, Progression};
/// # use std::collections::HashMap;
/// let formula = Ltl::<String>::eventually(Ltl::var("a"));
/// let step = HashMap::from([(String::from("a"), false)]);
/// let residual = evaluate(&formula, || Ok(step.clone()), false).unwrap();
/// assert_eq!(residual, Progression::Residual(formula.clone()));
/// let verdict = evaluate(&formula, || Ok(step), true).unwrap();
/// assert_eq!(verdict, Progression::Verdict(false));
/// ```
pub fn evaluate<V, L, F>(
    formula: &Ltl<V>,
    lookup: F,
    is_final: bool,
) -> Result<Progression<V>, L::Error>
where
    V: Clone + Eq + Hash,
    L: Lookup<V>,
    F: FnOnce() -> Result<L, L::Error>,
{
    let mut interpreter = Interpreter {
        provider: Some(lookup),
        lookup: None,
        cache: HashMap::new(),
        is_final,
    };
    Ok(match interpreter.eval(formula)? {
        Eval::Verdict(b) => Progression::Verdict(b),
        Eval::Residual(ltl) => Progression::Residual(ltl.into_owned()),
    })
}

impl<V: Clone + Eq + Hash> Ltl<V> {
    /// Progresses the formula through a step with the given observations.
    ///
    /// Shorthand for [`evaluate`] with an already available lookup.
    pub fn progress<L: Lookup<V>>(
        &self,
        lookup: L,
        is_final: bool,
    ) -> Result<Progression<V>, L::Error> {
        evaluate(self, || Ok(lookup), is_final)
    }
}

// Borrowed residuals point into the formula under evaluation,
// so that unchanged sub-formulae are neither cloned nor rebuilt.
enum Eval<'a, V: Clone> {
    Verdict(bool),
    Residual(Cow<'a, Ltl<V>>),
}

struct Interpreter<'a, V, L, F> {
    provider: Option<F>,
    lookup: Option<L>,
    // Each proposition is looked up at most once per step.
    cache: HashMap<&'a V, Option<bool>>,
    is_final: bool,
}

impl<'a, V, L, F> Interpreter<'a, V, L, F>
where
    V: Clone + Eq + Hash,
    L: Lookup<V>,
    F: FnOnce() -> Result<L, L::Error>,
{
    fn lookup(&mut self, var: &'a V) -> Result<Option<bool>, L::Error> {
        if let Some(val) = self.cache.get(var) {
            return Ok(*val);
        }
        let lookup = match &mut self.lookup {
            Some(lookup) => lookup,
            slot @ None => {
                let Some(provider) = self.provider.take() else {
                    unreachable!("lookup provider already consumed");
                };
                trace!("requesting lookup table");
                slot.insert(provider()?)
            }
        };
        let val = lookup.lookup(var)?;
        self.cache.insert(var, val);
        Ok(val)
    }

    fn eval(&mut self, formula: &'a Ltl<V>) -> Result<Eval<'a, V>, L::Error> {
        let eval = match formula {
            Ltl::Const(b) => Eval::Verdict(*b),
            Ltl::Var(var) => match self.lookup(var)? {
                Some(b) => Eval::Verdict(b),
                None => Eval::Residual(Cow::Borrowed(formula)),
            },
            Ltl::Not(sub) => match self.eval(sub)? {
                Eval::Verdict(b) => Eval::Verdict(!b),
                Eval::Residual(res) if unchanged(&res, sub) => {
                    Eval::Residual(Cow::Borrowed(formula))
                }
                Eval::Residual(res) => Eval::Residual(Cow::Owned(Ltl::not(res.into_owned()))),
            },
            Ltl::And(subs) => {
                let (lhs, rhs) = subs.as_ref();
                // The rhs must not be evaluated at all if the lhs is false,
                // as it might invoke probes.
                let lhs_eval = match self.eval(lhs)? {
                    Eval::Verdict(false) => return Ok(Eval::Verdict(false)),
                    lhs_eval => lhs_eval,
                };
                match (lhs_eval, self.eval(rhs)?) {
                    (_, Eval::Verdict(false)) => Eval::Verdict(false),
                    (Eval::Verdict(true), Eval::Verdict(true)) => Eval::Verdict(true),
                    (Eval::Verdict(true), Eval::Residual(res))
                    | (Eval::Residual(res), Eval::Verdict(true)) => Eval::Residual(res),
                    (Eval::Residual(lhs_res), Eval::Residual(rhs_res)) => Eval::Residual(
                        Connective::And.residual(formula, lhs_res, rhs_res),
                    ),
                    (Eval::Verdict(false), _) => unreachable!("conjunction short-circuited"),
                }
            }
            Ltl::Or(subs) => {
                let (lhs, rhs) = subs.as_ref();
                let lhs_eval = match self.eval(lhs)? {
                    Eval::Verdict(true) => return Ok(Eval::Verdict(true)),
                    lhs_eval => lhs_eval,
                };
                match (lhs_eval, self.eval(rhs)?) {
                    (_, Eval::Verdict(true)) => Eval::Verdict(true),
                    (Eval::Verdict(false), Eval::Verdict(false)) => Eval::Verdict(false),
                    (Eval::Verdict(false), Eval::Residual(res))
                    | (Eval::Residual(res), Eval::Verdict(false)) => Eval::Residual(res),
                    (Eval::Residual(lhs_res), Eval::Residual(rhs_res)) => Eval::Residual(
                        Connective::Or.residual(formula, lhs_res, rhs_res),
                    ),
                    (Eval::Verdict(true), _) => unreachable!("disjunction short-circuited"),
                }
            }
            // The argument is only evaluated from the next step.
            Ltl::Next(sub) => Eval::Residual(Cow::Borrowed(sub.as_ref())),
            Ltl::Eventually(sub) => match self.eval(sub)? {
                Eval::Verdict(true) => Eval::Verdict(true),
                Eval::Verdict(false) if self.is_final => Eval::Verdict(false),
                Eval::Verdict(false) => Eval::Residual(Cow::Borrowed(formula)),
                Eval::Residual(res) if unchanged(&res, sub) => {
                    Eval::Residual(Cow::Borrowed(formula))
                }
                // Either satisfied through the progress made now, or later on.
                Eval::Residual(res) => {
                    Eval::Residual(Connective::Or.fold(res, Cow::Borrowed(formula)))
                }
            },
            Ltl::Always(sub) => match self.eval(sub)? {
                Eval::Verdict(false) => Eval::Verdict(false),
                Eval::Verdict(true) if self.is_final => Eval::Verdict(true),
                Eval::Verdict(true) => Eval::Residual(Cow::Borrowed(formula)),
                Eval::Residual(res) if unchanged(&res, sub) => {
                    Eval::Residual(Cow::Borrowed(formula))
                }
                Eval::Residual(res) => {
                    Eval::Residual(Connective::And.fold(res, Cow::Borrowed(formula)))
                }
            },
            Ltl::Until(subs) => {
                let (lhs, rhs) = subs.as_ref();
                match self.eval(rhs)? {
                    Eval::Verdict(true) => Eval::Verdict(true),
                    Eval::Verdict(false) if self.is_final => Eval::Verdict(false),
                    Eval::Verdict(false) => match self.eval(lhs)? {
                        Eval::Verdict(false) => Eval::Verdict(false),
                        // `Until` keeps checking its rhs at every step,
                        // regardless of the history of its lhs.
                        _ => Eval::Residual(Cow::Borrowed(formula)),
                    },
                    // The lhs is only needed once the rhs is known to be false.
                    Eval::Residual(_) => Eval::Residual(Cow::Borrowed(formula)),
                }
            }
        };
        Ok(eval)
    }
}

// A residual is unchanged if it is the original formula itself.
// Borrowed residuals are either the original or one of its strict sub-formulae,
// so pointer equality suffices for them.
fn unchanged<V: Clone + PartialEq>(residual: &Cow<'_, Ltl<V>>, original: &Ltl<V>) -> bool {
    match residual {
        Cow::Borrowed(ltl) => std::ptr::eq(*ltl, original),
        Cow::Owned(ltl) => ltl == original,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

impl Connective {
    fn dual(self) -> Self {
        match self {
            Connective::And => Connective::Or,
            Connective::Or => Connective::And,
        }
    }

    fn build<V>(self, lhs: Ltl<V>, rhs: Ltl<V>) -> Ltl<V> {
        match self {
            Connective::And => Ltl::and(lhs, rhs),
            Connective::Or => Ltl::or(lhs, rhs),
        }
    }

    fn operands<V>(self, formula: &Ltl<V>) -> Option<&(Ltl<V>, Ltl<V>)> {
        match (self, formula) {
            (Connective::And, Ltl::And(subs)) | (Connective::Or, Ltl::Or(subs)) => {
                Some(subs.as_ref())
            }
            _ => None,
        }
    }

    // Whether `compound` is an application of this connective with `other` as an operand.
    fn has_operand<V: PartialEq>(self, compound: &Ltl<V>, other: &Ltl<V>) -> bool {
        self.operands(compound)
            .is_some_and(|(lhs, rhs)| lhs == other || rhs == other)
    }

    // Simplifies `lhs ∘ rhs` to one of its sides, if possible:
    // - idempotence: `p ∘ p = p` and `(p ∘ q) ∘ q = p ∘ q` (on either side);
    // - absorption: `p ∘ (p ∘' q) = p` with `∘'` the dual connective (on either side).
    fn prune<'a, V: Clone + PartialEq>(
        self,
        lhs: Cow<'a, Ltl<V>>,
        rhs: Cow<'a, Ltl<V>>,
    ) -> Result<Cow<'a, Ltl<V>>, (Cow<'a, Ltl<V>>, Cow<'a, Ltl<V>>)> {
        if lhs == rhs
            || self.has_operand(&*lhs, &*rhs)
            || self.dual().has_operand(&*rhs, &*lhs)
        {
            Ok(lhs)
        } else if self.has_operand(&*rhs, &*lhs) || self.dual().has_operand(&*lhs, &*rhs) {
            Ok(rhs)
        } else {
            Err((lhs, rhs))
        }
    }

    // Residual of the compound `original` formula, given the residuals of its operands.
    fn residual<'a, V: Clone + PartialEq>(
        self,
        original: &'a Ltl<V>,
        lhs: Cow<'a, Ltl<V>>,
        rhs: Cow<'a, Ltl<V>>,
    ) -> Cow<'a, Ltl<V>> {
        let (original_lhs, original_rhs) = self
            .operands(original)
            .expect("original formula is an application of the connective");
        match self.prune(lhs, rhs) {
            Ok(res) => res,
            Err((lhs, rhs)) if unchanged(&lhs, original_lhs) && unchanged(&rhs, original_rhs) => {
                Cow::Borrowed(original)
            }
            Err((lhs, rhs)) => Cow::Owned(self.build(lhs.into_owned(), rhs.into_owned())),
        }
    }

    // Combines two residuals which are not the operands of an existing formula.
    fn fold<'a, V: Clone + PartialEq>(
        self,
        lhs: Cow<'a, Ltl<V>>,
        rhs: Cow<'a, Ltl<V>>,
    ) -> Cow<'a, Ltl<V>> {
        match self.prune(lhs, rhs) {
            Ok(res) => res,
            Err((lhs, rhs)) => Cow::Owned(self.build(lhs.into_owned(), rhs.into_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Formula = Ltl<String>;

    fn var(name: &str) -> Formula {
        Ltl::var(name)
    }

    fn step(values: &[(&str, bool)]) -> HashMap<String, bool> {
        values
            .iter()
            .map(|(name, b)| (name.to_string(), *b))
            .collect()
    }

    fn eval(formula: &Formula, values: &[(&str, bool)]) -> Progression<String> {
        let Ok(progression) = formula.progress(step(values), false);
        progression
    }

    fn eval_final(formula: &Formula, values: &[(&str, bool)]) -> Progression<String> {
        let Ok(progression) = formula.progress(step(values), true);
        progression
    }

    // Feeds the states to the formula, with the last one as the final step.
    fn run(formula: &Formula, trace: &[&[(&str, bool)]]) -> Progression<String> {
        let mut current = formula.clone();
        for (idx, values) in trace.iter().enumerate() {
            let is_final = idx + 1 == trace.len();
            match evaluate(&current, || Ok::<_, Infallible>(step(values)), is_final) {
                Ok(Progression::Residual(res)) => current = res,
                Ok(verdict) => return verdict,
            }
        }
        Progression::Residual(current)
    }

    #[test]
    fn constants_never_request_lookup() {
        for b in [true, false] {
            let requested = Cell::new(false);
            let progression = evaluate(
                &Formula::Const(b),
                || {
                    requested.set(true);
                    Ok::<_, Infallible>(HashMap::<String, bool>::new())
                },
                false,
            );
            assert_eq!(progression, Ok(Progression::Verdict(b)));
            assert!(!requested.get());
        }
    }

    #[test]
    fn boolean_connectives() {
        for lhs in [true, false] {
            for rhs in [true, false] {
                let values = [("a", lhs), ("b", rhs)];
                assert_eq!(
                    eval(&Ltl::and(var("a"), var("b")), &values),
                    Progression::Verdict(lhs && rhs)
                );
                assert_eq!(
                    eval(&Ltl::or(var("a"), var("b")), &values),
                    Progression::Verdict(lhs || rhs)
                );
            }
            assert_eq!(
                eval(&Ltl::not(var("a")), &[("a", lhs)]),
                Progression::Verdict(!lhs)
            );
        }
    }

    #[test]
    fn unbound_variables_stay_open() {
        let formula = var("a");
        assert_eq!(eval(&formula, &[("b", true)]), Progression::Residual(var("a")));
        let formula = Ltl::not(var("a"));
        assert_eq!(eval(&formula, &[]), Progression::Residual(formula.clone()));
    }

    #[test]
    fn identity_simplification() {
        assert_eq!(
            eval(&Ltl::and(var("a"), var("b")), &[("a", true)]),
            Progression::Residual(var("b"))
        );
        assert_eq!(
            eval(&Ltl::and(var("a"), var("b")), &[("b", true)]),
            Progression::Residual(var("a"))
        );
        assert_eq!(
            eval(&Ltl::or(var("a"), var("b")), &[("a", false)]),
            Progression::Residual(var("b"))
        );
        assert_eq!(
            eval(&Ltl::or(var("a"), var("b")), &[("b", false)]),
            Progression::Residual(var("a"))
        );
        assert_eq!(
            eval(&Ltl::and(var("a"), var("b")), &[("b", false)]),
            Progression::Verdict(false)
        );
        assert_eq!(
            eval(&Ltl::or(var("a"), var("b")), &[("b", true)]),
            Progression::Verdict(true)
        );
    }

    #[test]
    fn short_circuit_skips_probes() {
        let invoked = Cell::new(false);
        let mut table: HashMap<String, Binding<'_, Infallible>> = HashMap::new();
        table.insert(
            "x".to_string(),
            Binding::probe(|| {
                invoked.set(true);
                Ok(true)
            }),
        );
        let formula = Ltl::and(Formula::FALSE, var("x"));
        assert_eq!(formula.progress(&mut table, false), Ok(Progression::Verdict(false)));
        let formula = Ltl::or(Formula::TRUE, var("x"));
        assert_eq!(formula.progress(&mut table, false), Ok(Progression::Verdict(true)));
        assert!(!invoked.get());

        let formula = Ltl::and(Formula::TRUE, var("x"));
        assert_eq!(formula.progress(&mut table, false), Ok(Progression::Verdict(true)));
        assert!(invoked.get());
    }

    #[test]
    fn short_circuit_skips_lookup_provider() {
        let requested = Cell::new(false);
        let formula = Ltl::and(Formula::FALSE, var("x"));
        let progression = evaluate(
            &formula,
            || {
                requested.set(true);
                Ok::<_, Infallible>(step(&[("x", true)]))
            },
            false,
        );
        assert_eq!(progression, Ok(Progression::Verdict(false)));
        assert!(!requested.get());
    }

    #[test]
    fn probes_run_at_most_once_per_step() {
        let calls = Cell::new(0);
        let mut table: HashMap<String, Binding<'_, Infallible>> = HashMap::new();
        table.insert(
            "a".to_string(),
            Binding::probe(|| {
                calls.set(calls.get() + 1);
                Ok(true)
            }),
        );
        let formula = Ltl::and(var("a"), Ltl::and(Ltl::not(Ltl::not(var("a"))), var("a")));
        assert_eq!(formula.progress(&mut table, false), Ok(Progression::Verdict(true)));
        assert_eq!(calls.get(), 1);
        assert_eq!(formula.progress(&mut table, false), Ok(Progression::Verdict(true)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn lookup_provider_requested_once() {
        let requests = Cell::new(0);
        let formula = Ltl::and(var("a"), Ltl::eventually(var("b")));
        let progression = evaluate(
            &formula,
            || {
                requests.set(requests.get() + 1);
                Ok::<_, Infallible>(step(&[("a", true), ("b", true)]))
            },
            false,
        );
        assert_eq!(progression, Ok(Progression::Verdict(true)));
        assert_eq!(requests.get(), 1);
    }

    #[test]
    fn probe_errors_propagate() {
        #[derive(Debug, PartialEq)]
        struct SensorDown;

        let mut table: HashMap<String, Binding<'_, SensorDown>> = HashMap::new();
        table.insert("a".to_string(), Binding::Value(true));
        table.insert("b".to_string(), Binding::probe(|| Err(SensorDown)));
        let formula = Ltl::always(Ltl::and(var("a"), var("b")));
        assert_eq!(formula.progress(&mut table, false), Err(SensorDown));

        let progression = evaluate(
            &formula,
            || Err::<HashMap<String, Binding<'static, SensorDown>>, _>(SensorDown),
            false,
        );
        assert_eq!(progression, Err(SensorDown));
    }

    #[test]
    fn next_defers_evaluation() {
        let requested = Cell::new(false);
        let formula = Ltl::next(var("x"));
        let progression = evaluate(
            &formula,
            || {
                requested.set(true);
                Ok::<_, Infallible>(step(&[("x", false)]))
            },
            false,
        );
        assert_eq!(progression, Ok(Progression::Residual(var("x"))));
        assert!(!requested.get());

        let formula = Ltl::next(Ltl::next(var("x")));
        let trace: &[&[(&str, bool)]] = &[&[("x", false)], &[("x", false)], &[("x", true)]];
        assert_eq!(run(&formula, trace), Progression::Verdict(true));
    }

    #[test]
    fn eventually() {
        let formula = Ltl::eventually(var("a"));
        let trace: &[&[(&str, bool)]] = &[&[("a", false)], &[("a", false)], &[("a", true)]];
        assert_eq!(run(&formula, trace), Progression::Verdict(true));
        let trace: &[&[(&str, bool)]] = &[&[("a", false)], &[("a", false)], &[("a", false)]];
        assert_eq!(run(&formula, trace), Progression::Verdict(false));
        assert_eq!(
            eval(&formula, &[("a", false)]),
            Progression::Residual(formula.clone())
        );
        // Unobserved, no progress is made.
        assert_eq!(eval(&formula, &[]), Progression::Residual(formula.clone()));
        assert_eq!(eval_final(&formula, &[]), Progression::Residual(formula.clone()));
    }

    #[test]
    fn always() {
        let formula = Ltl::always(var("a"));
        let trace: &[&[(&str, bool)]] = &[&[("a", true)], &[("a", true)], &[("a", true)]];
        assert_eq!(run(&formula, trace), Progression::Verdict(true));
        assert_eq!(
            eval(&formula, &[("a", true)]),
            Progression::Residual(formula.clone())
        );
        assert_eq!(eval(&formula, &[("a", false)]), Progression::Verdict(false));
        let trace: &[&[(&str, bool)]] = &[&[("a", true)], &[("a", false)], &[("a", true)]];
        assert_eq!(run(&formula, trace), Progression::Verdict(false));
    }

    #[test]
    fn eventually_folds_partial_progress() {
        let formula = Ltl::eventually(Ltl::next(var("a")));
        assert_eq!(
            eval(&formula, &[("a", false)]),
            Progression::Residual(Ltl::or(var("a"), formula.clone()))
        );
        let trace: &[&[(&str, bool)]] = &[&[("a", false)], &[("a", true)]];
        assert_eq!(run(&formula, trace), Progression::Verdict(true));
        // `Next` is still pending after the final step, and it is up to the caller to settle it.
        let trace: &[&[(&str, bool)]] = &[&[("a", true)], &[("a", false)], &[("a", false)]];
        assert_eq!(run(&formula, trace).verdict(), None);
    }

    #[test]
    fn always_folds_partial_progress() {
        let formula = Ltl::always(Ltl::or(var("a"), var("b")));
        assert_eq!(
            eval(&formula, &[("a", false)]),
            Progression::Residual(Ltl::and(var("b"), formula.clone()))
        );
    }

    #[test]
    fn until() {
        let formula = Ltl::until(var("a"), var("b"));
        assert_eq!(
            eval(&formula, &[("a", false), ("b", false)]),
            Progression::Verdict(false)
        );
        assert_eq!(
            eval(&formula, &[("a", false), ("b", true)]),
            Progression::Verdict(true)
        );
        let progression = eval(&formula, &[("a", true), ("b", false)]);
        assert_eq!(progression, Progression::Residual(formula.clone()));
        let residual = progression.into_formula();
        assert_eq!(
            eval(&residual, &[("a", false), ("b", true)]),
            Progression::Verdict(true)
        );
        assert_eq!(
            eval_final(&formula, &[("a", true), ("b", false)]),
            Progression::Verdict(false)
        );
    }

    #[test]
    fn until_skips_lhs_when_rhs_holds() {
        let invoked = Cell::new(false);
        let mut table: HashMap<String, Binding<'_, Infallible>> = HashMap::new();
        table.insert("b".to_string(), Binding::Value(true));
        table.insert(
            "a".to_string(),
            Binding::probe(|| {
                invoked.set(true);
                Ok(false)
            }),
        );
        let formula = Ltl::until(var("a"), var("b"));
        assert_eq!(formula.progress(&mut table, false), Ok(Progression::Verdict(true)));
        assert!(!invoked.get());
    }

    #[test]
    fn until_skips_lhs_when_rhs_is_open() {
        let invoked = Cell::new(0);
        let mut table: HashMap<String, Binding<'_, Infallible>> = HashMap::new();
        table.insert(
            "a".to_string(),
            Binding::probe(|| {
                invoked.set(invoked.get() + 1);
                Ok(false)
            }),
        );
        let formula = Ltl::until(var("a"), var("b"));
        assert_eq!(
            formula.progress(&mut table, false),
            Ok(Progression::Residual(formula.clone()))
        );
        assert_eq!(invoked.get(), 0);

        // Once the rhs is false, the lhs decides.
        table.insert("b".to_string(), Binding::Value(false));
        assert_eq!(formula.progress(&mut table, false), Ok(Progression::Verdict(false)));
        assert_eq!(invoked.get(), 1);
    }

    #[test]
    fn negation_of_progressed_residual() {
        let formula = Ltl::not(Ltl::next(var("a")));
        let residual = eval(&formula, &[("a", true)]);
        assert_eq!(residual, Progression::Residual(Ltl::not(var("a"))));
        let residual = residual.into_formula();
        assert_eq!(eval(&residual, &[("a", true)]), Progression::Verdict(false));
        assert_eq!(eval(&residual, &[("a", false)]), Progression::Verdict(true));
    }

    #[test]
    fn pruning_idempotence() {
        let p = var("p");
        let q = var("q");
        let open: &[(&str, bool)] = &[];
        for formula in [
            Ltl::and(Ltl::and(p.clone(), q.clone()), q.clone()),
            Ltl::and(Ltl::and(q.clone(), p.clone()), q.clone()),
        ] {
            let Progression::Residual(res) = eval(&formula, open) else {
                panic!("unbound formula has no verdict");
            };
            assert_eq!(res.size(), 3);
        }
        assert_eq!(
            eval(&Ltl::or(q.clone(), Ltl::or(q.clone(), p.clone())), open),
            Progression::Residual(Ltl::or(q.clone(), p.clone()))
        );
        assert_eq!(
            eval(&Ltl::or(p.clone(), p.clone()), open),
            Progression::Residual(p.clone())
        );
    }

    #[test]
    fn pruning_absorption() {
        let p = var("p");
        let q = var("q");
        assert_eq!(
            eval(&Ltl::and(p.clone(), Ltl::or(p.clone(), q.clone())), &[]),
            Progression::Residual(p.clone())
        );
        assert_eq!(
            eval(&Ltl::or(Ltl::and(q.clone(), p.clone()), p.clone()), &[]),
            Progression::Residual(p.clone())
        );
    }

    #[test]
    fn residuals_stay_bounded() {
        let eventually = Ltl::eventually(Ltl::and(var("a"), Ltl::next(var("b"))));
        let always = Ltl::always(Ltl::or(var("a"), Ltl::next(var("b"))));
        for (formula, a) in [(eventually, true), (always, false)] {
            let mut current = formula.clone();
            let mut max_size = 0;
            for _ in 0..100 {
                let Progression::Residual(res) = eval(&current, &[("a", a)]) else {
                    panic!("b is never observed");
                };
                max_size = max_size.max(res.size());
                current = res;
            }
            assert!(max_size <= 2 * formula.size(), "residual grew to {max_size}");
        }
    }

    #[test]
    fn dense_lookup() {
        let state: &[Option<bool>] = &[Some(true), None, Some(false)];
        let formula = Ltl::<usize>::until(Ltl::Var(0), Ltl::Var(1));
        assert_eq!(formula.progress(state, false), Ok(Progression::Residual(formula.clone())));
        let formula = Ltl::<usize>::or(Ltl::Var(2), Ltl::Var(7));
        assert_eq!(formula.progress(state, false), Ok(Progression::Residual(Ltl::Var(7))));
    }
}
