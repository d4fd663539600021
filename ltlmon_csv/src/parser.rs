use ltlmon_core::Ltl;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Properties {
    #[serde(default)]
    pub(crate) assumes: Vec<Formula>,
    #[serde(default)]
    pub(crate) guarantees: Vec<Property>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Property {
    pub(crate) name: String,
    pub(crate) formula: Formula,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Formula {
    Const(bool),
    Var(String),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Next(Box<Formula>),
    Eventually(Box<Formula>),
    Always(Box<Formula>),
    Until(Box<Formula>, Box<Formula>),
}

impl From<Formula> for Ltl<String> {
    fn from(formula: Formula) -> Self {
        match formula {
            Formula::Const(b) => Ltl::Const(b),
            Formula::Var(name) => Ltl::Var(name),
            Formula::Not(sub) => Ltl::not((*sub).into()),
            Formula::And(lhs, rhs) => Ltl::and((*lhs).into(), (*rhs).into()),
            Formula::Or(lhs, rhs) => Ltl::or((*lhs).into(), (*rhs).into()),
            Formula::Next(sub) => Ltl::next((*sub).into()),
            Formula::Eventually(sub) => Ltl::eventually((*sub).into()),
            Formula::Always(sub) => Ltl::always((*sub).into()),
            Formula::Until(lhs, rhs) => Ltl::until((*lhs).into(), (*rhs).into()),
        }
    }
}
