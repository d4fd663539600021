use crate::{Ltl, Progression, Step};
use log::trace;

/// An oracle for [`Ltl`] properties over dense, step-wise traces.
///
/// Properties are formulae over the indices of the state vectors fed to the oracle.
/// At each step, every property which is still open is progressed by one step,
/// so that the oracle only ever carries the residual obligations of the trace seen so far.
#[derive(Debug, Clone, Default)]
pub struct LtlOracle {
    assumes: Vec<Progression<usize>>,
    guarantees: Vec<Progression<usize>>,
    step: Step,
}

impl LtlOracle {
    /// Creates an oracle from assumes and guarantees LTL formulae.
    pub fn new(assumes: &[Ltl<usize>], guarantees: &[Ltl<usize>]) -> Self {
        Self {
            assumes: assumes.iter().cloned().map(Progression::Residual).collect(),
            guarantees: guarantees
                .iter()
                .cloned()
                .map(Progression::Residual)
                .collect(),
            step: 0,
        }
    }

    /// Add a new guarantee property to the [`LtlOracle`].
    pub fn add_guarantee(&mut self, ltl: Ltl<usize>) {
        self.guarantees.push(Progression::Residual(ltl));
    }

    /// Add a new assume property to the [`LtlOracle`].
    pub fn add_assume(&mut self, ltl: Ltl<usize>) {
        self.assumes.push(Progression::Residual(ltl));
    }

    /// Number of steps processed so far.
    pub fn step(&self) -> Step {
        self.step
    }

    /// Update the [`LtlOracle`] with the next state of a trace.
    ///
    /// `None` entries of the state are unobserved propositions.
    /// The last state of a finite trace has to be passed with `is_final` set,
    /// to settle pending `Eventually`, `Always` and `Until` obligations.
    pub fn update(&mut self, state: &[Option<bool>], is_final: bool) {
        let step = self.step;
        self.assumes
            .iter_mut()
            .chain(self.guarantees.iter_mut())
            .for_each(|property| {
                if let Progression::Residual(ltl) = property {
                    let Ok(progression) = ltl.progress(state, is_final);
                    trace!("step {step}: {ltl} progressed to {progression:?}");
                    *property = progression;
                }
            });
        self.step += 1;
    }

    /// Returns the values of the "assume" properties,
    /// if already determined.
    pub fn output_assumes(&self) -> impl Iterator<Item = Option<bool>> + '_ {
        self.assumes.iter().map(Progression::verdict)
    }

    /// Returns the values of the "guarantee" properties,
    /// if already determined.
    pub fn output_guarantees(&self) -> impl Iterator<Item = Option<bool>> + '_ {
        self.guarantees.iter().map(Progression::verdict)
    }

    /// As the trace ends, the values of the "assume" properties is determined to be either true or false.
    ///
    /// Obligations still open after the final step are considered violated.
    pub fn final_output_assumes(&self) -> impl Iterator<Item = bool> + '_ {
        self.assumes.iter().map(|p| p.verdict().unwrap_or(false))
    }

    /// As the trace ends, the values of the "guarantee" properties is determined to be either true or false.
    ///
    /// Obligations still open after the final step are considered violated.
    pub fn final_output_guarantees(&self) -> impl Iterator<Item = bool> + '_ {
        self.guarantees.iter().map(|p| p.verdict().unwrap_or(false))
    }

    /// The current state of the "guarantee" properties:
    /// either a verdict or the residual obligation still to be checked.
    pub fn guarantees(&self) -> &[Progression<usize>] {
        &self.guarantees
    }

    /// The current state of the "assume" properties.
    pub fn assumes(&self) -> &[Progression<usize>] {
        &self.assumes
    }
}
