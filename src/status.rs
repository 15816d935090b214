use std::fmt::Display;

use crate::{
    config::{StepBig, StepSmall},
    far::ScanDirection,
};

/// Why a decider could not prove non-halting. \
/// All of these are well-typed outcomes: a budget running dry or an abstract
/// halting transition becoming reachable ends the attempt for this decider,
/// it never aborts the run.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CannotProveReason {
    /// Loop decider walked its full step budget without a loop witness.
    StepLimit,
    /// NGramCPS expansion gas ran dry before the abstract state closed.
    GasExhausted,
    /// An abstract configuration can reach an undefined transition
    /// (NGramCPS local context or RepWL block simulation).
    HaltReachable,
    /// One RepWL block macro-simulation exceeded its step budget.
    BlockSimulationTimeout,
    /// The RepWL visited-tape cap was hit before the search closed.
    VisitedTapeLimit,
    /// No DFA up to the configured size produced a FAR proof.
    DfaLimitReached,
    DeciderNoResult,
}

/// Witness summary attached to a successful non-halting proof.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NonHaltReason {
    /// Bit i set = state i+1 (A=1) is in the witnessed closed state set.
    ClosedStateGraph(u8),
    /// Translated cycle: (steps walked, cycle length in steps).
    TranslatedLoop(StepSmall, StepSmall),
    /// Closed n-gram abstraction: number of reachable local contexts.
    NGramClosure(usize),
    /// Closed regex-tape graph: number of visited regex tapes.
    RegexTapeClosure(usize),
    /// Finite automata reduction: (DFA state count, scan direction).
    FiniteAutomataReduction(usize, ScanDirection),
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum MachineStatus {
    #[default]
    NoDecision,
    /// The machine reached an undefined transition during concrete simulation.
    DecidedHalts(StepBig),
    DecidedNonHalt(NonHaltReason),
    /// The decider gave up; carries the reason. Never an error.
    CannotProve(CannotProveReason),
}

impl MachineStatus {
    pub fn is_non_halt(&self) -> bool {
        matches!(self, MachineStatus::DecidedNonHalt(_))
    }

    pub fn is_decided(&self) -> bool {
        matches!(
            self,
            MachineStatus::DecidedHalts(_) | MachineStatus::DecidedNonHalt(_)
        )
    }
}

impl Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineStatus::NoDecision => write!(f, "No decision"),
            MachineStatus::DecidedHalts(steps) => {
                write!(f, "Decided Halts: after {steps} steps")
            }
            MachineStatus::DecidedNonHalt(reason) => match reason {
                NonHaltReason::ClosedStateGraph(mask) => {
                    write!(f, "Decided Non-Halt: closed state set {{")?;
                    let mut first = true;
                    for state in 0..8 {
                        if mask & (1 << state) != 0 {
                            if !first {
                                write!(f, ",")?;
                            }
                            write!(f, "{}", (state as u8 + b'A') as char)?;
                            first = false;
                        }
                    }
                    write!(f, "}}")
                }
                NonHaltReason::TranslatedLoop(steps, cycle) => {
                    write!(
                        f,
                        "Decided Non-Halt: translated loop of {cycle} steps found after {steps} steps"
                    )
                }
                NonHaltReason::NGramClosure(contexts) => {
                    write!(f, "Decided Non-Halt: n-gram closure with {contexts} local contexts")
                }
                NonHaltReason::RegexTapeClosure(tapes) => {
                    write!(f, "Decided Non-Halt: regex tape closure with {tapes} tapes")
                }
                NonHaltReason::FiniteAutomataReduction(dfa_states, direction) => {
                    write!(
                        f,
                        "Decided Non-Halt: finite automata reduction, {dfa_states} DFA states, scan {direction}"
                    )
                }
            },
            MachineStatus::CannotProve(reason) => match reason {
                CannotProveReason::StepLimit => write!(f, "Cannot prove: step limit reached"),
                CannotProveReason::GasExhausted => write!(f, "Cannot prove: gas exhausted"),
                CannotProveReason::HaltReachable => {
                    write!(f, "Cannot prove: halting transition reachable in abstraction")
                }
                CannotProveReason::BlockSimulationTimeout => {
                    write!(f, "Cannot prove: block simulation timeout")
                }
                CannotProveReason::VisitedTapeLimit => {
                    write!(f, "Cannot prove: visited regex tape limit reached")
                }
                CannotProveReason::DfaLimitReached => {
                    write!(f, "Cannot prove: no proof up to the DFA state limit")
                }
                CannotProveReason::DeciderNoResult => write!(f, "Cannot prove: no result"),
            },
        }
    }
}
