//! Loop decider: simulates the machine on a run-list tape, recording every
//! configuration with its head offset, and searches the trace for a pair of
//! configurations witnessing a periodic (possibly translated) repetition. \
//! The search runs once, after the step budget's final step. It tries every
//! period T by matching the newest configuration against the one T steps
//! earlier (and 2T steps earlier, which filters most candidates cheaply),
//! then walks the trace backwards comparing the pairs (i, i+T). The match is
//! complete at a pair where the displacement condition holds:
//! - no net drift: equal head offsets, the tapes repeat in place;
//! - net right drift: the elder configuration's right run is empty and its
//!   offset strictly smaller, so every cell the younger run revealed since
//!   came out of the all-zero region;
//! - net left drift: symmetric.
//! Such a pair witnesses c2 = shift_d(c1) with identical continuation, hence
//! an infinite cycle of periodic tape translation.

use crate::{
    config::{Config, StepBig, StepSmall},
    decider::{
        self,
        decider_result::{BatchData, ResultUnitEndReason},
        Decider, DeciderId, DECIDER_LOOP_ID,
    },
    machine_binary::MachineBinary,
    status::{CannotProveReason, MachineStatus, NonHaltReason},
    tape::list_tape::{ListTape, ListTapeStep},
};

/// One trace entry: the configuration and its head offset from the start cell.
type TraceEntry = (ListTape, i64);

#[derive(Debug)]
pub struct DeciderLoop {
    step_limit: StepSmall,
    trace: Vec<TraceEntry>,
}

impl DeciderLoop {
    pub fn new(config: &Config) -> Self {
        Self {
            step_limit: config.step_limit_loop(),
            trace: Vec::with_capacity(config.step_limit_loop() as usize + 1),
        }
    }

    /// Entry i steps back from the newest.
    fn newest(trace: &[TraceEntry], i: usize) -> &TraceEntry {
        &trace[trace.len() - 1 - i]
    }

    /// Walks the pairs (i, i+period) from the newest entry backwards. Every
    /// pair must agree on (state, head symbol); from i = period on, the
    /// displacement base condition finishes the match.
    fn verify_loop(trace: &[TraceEntry], period: usize, dpos: i64) -> bool {
        let len = trace.len();
        let mut i = 0;
        loop {
            if i + period >= len {
                return false;
            }
            let (younger, d_younger) = Self::newest(trace, i);
            let (elder, d_elder) = Self::newest(trace, i + period);
            if !younger.same_state_and_head(elder) {
                return false;
            }
            if i >= period {
                let matched = if dpos == 0 {
                    d_elder == d_younger
                } else if dpos > 0 {
                    elder.is_right_empty() && d_elder < d_younger
                } else {
                    elder.is_left_empty() && d_younger < d_elder
                };
                if matched {
                    return true;
                }
            }
            i += 1;
        }
    }

    /// Tries growing periods; candidate periods are pre-filtered by matching
    /// (state, head symbol) at distance T and 2T from the newest entry.
    fn find_loop(trace: &[TraceEntry]) -> Option<usize> {
        let len = trace.len();
        let mut j = 0;
        while 2 + 2 * j < len {
            let (newest, d_newest) = Self::newest(trace, 0);
            let (mid, d_mid) = Self::newest(trace, 1 + j);
            let (far, _) = Self::newest(trace, 2 + 2 * j);
            if newest.same_state_and_head(mid)
                && newest.same_state_and_head(far)
                && Self::verify_loop(trace, j + 1, d_newest - d_mid)
            {
                return Some(j + 1);
            }
            j += 1;
        }
        None
    }
}

impl Decider for DeciderLoop {
    fn decider_id() -> &'static DeciderId {
        &DECIDER_LOOP_ID
    }

    fn decide_machine(&mut self, machine: &MachineBinary) -> MachineStatus {
        self.trace.clear();
        let mut tape = ListTape::new();
        let mut offset: i64 = 0;
        self.trace.push((tape.clone(), offset));

        for step in 1..=self.step_limit {
            match tape.step(machine) {
                ListTapeStep::Halted => return MachineStatus::DecidedHalts(step as StepBig),
                ListTapeStep::Stepped(direction) => {
                    offset += direction as i64;
                    self.trace.push((tape.clone(), offset));
                }
            }
        }

        match Self::find_loop(&self.trace) {
            Some(period) => MachineStatus::DecidedNonHalt(NonHaltReason::TranslatedLoop(
                self.step_limit,
                period as StepSmall,
            )),
            None => MachineStatus::CannotProve(CannotProveReason::StepLimit),
        }
    }

    fn decide_single_machine(machine: &MachineBinary, config: &Config) -> MachineStatus {
        let mut d = Self::new(config);
        d.decide_machine(machine)
    }

    fn decider_run_batch(batch_data: &mut BatchData) -> ResultUnitEndReason {
        let decider = Self::new(batch_data.config);
        decider::decider_generic_run_batch(decider, batch_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine_binary::NotableMachine;

    fn decide_with_limit(tm: &str, step_limit: StepSmall) -> MachineStatus {
        let machine = MachineBinary::try_from(tm).unwrap();
        let config = Config::builder(machine.n_states())
            .step_limit_loop(step_limit)
            .build();
        DeciderLoop::decide_single_machine(&machine, &config)
    }

    #[test]
    fn loop_decider_simple_right_runner() {
        // runs right over the blank tape forever, a pure translation loop
        let status = decide_with_limit("0RA---", 50);
        assert!(matches!(
            status,
            MachineStatus::DecidedNonHalt(NonHaltReason::TranslatedLoop(50, _))
        ));
    }

    #[test]
    fn loop_decider_in_place_cycle() {
        // A and B shuttle between the same two cells: period 2, no drift
        let status = decide_with_limit("1RB1RB_1LA1LA", 40);
        assert!(matches!(
            status,
            MachineStatus::DecidedNonHalt(NonHaltReason::TranslatedLoop(40, 2))
        ));
    }

    #[test]
    fn loop_decider_never_misclassifies_the_bb5_champion() {
        // halts after 47,176,870 steps; with a small budget the only correct
        // answers are Halts (budget above the halting step) or CannotProve
        let machine = NotableMachine::BB5Max.machine();
        for limit in [10, 130, 512, 4100] {
            let config = Config::builder(5).step_limit_loop(limit).build();
            let status = DeciderLoop::decide_single_machine(&machine, &config);
            assert!(
                !status.is_non_halt(),
                "champion wrongly decided non-halting at limit {limit}: {status}"
            );
        }
    }

    #[test]
    fn loop_decider_reports_halt_with_step_count() {
        // halts on the second step
        let status = decide_with_limit("1RB1RB_---1LA", 100);
        assert_eq!(MachineStatus::DecidedHalts(2), status);
    }

    #[test]
    fn loop_decider_left_translation() {
        // mirror of the right runner
        let status = decide_with_limit("0LA---", 50);
        assert!(matches!(
            status,
            MachineStatus::DecidedNonHalt(NonHaltReason::TranslatedLoop(50, _))
        ));
    }

    #[test]
    fn loop_decider_budget_too_small_returns_cannot_prove() {
        // one step is not enough trace for any loop witness
        let status = decide_with_limit("0RA---", 1);
        assert_eq!(
            MachineStatus::CannotProve(CannotProveReason::StepLimit),
            status
        );
    }
}
