//! Closed-state-set decider: if the machine ever enters a set of states that is
//! closed under its defined transitions and contains no halting transition,
//! it never halts. \
//! By construction of the machine DB every state with a defined transition is
//! reached from the blank tape at some point, and no state has two undefined
//! transitions. So the machine never needs to be run at all: it suffices to
//! find a state whose reachable set in the transition digraph avoids all
//! states holding an undefined transition.

use crate::{
    config::{Config, MAX_STATES},
    decider::{
        self,
        decider_result::{BatchData, ResultUnitEndReason},
        Decider, DeciderId, DECIDER_CLOSED_STATES_ID,
    },
    machine_binary::MachineBinary,
    status::{CannotProveReason, MachineStatus, NonHaltReason},
};

#[derive(Debug, Default)]
pub struct DeciderClosedStates;

impl DeciderClosedStates {
    pub fn new(_config: &Config) -> Self {
        Self
    }

    /// Bitmask over states (bit s-1 = state s, A=1) with at least one halting transition.
    fn states_with_halt_transition(machine: &MachineBinary) -> u8 {
        let mut mask = 0u8;
        for state in 1..=machine.n_states() {
            if machine.transition_for_state_symbol(state, 0).is_halt()
                || machine.transition_for_state_symbol(state, 1).is_halt()
            {
                mask |= 1 << (state - 1);
            }
        }
        mask
    }

    /// States reachable from `start` in the transition digraph, tape content ignored.
    fn states_reachable_from(machine: &MachineBinary, start: usize) -> u8 {
        let mut visited = 0u8;
        let mut to_visit = Vec::with_capacity(MAX_STATES * 2);
        to_visit.push(start);

        while let Some(state) = to_visit.pop() {
            let bit = 1 << (state - 1);
            if visited & bit != 0 {
                continue;
            }
            visited |= bit;

            for symbol in 0..2 {
                let tr = machine.transition_for_state_symbol(state, symbol);
                if !tr.is_halt() {
                    let next = tr.state() as usize;
                    if visited & (1 << (next - 1)) == 0 {
                        to_visit.push(next);
                    }
                }
            }
        }
        visited
    }
}

impl Decider for DeciderClosedStates {
    fn decider_id() -> &'static DeciderId {
        &DECIDER_CLOSED_STATES_ID
    }

    fn decide_machine(&mut self, machine: &MachineBinary) -> MachineStatus {
        let halt_states = Self::states_with_halt_transition(machine);

        for state in 1..=machine.n_states() {
            let reachable = Self::states_reachable_from(machine, state);
            if reachable & halt_states == 0 {
                return MachineStatus::DecidedNonHalt(NonHaltReason::ClosedStateGraph(reachable));
            }
        }

        MachineStatus::CannotProve(CannotProveReason::DeciderNoResult)
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

    fn decide(tm: &str) -> MachineStatus {
        let machine = MachineBinary::try_from(tm).unwrap();
        let config = Config::new_default(machine.n_states());
        DeciderClosedStates::decide_single_machine(&machine, &config)
    }

    #[test]
    fn closed_states_yes_with_witness_excluding_e() {
        // {A,B} is closed and E, which holds the undefined transition, stays outside.
        let status = decide("0RB0LB_1LA1RB_1LB0LD_0RA1RE_0LE---");
        match status {
            MachineStatus::DecidedNonHalt(NonHaltReason::ClosedStateGraph(witness)) => {
                // E (bit 4) not in the witness
                assert_eq!(0, witness & 0b1_0000);
                assert_ne!(0, witness);
                // the witness is closed under the defined transitions of the machine
                let machine =
                    MachineBinary::try_from("0RB0LB_1LA1RB_1LB0LD_0RA1RE_0LE---").unwrap();
                for state in 1..=5 {
                    if witness & (1 << (state - 1)) == 0 {
                        continue;
                    }
                    assert!(!machine.has_undefined_transition(state));
                    for symbol in 0..2 {
                        let tr = machine.transition_for_state_symbol(state, symbol);
                        assert!(!tr.is_halt());
                        let next = tr.state() as usize;
                        assert_ne!(0, witness & (1 << (next - 1)), "witness not closed");
                    }
                }
            }
            _ => panic!("expected closed-state witness, got {status}"),
        }
    }

    #[test]
    fn closed_states_no_when_all_states_reach_halt() {
        // BB5 champion: every state reaches E0, the undefined transition.
        let status = decide("1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA");
        assert_eq!(
            MachineStatus::CannotProve(CannotProveReason::DeciderNoResult),
            status
        );
    }

    #[test]
    fn closed_states_yes_on_machine_without_halt_transition() {
        let status = decide("1RB1LB_1LA1RA");
        assert!(status.is_non_halt());
    }

    #[test]
    fn closed_states_simple_runner() {
        let machine = NotableMachine::EndlessSimple.machine();
        let config = Config::new_default(machine.n_states());
        // A0 loops on A but A1 is undefined: A itself holds the halting transition
        let status = DeciderClosedStates::decide_single_machine(&machine, &config);
        assert_eq!(
            MachineStatus::CannotProve(CannotProveReason::DeciderNoResult),
            status
        );
    }
}
