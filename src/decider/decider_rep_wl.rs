//! RepWL decider (repeated word list): explores the graph of regex tapes
//! reachable from the abstraction of the blank tape. Each node is advanced by
//! one block macro-step; a node whose head faces a plus block splits into its
//! two branch successors instead. The search is depth-first over normalised
//! tape fingerprints. \
//! An empty stack means every reachable regex tape has been visited and none
//! of them admits a halting transition, which proves non-halting: a plus
//! block (B)^k+ denotes every concrete count >= k, and the two branches
//! partition that set into "one concrete copy in front, at least k behind"
//! versus "exactly k copies". \
//! Halt during a block simulation, a simulation timeout and the visited-tape
//! cap all end the attempt with CannotProve.

use hashbrown::HashSet;

use crate::{
    config::{Config, StepSmall},
    decider::{
        self,
        decider_result::{BatchData, ResultUnitEndReason},
        Decider, DeciderId, DECIDER_REP_WL_ID,
    },
    machine_binary::MachineBinary,
    status::{CannotProveReason, MachineStatus, NonHaltReason},
    tape::regex_tape::{MacroStepAbort, RegexTape},
};

#[derive(Debug)]
pub struct DeciderRepWl {
    block_len: usize,
    plus_threshold: usize,
    max_visited: usize,
    block_sim_steps: StepSmall,
}

impl DeciderRepWl {
    pub fn new(config: &Config) -> Self {
        Self {
            block_len: config.rep_wl_block_len(),
            plus_threshold: config.rep_wl_plus_threshold(),
            max_visited: config.rep_wl_max_visited(),
            block_sim_steps: config.rep_wl_block_sim_steps(),
        }
    }
}

impl Decider for DeciderRepWl {
    fn decider_id() -> &'static DeciderId {
        &DECIDER_REP_WL_ID
    }

    fn decide_machine(&mut self, machine: &MachineBinary) -> MachineStatus {
        let mut visited: HashSet<String> = HashSet::new();
        let mut to_visit: Vec<RegexTape> =
            vec![RegexTape::initial(self.block_len, self.plus_threshold)];

        while let Some(mut tape) = to_visit.pop() {
            let fingerprint = tape.fingerprint();
            if visited.contains(&fingerprint) {
                continue;
            }
            visited.insert(fingerprint);

            if visited.len() > self.max_visited {
                return MachineStatus::CannotProve(CannotProveReason::VisitedTapeLimit);
            }

            #[cfg(feature = "debug_rep_wl")]
            println!("visiting {tape}");

            match tape.macro_step(machine, self.block_sim_steps) {
                Ok(()) => to_visit.push(tape),
                Err(MacroStepAbort::Halted) => {
                    return MachineStatus::CannotProve(CannotProveReason::HaltReachable)
                }
                Err(MacroStepAbort::Timeout) => {
                    return MachineStatus::CannotProve(CannotProveReason::BlockSimulationTimeout)
                }
                Err(MacroStepAbort::FacingPlus) => {
                    let [keep_plus, drop_plus] = tape.plus_branches();
                    to_visit.push(keep_plus);
                    to_visit.push(drop_plus);
                }
            }
        }

        MachineStatus::DecidedNonHalt(NonHaltReason::RegexTapeClosure(visited.len()))
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
