//! The decider framework: every decision procedure implements [Decider] and is
//! a pure per-machine function with no shared mutable state across machines;
//! each invocation is deterministic and depends only on its inputs. The batch
//! entry points plug the deciders into [decider_engine].

pub mod decider_closed_states;
pub mod decider_engine;
pub mod decider_far;
pub mod decider_loop;
pub mod decider_ngram_cps;
pub mod decider_rep_wl;
pub mod decider_result;
pub mod ngram_alphabet;

use std::sync::Arc;

use crate::{
    config::Config,
    decider::{
        decider_closed_states::DeciderClosedStates,
        decider_far::DeciderFar,
        decider_loop::DeciderLoop,
        decider_ngram_cps::DeciderNGramCps,
        decider_rep_wl::DeciderRepWl,
        decider_result::{BatchData, ResultUnitEndReason},
    },
    machine_binary::MachineBinary,
    status::MachineStatus,
};

// Deciders in this library
pub const DECIDER_CLOSED_STATES_ID: DeciderId = DeciderId {
    id: 10,
    name: "Decider Closed States",
};
pub const DECIDER_LOOP_ID: DeciderId = DeciderId {
    id: 20,
    name: "Decider Loop",
};
pub const DECIDER_NGRAM_CPS_ID: DeciderId = DeciderId {
    id: 30,
    name: "Decider NGramCPS",
};
pub const DECIDER_REP_WL_ID: DeciderId = DeciderId {
    id: 40,
    name: "Decider RepWL",
};
pub const DECIDER_FAR_ID: DeciderId = DeciderId {
    id: 50,
    name: "Decider FAR",
};

pub type FnDeciderRunBatch = fn(&mut BatchData) -> ResultUnitEndReason;

/// These are the provided deciders. This library should enable you to write your own decider.
#[derive(Debug, Clone, Copy)]
pub enum DeciderStandard {
    ClosedStates,
    Loop,
    NGramCps,
    RepWl,
    Far,
}

impl DeciderStandard {
    pub fn decider_config<'a>(&self, config: &'a Config) -> DeciderConfig<'a> {
        match self {
            DeciderStandard::ClosedStates => DeciderConfig::new(
                &DECIDER_CLOSED_STATES_ID,
                DeciderClosedStates::decider_run_batch,
                config,
            ),
            DeciderStandard::Loop => {
                DeciderConfig::new(&DECIDER_LOOP_ID, DeciderLoop::decider_run_batch, config)
            }
            DeciderStandard::NGramCps => DeciderConfig::new(
                &DECIDER_NGRAM_CPS_ID,
                DeciderNGramCps::decider_run_batch,
                config,
            ),
            DeciderStandard::RepWl => {
                DeciderConfig::new(&DECIDER_REP_WL_ID, DeciderRepWl::decider_run_batch, config)
            }
            DeciderStandard::Far => {
                DeciderConfig::new(&DECIDER_FAR_ID, DeciderFar::decider_run_batch, config)
            }
        }
    }
}

/// This struct is used to chain the deciders, e.g. closed states first, then
/// the loop decider with a small step limit, then the heavier abstractions.
#[derive(Debug, Clone)]
pub struct DeciderConfig<'a> {
    decider_id: &'a DeciderId,
    f_decider_run_batch: FnDeciderRunBatch,
    config: Arc<&'a Config>,
}

impl<'a> DeciderConfig<'a> {
    pub fn new(
        decider_id: &'a DeciderId,
        f_decider: FnDeciderRunBatch,
        config: &'a Config,
    ) -> Self {
        Self {
            decider_id,
            f_decider_run_batch: f_decider,
            config: Arc::new(config),
        }
    }

    pub fn f_decider(&self) -> FnDeciderRunBatch {
        self.f_decider_run_batch
    }

    pub fn config(&self) -> &'a Config {
        *self.config
    }

    pub fn decider_id(&self) -> &DeciderId {
        self.decider_id
    }
}

/// Decider identification. As only the function to run the decider is passed,
/// the id can not be requested and needs to be part of the DeciderConfig.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeciderId {
    pub id: usize,
    pub name: &'static str,
}

pub trait Decider {
    fn decider_id() -> &'static DeciderId;

    /// Returns the result of this decider for one single machine. \
    /// Each run must clear self variables as the decider is re-used for all machines (in a batch).
    fn decide_machine(&mut self, machine: &MachineBinary) -> MachineStatus;

    /// Allows to test a single machine. This is just a convenience function, where a decider
    /// is created and one machine is run. This causes more overhead than setting up the decider once
    /// and use it for multiple machines.
    fn decide_single_machine(machine: &MachineBinary, config: &Config) -> MachineStatus;

    fn decider_run_batch(batch_data: &mut BatchData) -> ResultUnitEndReason;
}

/// Runs one decider over all machines of a batch and collects the outcomes.
#[inline]
pub fn decider_generic_run_batch(
    mut decider: impl Decider,
    batch_data: &mut BatchData,
) -> ResultUnitEndReason {
    if batch_data.machines.is_empty() {
        return Err(crate::data_provider::EndReason::NoMoreData);
    }

    for machine_id in batch_data.machines.iter() {
        let status = decider.decide_machine(machine_id.machine());
        batch_data.result.add(machine_id, &status);
    }

    Ok(())
}
