//! Result collection of a decider run: outcome counters, the machine with the
//! longest halting run and optionally some undecided machines in full for
//! later analysis.

use std::fmt::Display;
use std::time::Duration;

use num_format::ToFormattedString;

use crate::{
    config::{user_locale, Config, StepBig},
    data_provider::EndReason,
    machine_binary::MachineId,
    status::MachineStatus,
    utils::duration_as_ms_rounded,
};

pub type ResultUnitEndReason = Result<(), EndReason>;

/// Working data of one batch run: the machines to decide and the result collector.
#[derive(Debug)]
pub struct BatchData<'a> {
    pub batch_no: usize,
    pub machines: Vec<MachineId>,
    pub result: DeciderResultStats,
    pub config: &'a Config,
}

impl<'a> BatchData<'a> {
    pub fn new(batch_no: usize, machines: Vec<MachineId>, config: &'a Config) -> Self {
        Self {
            batch_no,
            machines,
            result: DeciderResultStats::new(config),
            config,
        }
    }
}

/// Accumulated outcomes of a decider run. Merging two stats objects (e.g. from
/// worker threads) is associative, so the merged totals do not depend on the
/// merge order; the undecided sample keeps the first `limit` machines in the
/// order the results are merged.
#[derive(Debug, Clone)]
pub struct DeciderResultStats {
    num_total: u64,
    num_halts: u64,
    num_non_halt: u64,
    num_cannot_prove: u64,
    /// Longest halting run seen, with the machine.
    max_halt_steps: StepBig,
    machine_max_halt: Option<MachineId>,
    /// Undecided machines kept in full, capped by config limit_machines_undecided.
    machines_undecided: Vec<(MachineId, MachineStatus)>,
    limit_machines_undecided: usize,
    duration: Duration,
}

impl DeciderResultStats {
    pub fn new(config: &Config) -> Self {
        Self {
            num_total: 0,
            num_halts: 0,
            num_non_halt: 0,
            num_cannot_prove: 0,
            max_halt_steps: 0,
            machine_max_halt: None,
            machines_undecided: Vec::new(),
            limit_machines_undecided: config.limit_machines_undecided(),
            duration: Duration::default(),
        }
    }

    pub fn add(&mut self, machine: &MachineId, status: &MachineStatus) {
        self.num_total += 1;
        match status {
            MachineStatus::DecidedHalts(steps) => {
                self.num_halts += 1;
                if *steps > self.max_halt_steps {
                    self.max_halt_steps = *steps;
                    self.machine_max_halt = Some(*machine);
                }
            }
            MachineStatus::DecidedNonHalt(_) => self.num_non_halt += 1,
            _ => {
                self.num_cannot_prove += 1;
                if self.machines_undecided.len() < self.limit_machines_undecided {
                    self.machines_undecided.push((*machine, *status));
                }
            }
        }
    }

    /// Merges the result of another run (e.g. one worker's batch) into this one.
    pub fn add_result(&mut self, other: &DeciderResultStats) {
        self.num_total += other.num_total;
        self.num_halts += other.num_halts;
        self.num_non_halt += other.num_non_halt;
        self.num_cannot_prove += other.num_cannot_prove;
        if other.max_halt_steps > self.max_halt_steps {
            self.max_halt_steps = other.max_halt_steps;
            self.machine_max_halt = other.machine_max_halt;
        }
        for (machine, status) in other.machines_undecided.iter() {
            if self.machines_undecided.len() >= self.limit_machines_undecided {
                break;
            }
            self.machines_undecided.push((*machine, *status));
        }
    }

    pub fn num_total(&self) -> u64 {
        self.num_total
    }

    pub fn num_halts(&self) -> u64 {
        self.num_halts
    }

    pub fn num_non_halt(&self) -> u64 {
        self.num_non_halt
    }

    pub fn num_cannot_prove(&self) -> u64 {
        self.num_cannot_prove
    }

    pub fn max_halt_steps(&self) -> StepBig {
        self.max_halt_steps
    }

    pub fn machine_max_halt(&self) -> Option<&MachineId> {
        self.machine_max_halt.as_ref()
    }

    pub fn machines_undecided(&self) -> &[(MachineId, MachineStatus)] {
        &self.machines_undecided
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn to_string_with_duration(&self) -> String {
        format!(
            "{self}\nDuration: {} ms",
            duration_as_ms_rounded(self.duration)
        )
    }
}

impl Display for DeciderResultStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locale = &user_locale();
        write!(
            f,
            "Total: {}, halts: {}, non-halt: {}, cannot prove: {}",
            self.num_total.to_formatted_string(locale),
            self.num_halts.to_formatted_string(locale),
            self.num_non_halt.to_formatted_string(locale),
            self.num_cannot_prove.to_formatted_string(locale),
        )?;
        if let Some(machine) = &self.machine_max_halt {
            write!(
                f,
                "\nLongest halting run: {} steps by {}",
                self.max_halt_steps.to_formatted_string(locale),
                machine
            )?;
        }
        Ok(())
    }
}
