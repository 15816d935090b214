//! Finite automata reduction as a decider, plus the DVF entry workflows:
//! verifying every certificate of a DVF file against the machine DB,
//! re-solving each certificate's DFA and comparing the result against the
//! stored matrices, and emitting fresh certificates for solved machines. \
//! Per-entry failures are recorded and the run continues; structural file
//! errors abort with the error.

use crate::{
    config::Config,
    data_provider::db_reader::DbReader,
    decider::{
        self,
        decider_result::{BatchData, ResultUnitEndReason},
        Decider, DeciderId, DECIDER_FAR_ID,
    },
    error::FileFormatError,
    far::{
        dvf::{DvfReader, DvfWriter},
        solver::{proof_resolves_identically, solve_machine},
        verifier::verify_far_proof,
        FarProof,
    },
    machine_binary::{MachineBinary, MachineId},
    status::{CannotProveReason, MachineStatus, NonHaltReason},
};

#[derive(Debug)]
pub struct DeciderFar {
    dfa_limit: usize,
}

impl DeciderFar {
    pub fn new(config: &Config) -> Self {
        Self {
            dfa_limit: config.far_dfa_limit(),
        }
    }

    /// Like [Decider::decide_machine] but also returns the certificate.
    pub fn decide_machine_with_proof(
        &mut self,
        machine: &MachineBinary,
    ) -> (MachineStatus, Option<FarProof>) {
        match solve_machine(machine, self.dfa_limit) {
            Some(proof) => {
                let status = MachineStatus::DecidedNonHalt(NonHaltReason::FiniteAutomataReduction(
                    proof.dfa.n_states(),
                    proof.direction,
                ));
                (status, Some(proof))
            }
            None => (
                MachineStatus::CannotProve(CannotProveReason::DfaLimitReached),
                None,
            ),
        }
    }
}

impl Decider for DeciderFar {
    fn decider_id() -> &'static DeciderId {
        &DECIDER_FAR_ID
    }

    fn decide_machine(&mut self, machine: &MachineBinary) -> MachineStatus {
        self.decide_machine_with_proof(machine).0
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

/// Why one DVF entry failed its check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DvfEntryFailure {
    /// A verifier condition (1..=8) did not hold.
    ProofCheckFailed(u8),
    /// Re-solving the entry's DFA produced a different result.
    SolverMismatch,
}

/// Outcome of a whole-file DVF run.
#[derive(Debug, Default)]
pub struct DvfRunSummary {
    pub entries: u32,
    pub passed: u32,
    /// DFA_ONLY entries carry no NFA proof body and are skipped.
    pub skipped: u32,
    /// (entry index, machine id, failure)
    pub failed: Vec<(u32, u32, DvfEntryFailure)>,
}

impl DvfRunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Verifies the DVF file configured in config.toml against the configured
/// machine DB.
pub fn verify_dvf_toml_paths() -> Result<DvfRunSummary, FileFormatError> {
    let mut db = DbReader::try_new_toml_path()?;
    let mut dvf = DvfReader::try_new_toml_path()?;
    verify_dvf_entries(&mut db, &mut dvf)
}

/// Re-solves the DVF file configured in config.toml against the configured
/// machine DB.
pub fn check_dvf_toml_paths() -> Result<DvfRunSummary, FileFormatError> {
    let mut db = DbReader::try_new_toml_path()?;
    let mut dvf = DvfReader::try_new_toml_path()?;
    check_dvf_entries(&mut db, &mut dvf)
}

/// Verifies every entry of a DVF file against the machine DB. Failing entries
/// are recorded and the run continues; structural errors abort.
pub fn verify_dvf_entries(
    db: &mut DbReader,
    dvf: &mut DvfReader,
) -> Result<DvfRunSummary, FileFormatError> {
    run_dvf_entries(db, dvf, |machine, proof| {
        match verify_far_proof(machine, proof) {
            Ok(()) => None,
            Err(failure) => Some(DvfEntryFailure::ProofCheckFailed(failure.0)),
        }
    })
}

/// Re-runs the solver on each DVF entry's DFA and compares against the stored
/// matrices and accept vector.
pub fn check_dvf_entries(
    db: &mut DbReader,
    dvf: &mut DvfReader,
) -> Result<DvfRunSummary, FileFormatError> {
    run_dvf_entries(db, dvf, |machine, proof| {
        if proof_resolves_identically(machine, proof) {
            None
        } else {
            Some(DvfEntryFailure::SolverMismatch)
        }
    })
}

fn run_dvf_entries(
    db: &mut DbReader,
    dvf: &mut DvfReader,
    check: impl Fn(&MachineBinary, &FarProof) -> Option<DvfEntryFailure>,
) -> Result<DvfRunSummary, FileFormatError> {
    let mut summary = DvfRunSummary {
        entries: dvf.n_entries(),
        ..Default::default()
    };

    let mut index = 0u32;
    while let Some(entry) = dvf.read_entry_next()? {
        match &entry.proof {
            None => summary.skipped += 1,
            Some(proof) => {
                let machine = db.read_machine(entry.header.machine_id as u64)?;
                match check(machine.machine(), proof) {
                    None => summary.passed += 1,
                    Some(failure) => {
                        summary
                            .failed
                            .push((index, entry.header.machine_id, failure));
                    }
                }
            }
        }
        index += 1;
    }
    Ok(summary)
}

/// Runs the FAR solver over the given machines and writes a DVF entry for
/// every proven one. Returns the ids of the proven machines.
pub fn solve_machines_to_dvf(
    machines: &[MachineId],
    dfa_limit: usize,
    dvf_path: &str,
) -> Result<Vec<u64>, FileFormatError> {
    let mut writer = DvfWriter::create(dvf_path)?;
    let mut proven = Vec::new();
    for machine_id in machines {
        if let Some(proof) = solve_machine(machine_id.machine(), dfa_limit) {
            writer.write_proof(machine_id.id() as u32, &proof)?;
            proven.push(machine_id.id());
        }
    }
    writer.finish()?;
    Ok(proven)
}
