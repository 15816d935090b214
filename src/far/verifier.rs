//! FAR certificate verifier: eight algebraic closure conditions over
//! (DFA, NFA transition matrices, accept vector). All comparisons are
//! boolean matrix/vector operations; PASS means the certificate proves
//! the machine non-halting.

use std::fmt::Display;

use crate::{
    far::{nfa_state, nfa_state_count, solver::flipped_transitions, FarProof},
    machine_binary::MachineBinary,
};

/// A failed closure condition, numbered 1..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarConditionFailed(pub u8);

impl std::error::Error for FarConditionFailed {}

impl Display for FarConditionFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FAR proof check failed: condition {}", self.0)
    }
}

/// Checks the eight closure conditions; Ok(()) is PASS.
///
/// 1. delta(0,0) = 0 (leading zeros ignored)
/// 2. T0 * a^T = a^T (trailing zeros ignored)
/// 3. the sink is accepting
/// 4. the sink is steady on both symbols
/// 5. halting transitions feed the sink from every DFA state
/// 6. left-going transitions are closed under the product rule
/// 7. right-going transitions are present
/// 8. the initial configuration is rejected
pub fn verify_far_proof(machine: &MachineBinary, proof: &FarProof) -> Result<(), FarConditionFailed> {
    let d = proof.dfa.n_states();
    let n = nfa_state_count(d);
    let sink = n - 1;
    debug_assert_eq!(n, proof.nfa[0].n());
    debug_assert_eq!(n, proof.accept.len());

    // Condition 1 (leading zeros ignored)
    if proof.dfa.step(0, 0) != 0 {
        return Err(FarConditionFailed(1));
    }

    // Condition 2 (trailing zeros ignored): T0 a^T = a^T
    if proof.nfa[0].product_vec(&proof.accept) != proof.accept {
        return Err(FarConditionFailed(2));
    }

    // Condition 3 (steady state is accepting)
    if !proof.accept.get(sink) {
        return Err(FarConditionFailed(3));
    }

    // Condition 4 (steady state is steady)
    if !(proof.nfa[0].get(sink, sink) && proof.nfa[1].get(sink, sink)) {
        return Err(FarConditionFailed(4));
    }

    // One condition to check per machine transition rule, with the moves
    // mirrored when the scan direction is right to left.
    for t in flipped_transitions(machine, proof.direction).iter() {
        match t.defined {
            // Condition 5: halting transition reaches the sink from every DFA state
            None => {
                for i in 0..d {
                    if !proof.nfa[t.read_symbol].get(nfa_state(i, t.from_state), sink) {
                        return Err(FarConditionFailed(5));
                    }
                }
            }
            // Condition 6: left-going transition,
            // R_r[delta(i,b)f, :] must cover (R_b R_w)[i f', :] for both b
            Some((write, false, goto)) => {
                for b in 0..2 {
                    let product = proof.nfa[b].product(&proof.nfa[write]);
                    for i in 0..d {
                        let row_covering = nfa_state(proof.dfa.step(i, b), t.from_state);
                        let row_covered = product.row(nfa_state(i, goto));
                        if !proof.nfa[t.read_symbol].row_is_superset(row_covering, row_covered) {
                            return Err(FarConditionFailed(6));
                        }
                    }
                }
            }
            // Condition 7: right-going transition is present for every DFA state
            Some((write, true, goto)) => {
                for i in 0..d {
                    if !proof.nfa[t.read_symbol].get(
                        nfa_state(i, t.from_state),
                        nfa_state(proof.dfa.step(i, write), goto),
                    ) {
                        return Err(FarConditionFailed(7));
                    }
                }
            }
        }
    }

    // Condition 8 (initial configuration rejected)
    if proof.accept.get(0) {
        return Err(FarConditionFailed(8));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::far::{bit_matrix::BitRow, solver::solve_machine, Dfa, ScanDirection};

    fn proven_proof() -> (MachineBinary, FarProof) {
        let machine = MachineBinary::try_from("1RB1LB_1LA1RA").unwrap();
        let proof = solve_machine(&machine, 1).unwrap();
        (machine, proof)
    }

    #[test]
    fn far_verifier_passes_solver_output() {
        let (machine, proof) = proven_proof();
        assert_eq!(Ok(()), verify_far_proof(&machine, &proof));
    }

    #[test]
    fn far_verifier_condition_1_dfa_start_loop() {
        let (machine, _) = proven_proof();
        // delta(0,0) != 0 is checked before anything else
        let n = crate::far::nfa_state_count(2);
        let bad = FarProof {
            direction: ScanDirection::LeftToRight,
            dfa: Dfa::new(vec![[1, 0], [0, 0]]),
            nfa: [
                crate::far::bit_matrix::BitMatrix::new(n),
                crate::far::bit_matrix::BitMatrix::new(n),
            ],
            accept: BitRow::new(n),
        };
        assert_eq!(Err(FarConditionFailed(1)), verify_far_proof(&machine, &bad));
    }

    #[test]
    fn far_verifier_condition_3_and_8_on_tampered_accept() {
        let (machine, proof) = proven_proof();
        // clear the sink bit: condition 2 already notices the broken propagation
        // or condition 3 the missing sink, depending on the accept content
        let mut tampered = proof.clone();
        tampered.accept = BitRow::new(proof.accept.len());
        let r = verify_far_proof(&machine, &tampered);
        assert!(matches!(r, Err(FarConditionFailed(2)) | Err(FarConditionFailed(3))));

        // set the initial state accepting: condition 8 must fire (2 may fire
        // first if the acceptance no longer propagates)
        let mut tampered = proof.clone();
        tampered.accept.set(0);
        let r = verify_far_proof(&machine, &tampered);
        assert!(matches!(r, Err(FarConditionFailed(2)) | Err(FarConditionFailed(8))));
    }

    #[test]
    fn far_verifier_condition_4_on_cleared_sink_loop() {
        let (machine, proof) = proven_proof();
        let mut tampered = proof.clone();
        let n = tampered.nfa[1].n();
        // rebuild T1 without the sink self-loop
        let mut t1 = crate::far::bit_matrix::BitMatrix::new(n);
        for i in 0..n {
            for j in 0..n {
                if proof.nfa[1].get(i, j) && !(i == n - 1 && j == n - 1) {
                    t1.set(i, j);
                }
            }
        }
        tampered.nfa[1] = t1;
        assert_eq!(Err(FarConditionFailed(4)), verify_far_proof(&machine, &tampered));
    }

    #[test]
    fn far_verifier_condition_7_on_cleared_right_edge() {
        let machine = MachineBinary::try_from("1RB1LB_1LA1RA").unwrap();
        let proof = solve_machine(&machine, 1).unwrap();
        let n = proof.nfa[0].n();
        // drop the A0 -> 1RB edge from T0: condition 7 must fire
        let mut tampered = proof.clone();
        let mut t0 = crate::far::bit_matrix::BitMatrix::new(n);
        for i in 0..n {
            for j in 0..n {
                if proof.nfa[0].get(i, j) && !(i == nfa_state(0, 0) && j == nfa_state(0, 1)) {
                    t0.set(i, j);
                }
            }
        }
        tampered.nfa[0] = t0;
        // A0 is the first transition checked and it moves right
        assert_eq!(Err(FarConditionFailed(7)), verify_far_proof(&machine, &tampered));
    }

    #[test]
    fn far_verifier_scan_direction_mirrors_moves() {
        // mirrored machine of 1RB1LB_1LA1RA, provable scanning right to left as well
        let machine = MachineBinary::try_from("1LB1RB_1RA1LA").unwrap();
        let proof =
            crate::far::solver::search_dfa_with_n_states(&machine, 1, ScanDirection::RightToLeft)
                .expect("must be provable right to left");
        assert_eq!(Ok(()), verify_far_proof(&machine, &proof));
    }
}
