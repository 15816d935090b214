//! Regex tape of the RepWL decider: both tape sides are lists of blocks
//! `(B)^k` or `(B)^k+`, where B is a fixed binary word of the configured block
//! length and `+` means "k or more". Implicit infinite zeros bound both ends. \
//! Two invariants are re-established after every mutation (compress + generalise):
//! adjacent blocks with the same word are merged, and any repeat count at or
//! above the plus threshold becomes `(B)^T+`. \
//! The canonical display string doubles as the fingerprint of a tape in the
//! RepWL visited set.

use std::fmt::Display;

use crate::{
    config::StepSmall,
    machine_binary::{MachineBinary, StateType},
    tape::segment_tape::{SegmentStep, SegmentTape},
};

/// One run of a repeated word: `(B)^repeat` or `(B)^repeat+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexBlock {
    /// The fixed binary word, leftmost symbol first.
    pub word: Vec<u8>,
    /// Repeat count, always >= 1.
    pub repeat: usize,
    /// "repeat or more"
    pub plus: bool,
}

impl RegexBlock {
    pub fn new(word: Vec<u8>, repeat: usize, plus: bool) -> Self {
        debug_assert!(repeat > 0);
        Self { word, repeat, plus }
    }

    fn zero_block(block_len: usize) -> Self {
        Self::new(vec![0; block_len], 1, false)
    }

    /// Concrete finite tape holding `word` repeated `repeat` times, the head at
    /// the extremity it entered from, the opposite side empty, hard extremities.
    /// Must not be called on a plus block, that case branches instead.
    fn materialise(&self, state: StateType, looking_after: bool) -> SegmentTape {
        debug_assert!(!self.plus);
        let mut cells = Vec::with_capacity(self.word.len() * self.repeat);
        for _ in 0..self.repeat {
            cells.extend_from_slice(&self.word);
        }
        if looking_after {
            SegmentTape::new_finite(Vec::new(), state, &cells, true)
        } else {
            SegmentTape::new_finite(cells, state, &[], false)
        }
    }
}

impl Display for RegexBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for symbol in self.word.iter() {
            write!(f, "{symbol}")?;
        }
        write!(f, ")^{}{}", self.repeat, if self.plus { "+" } else { "" })
    }
}

/// Why a macro-step could not complete.
#[derive(Debug, PartialEq, Eq)]
pub enum MacroStepAbort {
    /// The machine halted inside the block simulation.
    Halted,
    /// The block simulation did not leave the block within the step budget.
    Timeout,
    /// The head faces a plus block; the search splits into two branches instead.
    FacingPlus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexTape {
    /// Blocks left of the head, leftmost first, the block next to the head is the last element.
    before: Vec<RegexBlock>,
    /// Blocks right of the head, stored reversed: the block next to the head is the last element.
    after: Vec<RegexBlock>,
    state: StateType,
    looking_after: bool,
    block_len: usize,
    plus_threshold: usize,
}

impl RegexTape {
    /// Abstraction of the blank starting tape: no blocks, state A, facing right.
    pub fn initial(block_len: usize, plus_threshold: usize) -> Self {
        Self::from_segment(&SegmentTape::new_blank(), block_len, plus_threshold)
    }

    /// Abstracts a concrete tape: each side is padded with zeros on its outer
    /// end to a multiple of the block length, chunked into words, every chunk
    /// with count 1, then normalised.
    pub fn from_segment(tape: &SegmentTape, block_len: usize, plus_threshold: usize) -> Self {
        let before = Self::chunk_side(tape.before_cells().to_vec(), block_len, true);
        let after_natural = Self::chunk_side(tape.after_cells_natural(), block_len, false);

        let mut regex_tape = Self {
            before,
            // natural order is block-next-to-head first; stored reversed
            after: after_natural.into_iter().rev().collect(),
            state: tape.state(),
            looking_after: tape.is_looking_after(),
            block_len,
            plus_threshold,
        };
        regex_tape.compress_and_generalise();
        regex_tape
    }

    /// Pads and chunks one tape side. `cells` is given head-outward for the
    /// right side and leftmost-first for the left side; `pad_front` selects
    /// where the outer end is. Returns blocks in the same orientation as `cells`.
    fn chunk_side(mut cells: Vec<u8>, block_len: usize, pad_front: bool) -> Vec<RegexBlock> {
        let pad = (block_len - cells.len() % block_len) % block_len;
        if pad > 0 {
            if pad_front {
                let mut padded = vec![0; pad];
                padded.append(&mut cells);
                cells = padded;
            } else {
                cells.extend(std::iter::repeat(0).take(pad));
            }
        }
        cells
            .chunks(block_len)
            .map(|chunk| RegexBlock::new(chunk.to_vec(), 1, false))
            .collect()
    }

    pub fn state(&self) -> StateType {
        self.state
    }

    pub fn is_looking_after(&self) -> bool {
        self.looking_after
    }

    pub fn block_count(&self) -> usize {
        self.before.len() + self.after.len()
    }

    /// Glue powers of the same word together, e.g. (110)^3 (110)^4 -> (110)^7,
    /// and keep "at least" powers, e.g. (110)^3 (110)^4+ -> (110)^7+.
    fn compress(&mut self) {
        for side in [&mut self.before, &mut self.after] {
            let mut merged: Vec<RegexBlock> = Vec::with_capacity(side.len());
            for block in side.drain(..) {
                match merged.last_mut() {
                    Some(last) if last.word == block.word => {
                        last.repeat += block.repeat;
                        last.plus = last.plus || block.plus;
                    }
                    _ => merged.push(block),
                }
            }
            *side = merged;
        }
    }

    /// Replace powers by "at least" versions once they reach the plus threshold.
    fn generalise(&mut self) {
        for side in [&mut self.before, &mut self.after] {
            for block in side.iter_mut() {
                if block.repeat >= self.plus_threshold {
                    block.plus = true;
                    block.repeat = self.plus_threshold;
                }
            }
        }
    }

    pub fn compress_and_generalise(&mut self) {
        self.compress();
        self.generalise();
    }

    /// The block directly in front of the head; a fresh all-zero block when the
    /// faced side has no stored blocks (the implicit zeros).
    pub fn read_block(&self) -> RegexBlock {
        let faced = if self.looking_after {
            self.after.last()
        } else {
            self.before.last()
        };
        match faced {
            Some(block) => block.clone(),
            None => RegexBlock::zero_block(self.block_len),
        }
    }

    /// Replaces the faced block with the given blocks (leftmost first). The
    /// faced side may be empty, then the blocks are simply written onto the
    /// implicit zeros.
    fn write_blocks(&mut self, blocks: Vec<RegexBlock>) {
        assert!(!blocks.is_empty());
        if self.looking_after {
            if self.after.is_empty() {
                self.after.extend(blocks.into_iter().rev());
            } else {
                let last = self.after.len() - 1;
                let mut iter = blocks.into_iter().rev();
                self.after[last] = iter.next().unwrap();
                self.after.extend(iter);
            }
        } else if self.before.is_empty() {
            self.before.extend(blocks);
        } else {
            let last = self.before.len() - 1;
            let mut iter = blocks.into_iter();
            self.before[last] = iter.next().unwrap();
            self.before.extend(iter);
        }
    }

    /// Moves the head over `n_blocks` blocks, or just turns it around when it
    /// was facing the other way.
    fn move_head(&mut self, move_right: bool, n_blocks: usize) {
        if move_right {
            if !self.looking_after {
                self.looking_after = true;
            } else {
                for _ in 0..n_blocks {
                    match self.after.pop() {
                        Some(block) => self.before.push(block),
                        None => break,
                    }
                }
            }
        } else if self.looking_after {
            self.looking_after = false;
        } else {
            for _ in 0..n_blocks {
                match self.before.pop() {
                    Some(block) => self.after.push(block),
                    None => break,
                }
            }
        }
    }

    /// One macro-step: materialise the faced block, run the machine inside the
    /// finite region until the head exits, then write the re-abstracted region
    /// back and move the head past it. Normalises afterwards.
    pub fn macro_step(
        &mut self,
        machine: &MachineBinary,
        block_sim_steps: StepSmall,
    ) -> Result<(), MacroStepAbort> {
        let block = self.read_block();
        if block.plus {
            return Err(MacroStepAbort::FacingPlus);
        }

        let mut segment = block.materialise(self.state, self.looking_after);
        let mut steps: StepSmall = 0;
        loop {
            if steps >= block_sim_steps {
                return Err(MacroStepAbort::Timeout);
            }
            match segment.step(machine) {
                SegmentStep::Moved => steps += 1,
                SegmentStep::Halted => return Err(MacroStepAbort::Halted),
                SegmentStep::AtExtremity => break,
            }
        }

        let region = Self::from_segment(&segment, self.block_len, self.plus_threshold);
        let exit_right = segment.is_looking_after();
        let blocks = if exit_right {
            // the head left the region to the right, its content is the before side
            region.before
        } else {
            // reversed storage back to leftmost-first
            region.after.into_iter().rev().collect()
        };
        let n_blocks = blocks.len();

        self.write_blocks(blocks);
        self.move_head(exit_right, n_blocks);
        self.state = segment.state();
        self.compress_and_generalise();

        Ok(())
    }

    /// The two successors for a faced plus block `(B)^k+`:
    /// one concrete copy split off in front of the still-intact plus block,
    /// and the fully concrete reading `(B)^k` (with one copy split off when k > 1).
    /// The successors are intentionally not normalised: compressing them would
    /// merge the split-off block straight back into the plus block.
    pub fn plus_branches(&self) -> [RegexTape; 2] {
        let block = self.read_block();
        assert!(block.plus);

        let single = RegexBlock::new(block.word.clone(), 1, false);

        let mut keep_plus = self.clone();
        let mut drop_plus = self.clone();
        {
            let faced = if self.looking_after {
                &mut keep_plus.after
            } else {
                &mut keep_plus.before
            };
            faced.push(single.clone());
        }
        {
            let faced = if self.looking_after {
                &mut drop_plus.after
            } else {
                &mut drop_plus.before
            };
            let last = faced.last_mut().expect("plus block was just read");
            last.plus = false;
            if last.repeat > 1 {
                last.repeat -= 1;
                faced.push(single);
            }
        }

        [keep_plus, drop_plus]
    }

    /// Canonical form, used as the fingerprint in the visited set.
    pub fn fingerprint(&self) -> String {
        self.to_string()
    }
}

impl Display for RegexTape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0∞ ")?;
        for block in self.before.iter() {
            write!(f, "{block} ")?;
        }
        if self.looking_after {
            write!(f, "{}>", (self.state as u8 + b'A' - 1) as char)?;
        } else {
            write!(f, "<{}", (self.state as u8 + b'A' - 1) as char)?;
        }
        for block in self.after.iter().rev() {
            write!(f, " {block}")?;
        }
        write!(f, " 0∞")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tape_from_cells(
        before: &[u8],
        state: StateType,
        after: &[u8],
        block_len: usize,
        plus_threshold: usize,
    ) -> RegexTape {
        let segment = SegmentTape::new_finite(before.to_vec(), state, after, true);
        RegexTape::from_segment(&segment, block_len, plus_threshold)
    }

    #[test]
    fn regex_tape_abstraction_compresses_and_generalises() {
        let tape = tape_from_cells(
            &[1, 0, 1, 0, 1, 0, 1, 1, 1],
            1,
            &[1, 0, 1, 0, 1, 1, 1, 1, 1, 1],
            2,
            3,
        );
        assert_eq!("0∞ (01)^3+ (11)^1 A> (10)^2 (11)^3+ 0∞", tape.to_string());
    }

    #[test]
    fn regex_tape_normalisation_is_idempotent() {
        let mut tape = tape_from_cells(&[1, 1, 1, 1, 1, 1, 0, 1], 2, &[0, 1, 0, 1], 2, 3);
        let once = tape.to_string();
        tape.compress_and_generalise();
        assert_eq!(once, tape.to_string());
    }

    #[test]
    fn regex_tape_initial_is_empty_blank_abstraction() {
        let tape = RegexTape::initial(2, 3);
        assert_eq!("0∞ A> 0∞", tape.to_string());
        assert_eq!(0, tape.block_count());
        // reading off the empty side yields the materialised zero block
        let block = tape.read_block();
        assert_eq!(vec![0, 0], block.word);
        assert_eq!(1, block.repeat);
        assert!(!block.plus);
    }

    #[test]
    fn regex_tape_padding_to_block_multiple() {
        // 3 cells before the head with block length 2: one zero is padded on the outer end
        let tape = tape_from_cells(&[1, 1, 1], 1, &[], 2, 9);
        assert_eq!("0∞ (01)^1 (11)^1 A> 0∞", tape.to_string());
        // 5 cells after the head with block length 3: one zero padded at the right outer end
        let tape = tape_from_cells(&[], 1, &[1, 1, 1, 1, 1], 3, 9);
        assert_eq!("0∞ A> (111)^1 (110)^1 0∞", tape.to_string());
    }

    #[test]
    fn regex_tape_plus_branches_split_the_faced_block() {
        let tape = tape_from_cells(&[], 1, &[1, 1, 1, 1, 1, 1], 2, 3);
        assert_eq!("0∞ A> (11)^3+ 0∞", tape.to_string());
        let [keep_plus, drop_plus] = tape.plus_branches();
        assert_eq!("0∞ A> (11)^1 (11)^3+ 0∞", keep_plus.to_string());
        assert_eq!("0∞ A> (11)^1 (11)^2 0∞", drop_plus.to_string());
    }

    #[test]
    fn regex_tape_plus_branch_on_count_one() {
        // plus threshold 1: the single block is already (11)^1+
        let tape = tape_from_cells(&[], 1, &[1, 1], 2, 1);
        assert_eq!("0∞ A> (11)^1+ 0∞", tape.to_string());
        let [keep_plus, drop_plus] = tape.plus_branches();
        assert_eq!("0∞ A> (11)^1 (11)^1+ 0∞", keep_plus.to_string());
        // k = 1: the plus is dropped, nothing is split off
        assert_eq!("0∞ A> (11)^1 0∞", drop_plus.to_string());
    }

    #[test]
    fn regex_tape_macro_step_runs_through_the_block() {
        // A1 -> 1RA runs right through the 1s and exits without changing them
        let machine = MachineBinary::try_from("1RB1RA_1LB1LA").unwrap();
        let mut tape = tape_from_cells(&[], 1, &[1, 1, 1, 1], 2, 9);
        assert_eq!("0∞ A> (11)^2 0∞", tape.to_string());
        // A1 -> 1RA twice per block word, exits right after 4 steps, still state A
        tape.macro_step(&machine, 100).unwrap();
        assert_eq!("0∞ (11)^2 A> 0∞", tape.to_string());
    }

    #[test]
    fn regex_tape_macro_step_turnaround() {
        // A0 -> 1LB: head faces the implicit zeros, writes one cell and turns left
        let machine = MachineBinary::try_from("1LB1RA_1LB1RB").unwrap();
        let mut tape = RegexTape::initial(2, 9);
        tape.macro_step(&machine, 100).unwrap();
        // the zero block became (10) with the head now facing it from the right:
        // A> 00 steps to <B 10 (pad on the left outer end)
        assert_eq!("0∞ <B (10)^1 0∞", tape.to_string());
    }

    #[test]
    fn regex_tape_macro_step_halts_inside_block() {
        // A0 -> 1RB, then B reads the 1 and B1 is undefined
        let machine = MachineBinary::try_from("1RB---_1RA---").unwrap();
        let mut tape = tape_from_cells(&[], 1, &[0, 1], 2, 9);
        assert_eq!(
            MacroStepAbort::Halted,
            tape.macro_step(&machine, 100).unwrap_err()
        );
    }

    #[test]
    fn regex_tape_macro_step_timeout() {
        // A and B bounce between two cells forever inside the block
        let machine = MachineBinary::try_from("1RB1RB_1LA1LA").unwrap();
        let mut tape = tape_from_cells(&[0], 1, &[0, 0, 0], 2, 9);
        assert_eq!(
            MacroStepAbort::Timeout,
            tape.macro_step(&machine, 50).unwrap_err()
        );
    }

    #[test]
    fn regex_tape_macro_step_facing_plus() {
        let machine = MachineBinary::try_from("1RB1RA_1LB1LA").unwrap();
        let mut tape = tape_from_cells(&[], 1, &[1, 1, 1, 1, 1, 1], 2, 3);
        assert_eq!(
            MacroStepAbort::FacingPlus,
            tape.macro_step(&machine, 100).unwrap_err()
        );
    }
}
