//! Facing tape used by the RepWL block macro-simulation. \
//! The head sits between the two runs and faces one of them; reading and writing
//! act on the faced cell. With `infinite_zero` the tape behaves like a normal
//! two-sided infinite tape; without it the extremities are hard and stepping off
//! the stored content is reported instead of executed, which is exactly the
//! "head exits the finite region" event of a block macro-step.

use std::fmt::Display;

use crate::machine_binary::{MachineBinary, StateType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTape {
    /// Cells left of the head, leftmost first, the cell next to the head is the last element.
    before: Vec<u8>,
    /// Cells right of the head, stored reversed: rightmost first, the cell
    /// next to the head is the last element (keeps head moves O(1)).
    after: Vec<u8>,
    state: StateType,
    /// Head faces the `after` run; false = faces the `before` run.
    looking_after: bool,
    /// Implicit infinite zeros beyond the stored runs.
    infinite_zero: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SegmentStep {
    Moved,
    /// The machine reached an undefined transition.
    Halted,
    /// The head faces past the stored content of a hard-extremity tape.
    /// Reported before anything is executed.
    AtExtremity,
}

impl SegmentTape {
    /// Blank infinite tape, state A, facing right.
    pub fn new_blank() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
            state: 1,
            looking_after: true,
            infinite_zero: true,
        }
    }

    /// Finite tape over the given content. `after` is taken in natural order
    /// (cell next to the head first).
    pub fn new_finite(before: Vec<u8>, state: StateType, after: &[u8], looking_after: bool) -> Self {
        Self {
            before,
            after: after.iter().rev().copied().collect(),
            state,
            looking_after,
            infinite_zero: false,
        }
    }

    pub fn state(&self) -> StateType {
        self.state
    }

    pub fn is_looking_after(&self) -> bool {
        self.looking_after
    }

    /// Cells left of the head, leftmost first.
    pub fn before_cells(&self) -> &[u8] {
        &self.before
    }

    /// Cells right of the head in natural order, the cell next to the head first.
    pub fn after_cells_natural(&self) -> Vec<u8> {
        self.after.iter().rev().copied().collect()
    }

    /// Returns True in cases `... S> 0∞` and `0∞ <S ...`
    pub fn head_at_extremity(&self) -> bool {
        if self.looking_after {
            self.after.is_empty()
        } else {
            self.before.is_empty()
        }
    }

    fn read(&self) -> u8 {
        let faced = if self.looking_after {
            self.after.last()
        } else {
            self.before.last()
        };
        // Tape extension is implemented by the write operation.
        *faced.unwrap_or(&0)
    }

    fn write(&mut self, symbol: u8) {
        let faced = if self.looking_after {
            &mut self.after
        } else {
            &mut self.before
        };
        match faced.last_mut() {
            Some(cell) => *cell = symbol,
            None => faced.push(symbol),
        }
    }

    fn move_head_right(&mut self) {
        if self.looking_after {
            match self.after.pop() {
                Some(cell) => self.before.push(cell),
                None => self.before.push(0),
            }
        } else {
            self.looking_after = true;
        }
    }

    fn move_head_left(&mut self) {
        if self.looking_after {
            self.looking_after = false;
        } else {
            match self.before.pop() {
                Some(cell) => self.after.push(cell),
                None => self.after.push(0),
            }
        }
    }

    /// Executes one step, or reports why it cannot.
    pub fn step(&mut self, machine: &MachineBinary) -> SegmentStep {
        if !self.infinite_zero && self.head_at_extremity() {
            return SegmentStep::AtExtremity;
        }

        let tr = machine.transition(self.state * 2 + self.read() as usize);
        if tr.is_halt() {
            return SegmentStep::Halted;
        }

        self.write(tr.symbol() as u8);
        if tr.is_dir_right() {
            self.move_head_right();
        } else {
            self.move_head_left();
        }
        self.state = tr.state() as StateType;

        SegmentStep::Moved
    }
}

impl Display for SegmentTape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.infinite_zero {
            write!(f, "0∞")?;
        }
        for symbol in self.before.iter() {
            write!(f, "{symbol}")?;
        }
        if self.looking_after {
            write!(f, "{}>", (self.state as u8 + b'A' - 1) as char)?;
        } else {
            write!(f, "<{}", (self.state as u8 + b'A' - 1) as char)?;
        }
        for symbol in self.after.iter().rev() {
            write!(f, "{symbol}")?;
        }
        if self.infinite_zero {
            write!(f, "0∞")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_tape_finite_reports_extremity_before_stepping() {
        let machine = MachineBinary::try_from("1RB---_1RA---").unwrap();
        // head at left end of "11", facing the content
        let mut tape = SegmentTape::new_finite(Vec::new(), 1, &[1, 1], true);
        assert!(!tape.head_at_extremity());
        // A1 is undefined in this machine
        assert_eq!(SegmentStep::Halted, tape.step(&machine));

        let mut tape = SegmentTape::new_finite(Vec::new(), 1, &[0, 0], true);
        assert_eq!(SegmentStep::Moved, tape.step(&machine));
        assert_eq!(SegmentStep::Moved, tape.step(&machine));
        // both cells consumed, head now faces past the right end
        assert_eq!(SegmentStep::AtExtremity, tape.step(&machine));
        assert_eq!(vec![1, 1], tape.before_cells().to_vec());
    }

    #[test]
    fn segment_tape_facing_flip_is_not_a_transfer() {
        // A0 -> 1LB, B0 -> 1RA
        let machine = MachineBinary::try_from("1LB---_1RA---").unwrap();
        let mut tape = SegmentTape::new_finite(vec![0, 0], 1, &[0, 0], true);
        assert_eq!(SegmentStep::Moved, tape.step(&machine));
        // moved left from looking-after: facing flipped, no cell transferred
        assert!(!tape.is_looking_after());
        assert_eq!(2, tape.before_cells().len());
        assert_eq!(2, tape.state());
    }

    #[test]
    fn segment_tape_blank_infinite_extends() {
        let machine = MachineBinary::try_from("0RA---").unwrap();
        let mut tape = SegmentTape::new_blank();
        for _ in 0..4 {
            assert_eq!(SegmentStep::Moved, tape.step(&machine));
        }
        assert_eq!(4, tape.before_cells().len());
    }
}
