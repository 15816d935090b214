//! Run-list tape for the Loop decider: (left run, head symbol, right run, state),
//! cells beyond the stored runs are implicitly 0. \
//! The runs are deliberately never trimmed: a run that holds an explicit 0 is
//! different from an empty run, and the loop search relies on that distinction
//! when it argues about newly revealed blank cells.

use std::fmt::Display;

use crate::{
    machine_binary::{MachineBinary, StateType},
    transition_binary::DirectionType,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTape {
    /// Left run, the cell adjacent to the head is the last element.
    left: Vec<u8>,
    /// Right run, the cell adjacent to the head is the last element.
    right: Vec<u8>,
    /// Symbol under the head.
    head: u8,
    state: StateType,
}

pub enum ListTapeStep {
    /// Head displacement of the executed step, -1 or 1.
    Stepped(DirectionType),
    /// The machine reached an undefined transition.
    Halted,
}

impl ListTape {
    /// Blank tape, head on a 0 cell, state A.
    pub fn new() -> Self {
        Self {
            left: Vec::new(),
            right: Vec::new(),
            head: 0,
            state: 1,
        }
    }

    pub fn state(&self) -> StateType {
        self.state
    }

    pub fn head_symbol(&self) -> u8 {
        self.head
    }

    pub fn is_left_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn is_right_empty(&self) -> bool {
        self.right.is_empty()
    }

    /// Same (state, head symbol) pair, the matching criterion of the loop search.
    pub fn same_state_and_head(&self, other: &ListTape) -> bool {
        self.state == other.state && self.head == other.head
    }

    /// Executes one step. The written symbol is pushed onto the run behind the
    /// move; the new head symbol is popped from the run ahead, or 0 past its end.
    pub fn step(&mut self, machine: &MachineBinary) -> ListTapeStep {
        let tr = machine.transition(self.state * 2 + self.head as usize);
        if tr.is_halt() {
            return ListTapeStep::Halted;
        }

        let write = tr.symbol() as u8;
        if tr.is_dir_right() {
            self.left.push(write);
            self.head = self.right.pop().unwrap_or(0);
        } else {
            self.right.push(write);
            self.head = self.left.pop().unwrap_or(0);
        }
        self.state = tr.state() as StateType;

        ListTapeStep::Stepped(tr.direction())
    }
}

impl Default for ListTape {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ListTape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for symbol in self.left.iter() {
            write!(f, "{symbol}")?;
        }
        write!(
            f,
            " [{}{}] ",
            (self.state as u8 + b'A' - 1) as char,
            self.head
        )?;
        for symbol in self.right.iter().rev() {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}
