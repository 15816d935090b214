//! The [MachineBinary] holds the transitions for one machine where the symbol can only be 0 or 1.
//! This is a single column array with an additional first line. The transition for state/symbol is
//! calculated by state * 2 + symbol with state A=1, so C1 would become 3*2+1 = transitions\[7\]. \
//! Transition\[0\] contains additional information, always the number of states used, therefore
//! use either a new variant which sets it or make sure the number of states is set.
//!
//! Use TryFrom<&str> to create a machine from Standard TM Text Format
//! (<https://www.sligocki.com/2022/10/09/standard-tm-format.html>), or
//! [MachineBinary::from_db_bytes] for the 30-byte wire form of the machine DB.

use std::fmt::Display;

use num_format::ToFormattedString;

use crate::{
    config::{MAX_STATES, NUM_FIELDS},
    transition_binary::{TransitionBinary, TransitionType, TRANSITION_BINARY_UNUSED},
};

/// Number of bytes of one machine record in the DB wire format.
pub const BYTES_MACHINE: usize = 30;

pub type TransitionTableBinaryArray1D = [TransitionBinary; NUM_FIELDS];
pub const TRANSITION_TABLE_BINARY_DEFAULT: TransitionTableBinaryArray1D =
    [TRANSITION_BINARY_UNUSED; NUM_FIELDS];

const FILTER_TABLE_N_STATES: TransitionType = 0b0000_1111;

/// Numeric state, A=1; 0 is the halt state.
pub type StateType = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineBinary {
    /// Transition\[0\] is used for additional information: n_states in bits 0-3.
    pub transitions: TransitionTableBinaryArray1D,
}

impl MachineBinary {
    /// Creates a new machine and stores the n_states. \
    /// This is the correct fast approach when the number of states is known, but not in the machine data.
    pub fn new_with_n_states(transitions: TransitionTableBinaryArray1D, n_states: usize) -> Self {
        let mut machine = Self { transitions };
        machine.set_n_states(n_states);
        machine
    }

    /// Creates a machine from one 30-byte record of the machine DB:
    /// 10 transitions of 3 bytes (write, move R=0/L=1, next state 0=undefined), row-major by (state, read symbol).
    pub fn from_db_bytes(bytes: &[u8; BYTES_MACHINE]) -> Result<Self, &'static str> {
        let mut transitions = TRANSITION_TABLE_BINARY_DEFAULT;
        for state in 0..MAX_STATES {
            let p = state * 6;
            for symbol in 0..2 {
                let q = p + symbol * 3;
                transitions[(state + 1) * 2 + symbol] =
                    TransitionBinary::try_new([bytes[q], bytes[q + 1], bytes[q + 2]])
                        .map_err(|_| "Invalid transition bytes in DB record")?;
            }
        }
        Ok(Self::new_with_n_states(transitions, MAX_STATES))
    }

    /// Returns the transition table as standard TM Text format. Display returns this.
    pub fn to_standard_tm_text_format(&self) -> String {
        let mut transition_texts = Vec::new();
        for i in (2..self.n_states() * 2 + 2).step_by(2) {
            let s = format!("{}{}", self.transitions[i], self.transitions[i + 1]);
            transition_texts.push(s);
        }

        transition_texts.join("_")
    }

    /// Returns the transition for the array id, which is state * 2 + symbol. A0 = 2.
    pub fn transition(&self, array_id: usize) -> TransitionBinary {
        self.transitions[array_id]
    }

    /// Returns the transition for state (numeric A=1, B=2 etc.) and read symbol.
    pub fn transition_for_state_symbol(&self, state: StateType, symbol: usize) -> TransitionBinary {
        self.transitions[state * 2 + symbol]
    }

    /// Returns the used section of the transition table, which is from 2..n_states * 2 + 2.
    pub fn transitions_used(&self) -> &[TransitionBinary] {
        &self.transitions[2..self.n_states() * 2 + 2]
    }

    /// Returns the number of states used.
    #[inline]
    pub fn n_states(&self) -> usize {
        (self.transitions[0].transition & FILTER_TABLE_N_STATES) as usize
    }

    /// Sets the n_states in the first array element. Expects states not to be set, so only during initialization.
    fn set_n_states(&mut self, n_states: usize) {
        self.transitions[0].transition |= n_states as TransitionType;
    }

    /// True if the given state (A=1) has at least one undefined transition. \
    /// By the enumeration rules of the machine DB a state has at most one.
    pub fn has_undefined_transition(&self, state: StateType) -> bool {
        self.transitions[state * 2].is_undefined() || self.transitions[state * 2 + 1].is_undefined()
    }

    // Returns the machine table field name from the transition array id in an 1D-array, e.g. 2 -> A0.
    pub fn array_id_to_field_name(arr_id: usize) -> String {
        let state = ((arr_id / 2) as u8 + b'A' - 1) as char;
        let symbol = ((arr_id & 1) as u8 + b'0') as char;
        format!("{state}{symbol}")
    }
}

impl Default for MachineBinary {
    fn default() -> Self {
        Self {
            transitions: TRANSITION_TABLE_BINARY_DEFAULT,
        }
    }
}

/// Creates the transition table from the Standard TM Text Format, e.g.
/// "1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA". Each `_`-separated group is one state
/// with its symbol-0 and symbol-1 transitions, `---` marks undefined.
impl TryFrom<&str> for MachineBinary {
    type Error = &'static str;

    fn try_from(tm_text_format: &str) -> Result<Self, Self::Error> {
        let state_texts: Vec<&str> = tm_text_format.split('_').collect();
        if state_texts.is_empty() || state_texts.len() > MAX_STATES {
            return Err("This transition format is limited to 1 to MAX_STATES states.");
        }
        let mut transitions = TRANSITION_TABLE_BINARY_DEFAULT;
        for (state_no, state_text) in state_texts.iter().enumerate() {
            if state_text.len() != 6 {
                return Err("Each state requires two transitions of 3 chars, e.g. '1RB0LC'.");
            }
            let bytes = state_text.as_bytes();
            for symbol in 0..2 {
                let tr: [u8; 3] = bytes[symbol * 3..symbol * 3 + 3].try_into().unwrap();
                transitions[(state_no + 1) * 2 + symbol] =
                    TransitionBinary::try_new(tr).map_err(|_| "Invalid transition text")?;
            }
        }

        Ok(Self::new_with_n_states(transitions, state_texts.len()))
    }
}

impl Display for MachineBinary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_standard_tm_text_format())
    }
}

/// This struct is used in DataProvider to allow an index id. \
/// To keep the size small, instead of Option<id> the u64::MAX is used to indicate not used.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MachineId {
    id: u64,
    machine: MachineBinary,
}

impl MachineId {
    pub fn new(id: u64, machine: MachineBinary) -> Self {
        Self { id, machine }
    }

    pub fn new_no_id(machine: MachineBinary) -> Self {
        Self {
            id: u64::MAX,
            machine,
        }
    }

    /// Returns the id, instead of Option, the unused case is: u64::MAX
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn id_as_option(&self) -> Option<u64> {
        if self.id == u64::MAX {
            None
        } else {
            Some(self.id)
        }
    }

    pub fn has_id(&self) -> bool {
        self.id != u64::MAX
    }

    pub fn machine(&self) -> &MachineBinary {
        &self.machine
    }

    pub fn n_states(&self) -> usize {
        self.machine.n_states()
    }

    pub fn to_standard_tm_text_format(&self) -> String {
        self.machine.to_standard_tm_text_format()
    }
}

impl From<&MachineBinary> for MachineId {
    fn from(mb: &MachineBinary) -> Self {
        Self {
            id: u64::MAX,
            machine: *mb,
        }
    }
}

impl Display for MachineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locale = &crate::config::user_locale();
        if self.has_id() {
            write!(f, "ID: {} {}", self.id.to_formatted_string(locale), self.machine)
        } else {
            write!(f, "{}", self.machine)
        }
    }
}

/// Some notable machines used for testing.
#[derive(Debug, Clone, Copy)]
pub enum NotableMachine {
    /// BB5 champion, halts after 47,176,870 steps.
    BB5Max,
    /// Runs right forever over blank tape.
    EndlessSimple,
    /// Decided by the closed-state-set argument ({A,B} is closed, only E holds
    /// an undefined transition).
    ClosedStatesExample,
    /// Proven by the n-gram abstraction with 2-grams.
    NGramExample,
    /// Proven by the repeated-word-list abstraction with block length 2, threshold 6.
    RepWlExample,
}

impl NotableMachine {
    pub fn machine(&self) -> MachineBinary {
        let transitions_text = match self {
            NotableMachine::BB5Max => "1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA",
            NotableMachine::EndlessSimple => "0RA---",
            NotableMachine::ClosedStatesExample => "0RB0LB_1LA1RB_1LB0LD_0RA1RE_0LE---",
            NotableMachine::NGramExample => "1RB1LE_1LC0RD_0LA1LA_0LB0RD_1LB---",
            NotableMachine::RepWlExample => "1RB1LC_1LA1RD_1LD1LA_1RA1RE_---1RB",
        };

        MachineBinary::try_from(transitions_text).unwrap()
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn machine_from_text_and_back() {
        let tm_in = "1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA";
        let machine = MachineBinary::try_from(tm_in).unwrap();
        assert_eq!(5, machine.n_states());
        assert_eq!(tm_in, machine.to_standard_tm_text_format());
    }

    #[test]
    fn machine_from_db_bytes_matches_text_form() {
        // 1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA in wire bytes (R=0, L=1, state A=1, 0=undefined)
        let bytes: [u8; BYTES_MACHINE] = [
            1, 0, 2, 1, 1, 3, // A
            1, 0, 3, 1, 0, 2, // B
            1, 0, 4, 0, 1, 5, // C
            1, 1, 1, 1, 1, 4, // D
            0, 0, 0, 0, 1, 1, // E
        ];
        let machine = MachineBinary::from_db_bytes(&bytes).unwrap();
        assert_eq!(
            "1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA",
            machine.to_standard_tm_text_format()
        );
    }

    #[test]
    fn machine_transition_access_C1() {
        let machine = MachineBinary::try_from("1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA").unwrap();
        // C1 is field 3*2+1 = 7
        assert_eq!("0LE", machine.transition(7).to_string());
        assert_eq!("0LE", machine.transition_for_state_symbol(3, 1).to_string());
    }

    #[test]
    fn machine_undefined_transition_per_state() {
        let machine = NotableMachine::ClosedStatesExample.machine();
        assert!(!machine.has_undefined_transition(1));
        assert!(!machine.has_undefined_transition(4));
        assert!(machine.has_undefined_transition(5));
    }
}
