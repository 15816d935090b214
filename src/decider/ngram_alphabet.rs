//! Pluggable tape alphabets for the NGramCPS decider. \
//! The abstraction works over any alphabet that the machine's transition
//! function can be lifted to; enriching the symbols tightens the
//! over-approximation at the cost of a larger alphabet:
//! - [PlainSymbols]: the raw binary alphabet {0,1};
//! - [HistorySymbols]: each cell carries the (state, symbol) pairs written at
//!   it, truncated to the n most recent;
//! - [LruSymbols]: each cell carries the pairs ordered most-recent-first,
//!   with prior entries of the same state removed on every write.

use std::hash::Hash;

use crate::machine_binary::{MachineBinary, StateType};

/// One lifted transition: the enriched symbol to write, the move, the next state.
#[derive(Debug, Clone)]
pub struct SymbolStep<S> {
    pub write: S,
    pub moves_right: bool,
    pub next_state: StateType,
}

/// A machine lifted to an enriched tape alphabet.
pub trait SymbolMachine {
    type Symbol: Clone + Eq + Hash + std::fmt::Debug;

    /// The symbol of an untouched blank cell.
    fn blank_symbol(&self) -> Self::Symbol;

    /// The lifted transition function; None where the underlying machine halts.
    fn apply(&self, state: StateType, symbol: &Self::Symbol) -> Option<SymbolStep<Self::Symbol>>;
}

/// The raw binary alphabet.
pub struct PlainSymbols<'a> {
    machine: &'a MachineBinary,
}

impl<'a> PlainSymbols<'a> {
    pub fn new(machine: &'a MachineBinary) -> Self {
        Self { machine }
    }
}

impl SymbolMachine for PlainSymbols<'_> {
    type Symbol = u8;

    fn blank_symbol(&self) -> u8 {
        0
    }

    fn apply(&self, state: StateType, symbol: &u8) -> Option<SymbolStep<u8>> {
        let tr = self.machine.transition_for_state_symbol(state, *symbol as usize);
        if tr.is_halt() {
            return None;
        }
        Some(SymbolStep {
            write: tr.symbol() as u8,
            moves_right: tr.is_dir_right(),
            next_state: tr.state() as StateType,
        })
    }
}

/// Binary symbol enriched with the history of (state, symbol) pairs seen at
/// the cell, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistorySymbol {
    pub bit: u8,
    pub history: Vec<(u8, u8)>,
}

impl HistorySymbol {
    fn blank() -> Self {
        Self {
            bit: 0,
            history: Vec::new(),
        }
    }
}

/// History alphabet with length-n truncation: a write prepends the current
/// (state, read symbol) pair and keeps the n most recent entries.
pub struct HistorySymbols<'a> {
    machine: &'a MachineBinary,
    history_len: usize,
}

impl<'a> HistorySymbols<'a> {
    pub fn new(machine: &'a MachineBinary, history_len: usize) -> Self {
        Self {
            machine,
            history_len,
        }
    }
}

impl SymbolMachine for HistorySymbols<'_> {
    type Symbol = HistorySymbol;

    fn blank_symbol(&self) -> HistorySymbol {
        HistorySymbol::blank()
    }

    fn apply(&self, state: StateType, symbol: &HistorySymbol) -> Option<SymbolStep<HistorySymbol>> {
        let tr = self.machine.transition_for_state_symbol(state, symbol.bit as usize);
        if tr.is_halt() {
            return None;
        }
        let mut history = Vec::with_capacity(self.history_len);
        history.push((state as u8, symbol.bit));
        history.extend(symbol.history.iter().copied());
        history.truncate(self.history_len);
        Some(SymbolStep {
            write: HistorySymbol {
                bit: tr.symbol() as u8,
                history,
            },
            moves_right: tr.is_dir_right(),
            next_state: tr.state() as StateType,
        })
    }
}

/// History alphabet with least-recent-usage pruning: a write prepends the
/// current (state, read symbol) pair and drops every older entry of the same
/// state, so each state appears at most once and the list stays bounded.
pub struct LruSymbols<'a> {
    machine: &'a MachineBinary,
}

impl<'a> LruSymbols<'a> {
    pub fn new(machine: &'a MachineBinary) -> Self {
        Self { machine }
    }
}

impl SymbolMachine for LruSymbols<'_> {
    type Symbol = HistorySymbol;

    fn blank_symbol(&self) -> HistorySymbol {
        HistorySymbol::blank()
    }

    fn apply(&self, state: StateType, symbol: &HistorySymbol) -> Option<SymbolStep<HistorySymbol>> {
        let tr = self.machine.transition_for_state_symbol(state, symbol.bit as usize);
        if tr.is_halt() {
            return None;
        }
        let mut history = vec![(state as u8, symbol.bit)];
        history.extend(
            symbol
                .history
                .iter()
                .filter(|(s, _)| *s != state as u8)
                .copied(),
        );
        Some(SymbolStep {
            write: HistorySymbol {
                bit: tr.symbol() as u8,
                history,
            },
            moves_right: tr.is_dir_right(),
            next_state: tr.state() as StateType,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> MachineBinary {
        MachineBinary::try_from("1RB---_0LC0RB_1RD1LD_0LE0RA_0RC0RA").unwrap()
    }

    #[test]
    fn plain_symbols_lift_the_raw_transitions() {
        let machine = machine();
        let plain = PlainSymbols::new(&machine);
        let step = plain.apply(1, &0).unwrap();
        assert_eq!(1, step.write);
        assert!(step.moves_right);
        assert_eq!(2, step.next_state);
        // A1 is undefined
        assert!(plain.apply(1, &1).is_none());
    }

    #[test]
    fn history_symbols_truncate_to_length() {
        let machine = machine();
        let lifted = HistorySymbols::new(&machine, 2);
        // A0 writes 1 with history [(A,0)]
        let step = lifted.apply(1, &HistorySymbol::blank()).unwrap();
        assert_eq!(1, step.write.bit);
        assert_eq!(vec![(1, 0)], step.write.history);

        // B1 on that cell: [(B,1), (A,0)]
        let step = lifted.apply(2, &step.write).unwrap();
        assert_eq!(0, step.write.bit);
        assert_eq!(vec![(2, 1), (1, 0)], step.write.history);

        // B0 again: truncated to the 2 most recent entries
        let step = lifted.apply(2, &step.write).unwrap();
        assert_eq!(vec![(2, 0), (2, 1)], step.write.history);
    }

    #[test]
    fn lru_symbols_drop_older_entries_of_the_same_state() {
        let machine = machine();
        let lifted = LruSymbols::new(&machine);
        let cell = HistorySymbol {
            bit: 0,
            history: vec![(3, 1), (2, 0)],
        };
        // B0 write: the old B entry disappears, C stays
        let step = lifted.apply(2, &cell).unwrap();
        assert_eq!(vec![(2, 0), (3, 1)], step.write.history);
    }
}
