//! NGramCPS decider: abstract interpretation over local contexts
//! (left l-gram, right r-gram, head symbol, state) together with the sets of
//! reachable fixed-length tape windows on each side. \
//! The abstract state only ever grows. A local context expands through the
//! machine's transition: moving right retires the left gram into the left
//! n-gram map and continues into every symbol the right map allows behind the
//! right gram (symmetric moving left). When a full sweep over the context set
//! adds nothing, the set is closed: no reachable context meets an undefined
//! transition, so the machine never halts. \
//! Gas is decremented once per expansion; newly inserted contexts are visited
//! first. The PROVEN outcome is independent of the visit order, the exact
//! gas count to termination is not.

use std::collections::VecDeque;
use std::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::{
    config::{Config, StepSmall},
    decider::{
        self,
        decider_result::{BatchData, ResultUnitEndReason},
        ngram_alphabet::{HistorySymbols, LruSymbols, PlainSymbols, SymbolMachine},
        Decider, DeciderId, DECIDER_NGRAM_CPS_ID,
    },
    machine_binary::{MachineBinary, StateType},
    status::{CannotProveReason, MachineStatus, NonHaltReason},
};

/// Insertion-ordered set; the order matters for the visit sequence.
#[derive(Debug, Clone)]
struct ListSet<T: Clone + Eq + Hash> {
    items: Vec<T>,
    set: HashSet<T>,
}

impl<T: Clone + Eq + Hash> ListSet<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            set: HashSet::new(),
        }
    }

    /// Inserts if absent; returns true when the item is new.
    fn ins(&mut self, item: T) -> bool {
        if self.set.insert(item.clone()) {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn items(&self) -> &[T] {
        &self.items
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LocalContext<S> {
    /// Left gram, leftmost symbol first (the symbol next to the head is the last).
    left: Vec<S>,
    /// Right gram, the symbol next to the head first.
    right: Vec<S>,
    head: S,
    state: StateType,
}

/// The abstract state (L, R, M): the side gram maps and the local context set.
/// L maps an (l-1)-gram suffix to the symbols that can precede it, R maps an
/// (r-1)-gram prefix to the symbols that can succeed it.
struct AbstractExecState<S: Clone + Eq + Hash> {
    left_ngrams: HashMap<Vec<S>, ListSet<S>>,
    right_ngrams: HashMap<Vec<S>, ListSet<S>>,
    local_contexts: ListSet<LocalContext<S>>,
}

impl<S: Clone + Eq + Hash> AbstractExecState<S> {
    fn initial(blank: S, len_left: usize, len_right: usize, start_state: StateType) -> Self {
        let mut left_ngrams = HashMap::new();
        let mut left_set = ListSet::new();
        left_set.ins(blank.clone());
        left_ngrams.insert(vec![blank.clone(); len_left - 1], left_set);

        let mut right_ngrams = HashMap::new();
        let mut right_set = ListSet::new();
        right_set.ins(blank.clone());
        right_ngrams.insert(vec![blank.clone(); len_right - 1], right_set);

        let mut local_contexts = ListSet::new();
        local_contexts.ins(LocalContext {
            left: vec![blank.clone(); len_left],
            right: vec![blank.clone(); len_right],
            head: blank,
            state: start_state,
        });

        Self {
            left_ngrams,
            right_ngrams,
            local_contexts,
        }
    }

    fn ins_left_ngram(&mut self, ngram: &[S]) {
        let suffix = ngram[1..].to_vec();
        self.left_ngrams
            .entry(suffix)
            .or_insert_with(ListSet::new)
            .ins(ngram[0].clone());
    }

    fn ins_right_ngram(&mut self, ngram: &[S]) {
        let prefix = ngram[..ngram.len() - 1].to_vec();
        self.right_ngrams
            .entry(prefix)
            .or_insert_with(ListSet::new)
            .ins(ngram[ngram.len() - 1].clone());
    }
}

/// Expands one local context. Returns the newly created contexts, or None if
/// the context meets a halting transition.
fn expand_local_context<M: SymbolMachine>(
    lifted: &M,
    lc: &LocalContext<M::Symbol>,
    s: &mut AbstractExecState<M::Symbol>,
) -> Option<Vec<LocalContext<M::Symbol>>> {
    let step = lifted.apply(lc.state, &lc.head)?;

    let mut created = Vec::new();
    if step.moves_right {
        // the left gram falls out of the window and is retired into L
        s.ins_left_ngram(&lc.left);
        let follow_key = lc.right[1..].to_vec();
        let successors: Vec<M::Symbol> = match s.right_ngrams.get(&follow_key) {
            Some(set) => set.items().to_vec(),
            None => Vec::new(),
        };
        for symbol in successors {
            let mut left = lc.left[1..].to_vec();
            left.push(step.write.clone());
            let mut right = lc.right[1..].to_vec();
            right.push(symbol);
            let new_lc = LocalContext {
                left,
                right,
                head: lc.right[0].clone(),
                state: step.next_state,
            };
            if s.local_contexts.ins(new_lc.clone()) {
                created.push(new_lc);
            }
        }
    } else {
        s.ins_right_ngram(&lc.right);
        let follow_key = lc.left[..lc.left.len() - 1].to_vec();
        let successors: Vec<M::Symbol> = match s.left_ngrams.get(&follow_key) {
            Some(set) => set.items().to_vec(),
            None => Vec::new(),
        };
        for symbol in successors {
            let mut left = vec![symbol];
            left.extend_from_slice(&lc.left[..lc.left.len() - 1]);
            let mut right = vec![step.write.clone()];
            right.extend_from_slice(&lc.right[..lc.right.len() - 1]);
            let new_lc = LocalContext {
                left,
                right,
                head: lc.left[lc.left.len() - 1].clone(),
                state: step.next_state,
            };
            if s.local_contexts.ins(new_lc.clone()) {
                created.push(new_lc);
            }
        }
    }
    Some(created)
}

/// Saturation over any lifted alphabet. `gas` bounds the number of expansions.
pub fn ngram_cps_decide<M: SymbolMachine>(
    lifted: &M,
    len_left: usize,
    len_right: usize,
    gas: StepSmall,
) -> MachineStatus {
    assert!(len_left >= 1 && len_right >= 1);
    let mut s = AbstractExecState::initial(lifted.blank_symbol(), len_left, len_right, 1);
    let mut gas = gas;

    loop {
        let mut any_updates = false;
        // sweep the current context set, newest first
        let mut to_visit: VecDeque<LocalContext<M::Symbol>> =
            s.local_contexts.items().iter().rev().cloned().collect();

        while let Some(lc) = to_visit.pop_front() {
            if gas == 0 {
                return MachineStatus::CannotProve(CannotProveReason::GasExhausted);
            }
            gas -= 1;

            #[cfg(feature = "debug_ngram")]
            println!("expanding state {} head {:?}", lc.state, lc.head);

            let created = match expand_local_context(lifted, &lc, &mut s) {
                Some(created) => created,
                None => return MachineStatus::CannotProve(CannotProveReason::HaltReachable),
            };
            if !created.is_empty() {
                any_updates = true;
                for lc in created.into_iter().rev() {
                    to_visit.push_front(lc);
                }
            }
        }

        if !any_updates {
            return MachineStatus::DecidedNonHalt(NonHaltReason::NGramClosure(
                s.local_contexts.len(),
            ));
        }
    }
}

/// Which alphabet the decider lifts the machine to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NGramVariant {
    Plain,
    /// Length-n history of (state, symbol) pairs per cell.
    History(usize),
    /// Most-recent-first history with one entry per state.
    Lru,
}

#[derive(Debug)]
pub struct DeciderNGramCps {
    len_left: usize,
    len_right: usize,
    gas: StepSmall,
    variant: NGramVariant,
}

impl DeciderNGramCps {
    pub fn new(config: &Config) -> Self {
        let variant = if config.ngram_history_len() > 0 {
            NGramVariant::History(config.ngram_history_len())
        } else {
            NGramVariant::Plain
        };
        Self {
            len_left: config.ngram_gram_len_left(),
            len_right: config.ngram_gram_len_right(),
            gas: config.ngram_gas(),
            variant,
        }
    }

    pub fn new_with_variant(config: &Config, variant: NGramVariant) -> Self {
        Self {
            variant,
            ..Self::new(config)
        }
    }
}

impl Decider for DeciderNGramCps {
    fn decider_id() -> &'static DeciderId {
        &DECIDER_NGRAM_CPS_ID
    }

    fn decide_machine(&mut self, machine: &MachineBinary) -> MachineStatus {
        match self.variant {
            NGramVariant::Plain => ngram_cps_decide(
                &PlainSymbols::new(machine),
                self.len_left,
                self.len_right,
                self.gas,
            ),
            NGramVariant::History(n) => ngram_cps_decide(
                &HistorySymbols::new(machine, n),
                self.len_left,
                self.len_right,
                self.gas,
            ),
            NGramVariant::Lru => ngram_cps_decide(
                &LruSymbols::new(machine),
                self.len_left,
                self.len_right,
                self.gas,
            ),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn decide_plain(tm: &str, gram_len: usize, gas: StepSmall) -> MachineStatus {
        let machine = MachineBinary::try_from(tm).unwrap();
        let config = Config::builder(machine.n_states())
            .ngram_gram_len(gram_len, gram_len)
            .ngram_gas(gas)
            .build();
        DeciderNGramCps::decide_single_machine(&machine, &config)
    }

    #[test]
    fn ngram_cps_proves_known_machine_with_2_grams() {
        let status = decide_plain("1RB1LE_1LC0RD_0LA1LA_0LB0RD_1LB---", 2, 5_000);
        assert!(matches!(
            status,
            MachineStatus::DecidedNonHalt(NonHaltReason::NGramClosure(_))
        ));
    }

    #[test]
    fn ngram_cps_gas_exhaustion_is_cannot_prove() {
        let status = decide_plain("1RB1LE_1LC0RD_0LA1LA_0LB0RD_1LB---", 2, 3);
        assert_eq!(
            MachineStatus::CannotProve(CannotProveReason::GasExhausted),
            status
        );
    }

    #[test]
    fn ngram_cps_reports_reachable_halt() {
        // the BB5 champion reaches its undefined transition from the blank tape
        let status = decide_plain("1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA", 2, 100_000);
        assert_eq!(
            MachineStatus::CannotProve(CannotProveReason::HaltReachable),
            status
        );
    }

    /// With l = r = 1 the abstraction collapses to reachable (state, symbol)
    /// pairs: machines whose transition graph is closed without undefined
    /// transitions are decided, machines reaching an undefined one are not.
    #[test]
    fn ngram_cps_1_grams_reduce_to_state_symbol_closure() {
        let status = decide_plain("1RB1LB_1LA1RA", 1, 1_000);
        assert!(status.is_non_halt());

        let status = decide_plain("1RB1LA_1LA---", 1, 1_000);
        assert_eq!(
            MachineStatus::CannotProve(CannotProveReason::HaltReachable),
            status
        );
    }

    #[test]
    fn ngram_cps_history_variant_proves_plain_provable_machine() {
        let machine = MachineBinary::try_from("1RB1LE_1LC0RD_0LA1LA_0LB0RD_1LB---").unwrap();
        let config = Config::builder(5)
            .ngram_gram_len(2, 2)
            .ngram_gas(200_000)
            .ngram_history_len(1)
            .build();
        let status = DeciderNGramCps::decide_single_machine(&machine, &config);
        assert!(status.is_non_halt(), "history variant failed: {status}");
    }

    #[test]
    fn ngram_cps_lru_variant_proves_plain_provable_machine() {
        let machine = MachineBinary::try_from("1RB1LE_1LC0RD_0LA1LA_0LB0RD_1LB---").unwrap();
        let config = Config::builder(5)
            .ngram_gram_len(2, 2)
            .ngram_gas(500_000)
            .build();
        let mut decider = DeciderNGramCps::new_with_variant(&config, NGramVariant::Lru);
        let status = decider.decide_machine(&machine);
        assert!(status.is_non_halt(), "LRU variant failed: {status}");
    }
}
