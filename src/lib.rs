//! Non-halting deciders for the 5-state 2-symbol Turing machines of the
//! bbchallenge machine DB, with machine-checkable certificates where the
//! method produces one. \
//! The deciders: closed state sets (graph reachability), loops (trace
//! repetition with translation), NGramCPS (closed position sets over local
//! tape contexts, with optional history alphabets), RepWL (repeated-word-list
//! regex tapes with block macro-simulation) and FAR (finite automata
//! reduction, with solver, eight-condition verifier and the DVF certificate
//! file codec). \
//! Every decider is a pure per-machine function behind the
//! [decider::Decider] trait; [decider::decider_engine] fans a decider out
//! over the machines of a [data_provider::DataProvider].

pub mod config;
pub mod data_provider;
pub mod decider;
pub mod error;
pub mod far;
pub mod machine_binary;
pub mod reporter;
pub mod status;
pub mod tape;
pub mod toml;
pub mod transition_binary;
pub mod utils;
