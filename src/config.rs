//! This crate contains the Config struct which is used to configure a decider run. \
//! All iteration budgets live here: the deciders themselves never invent limits,
//! they consume the ones handed to them and return CannotProve when a budget runs dry.

use std::{sync::LazyLock, time::SystemTime};

use hashbrown::HashMap;

use crate::toml::ConfigToml;

/// Read config.toml only once
pub static CONFIG_TOML: LazyLock<ConfigToml> = LazyLock::new(ConfigToml::read_toml);

// --- Below are program defining definitions, where changes may have a serious impact. ---

/// Number type used for step counters which may grow large (halt counts, gas totals).
pub type StepBig = u64;
/// Number type used for step counters which never exceed u32 and may be used as collection index.
pub type StepSmall = u32;

/// Number of states the program can handle. The bbchallenge DB is BB5.
pub const MAX_STATES: usize = 5;
/// Number of fields used in the transition table (state * 2 + symbol, line 0 unused).
pub const NUM_FIELDS: usize = (MAX_STATES + 1) * 2;

/// Only used in Default to initialize, use new_default() instead.
pub const N_STATES_DEFAULT: usize = 5;

const BATCH_SIZE_FILE: usize = 10_000;
const CPU_UTILIZATION_DEFAULT: usize = 100;

const STEP_LIMIT_LOOP_DEFAULT: StepSmall = 4100;
const NGRAM_GAS_DEFAULT: StepSmall = 50_000;
const NGRAM_GRAM_LEN_DEFAULT: usize = 2;
const REP_WL_BLOCK_LEN_DEFAULT: usize = 2;
const REP_WL_PLUS_THRESHOLD_DEFAULT: usize = 3;
const REP_WL_MAX_VISITED_DEFAULT: usize = 150_000;
const REP_WL_BLOCK_SIM_STEPS_DEFAULT: StepSmall = 1000;
const FAR_DFA_LIMIT_DEFAULT: usize = 5;

/// This is used to define the CPU usage during a decider or verifier run.
pub enum CoreUsage {
    SingleCore,
    MultiCore,
}

/// User locale for formatted number output in reports.
pub fn user_locale() -> num_format::Locale {
    num_format::Locale::en
}

/// This sets the configuration for a decider run. \
/// Use [Self::new_default] or the [Self::builder] to create a Config. \
/// Since the config is designed immutable, one can use [Self::builder_from_config]
/// to copy values of an existing config and make changes.
/// # Example
/// ```
/// use bb_nonhalt::config::Config;
///
/// let config = Config::builder(5).step_limit_loop(10_000).build();
/// assert_eq!(10_000, config.step_limit_loop());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    n_states: usize,
    /// Step budget of the Loop decider; the trace search runs on the final step.
    step_limit_loop: StepSmall,
    /// Gas of the NGramCPS decider, decremented once per local-context expansion.
    ngram_gas: StepSmall,
    /// Length of the left n-grams of the NGramCPS abstraction.
    ngram_gram_len_left: usize,
    /// Length of the right n-grams of the NGramCPS abstraction.
    ngram_gram_len_right: usize,
    /// History length of the NGramCPS history variant (0 = plain alphabet).
    ngram_history_len: usize,
    /// Block word length of the RepWL regex tape.
    rep_wl_block_len: usize,
    /// Repeat count from which a RepWL block is generalised to "or more".
    rep_wl_plus_threshold: usize,
    /// RepWL gives up once this many regex tapes have been visited.
    rep_wl_max_visited: usize,
    /// Step budget for one RepWL block macro-simulation.
    rep_wl_block_sim_steps: StepSmall,
    /// FAR enumeration ceiling: DFAs with 1..=limit states are tried, both directions.
    far_dfa_limit: usize,
    /// For data provider: return max this many machines. 0 = no limit.
    machines_limit: u64,
    /// Ids from the machine DB file (start, end exclusive). If None then all.
    file_id_range: Option<std::ops::Range<u64>>,
    /// batch size for operation
    batch_size: usize,
    /// This many undecided machines are stored in the result in full, to further analyze.
    limit_machines_undecided: usize,
    /// CPU utilization in percent, e.g. 75 -> 6 of 8 cores used. 0-150 allowed.
    cpu_utilization_percent: usize,
    /// Additional config e.g. for deciders using this library.
    config_key_value_pair: HashMap<String, String>,
    /// Creation time of this Config. Used for report headers.
    creation_time: SystemTime,
}

impl Config {
    /// Builder to initialize required values.
    pub fn builder(n_states: usize) -> ConfigBuilder {
        ConfigBuilder::new(n_states)
    }

    /// Builder to initialize required values taking over values of existing config.
    pub fn builder_from_config(config: &Config) -> ConfigBuilder {
        ConfigBuilder::new_config(config.clone())
    }

    /// Default values for testing purposes. Better use builder.
    pub fn new_default(n_states: usize) -> Config {
        Self {
            n_states,
            step_limit_loop: STEP_LIMIT_LOOP_DEFAULT,
            ngram_gas: NGRAM_GAS_DEFAULT,
            ngram_gram_len_left: NGRAM_GRAM_LEN_DEFAULT,
            ngram_gram_len_right: NGRAM_GRAM_LEN_DEFAULT,
            ngram_history_len: 0,
            rep_wl_block_len: REP_WL_BLOCK_LEN_DEFAULT,
            rep_wl_plus_threshold: REP_WL_PLUS_THRESHOLD_DEFAULT,
            rep_wl_max_visited: REP_WL_MAX_VISITED_DEFAULT,
            rep_wl_block_sim_steps: REP_WL_BLOCK_SIM_STEPS_DEFAULT,
            far_dfa_limit: FAR_DFA_LIMIT_DEFAULT,
            machines_limit: 0,
            file_id_range: None,
            batch_size: BATCH_SIZE_FILE,
            limit_machines_undecided: 0,
            cpu_utilization_percent: CPU_UTILIZATION_DEFAULT,
            config_key_value_pair: HashMap::new(),
            creation_time: SystemTime::now(),
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn step_limit_loop(&self) -> StepSmall {
        self.step_limit_loop
    }

    pub fn ngram_gas(&self) -> StepSmall {
        self.ngram_gas
    }

    pub fn ngram_gram_len_left(&self) -> usize {
        self.ngram_gram_len_left
    }

    pub fn ngram_gram_len_right(&self) -> usize {
        self.ngram_gram_len_right
    }

    pub fn ngram_history_len(&self) -> usize {
        self.ngram_history_len
    }

    pub fn rep_wl_block_len(&self) -> usize {
        self.rep_wl_block_len
    }

    pub fn rep_wl_plus_threshold(&self) -> usize {
        self.rep_wl_plus_threshold
    }

    pub fn rep_wl_max_visited(&self) -> usize {
        self.rep_wl_max_visited
    }

    pub fn rep_wl_block_sim_steps(&self) -> StepSmall {
        self.rep_wl_block_sim_steps
    }

    pub fn far_dfa_limit(&self) -> usize {
        self.far_dfa_limit
    }

    pub fn machines_limit(&self) -> u64 {
        self.machines_limit
    }

    pub fn file_id_range(&self) -> Option<std::ops::Range<u64>> {
        self.file_id_range.clone()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn limit_machines_undecided(&self) -> usize {
        self.limit_machines_undecided
    }

    pub fn cpu_utilization_percent(&self) -> usize {
        self.cpu_utilization_percent
    }

    pub fn config_key_value_pair(&self) -> &HashMap<String, String> {
        &self.config_key_value_pair
    }

    pub fn creation_time(&self) -> SystemTime {
        self.creation_time
    }

    pub fn config_toml(&self) -> &ConfigToml {
        &CONFIG_TOML
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new_default(N_STATES_DEFAULT)
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    fn new(n_states: usize) -> Self {
        Self {
            config: Config::new_default(n_states),
        }
    }

    fn new_config(config: Config) -> Self {
        Self { config }
    }

    pub fn step_limit_loop(mut self, step_limit: StepSmall) -> Self {
        self.config.step_limit_loop = step_limit;
        self
    }

    pub fn ngram_gas(mut self, gas: StepSmall) -> Self {
        self.config.ngram_gas = gas;
        self
    }

    pub fn ngram_gram_len(mut self, len_left: usize, len_right: usize) -> Self {
        assert!(len_left > 0 && len_right > 0);
        self.config.ngram_gram_len_left = len_left;
        self.config.ngram_gram_len_right = len_right;
        self
    }

    pub fn ngram_history_len(mut self, history_len: usize) -> Self {
        self.config.ngram_history_len = history_len;
        self
    }

    pub fn rep_wl_block_len(mut self, block_len: usize) -> Self {
        assert!(block_len > 0);
        self.config.rep_wl_block_len = block_len;
        self
    }

    pub fn rep_wl_plus_threshold(mut self, plus_threshold: usize) -> Self {
        assert!(plus_threshold > 0);
        self.config.rep_wl_plus_threshold = plus_threshold;
        self
    }

    pub fn rep_wl_max_visited(mut self, max_visited: usize) -> Self {
        self.config.rep_wl_max_visited = max_visited;
        self
    }

    pub fn rep_wl_block_sim_steps(mut self, steps: StepSmall) -> Self {
        self.config.rep_wl_block_sim_steps = steps;
        self
    }

    pub fn far_dfa_limit(mut self, limit: usize) -> Self {
        self.config.far_dfa_limit = limit;
        self
    }

    pub fn machines_limit(mut self, limit: u64) -> Self {
        self.config.machines_limit = limit;
        self
    }

    pub fn file_id_range(mut self, range: std::ops::Range<u64>) -> Self {
        self.config.file_id_range = Some(range);
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn limit_machines_undecided(mut self, limit: usize) -> Self {
        self.config.limit_machines_undecided = limit;
        self
    }

    pub fn cpu_utilization_percent(mut self, percent: usize) -> Self {
        self.config.cpu_utilization_percent = percent;
        self
    }

    pub fn key_value(mut self, key: &str, value: &str) -> Self {
        self.config
            .config_key_value_pair
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
