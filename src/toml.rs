//! Very basic functionality to read and write some configuration into a toml configuration file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfigToml {
    /// file path and file name of the machine DB, usually named "all_5_states_undecided_machines_with_global_header"
    #[serde(default = "default_machine_db_file")]
    machine_db_filename_path: String,

    /// Whether the machine DB carries the 30-byte global header record.
    #[serde(default = "default_machine_db_has_header")]
    machine_db_has_header: bool,

    /// file path and file name of the decider verification file consumed by the FAR verifier.
    #[serde(default = "default_dvf_file")]
    dvf_filename_path: String,
}

impl ConfigToml {
    pub fn read_toml() -> ConfigToml {
        if Path::new(CONFIG_FILE).exists() {
            let config_content = fs::read_to_string(CONFIG_FILE)
                .expect("Config file {CONFIG_FILE} could not be read.");
            let config: ConfigToml = toml::from_str(&config_content)
                .expect("Config file {CONFIG_FILE} could not be parsed.");
            config
        } else {
            println!(
                "Config file {CONFIG_FILE} not found, creating a new one with default values."
            );
            let default_config = ConfigToml::default();
            let toml_string = toml::to_string_pretty(&default_config)
                .expect("Failed to serialize default config");
            let write_result = fs::write(CONFIG_FILE, toml_string);
            if write_result.is_err() {
                println!(
                    "ERROR: Config file {CONFIG_FILE} was not found and could not be written. Using default values, some functionality might not be available."
                );
            }
            default_config
        }
    }

    pub fn machine_db_filename_path(&self) -> &str {
        &self.machine_db_filename_path
    }

    pub fn machine_db_has_header(&self) -> bool {
        self.machine_db_has_header
    }

    pub fn dvf_filename_path(&self) -> &str {
        &self.dvf_filename_path
    }
}

impl Default for ConfigToml {
    fn default() -> Self {
        ConfigToml {
            machine_db_filename_path: default_machine_db_file(),
            machine_db_has_header: default_machine_db_has_header(),
            dvf_filename_path: default_dvf_file(),
        }
    }
}

fn default_machine_db_file() -> String {
    "../res/all_5_states_undecided_machines_with_global_header".to_string()
}

fn default_machine_db_has_header() -> bool {
    true
}

fn default_dvf_file() -> String {
    "../res/finite_automata_reduction.dvf".to_string()
}
