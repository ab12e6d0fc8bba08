use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lookahead: LookaheadConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookahead: LookaheadConfig::default(),
            input: InputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookaheadConfig {
    /// Largest horizontal distance stored in the tables.
    #[serde(default = "default_table_width")]
    pub table_width: u32,
    /// Largest vertical distance stored in the tables.
    #[serde(default = "default_table_height")]
    pub table_height: u32,
    /// How far past the target a path may overshoot before returning.
    #[serde(default = "default_detour_budget")]
    pub detour_budget: u32,
    /// Worker threads for table construction, 0 for the rayon default.
    #[serde(default)]
    pub threads: usize,
    /// Fail construction when a logic_out -> logic_in cell is unreachable.
    #[serde(default = "default_strict_tables")]
    pub strict_tables: bool,
}

impl Default for LookaheadConfig {
    fn default() -> Self {
        Self {
            table_width: default_table_width(),
            table_height: default_table_height(),
            detour_budget: default_detour_budget(),
            threads: 0,
            strict_tables: default_strict_tables(),
        }
    }
}

impl LookaheadConfig {
    pub fn with_tables(mut self, width: u32, height: u32) -> Self {
        self.table_width = width;
        self.table_height = height;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    /// Characterization TOML. The built-in reference fabric is used when unset.
    #[serde(default)]
    pub fabric_file: Option<String>,
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            fabric_file: None,
            cache_file: default_cache_file(),
        }
    }
}

fn default_table_width() -> u32 {
    12
}

fn default_table_height() -> u32 {
    24
}

fn default_detour_budget() -> u32 {
    2
}

fn default_strict_tables() -> bool {
    true
}

fn default_cache_file() -> String {
    "output/lookahead.bin".to_string()
}
