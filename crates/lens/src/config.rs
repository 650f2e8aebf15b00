//
// config.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::path::Path;

use relay::comm::data_explorer_comm::FormatOptions;
use serde::Deserialize;
use serde::Serialize;

/// Number of columns above which schema reconciliation gives up on a full
/// per-column diff and reports a schema change instead.
pub const DEFAULT_RECONCILE_COLUMN_THRESHOLD: usize = 10_000;

pub const DATA_EXPLORER_COMM_NAME: &str = "positron.dataExplorer";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
    pub reconcile_column_threshold: usize,

    /// Filled into requests read by the `lens` binary that omit
    /// `format_options`.
    pub default_format_options: FormatOptions,

    pub comm_name: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            reconcile_column_threshold: DEFAULT_RECONCILE_COLUMN_THRESHOLD,
            default_format_options: default_format_options(),
            comm_name: String::from(DATA_EXPLORER_COMM_NAME),
        }
    }
}

impl ExplorerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

pub fn default_format_options() -> FormatOptions {
    FormatOptions {
        large_num_digits: 2,
        small_num_digits: 4,
        max_integral_digits: 7,
        max_value_length: 1000,
        thousands_sep: Some(String::from(",")),
    }
}
