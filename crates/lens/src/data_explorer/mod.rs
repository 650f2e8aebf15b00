//
// mod.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

pub mod backend;
pub mod coerce;
pub mod column_profile;
pub mod export_selection;
pub mod filter;
pub mod format;
pub mod histogram;
pub mod reconcile;
pub mod search_schema;
pub mod sort;
pub mod summary_stats;
pub mod table_view;
pub mod utils;
