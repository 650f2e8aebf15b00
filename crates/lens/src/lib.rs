//
// lib.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

pub mod bridge;
pub mod config;
pub mod data_explorer;
pub mod error;
pub mod fixtures;
pub mod frame;
pub mod handle;
pub mod logger;
pub mod registry;
pub mod service;
pub mod value;

pub use error::Error;
pub use error::Result;
