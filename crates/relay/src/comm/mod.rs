/*
 * mod.rs
 *
 * Copyright (C) 2024 Posit Software, PBC. All rights reserved.
 *
 */

pub mod base_comm;
pub mod comm_channel;
pub mod data_explorer_comm;
pub mod event;
