/*
 * lib.rs
 *
 * Copyright (C) 2024 Posit Software, PBC. All rights reserved.
 *
 */

pub mod comm;
pub mod socket;
