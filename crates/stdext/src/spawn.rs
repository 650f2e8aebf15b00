//
// spawn.rs
//
// Copyright (C) 2022 Posit Software, PBC. All rights reserved.
//
//

/// Spawn a named thread. Panics if the OS refuses to create the thread,
/// which leaves the process in no state to continue anyway.
#[macro_export]
macro_rules! spawn {
    ($name:expr, $body:expr) => {{
        std::thread::Builder::new()
            .name($name.to_string())
            .spawn($body)
            .expect(&format!("Failed to spawn thread '{}'", $name))
    }};
}
