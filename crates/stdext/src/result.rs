//
// result.rs
//
// Copyright (C) 2023 Posit Software, PBC. All rights reserved.
//
//

pub trait ResultExt<T, E> {
    /// Calls the provided closure with the contained error (if [`Err`]).
    ///
    /// Consumes the Result, unlike `inspect_err()` which propagates it and
    /// still requires you to handle the Result in some way.
    fn on_err<F: FnOnce(E)>(self, f: F);
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn on_err<F: FnOnce(E)>(self, f: F) {
        if let Err(e) = self {
            f(e);
        }
    }
}

/// Log the error of a fire-and-forget operation, typically a channel send
/// whose receiver may already be gone.
pub trait ResultOrLog<E> {
    fn or_log_error(self, prefix: &str);
    fn or_log_warning(self, prefix: &str);
}

impl<T, E> ResultOrLog<E> for Result<T, E>
where
    E: std::fmt::Debug,
{
    fn or_log_error(self, prefix: &str) {
        if let Err(err) = self {
            log::error!("{prefix}: {err:?}");
        }
    }

    fn or_log_warning(self, prefix: &str) {
        if let Err(err) = self {
            log::warn!("{prefix}: {err:?}");
        }
    }
}
