//
// unwrap.rs
//
// Copyright (C) 2022 Posit Software, PBC. All rights reserved.
//
//

// Unify `Option` and `Result` so that `unwrap!` can destructure either with
// an explicit fallback arm, e.g.
//
//     let x = unwrap!(maybe, None => return);
//     let y = unwrap!(result, Err(err) => {
//         log::error!("{err}");
//         continue;
//     });
pub trait IntoResult<T, E> {
    fn into_result(self) -> Result<T, E>;
}

impl<T, E> IntoResult<T, E> for Result<T, E> {
    fn into_result(self) -> Result<T, E> {
        self
    }
}

impl<T> IntoResult<T, ()> for Option<T> {
    fn into_result(self) -> Result<T, ()> {
        self.ok_or(())
    }
}

pub trait IntoOption<T> {
    fn into_option(self) -> Option<T>;
}

impl<T> IntoOption<T> for Option<T> {
    fn into_option(self) -> Option<T> {
        self
    }
}

impl<T, E> IntoOption<T> for Result<T, E> {
    fn into_option(self) -> Option<T> {
        self.ok()
    }
}

#[macro_export]
macro_rules! unwrap {

    ($value:expr, Err($id:ident) => $error:expr) => {
        match $crate::IntoResult::into_result($value) {
            Ok(value) => value,
            Err($id) => $error,
        }
    };

    ($value:expr, None => $error:expr) => {
        match $crate::IntoOption::into_option($value) {
            Some(value) => value,
            None => $error,
        }
    };

}
