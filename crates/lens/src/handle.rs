//
// handle.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::any::Any;
use std::sync::Arc;

/// A shared reference to a host value that may or may not be tabular.
/// Views never mutate the value behind the handle; they probe it by type
/// when a backend is selected.
#[derive(Clone)]
pub struct TableHandle(Arc<dyn Any + Send + Sync>);

impl TableHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.clone().downcast::<T>().ok()
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &TableHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TableHandle({:p})", Arc::as_ptr(&self.0))
    }
}
