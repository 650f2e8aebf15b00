//
// registry.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use relay::comm::data_explorer_comm::DataExplorerFrontendEvent;
use uuid::Uuid;

use crate::data_explorer::table_view::TableView;
use crate::error::Error;
use crate::handle::TableHandle;

pub type ViewId = String;

/// Where a viewed value lives in the host namespace: a variable name,
/// followed by the keys leading to a nested table, if any.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariablePath(Vec<String>);

impl VariablePath {
    pub fn new(segments: Vec<String>) -> crate::Result<Self> {
        if segments.is_empty() {
            return Err(Error::InvalidPath {
                path: segments,
                message: String::from("path is empty"),
            });
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(Error::InvalidPath {
                path: segments,
                message: String::from("path has an empty segment"),
            });
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

/// Owns every open view, and knows which variable each view is bound to.
pub struct ViewRegistry {
    views: HashMap<ViewId, TableView>,
    bindings: HashMap<VariablePath, HashSet<ViewId>>,
    reconcile_threshold: usize,
}

impl ViewRegistry {
    pub fn new(reconcile_threshold: usize) -> Self {
        Self {
            views: HashMap::new(),
            bindings: HashMap::new(),
            reconcile_threshold,
        }
    }

    /// Opens a view of `handle` under a fresh id. Views bound to a variable
    /// follow its updates and are closed when it is deleted.
    pub fn open(
        &mut self,
        title: String,
        handle: TableHandle,
        binding: Option<VariablePath>,
    ) -> ViewId {
        let id = Uuid::new_v4().to_string();
        let view = TableView::new(title, handle, self.reconcile_threshold);
        log::info!("Opening data explorer view '{}' ({id})", view.title());

        self.views.insert(id.clone(), view);
        if let Some(path) = binding {
            self.bindings.entry(path).or_default().insert(id.clone());
        }
        id
    }

    pub fn get(&self, id: &str) -> crate::Result<&TableView> {
        self.views
            .get(id)
            .ok_or_else(|| Error::ViewNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> crate::Result<&mut TableView> {
        self.views
            .get_mut(id)
            .ok_or_else(|| Error::ViewNotFound(id.to_string()))
    }

    pub fn close(&mut self, id: &str) -> crate::Result<TableView> {
        let view = self
            .views
            .remove(id)
            .ok_or_else(|| Error::ViewNotFound(id.to_string()))?;

        self.bindings.retain(|_, ids| {
            ids.remove(id);
            !ids.is_empty()
        });

        log::info!("Closed data explorer view '{}' ({id})", view.title());
        Ok(view)
    }

    /// Points every view bound to `path` at the new value. Returns the
    /// event each affected view should send to its front end.
    pub fn variable_updated(
        &mut self,
        path: &VariablePath,
        handle: &TableHandle,
    ) -> Vec<(ViewId, DataExplorerFrontendEvent)> {
        let Some(ids) = self.bindings.get(path) else {
            return vec![];
        };

        let mut events = Vec::with_capacity(ids.len());
        for id in ids.iter() {
            let Some(view) = self.views.get_mut(id) else {
                log::warn!("Binding '{path}' refers to unknown view {id}");
                continue;
            };
            if let Some(event) = view.update(handle.clone()) {
                events.push((id.clone(), event));
            }
        }
        events
    }

    /// Closes every view bound to `path` and returns their ids.
    pub fn variable_deleted(&mut self, path: &VariablePath) -> Vec<ViewId> {
        let Some(ids) = self.bindings.remove(path) else {
            return vec![];
        };

        let mut closed = Vec::with_capacity(ids.len());
        for id in ids.into_iter() {
            if self.close(&id).is_ok() {
                closed.push(id);
            }
        }
        closed
    }

    pub fn ids(&self) -> impl Iterator<Item = &ViewId> {
        self.views.keys()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
