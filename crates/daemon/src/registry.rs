// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project `Coordinator` registry. Each project is an independent log
//! (Design Notes §2: "cross-project work" is a non-goal), so the daemon
//! holds one open `Coordinator` per project key, opened lazily on first
//! use and kept for the life of the daemon process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use sw_engine::{Coordinator, CoordinatorError};

#[derive(Clone)]
pub struct Registry {
    state_dir: PathBuf,
    coordinators: Arc<Mutex<HashMap<String, Arc<Coordinator>>>>,
}

impl Registry {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            coordinators: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get_or_open(&self, project_key: &str) -> Result<Arc<Coordinator>, CoordinatorError> {
        if let Some(existing) = self.coordinators.lock().get(project_key) {
            return Ok(Arc::clone(existing));
        }
        let coord = Arc::new(Coordinator::open(&self.state_dir, project_key)?);
        self.coordinators.lock().insert(project_key.to_string(), Arc::clone(&coord));
        Ok(coord)
    }

    /// Snapshot of every project currently open, for background sweeps and
    /// the `/cells` fan-out endpoint's default project resolution.
    pub fn open_projects(&self) -> Vec<Arc<Coordinator>> {
        self.coordinators.lock().values().cloned().collect()
    }
}
