// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::db;

/// Per-invocation settings from flags and the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub user: Option<String>,
}

impl AppConfig {
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let db_path = match m
            .get_one::<String>("db")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            Some(p) => PathBuf::from(p),
            None => db::default_db_path()?,
        };
        let user = m.get_one::<String>("user").cloned();
        debug!(db = %db_path.display(), user = ?user, "resolved configuration");
        Ok(AppConfig { db_path, user })
    }
}
