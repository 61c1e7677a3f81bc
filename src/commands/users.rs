// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::AppError;
use crate::models::User;
use crate::utils::{get_setting, pretty_table, set_setting};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

pub const DEFAULT_USER_KEY: &str = "default_user";
pub const DEMO_USER: &str = "demo";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let email = sub
                .get_one::<String>("email")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());
            if name.is_empty() {
                return Err(AppError::validation("User name cannot be empty").into());
            }
            conn.execute(
                "INSERT INTO users(name, email) VALUES (?1, ?2)",
                params![name, email],
            )?;
            println!("Added user '{}'", name);
        }
        Some(("list", _)) => {
            let default = get_setting(conn, DEFAULT_USER_KEY)?;
            let mut stmt = conn.prepare(
                "SELECT name, COALESCE(email,''), created_at FROM users ORDER BY name",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, e, c) = row?;
                let mark = if default.as_deref() == Some(n.as_str()) {
                    "*".to_string()
                } else {
                    String::new()
                };
                data.push(vec![n, e, c, mark]);
            }
            println!(
                "{}",
                pretty_table(&["Name", "Email", "Created", "Default"], data)
            );
        }
        Some(("default", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            find_user(conn, name)?.ok_or_else(|| AppError::UnknownUser(name.to_string()))?;
            set_setting(conn, DEFAULT_USER_KEY, name)?;
            println!("Default user is now '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn find_user(conn: &Connection, name: &str) -> Result<Option<User>> {
    let u = conn
        .query_row(
            "SELECT id, name, email FROM users WHERE name=?1",
            params![name],
            |r| {
                Ok(User {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    email: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(u)
}

/// Resolves who the current invocation acts for.
///
/// An explicit name must exist. Without one the `default_user` setting is
/// used, and failing that a `demo` user is created on first use.
pub fn resolve_owner(conn: &Connection, requested: Option<&str>) -> Result<User> {
    if let Some(name) = requested.map(str::trim).filter(|s| !s.is_empty()) {
        return find_user(conn, name)?
            .ok_or_else(|| AppError::UnknownUser(name.to_string()).into());
    }
    if let Some(name) = get_setting(conn, DEFAULT_USER_KEY)? {
        if let Some(u) = find_user(conn, &name)? {
            return Ok(u);
        }
    }
    if let Some(u) = find_user(conn, DEMO_USER)? {
        return Ok(u);
    }
    conn.execute(
        "INSERT INTO users(name, email) VALUES (?1, NULL)",
        params![DEMO_USER],
    )?;
    info!(user = DEMO_USER, "created demo user");
    Ok(User {
        id: conn.last_insert_rowid(),
        name: DEMO_USER.to_string(),
        email: None,
    })
}
