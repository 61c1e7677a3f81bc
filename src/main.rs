// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use spendlog::commands::users::resolve_owner;
use spendlog::{cli, commands, config::AppConfig, db};

fn main() -> Result<()> {
    // stdout carries tables and JSON, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();
    let cfg = AppConfig::from_matches(&matches)?;

    let mut conn = db::open_or_init(&cfg.db_path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", cfg.db_path.display());
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some((name, sub)) => {
            let owner = resolve_owner(&conn, cfg.user.as_deref())?;
            match name {
                "expense" => commands::expenses::handle(&conn, &owner, sub)?,
                "recurring" => commands::recurring::handle(&mut conn, &owner, sub)?,
                "budget" => commands::budgets::handle(&conn, &owner, sub)?,
                "stats" => commands::stats::handle(&conn, &owner, sub)?,
                "export" => commands::exporter::handle(&conn, &owner, sub)?,
                _ => {}
            }
        }
        None => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
