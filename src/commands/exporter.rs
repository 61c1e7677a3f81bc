// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::utils::{decimal_at, fmt_amount};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use serde_json::json;

pub fn handle(conn: &Connection, owner: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => export_expenses(conn, owner, sub),
        _ => Ok(()),
    }
}

fn export_expenses(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    let n = write_expenses(conn, owner.id, &fmt, out)?;
    println!("Exported {} expenses to {}", n, out);
    Ok(())
}

/// Writes all of the owner's expenses, oldest first. Returns the row count.
pub fn write_expenses(conn: &Connection, owner_id: i64, fmt: &str, out: &str) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT date, category, amount, description, payment_method, is_recurring
         FROM expenses WHERE user_id=?1
         ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![owner_id], |r| {
        Ok((
            r.get::<_, NaiveDate>(0)?,
            r.get::<_, String>(1)?,
            decimal_at(r, 2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, bool>(5)?,
        ))
    })?;

    let mut n = 0;
    match fmt {
        "csv" => {
            let mut wtr =
                csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record([
                "Date",
                "Category",
                "Amount",
                "Description",
                "Payment Method",
                "Recurring",
            ])?;
            for row in rows {
                let (d, cat, amt, desc, method, rec) = row?;
                wtr.write_record([
                    d.to_string(),
                    cat,
                    fmt_amount(&amt),
                    desc.unwrap_or_default(),
                    method,
                    if rec { "yes".into() } else { "no".into() },
                ])?;
                n += 1;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, cat, amt, desc, method, rec) = row?;
                items.push(json!({
                    "date": d, "category": cat, "amount": fmt_amount(&amt), "description": desc,
                    "payment_method": method, "recurring": rec
                }));
            }
            n = items.len();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out))?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    Ok(n)
}
