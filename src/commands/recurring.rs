// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::AppError;
use crate::models::{Category, Frequency, PaymentMethod, RecurringDefinition, User};
use crate::schedule::{
    self, Backlog, MaterializeReport, RECURRING_COLUMNS, first_due, recurring_from_row,
};
use crate::utils::{fmt_amount, maybe_print_json, parse_date, parse_decimal, pretty_table, today};
use crate::validate;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

pub fn handle(conn: &mut Connection, owner: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("edit", sub)) => edit(conn, owner, sub)?,
        Some(("pause", sub)) => set_active(conn, owner, sub, false)?,
        Some(("resume", sub)) => set_active(conn, owner, sub, true)?,
        Some(("rm", sub)) => rm(conn, owner, sub)?,
        Some(("run", sub)) => run(conn, owner, sub)?,
        _ => {}
    }
    Ok(())
}

/// Loads a definition owned by `owner_id`; other owners' ids read as missing.
pub fn load_owned(conn: &Connection, owner_id: i64, id: i64) -> Result<RecurringDefinition> {
    let sql = format!(
        "SELECT {} FROM recurring_expenses WHERE id=?1 AND user_id=?2",
        RECURRING_COLUMNS
    );
    let def = conn
        .query_row(&sql, params![id, owner_id], recurring_from_row)
        .optional()?
        .ok_or(AppError::NotFound {
            kind: "Recurring expense",
            id,
        })?;
    Ok(def)
}

fn parse_opt_date(sub: &clap::ArgMatches, name: &str) -> Result<Option<NaiveDate>> {
    sub.get_one::<String>(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_date)
        .transpose()
}

fn add(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let amount = validate::amount(parse_decimal(sub.get_one::<String>("amount").unwrap())?)?;
    let category: Category = sub.get_one::<String>("category").unwrap().parse()?;
    let frequency: Frequency = sub.get_one::<String>("frequency").unwrap().parse()?;
    let method: PaymentMethod = sub.get_one::<String>("payment-method").unwrap().parse()?;
    let description =
        validate::description(sub.get_one::<String>("description").map(|s| s.as_str()))?;
    let day_of_month = sub.get_one::<i64>("day-of-month").copied();
    let day_of_week = sub.get_one::<i64>("day-of-week").copied();
    let start = parse_opt_date(sub, "start")?.unwrap_or_else(today);
    let end = parse_opt_date(sub, "end")?;
    validate::date_range(start, end)?;

    let next_due = first_due(start, frequency, day_of_month, day_of_week);
    conn.execute(
        "INSERT INTO recurring_expenses(user_id, amount, category, description, payment_method,
            frequency, day_of_month, day_of_week, start_date, end_date, is_active, next_due_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11)",
        params![
            owner.id,
            amount.to_string(),
            category.label(),
            description,
            method.label(),
            frequency.as_str(),
            day_of_month,
            day_of_week,
            start,
            end,
            next_due
        ],
    )?;
    println!(
        "Scheduled #{}: {} {} {}, first due {}",
        conn.last_insert_rowid(),
        amount,
        category,
        frequency,
        next_due
    );
    Ok(())
}

/// Owner's definitions ordered by next due date, without materializing.
pub fn query_rows(conn: &Connection, owner_id: i64) -> Result<Vec<RecurringDefinition>> {
    let sql = format!(
        "SELECT {} FROM recurring_expenses WHERE user_id=?1 ORDER BY next_due_date, id",
        RECURRING_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id], recurring_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Materializes whatever is due today, then returns the owner's definitions.
pub fn list_with_materialization(
    conn: &mut Connection,
    owner_id: i64,
    today: NaiveDate,
) -> Result<Vec<RecurringDefinition>> {
    schedule::materialize_due(conn, owner_id, today, Backlog::Single)
        .context("Failed to fetch recurring expenses")?;
    query_rows(conn, owner_id)
}

fn list(conn: &mut Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = list_with_materialization(conn, owner.id, today())?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|d| {
                let anchor = match (d.day_of_month, d.day_of_week) {
                    (Some(dom), _) => format!("day {}", dom),
                    (None, Some(dow)) => format!("weekday {}", dow),
                    _ => String::new(),
                };
                vec![
                    d.id.to_string(),
                    fmt_amount(&d.amount),
                    d.category.clone(),
                    d.frequency.clone(),
                    anchor,
                    d.next_due_date.to_string(),
                    d.end_date.map(|e| e.to_string()).unwrap_or_default(),
                    if d.is_active { "active" } else { "paused" }.to_string(),
                    d.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID",
                    "Amount",
                    "Category",
                    "Frequency",
                    "Anchor",
                    "Next Due",
                    "Ends",
                    "Status",
                    "Description"
                ],
                rows,
            )
        );
    }
    Ok(())
}

/// Partial update. The next due date is left alone; it only ever moves
/// through materialization.
fn edit(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let existing = load_owned(conn, owner.id, id)?;

    let amount = match sub.get_one::<String>("amount") {
        Some(s) => validate::amount(parse_decimal(s)?)?,
        None => existing.amount,
    };
    let category = match sub.get_one::<String>("category") {
        Some(s) => s.parse::<Category>()?.label().to_string(),
        None => existing.category,
    };
    let method = match sub.get_one::<String>("payment-method") {
        Some(s) => s.parse::<PaymentMethod>()?.label().to_string(),
        None => existing.payment_method,
    };
    let frequency = match sub.get_one::<String>("frequency") {
        Some(s) => s.parse::<Frequency>()?.as_str().to_string(),
        None => existing.frequency,
    };
    let description = match sub.get_one::<String>("description") {
        Some(s) => validate::description(Some(s))?,
        None => existing.description,
    };
    let (day_of_month, day_of_week) = if sub.get_flag("clear-anchors") {
        (None, None)
    } else {
        (
            sub.get_one::<i64>("day-of-month")
                .copied()
                .or(existing.day_of_month),
            sub.get_one::<i64>("day-of-week")
                .copied()
                .or(existing.day_of_week),
        )
    };
    let start = parse_opt_date(sub, "start")?.unwrap_or(existing.start_date);
    let end = if sub.get_flag("no-end") {
        None
    } else {
        parse_opt_date(sub, "end")?.or(existing.end_date)
    };
    validate::date_range(start, end)?;

    conn.execute(
        "UPDATE recurring_expenses SET amount=?1, category=?2, description=?3, payment_method=?4,
            frequency=?5, day_of_month=?6, day_of_week=?7, start_date=?8, end_date=?9
         WHERE id=?10 AND user_id=?11",
        params![
            amount.to_string(),
            category,
            description,
            method,
            frequency,
            day_of_month,
            day_of_week,
            start,
            end,
            id,
            owner.id
        ],
    )?;
    println!("Updated recurring expense #{}", id);
    Ok(())
}

fn set_active(conn: &Connection, owner: &User, sub: &clap::ArgMatches, active: bool) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    load_owned(conn, owner.id, id)?;
    conn.execute(
        "UPDATE recurring_expenses SET is_active=?1 WHERE id=?2 AND user_id=?3",
        params![active, id, owner.id],
    )?;
    println!(
        "{} recurring expense #{}",
        if active { "Resumed" } else { "Paused" },
        id
    );
    Ok(())
}

fn rm(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    load_owned(conn, owner.id, id)?;
    // Materialized expenses stay; their back-reference is cleared by the FK.
    conn.execute(
        "DELETE FROM recurring_expenses WHERE id=?1 AND user_id=?2",
        params![id, owner.id],
    )?;
    println!("Removed recurring expense #{}", id);
    Ok(())
}

fn run(conn: &mut Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let backlog = if sub.get_flag("catch-up") {
        Backlog::CatchUp
    } else {
        Backlog::Single
    };
    let report: MaterializeReport = schedule::materialize_due(conn, owner.id, today(), backlog)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report.created)? {
        if report.created.is_empty() {
            println!("Nothing due");
            return Ok(());
        }
        let rows: Vec<Vec<String>> = report
            .created
            .iter()
            .map(|o| {
                vec![
                    o.recurring_id.to_string(),
                    o.expense_id.to_string(),
                    o.date.to_string(),
                    fmt_amount(&o.amount),
                    o.category.clone(),
                    o.next_due_date.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Schedule", "Expense", "Date", "Amount", "Category", "Next Due"],
                rows,
            )
        );
    }
    Ok(())
}
