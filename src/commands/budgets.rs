// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::AppError;
use crate::models::{Budget, BudgetPeriod, Category, User};
use crate::utils::{
    decimal_at, fmt_amount, maybe_print_json, month_end, month_start, opt_decimal_at, parse_date,
    parse_decimal, pretty_table, today, week_end, week_start, year_end, year_start,
};
use crate::validate;
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, owner: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("edit", sub)) => edit(conn, owner, sub)?,
        Some(("rm", sub)) => rm(conn, owner, sub)?,
        _ => {}
    }
    Ok(())
}

const BUDGET_COLUMNS: &str =
    "id, user_id, category, amount, period, start_date, end_date, alert_threshold";

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        user_id: r.get(1)?,
        category: r.get(2)?,
        amount: decimal_at(r, 3)?,
        period: r.get(4)?,
        start_date: r.get(5)?,
        end_date: r.get(6)?,
        alert_threshold: opt_decimal_at(r, 7)?,
    })
}

fn load_owned(conn: &Connection, owner_id: i64, id: i64) -> Result<Budget> {
    let sql = format!(
        "SELECT {} FROM budgets WHERE id=?1 AND user_id=?2",
        BUDGET_COLUMNS
    );
    let b = conn
        .query_row(&sql, params![id, owner_id], budget_from_row)
        .optional()?
        .ok_or(AppError::NotFound { kind: "Budget", id })?;
    Ok(b)
}

/// `None` and "all" both mean the budget covers every category.
fn parse_category(s: Option<&String>) -> Result<Option<String>> {
    match s.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => Ok(Some(s.parse::<Category>()?.label().to_string())),
    }
}

fn add(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let amount = validate::amount(parse_decimal(sub.get_one::<String>("amount").unwrap())?)?;
    let period: BudgetPeriod = sub.get_one::<String>("period").unwrap().parse()?;
    let category = parse_category(sub.get_one::<String>("category"))?;
    let start = match sub.get_one::<String>("start") {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let end = sub.get_one::<String>("end").map(|s| parse_date(s)).transpose()?;
    validate::date_range(start, end)?;
    let threshold = sub
        .get_one::<String>("alert-threshold")
        .map(|s| parse_decimal(s).and_then(|d| Ok(validate::alert_threshold(d)?)))
        .transpose()?;

    conn.execute(
        "INSERT INTO budgets(user_id, category, amount, period, start_date, end_date, alert_threshold)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            owner.id,
            category,
            amount.to_string(),
            period.as_str(),
            start,
            end,
            threshold.map(|t| t.to_string())
        ],
    )?;
    println!(
        "Budget #{} set: {} {} for {}",
        conn.last_insert_rowid(),
        amount,
        period,
        category.as_deref().unwrap_or("all categories")
    );
    Ok(())
}

/// Inclusive date range a budget is measured over, relative to `today`.
pub fn period_range(
    period: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    match period.parse::<BudgetPeriod>() {
        Ok(BudgetPeriod::Monthly) => (month_start(today), month_end(today)),
        Ok(BudgetPeriod::Weekly) => (week_start(today), week_end(today)),
        Ok(BudgetPeriod::Yearly) => (year_start(today), year_end(today)),
        // custom and anything unrecognised use the budget's own dates
        _ => (start, end.unwrap_or_else(|| month_end(start))),
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetProgress {
    pub id: i64,
    pub category: Option<String>,
    pub period: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub amount: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub progress: Decimal,
    pub alert_threshold: Option<Decimal>,
    pub status: &'static str,
}

const MAX_PROGRESS: i64 = 999;

pub fn budget_progress(conn: &Connection, b: &Budget, today: NaiveDate) -> Result<BudgetProgress> {
    let (from, to) = period_range(&b.period, b.start_date, b.end_date, today);

    let mut stmt = conn.prepare(
        "SELECT amount FROM expenses
         WHERE user_id=?1 AND date>=?2 AND date<=?3 AND (?4 IS NULL OR category=?4)",
    )?;
    let mut rows = stmt.query(params![b.user_id, from, to, b.category])?;
    let mut spent = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        spent += decimal_at(r, 0)?;
    }

    let remaining = (b.amount - spent).max(Decimal::ZERO);
    let progress = if b.amount > Decimal::ZERO {
        (spent / b.amount * Decimal::ONE_HUNDRED)
            .min(Decimal::from(MAX_PROGRESS))
            .round_dp(2)
    } else {
        Decimal::ZERO
    };
    let status = if spent > b.amount {
        "over"
    } else if b.alert_threshold.is_some_and(|t| progress >= t) {
        "alert"
    } else {
        "ok"
    };

    Ok(BudgetProgress {
        id: b.id,
        category: b.category.clone(),
        period: b.period.clone(),
        from,
        to,
        amount: b.amount,
        spent,
        remaining,
        progress,
        alert_threshold: b.alert_threshold,
        status,
    })
}

pub fn query_progress(conn: &Connection, owner_id: i64, today: NaiveDate) -> Result<Vec<BudgetProgress>> {
    let sql = format!(
        "SELECT {} FROM budgets WHERE user_id=?1 ORDER BY created_at DESC, id DESC",
        BUDGET_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id], budget_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(budget_progress(conn, &row?, today)?);
    }
    Ok(data)
}

fn list(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_progress(conn, owner.id, today())?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.category.clone().unwrap_or_else(|| "(all)".into()),
                    p.period.clone(),
                    format!("{}..{}", p.from, p.to),
                    fmt_amount(&p.amount),
                    fmt_amount(&p.spent),
                    fmt_amount(&p.remaining),
                    format!("{}%", p.progress.round_dp(0)),
                    p.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Category", "Period", "Range", "Budget", "Spent", "Remaining", "Progress",
                    "Status"
                ],
                rows,
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let existing = load_owned(conn, owner.id, id)?;

    let amount = match sub.get_one::<String>("amount") {
        Some(s) => validate::amount(parse_decimal(s)?)?,
        None => existing.amount,
    };
    let period = match sub.get_one::<String>("period") {
        Some(s) => s.parse::<BudgetPeriod>()?.as_str().to_string(),
        None => existing.period,
    };
    let category = match sub.get_one::<String>("category") {
        Some(s) => parse_category(Some(s))?,
        None => existing.category,
    };
    let start = match sub.get_one::<String>("start") {
        Some(s) => parse_date(s)?,
        None => existing.start_date,
    };
    let end = match sub.get_one::<String>("end") {
        Some(s) => Some(parse_date(s)?),
        None => existing.end_date,
    };
    validate::date_range(start, end)?;
    let threshold = match sub.get_one::<String>("alert-threshold") {
        Some(s) => Some(validate::alert_threshold(parse_decimal(s)?)?),
        None => existing.alert_threshold,
    };

    conn.execute(
        "UPDATE budgets SET category=?1, amount=?2, period=?3, start_date=?4, end_date=?5,
            alert_threshold=?6 WHERE id=?7 AND user_id=?8",
        params![
            category,
            amount.to_string(),
            period,
            start,
            end,
            threshold.map(|t| t.to_string()),
            id,
            owner.id
        ],
    )?;
    println!("Updated budget #{}", id);
    Ok(())
}

fn rm(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    load_owned(conn, owner.id, id)?;
    conn.execute(
        "DELETE FROM budgets WHERE id=?1 AND user_id=?2",
        params![id, owner.id],
    )?;
    println!("Removed budget #{}", id);
    Ok(())
}
