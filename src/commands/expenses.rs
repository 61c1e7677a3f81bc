// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::AppError;
use crate::models::{Category, Expense, PaymentMethod, User};
use crate::utils::{
    decimal_at, fmt_amount, maybe_print_json, parse_date, parse_decimal, pretty_table, today,
};
use crate::validate;
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::Serialize;

pub fn handle(conn: &Connection, owner: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("show", sub)) => show(conn, owner, sub)?,
        Some(("edit", sub)) => edit(conn, owner, sub)?,
        Some(("rm", sub)) => rm(conn, owner, sub)?,
        _ => {}
    }
    Ok(())
}

const EXPENSE_COLUMNS: &str = "id, user_id, amount, category, date, description, payment_method, \
     is_recurring, recurring_id, occurrence_date";

fn expense_from_row(r: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: r.get(0)?,
        user_id: r.get(1)?,
        amount: decimal_at(r, 2)?,
        category: r.get(3)?,
        date: r.get(4)?,
        description: r.get(5)?,
        payment_method: r.get(6)?,
        is_recurring: r.get(7)?,
        recurring_id: r.get(8)?,
        occurrence_date: r.get(9)?,
    })
}

/// Loads an expense, telling apart a missing id from someone else's.
pub fn load_owned(conn: &Connection, owner_id: i64, id: i64) -> Result<Expense> {
    let sql = format!("SELECT {} FROM expenses WHERE id=?1", EXPENSE_COLUMNS);
    let e = conn
        .query_row(&sql, params![id], expense_from_row)
        .optional()?
        .ok_or(AppError::NotFound { kind: "Expense", id })?;
    if e.user_id != owner_id {
        return Err(AppError::Forbidden { kind: "Expense", id }.into());
    }
    Ok(e)
}

fn add(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let amount = validate::amount(parse_decimal(sub.get_one::<String>("amount").unwrap())?)?;
    let category: Category = sub.get_one::<String>("category").unwrap().parse()?;
    let method: PaymentMethod = sub.get_one::<String>("payment-method").unwrap().parse()?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let date = validate::expense_date(date, today())?;
    let description = validate::description(sub.get_one::<String>("description").map(|s| s.as_str()))?;

    conn.execute(
        "INSERT INTO expenses(user_id, amount, category, date, description, payment_method)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            owner.id,
            amount.to_string(),
            category.label(),
            date,
            description,
            method.label()
        ],
    )?;
    println!(
        "Recorded expense #{}: {} {} on {} ({})",
        conn.last_insert_rowid(),
        amount,
        category,
        date,
        method
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub amount: String,
    pub payment_method: String,
    pub description: String,
    pub recurring: bool,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct ExpensePage {
    pub expenses: Vec<ExpenseRow>,
    pub pagination: Pagination,
}

fn list(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let page = query_rows(conn, owner.id, sub)?;
    if jsonl_flag {
        maybe_print_json(false, true, &page.expenses)?;
        return Ok(());
    }
    if !maybe_print_json(json_flag, false, &page)? {
        let p = &page.pagination;
        let rows: Vec<Vec<String>> = page
            .expenses
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date,
                    r.category,
                    r.amount,
                    r.payment_method,
                    r.description,
                    if r.recurring { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Category", "Amount", "Payment", "Description", "Recurring"],
                rows,
            )
        );
        println!(
            "Page {}/{} ({} expenses)",
            p.page,
            p.total_pages.max(1),
            p.total
        );
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, owner_id: i64, sub: &clap::ArgMatches) -> Result<ExpensePage> {
    let mut filter = String::from(" FROM expenses WHERE user_id=?");
    let mut params_vec: Vec<Value> = vec![Value::Integer(owner_id)];

    if let Some(cat) = sub
        .get_one::<String>("category")
        .map(|s| s.trim())
        .filter(|s| !s.eq_ignore_ascii_case("all"))
    {
        let cat: Category = cat.parse()?;
        filter.push_str(" AND category=?");
        params_vec.push(Value::Text(cat.label().to_string()));
    }
    if let Some(from) = sub.get_one::<String>("from") {
        filter.push_str(" AND date>=?");
        params_vec.push(Value::Text(parse_date(from)?.to_string()));
    }
    if let Some(to) = sub.get_one::<String>("to") {
        filter.push_str(" AND date<=?");
        params_vec.push(Value::Text(parse_date(to)?.to_string()));
    }
    if let Some(min) = sub.get_one::<String>("min") {
        filter.push_str(" AND CAST(amount AS REAL)>=?");
        params_vec.push(Value::Real(to_f64(&parse_decimal(min)?)));
    }
    if let Some(max) = sub.get_one::<String>("max") {
        filter.push_str(" AND CAST(amount AS REAL)<=?");
        params_vec.push(Value::Real(to_f64(&parse_decimal(max)?)));
    }
    if let Some(search) = sub
        .get_one::<String>("search")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        filter.push_str(" AND instr(lower(COALESCE(description,'')), lower(?))>0");
        params_vec.push(Value::Text(search.to_string()));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*){}", filter),
        params_from_iter(params_vec.iter()),
        |r| r.get(0),
    )?;

    let sort_col = match sub.get_one::<String>("sort").map(|s| s.as_str()) {
        Some("amount") => "CAST(amount AS REAL)",
        Some("category") => "category",
        _ => "date",
    };
    let order = match sub.get_one::<String>("order").map(|s| s.as_str()) {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    let page = (*sub.get_one::<usize>("page").unwrap_or(&1)).max(1);
    let limit = (*sub.get_one::<usize>("limit").unwrap_or(&20)).max(1);

    let sql = format!(
        "SELECT {}{} ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
        EXPENSE_COLUMNS, filter, sort_col, order, order
    );
    params_vec.push(Value::Integer(limit as i64));
    params_vec.push(Value::Integer(((page - 1) * limit) as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params_vec.iter()), expense_from_row)?;
    let mut expenses = Vec::new();
    for row in rows {
        let e = row?;
        expenses.push(ExpenseRow {
            id: e.id,
            date: e.date.to_string(),
            category: e.category,
            amount: fmt_amount(&e.amount),
            payment_method: e.payment_method,
            description: e.description.unwrap_or_default(),
            recurring: e.is_recurring,
        });
    }

    let total = total as usize;
    Ok(ExpensePage {
        expenses,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        },
    })
}

fn to_f64(d: &rust_decimal::Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    d.to_f64().unwrap_or(0.0)
}

fn show(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let e = load_owned(conn, owner.id, id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &e)? {
        let rows = vec![
            vec!["ID".into(), e.id.to_string()],
            vec!["Date".into(), e.date.to_string()],
            vec!["Category".into(), e.category.clone()],
            vec!["Amount".into(), fmt_amount(&e.amount)],
            vec!["Payment".into(), e.payment_method.clone()],
            vec!["Description".into(), e.description.clone().unwrap_or_default()],
            vec![
                "Recurring".into(),
                match e.recurring_id {
                    Some(rid) => match e.occurrence_date {
                        Some(due) => format!("yes (#{}, due {})", rid, due),
                        None => format!("yes (#{})", rid),
                    },
                    None if e.is_recurring => "yes (schedule deleted)".into(),
                    None => "no".into(),
                },
            ],
        ];
        println!("{}", pretty_table(&["Field", "Value"], rows));
    }
    Ok(())
}

fn edit(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let existing = load_owned(conn, owner.id, id)?;

    let amount = match sub.get_one::<String>("amount") {
        Some(s) => parse_decimal(s)?,
        None => existing.amount,
    };
    let category: Category = sub
        .get_one::<String>("category")
        .map(|s| s.as_str())
        .unwrap_or(existing.category.as_str())
        .parse()?;
    let method: PaymentMethod = sub
        .get_one::<String>("payment-method")
        .map(|s| s.as_str())
        .unwrap_or(existing.payment_method.as_str())
        .parse()?;
    let date: NaiveDate = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => existing.date,
    };
    let description = match sub.get_one::<String>("description") {
        Some(s) => validate::description(Some(s))?,
        None => validate::description(existing.description.as_deref())?,
    };
    let amount = validate::amount(amount)?;
    let date = validate::expense_date(date, today())?;

    conn.execute(
        "UPDATE expenses SET amount=?1, category=?2, date=?3, description=?4, payment_method=?5,
         updated_at=datetime('now') WHERE id=?6 AND user_id=?7",
        params![
            amount.to_string(),
            category.label(),
            date,
            description,
            method.label(),
            id,
            owner.id
        ],
    )?;
    println!("Updated expense #{}", id);
    Ok(())
}

fn rm(conn: &Connection, owner: &User, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    load_owned(conn, owner.id, id)?;
    conn.execute(
        "DELETE FROM expenses WHERE id=?1 AND user_id=?2",
        params![id, owner.id],
    )?;
    println!("Removed expense #{}", id);
    Ok(())
}
