// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring due-date scheduling.
//!
//! [`next_due`] advances a definition's due date by one period. The
//! materialization pass turns every due occurrence into an expense row and
//! advances the definition, one definition at a time.

use anyhow::{Result, anyhow};
use chrono::{Datelike, Days, Months, NaiveDate};
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::models::{Frequency, RecurringDefinition};
use crate::utils::decimal_at;

/// Next due date after `current`.
///
/// Monthly steps keep the day of month, clamped to the end of shorter
/// months, unless `day_of_month` is in 1..=28, in which case that day is used.
/// Yearly steps clamp Feb 29 to Feb 28. `day_of_week` never re-aligns an
/// occurrence; see [`first_due`].
pub fn next_due(
    current: NaiveDate,
    frequency: Frequency,
    day_of_month: Option<i64>,
    _day_of_week: Option<i64>,
) -> NaiveDate {
    let next = match frequency {
        Frequency::Daily => current.checked_add_days(Days::new(1)),
        Frequency::Weekly => current.checked_add_days(Days::new(7)),
        Frequency::Monthly => current
            .checked_add_months(Months::new(1))
            .map(|next| match day_of_month {
                Some(dom @ 1..=28) => next.with_day(dom as u32).unwrap_or(next),
                _ => next,
            }),
        Frequency::Yearly => current.checked_add_months(Months::new(12)),
    };
    next.unwrap_or(NaiveDate::MAX)
}

/// Due date assigned when a definition is created from its start date.
///
/// Same as [`next_due`] except for weekly schedules with a weekday anchor
/// (0 = Sunday .. 6 = Saturday): the first occurrence is the first such
/// weekday strictly after `start`.
pub fn first_due(
    start: NaiveDate,
    frequency: Frequency,
    day_of_month: Option<i64>,
    day_of_week: Option<i64>,
) -> NaiveDate {
    if let (Frequency::Weekly, Some(dow @ 0..=6)) = (frequency, day_of_week) {
        let mut d = start;
        for _ in 0..7 {
            d = match d.succ_opt() {
                Some(n) => n,
                None => break,
            };
            if i64::from(d.weekday().num_days_from_sunday()) == dow {
                return d;
            }
        }
    }
    next_due(start, frequency, day_of_month, day_of_week)
}

/// How much backlog one pass works off per definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backlog {
    /// At most one occurrence per definition; later passes continue.
    #[default]
    Single,
    /// Every occurrence up to and including today.
    CatchUp,
}

#[derive(Debug, Clone, Serialize)]
pub struct Occurrence {
    pub recurring_id: i64,
    pub expense_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub category: String,
    pub next_due_date: NaiveDate,
}

#[derive(Debug, Default, Serialize)]
pub struct MaterializeReport {
    pub created: Vec<Occurrence>,
    /// Definitions whose due occurrence produced no new expense here: either
    /// another pass advanced them first, or the occurrence already had an
    /// expense and only the due date moved on.
    pub skipped: usize,
}

pub const RECURRING_COLUMNS: &str = "id, user_id, amount, category, description, payment_method, \
     frequency, day_of_month, day_of_week, start_date, end_date, is_active, next_due_date";

pub fn recurring_from_row(r: &Row<'_>) -> rusqlite::Result<RecurringDefinition> {
    Ok(RecurringDefinition {
        id: r.get(0)?,
        user_id: r.get(1)?,
        amount: decimal_at(r, 2)?,
        category: r.get(3)?,
        description: r.get(4)?,
        payment_method: r.get(5)?,
        frequency: r.get(6)?,
        day_of_month: r.get(7)?,
        day_of_week: r.get(8)?,
        start_date: r.get(9)?,
        end_date: r.get(10)?,
        is_active: r.get(11)?,
        next_due_date: r.get(12)?,
    })
}

/// Active definitions of `owner_id` whose next occurrence is on or before
/// `today` and not past their end date.
pub fn due_definitions(
    conn: &Connection,
    owner_id: i64,
    today: NaiveDate,
) -> Result<Vec<RecurringDefinition>> {
    let sql = format!(
        "SELECT {} FROM recurring_expenses
         WHERE user_id=?1 AND is_active=1 AND next_due_date<=?2
           AND (end_date IS NULL OR end_date>=next_due_date)
         ORDER BY next_due_date, id",
        RECURRING_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id, today], recurring_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Materializes the occurrence `def.next_due_date` as read in `def`.
///
/// The due date is advanced only if the stored value still equals the one
/// read, and the expense is inserted in the same transaction. Returns `None`
/// when the stored definition moved on (or was paused) in the meantime, or
/// when an expense for this occurrence exists already.
pub fn materialize_one(
    conn: &mut Connection,
    def: &RecurringDefinition,
) -> Result<Option<Occurrence>> {
    let due = def.next_due_date;
    let next = next_due(
        due,
        Frequency::from_stored(&def.frequency),
        def.day_of_month,
        def.day_of_week,
    );

    let tx = conn.transaction()?;
    let advanced = tx.execute(
        "UPDATE recurring_expenses SET next_due_date=?1
         WHERE id=?2 AND user_id=?3 AND is_active=1 AND next_due_date=?4",
        params![next, def.id, def.user_id, due],
    )?;
    if advanced != 1 {
        debug!(recurring_id = def.id, %due, "occurrence already advanced, skipping");
        return Ok(None);
    }

    let inserted = tx.execute(
        "INSERT OR IGNORE INTO expenses(user_id, amount, category, date, description, payment_method,
            is_recurring, recurring_id, occurrence_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?4)",
        params![
            def.user_id,
            def.amount.to_string(),
            def.category,
            due,
            def.description,
            def.payment_method,
            def.id
        ],
    )?;
    if inserted == 0 {
        // The row exists already; keep the advance so the schedule moves on.
        warn!(recurring_id = def.id, %due, "occurrence already materialized");
        tx.commit()?;
        return Ok(None);
    }
    let expense_id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(Some(Occurrence {
        recurring_id: def.id,
        expense_id,
        date: due,
        amount: def.amount,
        category: def.category.clone(),
        next_due_date: next,
    }))
}

/// Runs one materialization pass for `owner_id`.
///
/// Definitions are independent: a failure is logged and the pass carries on
/// with the rest, then reports an error once all of them were attempted.
pub fn materialize_due(
    conn: &mut Connection,
    owner_id: i64,
    today: NaiveDate,
    backlog: Backlog,
) -> Result<MaterializeReport> {
    let due = due_definitions(conn, owner_id, today)?;
    let mut report = MaterializeReport::default();
    let mut failed = Vec::new();

    for mut def in due {
        loop {
            match materialize_one(conn, &def) {
                Ok(Some(occ)) => {
                    info!(
                        recurring_id = occ.recurring_id,
                        expense_id = occ.expense_id,
                        date = %occ.date,
                        next_due = %occ.next_due_date,
                        "materialized recurring expense"
                    );
                    let next = occ.next_due_date;
                    report.created.push(occ);
                    if backlog == Backlog::Single
                        || next > today
                        || def.end_date.is_some_and(|end| next > end)
                    {
                        break;
                    }
                    def.next_due_date = next;
                }
                Ok(None) => {
                    report.skipped += 1;
                    break;
                }
                Err(err) => {
                    error!(recurring_id = def.id, error = %err, "failed to materialize");
                    failed.push(def.id);
                    break;
                }
            }
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!(
            "Failed to materialize recurring expense(s) {:?}",
            failed
        ));
    }
    Ok(report)
}
