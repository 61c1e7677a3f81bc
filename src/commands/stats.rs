// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::utils::{
    days_inclusive, decimal_at, fmt_amount, maybe_print_json, month_end, month_start,
    pretty_table, today, year_end, year_start,
};
use anyhow::Result;
use chrono::{Months, NaiveDate};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, owner: &User, m: &clap::ArgMatches) -> Result<()> {
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");
    let period = m
        .get_one::<String>("period")
        .map(|s| s.as_str())
        .unwrap_or("month");
    let stats = compute(conn, owner.id, period, today())?;
    if maybe_print_json(json_flag, jsonl_flag, &stats)? {
        return Ok(());
    }

    let top = stats
        .most_expensive
        .as_ref()
        .map(|c| format!("{} ({})", c.category, fmt_amount(&c.total)))
        .unwrap_or_else(|| "N/A".into());
    let summary = vec![
        vec!["Period".into(), format!("{} ({}..{})", stats.period, stats.from, stats.to)],
        vec!["Total".into(), fmt_amount(&stats.total)],
        vec!["Expenses".into(), stats.count.to_string()],
        vec!["Average".into(), fmt_amount(&stats.average)],
        vec!["Daily average".into(), fmt_amount(&stats.avg_daily)],
        vec!["Top category".into(), top],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], summary));

    let cats: Vec<Vec<String>> = stats
        .by_category
        .iter()
        .map(|c| vec![c.category.clone(), fmt_amount(&c.total), c.count.to_string()])
        .collect();
    println!("{}", pretty_table(&["Category", "Spent", "Count"], cats));

    let months: Vec<Vec<String>> = stats
        .monthly
        .iter()
        .map(|m| vec![m.month.clone(), fmt_amount(&m.total)])
        .collect();
    println!("{}", pretty_table(&["Month", "Spent"], months));
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MonthTotal {
    pub month: String, // YYYY-MM
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub period: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total: Decimal,
    pub count: usize,
    pub average: Decimal,
    pub avg_daily: Decimal,
    pub most_expensive: Option<CategoryTotal>,
    pub by_category: Vec<CategoryTotal>,
    /// Last six calendar months, oldest first, whatever the period.
    pub monthly: Vec<MonthTotal>,
    /// Days of the current month that have spending.
    pub daily: Vec<DayTotal>,
}

const TREND_MONTHS: u32 = 6;

pub fn compute(conn: &Connection, owner_id: i64, period: &str, today: NaiveDate) -> Result<Stats> {
    let mut stmt =
        conn.prepare("SELECT date, amount, category FROM expenses WHERE user_id=?1 ORDER BY date")?;
    let rows = stmt.query_map(params![owner_id], |r| {
        Ok((
            r.get::<_, NaiveDate>(0)?,
            decimal_at(r, 1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut all = Vec::new();
    for row in rows {
        all.push(row?);
    }

    let earliest = all.first().map(|(d, _, _)| *d).unwrap_or(today);
    let (from, to) = match period {
        "year" => (year_start(today), year_end(today)),
        "all" => (earliest.min(today), today),
        _ => (month_start(today), month_end(today)),
    };
    let in_range = |d: &NaiveDate| *d >= from && *d <= to;

    let mut total = Decimal::ZERO;
    let mut count = 0usize;
    let mut cats: BTreeMap<String, (Decimal, usize)> = BTreeMap::new();
    for (_, amt, cat) in all.iter().filter(|(d, _, _)| in_range(d)) {
        total += *amt;
        count += 1;
        let e = cats.entry(cat.clone()).or_insert((Decimal::ZERO, 0));
        e.0 += *amt;
        e.1 += 1;
    }

    let average = if count > 0 {
        (total / Decimal::from(count)).round_dp(2)
    } else {
        Decimal::ZERO
    };
    let avg_daily = if count > 0 {
        (total / Decimal::from(days_inclusive(from, to))).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let mut by_category: Vec<CategoryTotal> = cats
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total,
            count,
        })
        .collect();
    by_category.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));
    let most_expensive = by_category.first().map(|c| CategoryTotal {
        category: c.category.clone(),
        total: c.total,
        count: c.count,
    });

    let this_month = month_start(today);
    let mut monthly = Vec::new();
    for back in (0..TREND_MONTHS).rev() {
        let start = this_month
            .checked_sub_months(Months::new(back))
            .unwrap_or(this_month);
        let end = month_end(start);
        let sum: Decimal = all
            .iter()
            .filter(|(d, _, _)| *d >= start && *d <= end)
            .map(|(_, a, _)| *a)
            .sum();
        monthly.push(MonthTotal {
            month: start.format("%Y-%m").to_string(),
            total: sum,
        });
    }

    let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let month_last = month_end(today);
    for (d, amt, _) in all.iter().filter(|(d, _, _)| *d >= this_month && *d <= month_last) {
        *days.entry(*d).or_insert(Decimal::ZERO) += *amt;
    }
    let daily = days
        .into_iter()
        .map(|(date, total)| DayTotal { date, total })
        .collect();

    Ok(Stats {
        period: period.to_string(),
        from,
        to,
        total,
        count,
        average,
        avg_daily,
        most_expensive,
        by_category,
        monthly,
        daily,
    })
}
