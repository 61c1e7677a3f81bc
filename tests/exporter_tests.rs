// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, params};
use serde_json::json;
use spendlog::commands::{exporter, users};
use spendlog::models::User;
use spendlog::{cli, db};
use tempfile::tempdir;

fn base_conn() -> (Connection, User) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let owner = users::resolve_owner(&conn, None).unwrap();
    conn.execute(
        "INSERT INTO expenses(user_id, amount, category, date, description, payment_method)
         VALUES (?1, '12.5', 'Food & Dining', '2025-01-02', 'Corner shop, weekly run', 'Cash')",
        params![owner.id],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO recurring_expenses(user_id, amount, category, payment_method, frequency,
            start_date, next_due_date)
         VALUES (?1, '9.99', 'Entertainment', 'Credit Card', 'monthly', '2024-12-01', '2025-02-01')",
        params![owner.id],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO expenses(user_id, amount, category, date, payment_method, is_recurring, recurring_id)
         VALUES (?1, '9.99', 'Entertainment', '2025-01-01', 'Credit Card', 1, 1)",
        params![owner.id],
    )
    .unwrap();
    (conn, owner)
}

fn export(conn: &Connection, owner: &User, format: &str, out: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "spendlog", "export", "expenses", "--format", format, "--out", out,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, owner, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_expenses_writes_pretty_json() {
    let (conn, owner) = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    export(&conn, &owner, "JSON", &out_str).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-01-01",
                "category": "Entertainment",
                "amount": "9.99",
                "description": null,
                "payment_method": "Credit Card",
                "recurring": true
            },
            {
                "date": "2025-01-02",
                "category": "Food & Dining",
                "amount": "12.50",
                "description": "Corner shop, weekly run",
                "payment_method": "Cash",
                "recurring": false
            }
        ])
    );
}

#[test]
fn export_expenses_writes_csv() {
    let (conn, owner) = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    let n = exporter::write_expenses(&conn, owner.id, "csv", &out_str).unwrap();
    assert_eq!(n, 2);

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        ["Date", "Category", "Amount", "Description", "Payment Method", "Recurring"]
    );
    let rows: Vec<Vec<String>> = rdr
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec!["2025-01-01", "Entertainment", "9.99", "", "Credit Card", "yes"],
            vec!["2025-01-02", "Food & Dining", "12.50", "Corner shop, weekly run", "Cash", "no"],
        ]
    );
}

#[test]
fn export_expenses_is_owner_scoped() {
    let (conn, _) = base_conn();
    conn.execute("INSERT INTO users(name) VALUES ('other')", []).unwrap();
    let other = users::find_user(&conn, "other").unwrap().unwrap();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("empty.json");
    let n = exporter::write_expenses(&conn, other.id, "json", &out_path.to_string_lossy()).unwrap();
    assert_eq!(n, 0);
    assert_eq!(std::fs::read_to_string(&out_path).unwrap().trim(), "[]");
}

#[test]
fn export_expenses_rejects_unknown_format() {
    let (conn, owner) = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    let out_str = out_path.to_string_lossy().to_string();

    assert!(export(&conn, &owner, "xml", &out_str).is_err());
    assert!(!out_path.exists());
}
