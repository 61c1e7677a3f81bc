// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Days;
use rusqlite::{Connection, params};
use spendlog::commands::{expenses, users};
use spendlog::error::AppError;
use spendlog::models::User;
use spendlog::{cli, db, utils};

fn setup() -> (Connection, User) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let owner = users::resolve_owner(&conn, None).unwrap();
    (conn, owner)
}

fn run(conn: &Connection, owner: &User, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["spendlog", "expense"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("expense", m)) => expenses::handle(conn, owner, m),
        _ => panic!("expense command not parsed"),
    }
}

fn validation_error(res: anyhow::Result<()>) -> bool {
    matches!(
        res.unwrap_err().downcast_ref::<AppError>(),
        Some(AppError::Validation(_))
    )
}

fn seed(conn: &Connection, owner_id: i64) {
    let rows = [
        ("2024-01-05", "12.50", "Food & Dining", Some("Lunch with team")),
        ("2024-01-10", "80.00", "Transportation", Some("Train pass")),
        ("2024-02-01", "1200.00", "Housing/Rent", Some("February rent")),
        ("2024-02-03", "7.25", "Food & Dining", Some("Coffee beans")),
        ("2024-02-14", "45.00", "Entertainment", None),
    ];
    for (date, amount, category, description) in rows {
        conn.execute(
            "INSERT INTO expenses(user_id, amount, category, date, description, payment_method)
             VALUES (?1, ?2, ?3, ?4, ?5, 'Cash')",
            params![owner_id, amount, category, date, description],
        )
        .unwrap();
    }
}

fn page(conn: &Connection, owner: &User, args: &[&str]) -> expenses::ExpensePage {
    let mut argv = vec!["spendlog", "expense", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("expense", m)) = matches.subcommand() else {
        panic!("expense command not parsed");
    };
    let Some(("list", sub)) = m.subcommand() else {
        panic!("list not parsed");
    };
    expenses::query_rows(conn, owner.id, sub).unwrap()
}

#[test]
fn add_normalizes_labels_and_trims_description() {
    let (conn, owner) = setup();
    run(
        &conn,
        &owner,
        &[
            "add",
            "--amount",
            " 19.9 ",
            "--category",
            "food-dining",
            "--payment-method",
            "DEBIT_CARD",
            "--date",
            "2024-03-01",
            "--description",
            "  groceries  ",
        ],
    )
    .unwrap();

    let (amount, category, method, description, is_recurring): (
        String,
        String,
        String,
        Option<String>,
        bool,
    ) = conn
        .query_row(
            "SELECT amount, category, payment_method, description, is_recurring FROM expenses",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(amount, "19.9");
    assert_eq!(category, "Food & Dining");
    assert_eq!(method, "Debit Card");
    assert_eq!(description.as_deref(), Some("groceries"));
    assert!(!is_recurring);
}

#[test]
fn add_rejects_invalid_input() {
    let (conn, owner) = setup();
    fn base(amount: &str) -> Vec<&str> {
        vec![
            "add",
            "--amount",
            amount,
            "--category",
            "Other",
            "--payment-method",
            "Cash",
            "--date",
            "2024-03-01",
        ]
    }
    assert!(validation_error(run(&conn, &owner, &base("0"))));
    let mut negative = base("10");
    negative[1] = "--amount=-5";
    negative.remove(2);
    assert!(validation_error(run(&conn, &owner, &negative)));
    assert!(validation_error(run(&conn, &owner, &base("1000000.01"))));
    assert!(validation_error(run(&conn, &owner, &base("1.005"))));

    let mut bad_cat = base("10");
    bad_cat[4] = "Groceries";
    assert!(validation_error(run(&conn, &owner, &bad_cat)));

    let long = "x".repeat(201);
    let mut too_long = base("10");
    too_long.push("--description");
    too_long.push(&long);
    assert!(validation_error(run(&conn, &owner, &too_long)));

    let tomorrow = utils::today()
        .checked_add_days(Days::new(1))
        .unwrap()
        .to_string();
    let mut future = base("10");
    future[8] = tomorrow.as_str();
    assert!(validation_error(run(&conn, &owner, &future)));

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn upper_bounds_are_inclusive() {
    let (conn, owner) = setup();
    let long = "y".repeat(200);
    run(
        &conn,
        &owner,
        &[
            "add",
            "--amount",
            "1000000",
            "--category",
            "Other",
            "--payment-method",
            "Cash",
            "--date",
            "2024-03-01",
            "--description",
            &long,
        ],
    )
    .unwrap();
}

#[test]
fn list_filters_and_sorts() {
    let (conn, owner) = setup();
    seed(&conn, owner.id);

    let p = page(&conn, &owner, &[]);
    assert_eq!(p.pagination.total, 5);
    assert_eq!(p.expenses[0].date, "2024-02-14");

    let p = page(&conn, &owner, &["--category", "food & dining", "--order", "asc"]);
    let dates: Vec<&str> = p.expenses.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-05", "2024-02-03"]);

    let p = page(&conn, &owner, &["--from", "2024-01-10", "--to", "2024-02-03"]);
    assert_eq!(p.pagination.total, 3);

    let p = page(&conn, &owner, &["--min", "10", "--max", "100", "--sort", "amount"]);
    let amounts: Vec<&str> = p.expenses.iter().map(|e| e.amount.as_str()).collect();
    assert_eq!(amounts, vec!["80.00", "45.00", "12.50"]);

    let p = page(&conn, &owner, &["--search", "RENT"]);
    assert_eq!(p.expenses.len(), 1);
    assert_eq!(p.expenses[0].category, "Housing/Rent");
}

#[test]
fn list_paginates() {
    let (conn, owner) = setup();
    seed(&conn, owner.id);

    let p = page(&conn, &owner, &["--limit", "2", "--page", "3", "--order", "asc"]);
    assert_eq!(p.pagination.total, 5);
    assert_eq!(p.pagination.total_pages, 3);
    assert_eq!(p.expenses.len(), 1);
    assert_eq!(p.expenses[0].date, "2024-02-14");

    let p = page(&conn, &owner, &["--limit", "2", "--page", "9"]);
    assert!(p.expenses.is_empty());
}

#[test]
fn list_is_scoped_to_owner() {
    let (conn, owner) = setup();
    seed(&conn, owner.id);
    conn.execute("INSERT INTO users(name) VALUES ('other')", []).unwrap();
    let other = users::find_user(&conn, "other").unwrap().unwrap();
    assert_eq!(page(&conn, &other, &[]).pagination.total, 0);
}

#[test]
fn other_users_expense_is_forbidden_and_missing_is_not_found() {
    let (conn, owner) = setup();
    seed(&conn, owner.id);
    conn.execute("INSERT INTO users(name) VALUES ('other')", []).unwrap();
    let other = users::find_user(&conn, "other").unwrap().unwrap();

    let err = expenses::load_owned(&conn, other.id, 1).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AppError>(),
        Some(&AppError::Forbidden { kind: "Expense", id: 1 })
    );
    let err = run(&conn, &other, &["rm", "--id", "1"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Forbidden { .. })
    ));

    let err = expenses::load_owned(&conn, owner.id, 999).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AppError>(),
        Some(&AppError::NotFound { kind: "Expense", id: 999 })
    );
    assert_eq!(page(&conn, &owner, &[]).pagination.total, 5);
}

#[test]
fn edit_merges_and_revalidates() {
    let (conn, owner) = setup();
    seed(&conn, owner.id);

    run(
        &conn,
        &owner,
        &["edit", "--id", "1", "--amount", "15", "--description", ""],
    )
    .unwrap();
    let e = expenses::load_owned(&conn, owner.id, 1).unwrap();
    assert_eq!(e.amount.to_string(), "15");
    assert_eq!(e.category, "Food & Dining");
    assert_eq!(e.description, None);

    assert!(validation_error(run(
        &conn,
        &owner,
        &["edit", "--id", "1", "--amount", "0"]
    )));
    assert_eq!(expenses::load_owned(&conn, owner.id, 1).unwrap().amount.to_string(), "15");
}

#[test]
fn rm_deletes_only_that_expense() {
    let (conn, owner) = setup();
    seed(&conn, owner.id);
    run(&conn, &owner, &["rm", "--id", "2"]).unwrap();
    assert_eq!(page(&conn, &owner, &[]).pagination.total, 4);
    assert!(expenses::load_owned(&conn, owner.id, 2).is_err());
}
