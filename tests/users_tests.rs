// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use spendlog::commands::users::{self, DEFAULT_USER_KEY, DEMO_USER};
use spendlog::error::AppError;
use spendlog::{cli, db, utils};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn user_cmd(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["spendlog", "user"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("user", m)) => users::handle(conn, m),
        _ => panic!("user command not parsed"),
    }
}

#[test]
fn demo_user_is_created_once() {
    let conn = setup();
    let first = users::resolve_owner(&conn, None).unwrap();
    let second = users::resolve_owner(&conn, Some("   ")).unwrap();
    assert_eq!(first.name, DEMO_USER);
    assert_eq!(first.id, second.id);
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn explicit_user_must_exist() {
    let conn = setup();
    let err = users::resolve_owner(&conn, Some("alice")).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AppError>(),
        Some(&AppError::UnknownUser("alice".into()))
    );

    user_cmd(&conn, &["add", "--name", " alice ", "--email", "alice@example.com"]).unwrap();
    let alice = users::resolve_owner(&conn, Some("alice")).unwrap();
    assert_eq!(alice.email.as_deref(), Some("alice@example.com"));
}

#[test]
fn default_user_setting_wins_over_demo() {
    let conn = setup();
    user_cmd(&conn, &["add", "--name", "bob"]).unwrap();
    assert!(user_cmd(&conn, &["default", "--name", "carol"]).is_err());
    user_cmd(&conn, &["default", "--name", "bob"]).unwrap();

    assert_eq!(
        utils::get_setting(&conn, DEFAULT_USER_KEY).unwrap().as_deref(),
        Some("bob")
    );
    assert_eq!(users::resolve_owner(&conn, None).unwrap().name, "bob");
    assert!(users::find_user(&conn, DEMO_USER).unwrap().is_none());
}

#[test]
fn blank_and_duplicate_names_are_rejected() {
    let conn = setup();
    let err = user_cmd(&conn, &["add", "--name", "  "]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(_))
    ));
    user_cmd(&conn, &["add", "--name", "dana"]).unwrap();
    assert!(user_cmd(&conn, &["add", "--name", "dana"]).is_err());
}
