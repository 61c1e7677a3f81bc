// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn anchor_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("day-of-month")
            .long("day-of-month")
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true)
            .help("Monthly anchor; only 1-28 takes effect"),
    )
    .arg(
        Arg::new("day-of-week")
            .long("day-of-week")
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true)
            .help("Weekly anchor for the first occurrence (0=Sunday .. 6=Saturday)"),
    )
}

pub fn build_cli() -> Command {
    Command::new("spendlog")
        .version(clap::crate_version!())
        .about("Personal expense tracking, budgets, recurring charges and analytics")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("SPENDLOG_DB")
                .help("Database file (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("SPENDLOG_USER")
                .help("Act as this user"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "User name"))
                        .arg(opt("email", "Email address")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("default")
                        .about("Set the user used when --user is absent")
                        .arg(req("name", "User name")),
                ),
        )
        .subcommand(
            Command::new("expense")
                .about("Log and browse expenses")
                .subcommand(
                    Command::new("add")
                        .arg(req("amount", "Amount, positive with at most 2 decimals"))
                        .arg(req("category", "Category, e.g. 'Food & Dining' or food-dining"))
                        .arg(req("payment-method", "Payment method, e.g. cash or credit-card"))
                        .arg(opt("date", "YYYY-MM-DD, defaults to today"))
                        .arg(opt("description", "Up to 200 characters")),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(opt("category", "Only this category"))
                        .arg(opt("from", "Earliest date (inclusive)"))
                        .arg(opt("to", "Latest date (inclusive)"))
                        .arg(opt("min", "Minimum amount"))
                        .arg(opt("max", "Maximum amount"))
                        .arg(opt("search", "Substring of the description"))
                        .arg(
                            Arg::new("sort")
                                .long("sort")
                                .value_parser(["date", "amount", "category"])
                                .default_value("date"),
                        )
                        .arg(
                            Arg::new("order")
                                .long("order")
                                .value_parser(["asc", "desc"])
                                .default_value("desc"),
                        )
                        .arg(
                            Arg::new("page")
                                .long("page")
                                .value_parser(value_parser!(usize))
                                .default_value("1"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize))
                                .default_value("20"),
                        ),
                ))
                .subcommand(json_args(Command::new("show").arg(id_arg())))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(opt("amount", "New amount"))
                        .arg(opt("category", "New category"))
                        .arg(opt("payment-method", "New payment method"))
                        .arg(opt("date", "New date"))
                        .arg(opt("description", "New description, empty to clear")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("recurring")
                .about("Schedule recurring expenses")
                .subcommand(anchor_args(
                    Command::new("add")
                        .arg(req("amount", "Amount per occurrence"))
                        .arg(req("category", "Category"))
                        .arg(req("frequency", "daily|weekly|monthly|yearly"))
                        .arg(
                            Arg::new("payment-method")
                                .long("payment-method")
                                .default_value("Other"),
                        )
                        .arg(opt("description", "Up to 200 characters"))
                        .arg(opt("start", "Start date, defaults to today"))
                        .arg(opt("end", "Last date an occurrence may fall on")),
                ))
                .subcommand(json_args(
                    Command::new("list").about("Materialize due occurrences, then list"),
                ))
                .subcommand(anchor_args(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(opt("amount", "New amount"))
                        .arg(opt("category", "New category"))
                        .arg(opt("payment-method", "New payment method"))
                        .arg(opt("frequency", "New frequency"))
                        .arg(opt("description", "New description, empty to clear"))
                        .arg(opt("start", "New start date"))
                        .arg(opt("end", "New end date"))
                        .arg(
                            Arg::new("clear-anchors")
                                .long("clear-anchors")
                                .action(ArgAction::SetTrue)
                                .conflicts_with_all(["day-of-month", "day-of-week"])
                                .help("Remove the day-of-month and day-of-week anchors"),
                        )
                        .arg(
                            Arg::new("no-end")
                                .long("no-end")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("end")
                                .help("Remove the end date"),
                        ),
                ))
                .subcommand(Command::new("pause").arg(id_arg()))
                .subcommand(Command::new("resume").arg(id_arg()))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(json_args(
                    Command::new("run")
                        .about("Materialize due occurrences")
                        .arg(
                            Arg::new("catch-up")
                                .long("catch-up")
                                .action(ArgAction::SetTrue)
                                .help("Create every missed occurrence, not just the next one"),
                        ),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Spending limits per period")
                .subcommand(
                    Command::new("add")
                        .arg(req("amount", "Limit for the period"))
                        .arg(req("period", "weekly|monthly|yearly|custom"))
                        .arg(opt("category", "Limit only this category"))
                        .arg(opt("start", "Start date, defaults to today"))
                        .arg(opt("end", "End date for custom periods"))
                        .arg(opt("alert-threshold", "Warn at this percent of the limit")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(opt("amount", "New limit"))
                        .arg(opt("period", "New period"))
                        .arg(opt("category", "New category, 'all' to clear"))
                        .arg(opt("start", "New start date"))
                        .arg(opt("end", "New end date"))
                        .arg(opt("alert-threshold", "New threshold")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(json_args(
            Command::new("stats").about("Spending analytics").arg(
                Arg::new("period")
                    .long("period")
                    .value_parser(["month", "year", "all"])
                    .default_value("month"),
            ),
        ))
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("expenses")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(req("out", "Output file")),
            ),
        )
}
