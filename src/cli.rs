// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn with_json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print output as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print output as JSON lines"),
    )
}

fn with_filter_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("from")
            .long("from")
            .value_name("YYYY-MM-DD")
            .help("Start of the renewal-date window (default: 6 months back)"),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .value_name("YYYY-MM-DD")
            .help("End of the renewal-date window (default: 6 months ahead)"),
    )
    .arg(
        Arg::new("category")
            .long("category")
            .action(ArgAction::Append)
            .help("Restrict to a category (repeatable)"),
    )
    .arg(
        Arg::new("include-inactive")
            .long("include-inactive")
            .action(ArgAction::SetTrue)
            .help("Include paused and cancelled subscriptions"),
    )
}

pub fn build_cli() -> Command {
    Command::new("subtrack")
        .about("Subscription spend tracking, analytics, budget forecasting, and savings")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Initialize the local database"))
        .subcommand(
            Command::new("sub")
                .about("Manage subscriptions")
                .subcommand(
                    Command::new("add")
                        .about("Add a subscription")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .required(true)
                                .help("Streaming | Software | Fitness | Gaming | Other"),
                        )
                        .arg(Arg::new("price").long("price").required(true))
                        .arg(
                            Arg::new("currency")
                                .long("currency")
                                .help("Currency the price was entered in (default: USD)"),
                        )
                        .arg(
                            Arg::new("cycle")
                                .long("cycle")
                                .required(true)
                                .help("weekly | monthly | yearly"),
                        )
                        .arg(
                            Arg::new("renewal")
                                .long("renewal")
                                .required(true)
                                .value_name("YYYY-MM-DD")
                                .help("Next renewal date"),
                        )
                        .arg(Arg::new("payment").long("payment").help("Payment method"))
                        .arg(Arg::new("notes").long("notes"))
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .action(ArgAction::SetTrue)
                                .help("Add even when a subscription with this name exists"),
                        ),
                )
                .subcommand(with_json_flags(
                    Command::new("list")
                        .about("List subscriptions")
                        .arg(
                            Arg::new("name")
                                .long("name")
                                .help("Filter by name substring, case-insensitive"),
                        )
                        .arg(Arg::new("status").long("status").help("Filter by status"))
                        .arg(Arg::new("category").long("category").help("Filter by category"))
                        .arg(
                            Arg::new("currency")
                                .long("currency")
                                .help("Display currency (default: configured one)"),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .about("Edit a subscription")
                        .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(i64)))
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("price").long("price"))
                        .arg(Arg::new("cycle").long("cycle"))
                        .arg(Arg::new("renewal").long("renewal").value_name("YYYY-MM-DD"))
                        .arg(Arg::new("status").long("status"))
                        .arg(Arg::new("payment").long("payment"))
                        .arg(Arg::new("notes").long("notes")),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Delete a subscription")
                        .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(i64))),
                )
                .subcommand(
                    Command::new("status")
                        .about("Quick status toggle")
                        .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(i64)))
                        .arg(
                            Arg::new("status")
                                .required(true)
                                .help("active | paused | cancelled"),
                        ),
                )
                .subcommand(with_json_flags(
                    Command::new("upcoming")
                        .about("Renewals due within a window")
                        .arg(
                            Arg::new("days")
                                .long("days")
                                .value_parser(clap::value_parser!(usize))
                                .default_value("7"),
                        ),
                )),
        )
        .subcommand(
            Command::new("analytics")
                .about("Derived spend metrics")
                .subcommand(with_json_flags(with_filter_args(
                    Command::new("trends").about("Monthly spending trend buckets"),
                )))
                .subcommand(with_json_flags(with_filter_args(
                    Command::new("categories").about("Spend breakdown by category"),
                )))
                .subcommand(with_json_flags(with_filter_args(
                    Command::new("top")
                        .about("Most expensive subscriptions")
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(clap::value_parser!(usize))
                                .default_value("5"),
                        ),
                )))
                .subcommand(with_json_flags(with_filter_args(
                    Command::new("predict").about("Linear-regression spend prediction"),
                )))
                .subcommand(with_json_flags(with_filter_args(
                    Command::new("insights").about("Rule-based spending insights"),
                )))
                .subcommand(with_json_flags(with_filter_args(
                    Command::new("forecast").about("Budget forecast for this and next month"),
                )))
                .subcommand(with_json_flags(
                    Command::new("roi")
                        .about("Value-for-money check for one subscription")
                        .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(i64)))
                        .arg(
                            Arg::new("value")
                                .long("value")
                                .required(true)
                                .help("Estimated monthly value"),
                        )
                        .arg(
                            Arg::new("usage")
                                .long("usage")
                                .value_parser(clap::value_parser!(u8).range(1..=10))
                                .default_value("5")
                                .help("Usage score, 1-10"),
                        ),
                )),
        )
        .subcommand(
            Command::new("savings")
                .about("Salary, savings ledger, and budget summary")
                .subcommand(
                    Command::new("salary")
                        .about("Configure monthly salary and savings percentage")
                        .arg(Arg::new("amount").long("amount"))
                        .arg(
                            Arg::new("save-pct")
                                .long("save-pct")
                                .help("Share of salary set aside, in percent"),
                        ),
                )
                .subcommand(
                    Command::new("deposit")
                        .about("Add to savings")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("withdraw")
                        .about("Withdraw from savings")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("auto-deposit")
                        .about("Deposit this month's configured savings slice"),
                )
                .subcommand(
                    Command::new("reset")
                        .about("Delete the entire savings ledger and zero the balance")
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .action(ArgAction::SetTrue)
                                .help("Confirm the permanent deletion"),
                        ),
                )
                .subcommand(with_json_flags(
                    Command::new("history")
                        .about("Recent ledger entries, newest first")
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(clap::value_parser!(usize))
                                .default_value("20"),
                        ),
                ))
                .subcommand(with_json_flags(
                    Command::new("stats").about("Savings totals over the recent window"),
                ))
                .subcommand(with_json_flags(
                    Command::new("summary").about("Salary minus subscriptions minus savings"),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly subscription budget")
                .subcommand(
                    Command::new("set")
                        .about("Set the monthly budget")
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(Command::new("show").about("Show the monthly budget")),
        )
        .subcommand(
            Command::new("fx")
                .about("Display currency and exchange rates")
                .subcommand(
                    Command::new("set-display")
                        .about("Set the display currency")
                        .arg(Arg::new("currency").required(true)),
                )
                .subcommand(Command::new("fetch").about("Force an exchange-rate refresh"))
                .subcommand(with_json_flags(
                    Command::new("list").about("Show the cached rate table"),
                ))
                .subcommand(
                    Command::new("convert")
                        .about("One-off currency conversion")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Integrity checks over the local store"))
}
