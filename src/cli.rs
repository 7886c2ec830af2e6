use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};

use crate::dates::{parse_clock_time, parse_date};

#[derive(Parser, Debug)]
#[command(
    name = "toggl",
    version,
    about = "Start, stop and report Toggl Track timers",
    long_about = None,
    infer_subcommands = true
)]
pub struct Arguments {
    /// increase the verbosity
    ///
    /// Can be given several times: once for info, twice for each HTTP call,
    /// three times for response statuses.
    #[arg(global = true, short, long, action = clap::ArgAction::Count, help_heading = "Logging")]
    pub verbose: u8,

    /// output no logging
    #[arg(global = true, short, long, action = clap::ArgAction::SetTrue, help_heading = "Logging")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show workspace projects
    Projects,

    /// Start a timer
    ///
    /// The project name is matched loosely: every typed character has to
    /// appear in the project name, in order, ignoring case.  The command
    /// fails when no project or more than one project matches, or when a
    /// timer is already running.
    Start(Start),

    /// Stop the running timer
    Stop,

    /// Show the running timer
    Status,

    /// Print time per project since a date
    Report(Report),

    /// Show version and exit
    Version,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Projects => "projects",
            Command::Start(_) => "start",
            Command::Stop => "stop",
            Command::Status => "status",
            Command::Report(_) => "report",
            Command::Version => "version",
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Start {
    /// project name (or part of it)
    pub project: String,

    /// start time today (HH:MM), defaults to now
    #[arg(short, long, value_parser = parse_clock_time)]
    pub time: Option<NaiveTime>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// first day of the report (YYYY-MM-DD), defaults to yesterday
    #[arg(value_parser = parse_date)]
    pub since: Option<NaiveDate>,
}
