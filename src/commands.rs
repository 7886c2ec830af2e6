use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::io::Write;
use thiserror::Error;

use crate::cli::{Command, Report, Start};
use crate::config;
use crate::dates::{default_report_since, elapsed_since, format_duration, start_time};
use crate::models::Project;
use crate::resolver::{Resolution, compare_names, resolve};
use crate::toggl::TogglClient;

const UNKNOWN_PROJECT: &str = "<unknown>";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("no project match {0:?}")]
    NoMatch(String),
    #[error("too many matches to {query:?}: {}", candidates.join(", "))]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },
    #[error("there's a timer running")]
    TimerRunning,
    #[error("no timer running")]
    NoTimer,
    #[error("{0}")]
    BadArgument(String),
}

/// Runs one command. Everything but `version` loads the config and talks
/// to the service; the config is read before any network call.
pub fn run(command: &Command, out: &mut dyn Write) -> Result<()> {
    log::debug!("Running {}", command.name());
    if *command == Command::Version {
        return version(out);
    }

    let config = config::load()?;
    let client = TogglClient::new(&config)?;
    execute(command, &client, out)
}

pub fn execute(command: &Command, client: &TogglClient, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Projects => projects(client, out),
        Command::Start(args) => start(client, args, Local::now(), out),
        Command::Stop => stop(client, out),
        Command::Status => status(client, Utc::now(), out),
        Command::Report(Report { since }) => {
            let since = since.unwrap_or_else(|| default_report_since(Local::now().date_naive()));
            report(client, since, out)
        }
        Command::Version => version(out),
    }
}

pub fn projects(client: &TogglClient, out: &mut dyn Write) -> Result<()> {
    let mut names: Vec<String> = client.projects()?.iter().map(Project::full_name).collect();
    names.sort_by(|a, b| compare_names(a, b));
    for name in names {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

pub fn start(client: &TogglClient, args: &Start, now: DateTime<Local>, out: &mut dyn Write) -> Result<()> {
    let start = start_time(args.time, now).map_err(CommandError::BadArgument)?;

    // Read-then-act: another client may start a timer between these calls.
    if let Some(timer) = client.current_timer()? {
        log::debug!("Timer {} already running since {}", timer.id, timer.start);
        return Err(CommandError::TimerRunning.into());
    }

    let projects = client.projects()?;
    let project = match resolve(&args.project, &projects) {
        Resolution::Unique(project) => project,
        Resolution::NoMatch => return Err(CommandError::NoMatch(args.project.clone()).into()),
        Resolution::Ambiguous(matches) => {
            let mut candidates: Vec<String> = matches.iter().map(|project| project.full_name()).collect();
            candidates.sort_by(|a, b| compare_names(a, b));
            return Err(CommandError::Ambiguous {
                query: args.project.clone(),
                candidates,
            }
            .into());
        }
    };

    client.start_timer(project.id, start)?;
    log::info!("Started {} (project {}) at {start}", project.name, project.id);
    writeln!(out, "Starting {}", project.name)?;
    Ok(())
}

pub fn stop(client: &TogglClient, out: &mut dyn Write) -> Result<()> {
    let timer = client.current_timer()?.ok_or(CommandError::NoTimer)?;
    let stopped = client.stop_timer(timer.id)?;
    let projects = client.projects()?;
    writeln!(
        out,
        "{}: {}",
        project_name(stopped.project_id, &projects),
        format_duration(stopped.duration)
    )?;
    Ok(())
}

pub fn status(client: &TogglClient, now: DateTime<Utc>, out: &mut dyn Write) -> Result<()> {
    let timer = client.current_timer()?.ok_or(CommandError::NoTimer)?;
    let projects = client.projects()?;
    writeln!(
        out,
        "{}: {}",
        project_name(timer.project_id, &projects),
        format_duration(elapsed_since(timer.start, now))
    )?;
    Ok(())
}

pub fn report(client: &TogglClient, since: NaiveDate, out: &mut dyn Write) -> Result<()> {
    let lines = client.report(since).context("can't get report")?;
    if lines.is_empty() {
        log::info!("No time tracked since {since}");
    }
    for line in lines {
        writeln!(out, "{}: {}", line.project, format_duration(line.duration))?;
    }
    Ok(())
}

pub fn version(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "toggl version {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

fn project_name(id: Option<u64>, projects: &[Project]) -> &str {
    id.and_then(|id| projects.iter().find(|project| project.id == id))
        .map(|project| project.name.as_str())
        .unwrap_or(UNKNOWN_PROJECT)
}
