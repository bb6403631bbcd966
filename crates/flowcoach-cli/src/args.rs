//! Shared scope arguments

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use flowcoach_model::{AnalysisWindow, ScopeDescriptor, ScopeKind, WorkflowShape};

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Add the arguments describing a scope
pub(crate) fn scope_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("scope")
                .long("scope")
                .default_value("team")
                .help("Scope kind: feature, team, program, period or portfolio"),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .required(true)
                .help("Identifier of the scoped team, program or period"),
        )
        .arg(
            Arg::new("days")
                .long("days")
                .default_value("84")
                .value_parser(value_parser!(u32))
                .conflicts_with("start")
                .help("Window length in days, ending at --end"),
        )
        .arg(
            Arg::new("start")
                .long("start")
                .value_parser(parse_date)
                .help("First day of the window (YYYY-MM-DD)"),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .value_parser(parse_date)
                .help("Day after the window (YYYY-MM-DD); defaults to today"),
        )
        .arg(
            Arg::new("workflow")
                .long("workflow")
                .help("Workflow shape: story or feature (defaults per scope)"),
        )
        .arg(
            Arg::new("team")
                .long("team")
                .help("Team filter"),
        )
        .arg(
            Arg::new("program")
                .long("program")
                .action(ArgAction::Append)
                .help("Program identifier (repeatable)"),
        )
        .arg(
            Arg::new("period")
                .long("period")
                .action(ArgAction::Append)
                .help("Period identifier (repeatable)"),
        )
        .arg(
            Arg::new("stuck-threshold")
                .long("stuck-threshold")
                .value_parser(value_parser!(f64))
                .help("Days in one stage after which an item is stuck"),
        )
}

/// Build the scope descriptor from parsed arguments
pub(crate) fn scope_from_matches(args: &ArgMatches, today: NaiveDate) -> Result<ScopeDescriptor> {
    let kind: ScopeKind = args
        .get_one::<String>("scope")
        .map_or("team", String::as_str)
        .parse()
        .context("invalid --scope")?;
    let Some(id) = args.get_one::<String>("id") else {
        bail!("--id is required");
    };

    let end = args.get_one::<NaiveDate>("end").copied().unwrap_or(today);
    let window = match args.get_one::<NaiveDate>("start") {
        Some(start) => AnalysisWindow::new(*start, end).context("invalid window")?,
        None => AnalysisWindow::ending(end, args.get_one::<u32>("days").copied().unwrap_or(84)),
    };

    let workflow = match args.get_one::<String>("workflow") {
        Some(raw) => raw.parse().context("invalid --workflow")?,
        None => default_workflow(kind),
    };

    let mut scope = ScopeDescriptor::new(kind, id, window).with_workflow(workflow);
    if let Some(team) = args.get_one::<String>("team") {
        scope = scope.with_team(team);
    } else if kind == ScopeKind::Team {
        scope = scope.with_team(id);
    }
    let programs: Vec<String> = args
        .get_many::<String>("program")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    if !programs.is_empty() {
        scope = scope.with_programs(programs);
    } else if kind == ScopeKind::Program {
        scope = scope.with_programs(vec![id.clone()]);
    }
    if let Some(periods) = args.get_many::<String>("period") {
        scope = scope.with_periods(periods.cloned().collect());
    }
    if let Some(days) = args.get_one::<f64>("stuck-threshold") {
        if !days.is_finite() || *days <= 0.0 {
            bail!("--stuck-threshold must be a positive number of days");
        }
        scope = scope.with_stuck_threshold(*days);
    }
    Ok(scope)
}

fn default_workflow(kind: ScopeKind) -> WorkflowShape {
    match kind {
        ScopeKind::Feature | ScopeKind::Team => WorkflowShape::Story,
        ScopeKind::Program | ScopeKind::Period | ScopeKind::Portfolio => WorkflowShape::Feature,
    }
}
