//! `taskdeck` command-line client

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::PathBuf;
use taskdeck_analytics::Drilldown;
use taskdeck_board::DropOutcome;
use taskdeck_core::{TaskDeck, TaskDeckConfig};
use taskdeck_local::Theme;
use taskdeck_model::{Credentials, Priority, ProjectId, TaskId, TaskQuery, TaskStatus};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("taskdeck")
        .version(taskdeck_core::VERSION)
        .about("TaskDeck dashboard client")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .subcommand(Command::new("stats").about("Dashboard figures"))
        .subcommand(
            Command::new("projects").about("List projects").arg(
                Arg::new("search")
                    .long("search")
                    .help("Filter by title or description"),
            ),
        )
        .subcommand(
            Command::new("tasks")
                .about("List tasks")
                .arg(Arg::new("project").long("project").help("Project id"))
                .arg(Arg::new("status").long("status").help("todo, in-progress or completed"))
                .arg(Arg::new("priority").long("priority").help("low, medium or high"))
                .arg(Arg::new("search").long("search").help("Server-side text search")),
        )
        .subcommand(
            Command::new("board")
                .about("Show a project's kanban columns")
                .arg(Arg::new("project").required(true)),
        )
        .subcommand(
            Command::new("move")
                .about("Move a task to another column")
                .arg(Arg::new("task").required(true))
                .arg(Arg::new("status").required(true)),
        )
        .subcommand(
            Command::new("comment")
                .about("Add a local activity note to a task")
                .arg(Arg::new("task").required(true))
                .arg(Arg::new("text").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("activity")
                .about("Show a task's activity notes")
                .arg(Arg::new("task").required(true)),
        )
        .subcommand(Command::new("weekly").about("Completed tasks per day this week"))
        .subcommand(Command::new("recent").about("Recent projects with progress"))
        .subcommand(
            Command::new("members")
                .about("People assigned to a project's tasks")
                .arg(Arg::new("project").required(true)),
        )
        .subcommand(
            Command::new("drilldown")
                .about("Tasks behind a dashboard card")
                .arg(
                    Arg::new("selection")
                        .value_parser(["all", "completed", "overdue"])
                        .default_value("all"),
                ),
        )
        .subcommand(Command::new("upcoming").about("This month and the week's deadlines"))
        .subcommand(
            Command::new("search")
                .about("Quick search over projects and tasks")
                .arg(Arg::new("term").required(true)),
        )
        .subcommand(
            Command::new("theme")
                .about("Show or set the theme")
                .arg(Arg::new("theme").value_parser(["light", "dark"])),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("TASKDECK_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<TaskDeckConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => TaskDeckConfig::load(path)?,
        None => TaskDeckConfig::from_env()?,
    };
    Ok(config)
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}

fn project_arg(args: &ArgMatches) -> ProjectId {
    ProjectId::new(args.get_one::<String>("project").cloned().unwrap_or_default())
}

fn task_arg(args: &ArgMatches) -> TaskId {
    TaskId::new(args.get_one::<String>("task").cloned().unwrap_or_default())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();
    let json = matches.get_flag("json");
    let deck = TaskDeck::connect(load_config(&matches)?).context("starting TaskDeck")?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("TASKDECK_EMAIL"),
        std::env::var("TASKDECK_PASSWORD"),
    ) {
        deck.login(&Credentials::new(email, password))
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))
            .context("logging in")?;
    }

    match matches.subcommand() {
        Some(("stats", _)) => {
            let overview = deck.overview(&Local::now()).await?;
            emit(json, &overview, || {
                let counts = &overview.counts;
                println!("Total tasks:   {}", overview.stats.total);
                println!("Completed:     {}", overview.stats.completed);
                println!("In progress:   {}", overview.stats.in_progress);
                println!("Todo:          {}", overview.stats.todo);
                println!("Overdue:       {}", counts.overdue);
                println!("Progress:      {}%", counts.progress());
                println!(
                    "Priorities:    high {} / medium {} / low {}",
                    overview.priorities.high, overview.priorities.medium, overview.priorities.low
                );
                for task in &overview.upcoming {
                    println!("  due {}  {}", task.due_date.with_timezone(&Local).format("%b %d"), task.title);
                }
            })?;
        }
        Some(("projects", args)) => {
            if let Some(term) = args.get_one::<String>("search") {
                let found = deck.search_projects(term).await?;
                emit(json, &found, || {
                    for project in &found {
                        println!("{}  {}", project.id, project.title);
                    }
                })?;
            } else {
                let summaries = deck.project_summaries().await?;
                emit(json, &summaries, || {
                    for row in &summaries {
                        println!(
                            "{}  {:<30} {:>3}%  {}/{}  {}",
                            row.id,
                            row.title,
                            row.progress,
                            row.completed,
                            row.total,
                            row.health.label()
                        );
                    }
                })?;
            }
        }
        Some(("tasks", args)) => {
            let mut query = TaskQuery::new();
            if let Some(project) = args.get_one::<String>("project") {
                query = query.for_project(ProjectId::new(project.as_str()));
            }
            if let Some(status) = args.get_one::<String>("status") {
                query = query.with_status(status.parse::<TaskStatus>()?);
            }
            if let Some(priority) = args.get_one::<String>("priority") {
                query = query.with_priority(priority.parse::<Priority>()?);
            }
            if let Some(search) = args.get_one::<String>("search") {
                query = query.with_search(search.as_str());
            }
            let tasks = deck.tasks(&query).await?;
            emit(json, &*tasks, || {
                for task in tasks.iter() {
                    println!("{}  [{}] {} {}", task.id, task.status, task.priority, task.title);
                }
            })?;
        }
        Some(("board", args)) => {
            let board = deck.board(project_arg(args)).load().await?;
            emit(json, &board, || {
                for column in &board.columns {
                    println!("{} ({})", column.label, column.count());
                    for task in &column.tasks {
                        println!("  {}  {}", task.id, task.title);
                    }
                }
            })?;
        }
        Some(("move", args)) => {
            let task = task_arg(args);
            let status = args
                .get_one::<String>("status")
                .map(String::as_str)
                .unwrap_or_default()
                .parse::<TaskStatus>()?;
            match deck.move_task(&task, status).await {
                Ok(DropOutcome::Unchanged) => println!("{task} is already {}", status.label()),
                Ok(DropOutcome::Moved(updated)) => println!("{} moved to {}", updated.title, status.label()),
                Err(e) => anyhow::bail!(e.user_message()),
            }
        }
        Some(("comment", args)) => {
            let task = task_arg(args);
            let text = args
                .get_many::<String>("text")
                .map(|parts| parts.cloned().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            match deck.comment(&task, &text)? {
                Some(entry) => emit(json, &entry, || println!("Noted on {task}"))?,
                None => println!("Nothing to add"),
            }
        }
        Some(("activity", args)) => {
            let task = task_arg(args);
            let entries = deck.activity(&task);
            emit(json, &entries, || {
                for entry in &entries {
                    let when = entry
                        .at()
                        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!("{when}  {}", entry.text);
                }
            })?;
        }
        Some(("weekly", _)) => {
            let now = Local::now();
            let series = deck.weekly(&now).await?;
            emit(json, &series, || {
                for (offset, count) in series.iter().enumerate() {
                    let back = i64::try_from(series.len() - 1 - offset).unwrap_or_default();
                    let day = now.date_naive() - chrono::Duration::days(back);
                    println!("{}  {}", day.format("%a %d"), "#".repeat(*count));
                }
            })?;
        }
        Some(("recent", _)) => {
            let rows = deck.recent_projects().await?;
            emit(json, &rows, || {
                for row in &rows {
                    println!("{:<30} {}/{}  {:>3}%", row.title, row.completed, row.total, row.progress);
                }
            })?;
        }
        Some(("members", args)) => {
            let members = deck.project_members(&project_arg(args)).await?;
            emit(json, &members, || {
                for member in &members {
                    println!(
                        "{}  {}",
                        member.name.as_deref().unwrap_or("-"),
                        member.email.as_deref().unwrap_or("")
                    );
                }
            })?;
        }
        Some(("drilldown", args)) => {
            let selection = match args.get_one::<String>("selection").map(String::as_str) {
                Some("completed") => Drilldown::Completed,
                Some("overdue") => Drilldown::Overdue,
                _ => Drilldown::All,
            };
            let rows = deck.drilldown(selection, &Local::now()).await?;
            emit(json, &rows, || {
                println!("{}", selection.title());
                for task in &rows {
                    println!("  {}  [{}] {}", task.id, task.status, task.title);
                }
            })?;
        }
        Some(("upcoming", _)) => {
            let now = Local::now();
            let panel = deck.upcoming_panel(&now).await?;
            emit(json, &panel, || {
                println!("{}", now.format("%B %Y"));
                println!(" Su Mo Tu We Th Fr Sa");
                for week in panel.calendar.weeks() {
                    let row: String = week
                        .iter()
                        .map(|cell| cell.map_or_else(|| "   ".to_string(), |day| format!("{day:>3}")))
                        .collect();
                    println!("{row}");
                }
                if panel.tasks.is_empty() {
                    println!("No upcoming tasks");
                }
                for task in &panel.tasks {
                    println!(
                        "  {}  {}  {}",
                        task.due_date.with_timezone(&Local).format("%b %d"),
                        task.title,
                        task.project_title().unwrap_or("-")
                    );
                }
            })?;
        }
        Some(("search", args)) => {
            let term = args.get_one::<String>("term").map(String::as_str).unwrap_or_default();
            let found = deck.search(term).await?;
            emit(json, &found, || {
                for project in &found.projects {
                    println!("project  {}  {}", project.id, project.title);
                }
                for task in &found.tasks {
                    println!("task     {}  {}", task.id, task.title);
                }
            })?;
        }
        Some(("theme", args)) => {
            let theme = match args.get_one::<String>("theme") {
                Some(name) => {
                    let theme: Theme = name.parse()?;
                    deck.set_theme(theme)?;
                    theme
                }
                None => deck.theme(),
            };
            println!("{theme}");
        }
        _ => {}
    }

    Ok(())
}
