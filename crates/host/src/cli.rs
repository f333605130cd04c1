// crates/host/src/cli.rs

//! Command implementations for the `calendar-agent` binary.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use calendar_agent_core::ai_client::CompletionClient;
use calendar_agent_core::desktop_client::{self, ProjectSummary, RemoteDesktop};
use calendar_agent_core::reliability::{BatchStatus, MetricsSnapshot, ReliableDesktop};
use calendar_agent_core::types::EventField;

use calendar_agent_host::clarify::{AutoComplete, Clarifier, Interactive};
use calendar_agent_host::config::ProjectConfig;
use calendar_agent_host::log::{self, Stage};
use calendar_agent_host::pipeline::{describe, Pipeline, RunReport, Verification};
use calendar_agent_host::worker::{PipelineWorker, WorkerEvent};

pub const DEMO_INPUT: &str = "Create a diving event on August 22nd at 8am for 2 hours";
pub const CHECK_PROMPT: &str =
    "Take a screenshot and tell me what you can see on the screen in one sentence.";

/// Read requests from stdin and run each on the background worker.
pub fn run_interactive<C, D>(pipeline: Arc<Pipeline<C, D>>) -> Result<()>
where
    C: CompletionClient + 'static,
    D: RemoteDesktop + 'static,
{
    let (worker, events) = PipelineWorker::new(pipeline);

    println!("\nCalendar Agent");
    println!("Describe an event and press Enter. Type 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    loop {
        print!("📅 What calendar event would you like to create? ");
        stdout.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let task = line.trim();

        if task.is_empty() {
            continue;
        }
        if ["quit", "exit", "q"]
            .iter()
            .any(|cmd| task.eq_ignore_ascii_case(cmd))
        {
            println!("Goodbye!");
            break;
        }

        if let Err(e) = worker.submit(task) {
            log::error(e);
            continue;
        }

        for event in events.iter() {
            match event {
                WorkerEvent::Started(request) => log::stage_start(Stage::Worker, &request),
                WorkerEvent::Questions(questions) => {
                    let mut clarifier = Interactive::new(&mut input, &mut stdout);
                    // The worker blocks until it gets a reply.
                    let answers = clarifier.ask(&questions).unwrap_or_else(|e| {
                        log::error(format!("{:#}", e));
                        Vec::new()
                    });
                    if let Err(e) = worker.answer(answers) {
                        log::error(e);
                    }
                }
                WorkerEvent::Finished(Ok(report)) => {
                    print_report(&report);
                    break;
                }
                WorkerEvent::Finished(Err(e)) => {
                    log::error(format!("Error: {}", e));
                    break;
                }
            }
        }
        worker.join();
        println!();
    }

    Ok(())
}

/// Run the canned diving example without asking the user anything.
pub fn run_demo<C, D>(pipeline: &Pipeline<C, D>) -> Result<()>
where
    C: CompletionClient,
    D: RemoteDesktop,
{
    println!("DEMO INPUT: {}", DEMO_INPUT);
    log::separator();

    let mut clarifier = AutoComplete::new(vec![
        (EventField::Duration, "2 hours".to_string()),
        (EventField::Location, "Local diving center".to_string()),
    ]);

    match pipeline.run(DEMO_INPUT, &mut clarifier) {
        Ok(report) => {
            print_report(&report);
            log::success("Demo complete");
            Ok(())
        }
        Err(e) => {
            log::error(format!("Demo failed: {:#}", e));
            Err(e)
        }
    }
}

/// Send a harmless prompt to the remote desktop to prove the setup works.
pub fn run_check<D: RemoteDesktop>(desktop: &ReliableDesktop<D>) -> Result<()> {
    log::info("Testing remote desktop connection...");
    let result = desktop
        .prompt_uncached(CHECK_PROMPT)
        .context("remote desktop connection failed")?;
    log::success("Connection successful!");
    println!("Result: {}", result);
    print_metrics(&desktop.metrics());
    Ok(())
}

/// Send every non-empty line of `file` straight to the remote desktop.
pub fn run_batch<D: RemoteDesktop>(desktop: &ReliableDesktop<D>, file: &Path) -> Result<()> {
    let operations = read_operations(file)?;
    if operations.is_empty() {
        anyhow::bail!("{} contains no operations", file.display());
    }

    log::info(format!("Running {} operations...", operations.len()));
    for outcome in desktop.run_batch(&operations) {
        let status = match outcome.status {
            BatchStatus::Success => "success",
            BatchStatus::Failed => "failed",
        };
        println!("Operation: {}", outcome.operation);
        println!("Status: {}", status);
        println!("Result: {}\n", outcome.result);
    }

    print_metrics(&desktop.metrics());
    Ok(())
}

/// Write the project file, prompting for the id when it was not given.
pub fn run_setup(path: &Path, project_id: Option<String>) -> Result<()> {
    match ProjectConfig::load(path) {
        Ok(current) => log::info(format!("Current project ID: {}", current.project_id)),
        Err(_) => log::info(format!("No project file at {}", path.display())),
    }

    let project_id = match project_id {
        Some(id) => id,
        None => {
            let projects = discover_projects();
            if projects.is_empty() {
                print!("Enter your Orgo project ID: ");
            } else {
                print!("Enter a number from the list or a project ID: ");
            }
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            choose_project(&line, &projects)
        }
    };
    let project_id = project_id.trim().to_string();
    if project_id.is_empty() {
        anyhow::bail!("No project ID provided");
    }

    ProjectConfig {
        project_id: project_id.clone(),
    }
    .save(path)?;

    log::success(format!(
        "Updated {} with project ID: {}",
        path.display(),
        project_id
    ));
    log::info("Run `calendar-agent check` to test the connection.");
    Ok(())
}

/// Print the projects the Orgo key can see. Failures only cost the list.
fn discover_projects() -> Vec<ProjectSummary> {
    log::info("Looking up your Orgo projects...");
    match desktop_client::list_projects_from_env(Some(Duration::from_secs(10))) {
        Ok(projects) if projects.is_empty() => {
            log::warn("No projects found. Create one at https://app.orgo.ai/");
            projects
        }
        Ok(projects) => {
            println!("\nYour Orgo projects:");
            for (i, project) in projects.iter().enumerate() {
                println!("  {}. {} (ID: {})", i + 1, project.name, project.id);
            }
            println!();
            projects
        }
        Err(e) => {
            log::warn(format!("Could not list projects: {:#}", e));
            log::info("Find the project ID in the Orgo dashboard at https://app.orgo.ai/");
            Vec::new()
        }
    }
}

/// A 1-based list number picks from `projects`; anything else is taken as an ID.
pub fn choose_project(line: &str, projects: &[ProjectSummary]) -> String {
    let line = line.trim();
    match line.parse::<usize>() {
        Ok(n) if (1..=projects.len()).contains(&n) => projects[n - 1].id.clone(),
        _ => line.to_string(),
    }
}

/// Non-empty, non-comment lines of a batch file.
pub fn read_operations(file: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub fn print_report(report: &RunReport) {
    log::separator();
    println!("Final event details: {}", describe(&report.event));
    match &report.result {
        Some(result) => log::success(format!(
            "Done! Result: {}",
            log::truncate_message(result, 200)
        )),
        None => println!("Instruction ready (not sent):\n{}", report.instruction),
    }
    match report.verification {
        Some(Verification::Confirmed) => log::success("Verified: the event is in the calendar"),
        Some(Verification::Missing) => log::warn("Verification: the event was not found"),
        Some(Verification::Inconclusive) => log::warn("Verification was inconclusive"),
        None => {}
    }
}

pub fn print_metrics(metrics: &MetricsSnapshot) {
    println!("Performance Metrics:");
    println!("{}", metrics);
}
