use crate::error::Result;
use crate::services::agent_service::{AgentService, ConversationAgent};
use crate::services::event_store::EventStore;
use crate::services::export_service::ExportService;
use crate::services::scheduling_service::resolve_entry;
use crate::services::session_service::{is_exit, Session, SessionMode, GREETING};
use crate::AppState;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Instrument;

#[derive(Debug, Parser)]
#[command(
    name = "intellibot",
    about = "Conversational interview scheduling assistant",
    long_about = "Chat with a hosted HR agent and turn confirmed interviews into Teams meetings.",
    after_help = "Examples:\n  intellibot chat --export candidates.xlsx\n  intellibot batch\n  intellibot schedule-file all_chat_history_sr_/all_chat_history_sr_3.txt --dry-run"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Chat with the agent and schedule or cancel meetings as they are confirmed")]
    Chat {
        #[arg(long, value_name = "FILE", help = "Write the final candidate table to an XLSX file")]
        export: Option<PathBuf>,
    },
    #[command(about = "Chat with the agent, then schedule every candidate from the conversation")]
    Batch,
    #[command(about = "Schedule every candidate found in a saved chat transcript")]
    ScheduleFile {
        path: PathBuf,
        #[arg(long, help = "Only list what would be scheduled")]
        dry_run: bool,
    },
    #[command(about = "Extract the candidate table from a saved chat transcript")]
    Table {
        path: PathBuf,
        #[arg(long, value_name = "FILE", help = "Write the table to an XLSX file")]
        export: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    let span = tracing::info_span!("session", session_id = %uuid::Uuid::new_v4());

    async move {
        match cli.command.unwrap_or(Command::Chat { export: None }) {
            Command::Chat { export } => run_chat(&state, export.as_deref()).await,
            Command::Batch => run_batch(&state).await,
            Command::ScheduleFile { path, dry_run } => {
                run_schedule_file(&state, &path, dry_run).await
            }
            Command::Table { path, export } => run_table(&state, &path, export.as_deref()).await,
        }
    }
    .instrument(span)
    .await?;

    Ok(())
}

/// Reads user lines until `exit`, `quit` or end of input.
async fn converse<A: ConversationAgent>(session: &mut Session<A>) -> Result<()> {
    println!("Chatbot: {}", GREETING);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit(input) {
            break;
        }

        match session.handle_turn(input).await {
            Ok(outcome) => {
                println!("Bot: {}", outcome.reply);
                if let Some(action) = outcome.action {
                    println!("{}", action);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Agent relay failed");
                println!("❌ Agent error: {}", e);
            }
        }
    }

    Ok(())
}

async fn open_session(state: &AppState, mode: SessionMode) -> Result<Session<AgentService>> {
    let events = EventStore::from_path(state.config.scheduled_events_path.as_deref()).await?;
    state.agent_service.connect().await?;
    Ok(Session::new(
        state.agent_service.clone(),
        state.auth_service.clone(),
        state.calendar_service.clone(),
        mode,
        state.profile_memory(),
        events,
    ))
}

async fn run_chat(state: &AppState, export: Option<&Path>) -> Result<()> {
    let mut session = open_session(state, SessionMode::Live).await?;
    converse(&mut session).await?;

    let saved = state.history_service.save(session.history()).await?;
    println!("Chat history saved to {}", saved.display());

    if session.history().is_empty() {
        return Ok(());
    }

    println!("Extracting candidate details...");
    match state
        .completion_service
        .extract_candidate_table(&session.transcript())
        .await
    {
        Ok(table) if table.is_empty() => {
            println!("Candidate data could not be extracted. Try again.");
        }
        Ok(table) => {
            if let Some(profile) = table.first_job_profile() {
                session.profiles_mut().remember(profile);
                tracing::info!(
                    job_profile = session.profiles().last(),
                    "Job profile taken from candidate table"
                );
            }
            println!("\nAll Candidate Details (including all key skills)\n");
            println!("{}", table.render_text());
            if let Some(path) = export {
                ExportService::write_candidate_table_xlsx(&table, path).await?;
                println!("Candidate table exported to {}", path.display());
            }
        }
        Err(e) => println!("Could not extract candidate table: {}", e),
    }

    Ok(())
}

async fn run_batch(state: &AppState) -> Result<()> {
    let mut session = open_session(state, SessionMode::Batch).await?;
    converse(&mut session).await?;

    println!("Thank you! Extracting meeting info and scheduling interviews...");
    let saved = state.history_service.save(session.history()).await?;
    let transcript = tokio::fs::read_to_string(&saved).await?;

    match state
        .scheduling_service
        .schedule_transcript(&transcript, session.events_mut())
        .await
    {
        Ok(report) => {
            for line in report.lines() {
                println!("{}", line);
            }
        }
        Err(abort) => println!("{}", abort),
    }

    println!("Session complete.");
    Ok(())
}

async fn run_schedule_file(state: &AppState, path: &Path, dry_run: bool) -> Result<()> {
    let transcript = tokio::fs::read_to_string(path).await?;

    if dry_run {
        let info = match state.scheduling_service.preview(&transcript).await {
            Ok(info) => info,
            Err(abort) => {
                println!("{}", abort);
                return Ok(());
            }
        };
        for (i, entry) in info.candidates.iter().enumerate() {
            let index = i + 1;
            match resolve_entry(index, entry, state.config.candidate_email_override.as_deref()) {
                Ok(c) => println!(
                    "• Candidate {}: {} with {} on {} at {} ({})",
                    index, c.name, c.interviewer.name, c.date, c.time, c.job_profile
                ),
                Err(outcome) => println!("{}", outcome),
            }
        }
        return Ok(());
    }

    let mut events = EventStore::from_path(state.config.scheduled_events_path.as_deref()).await?;
    match state
        .scheduling_service
        .schedule_transcript(&transcript, &mut events)
        .await
    {
        Ok(report) => {
            for line in report.lines() {
                println!("{}", line);
            }
        }
        Err(abort) => println!("{}", abort),
    }
    Ok(())
}

async fn run_table(state: &AppState, path: &Path, export: Option<&Path>) -> Result<()> {
    let transcript = tokio::fs::read_to_string(path).await?;
    let table = state
        .completion_service
        .extract_candidate_table(&transcript)
        .await?;

    if table.is_empty() {
        println!("Candidate data could not be extracted. Try again.");
        return Ok(());
    }

    println!("{}", table.render_text());
    if let Some(export) = export {
        ExportService::write_candidate_table_xlsx(&table, export).await?;
        println!("Candidate table exported to {}", export.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_chat() {
        let cli = Cli::try_parse_from(["intellibot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn schedule_file_accepts_dry_run() {
        let cli = Cli::try_parse_from(["intellibot", "schedule-file", "log.txt", "--dry-run"]).unwrap();
        match cli.command {
            Some(Command::ScheduleFile { path, dry_run }) => {
                assert_eq!(path, PathBuf::from("log.txt"));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn table_export_takes_a_file() {
        let cli =
            Cli::try_parse_from(["intellibot", "table", "log.txt", "--export", "out.xlsx"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Table { export: Some(_), .. })
        ));
    }
}
