//! Interactive terminal chat driving a [`WorkspaceSession`].
//!
//! Each line typed is one chat turn. Generated files are persisted to the
//! user's project by the session and, with `--out`, also written to disk.

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use codeloom_core::chat::session::{TurnOutcome, WorkspaceSession};
use codeloom_core::project::repository::ProjectRepository;
use codeloom_infra::filesystem::write_project_file;

use crate::state::AppState;

/// Slash commands understood by the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum SlashCommand {
    Quit,
    Help,
    Files,
    Preview,
    Unknown(String),
}

/// Parse a line as a slash command; `None` for a normal message.
fn parse_command(line: &str) -> Option<SlashCommand> {
    let cmd = line.trim().strip_prefix('/')?;
    Some(match cmd.split_whitespace().next().unwrap_or("") {
        "quit" | "exit" | "q" => SlashCommand::Quit,
        "help" | "?" => SlashCommand::Help,
        "files" => SlashCommand::Files,
        "preview" => SlashCommand::Preview,
        other => SlashCommand::Unknown(other.to_string()),
    })
}

/// Run the interactive chat loop until EOF or `/quit`.
pub async fn run_chat(state: &AppState, user: &str, out: Option<&Path>, json: bool) -> Result<()> {
    let chat = Arc::clone(state.chat()?);
    let mut session = WorkspaceSession::open(chat, user).await?;

    if !json {
        println!();
        println!(
            "  {} Codeloom chat for {}  {}",
            style("✦").magenta().bold(),
            style(user).bold(),
            style("(/help for commands)").dim()
        );
        if let Some(greeting) = session.turns().first() {
            println!();
            println!("  {}", greeting.content);
        }
        println!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !json {
            print!("{} ", style("›").cyan().bold());
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if let Some(cmd) = parse_command(&line) {
            match cmd {
                SlashCommand::Quit => break,
                SlashCommand::Help => print_help(),
                SlashCommand::Files => print_files(&session),
                SlashCommand::Preview => match session.preview() {
                    Some(p) => println!("{}\n{}", style(&p.filename).cyan().bold(), p.code),
                    None => println!("  {}", style("Nothing generated yet.").dim()),
                },
                SlashCommand::Unknown(name) => {
                    println!("  {} unknown command '/{name}'", style("?").yellow());
                }
            }
            continue;
        }

        let outcome = session.send(&line).await;
        render_outcome(&outcome, &state.config.chat.apology_message, json)?;

        if let (Some(dir), TurnOutcome::Replied { reply, .. }) = (out, &outcome) {
            if let Some(file) = reply.generated_file() {
                match write_project_file(dir, file.filename, file.code).await {
                    Ok(path) if !json => {
                        println!("  {} wrote {}", style("↳").dim(), path.display());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(filename = file.filename, error = %e, "could not write file"),
                }
            }
        }
    }

    if !json {
        println!();
        println!("  {}", style("Goodbye.").dim());
    }
    Ok(())
}

fn render_outcome(outcome: &TurnOutcome, apology: &str, json: bool) -> Result<()> {
    if json {
        let line = match outcome {
            TurnOutcome::Ignored => return Ok(()),
            TurnOutcome::Replied { reply, saved_file } => serde_json::json!({
                "reply": reply,
                "saved_file": saved_file,
            }),
            TurnOutcome::Failed { error } => serde_json::json!({"error": error}),
        };
        println!("{line}");
        return Ok(());
    }

    match outcome {
        TurnOutcome::Ignored => {}
        TurnOutcome::Replied { reply, saved_file } => {
            println!();
            println!("{}", reply.message);
            match (reply.generated_file(), saved_file) {
                (Some(file), Some(_)) => println!(
                    "\n  {} {} saved to project",
                    style("✓").green(),
                    style(file.filename).cyan()
                ),
                (Some(file), None) => println!(
                    "\n  {} {} generated but not saved",
                    style("!").yellow(),
                    style(file.filename).cyan()
                ),
                _ => {}
            }
            println!();
        }
        TurnOutcome::Failed { error } => {
            tracing::debug!(%error, "chat turn failed");
            println!();
            println!("{}", style(apology).red());
            println!();
        }
    }
    Ok(())
}

fn print_help() {
    println!("  /files    list project files");
    println!("  /preview  show the current file");
    println!("  /quit     leave the chat");
}

fn print_files<R: ProjectRepository>(session: &WorkspaceSession<R>) {
    let state = session.state();
    if state.files.is_empty() {
        println!("  {}", style("No files yet.").dim());
        return;
    }
    for name in state.file_names() {
        println!("  {}", style(name).cyan());
    }
}
