use agentic_core::session::ReportOutcome;
use agentic_core::{
    AuthProvider, ChatController, ChatEvent, Role, SendOutcome, SessionAuth, SpecialistRegistry,
};
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::commands::{self, CommandResult};

// ── Streaming output ────────────────────────────────────────────────────

/// Prints the reply of one specialist as it streams in.
///
/// `MessageUpdated` carries the whole tail message, so only the unseen
/// suffix is written.
struct StreamPrinter {
    specialist_id: String,
    printed: usize,
    wrote_any: bool,
}

impl StreamPrinter {
    fn new(specialist_id: &str) -> Self {
        Self {
            specialist_id: specialist_id.to_string(),
            printed: 0,
            wrote_any: false,
        }
    }

    fn handle(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::MessageAppended {
                specialist_id,
                message,
            } if *specialist_id == self.specialist_id && message.role == Role::Assistant => {
                if self.wrote_any {
                    println!();
                }
                print!("{}", message.content);
                self.printed = message.content.len();
                self.wrote_any = true;
            }
            ChatEvent::MessageUpdated {
                specialist_id,
                content,
            } if *specialist_id == self.specialist_id => {
                if let Some(suffix) = content.get(self.printed..) {
                    print!("{suffix}");
                }
                self.printed = content.len();
                self.wrote_any = true;
            }
            ChatEvent::TokenBudgetChanged(budget) => {
                tracing::debug!("Token usage {}/{}", budget.used(), budget.limit());
            }
            ChatEvent::Error {
                specialist_id,
                message,
            } if *specialist_id == self.specialist_id => {
                eprintln!("\nError: {message}");
            }
            _ => {}
        }
        let _ = std::io::stdout().flush();
    }

    fn finish(&self) {
        if self.wrote_any {
            println!();
        }
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<ChatEvent>) {
    while events.try_recv().is_ok() {}
}

/// Send one prompt to the selected specialist and stream the reply to stdout.
pub async fn send_and_stream(
    controller: &ChatController,
    events: &mut mpsc::UnboundedReceiver<ChatEvent>,
    prompt: &str,
) -> Result<()> {
    drain(events);
    let specialist_id = controller.selected_specialist().await;
    let mut printer = StreamPrinter::new(&specialist_id);

    let mut handle = tokio::spawn({
        let controller = controller.clone();
        let prompt = prompt.to_string();
        async move { controller.send(&prompt).await }
    });

    let outcome = loop {
        tokio::select! {
            result = &mut handle => break result??,
            Some(event) = events.recv() => printer.handle(&event),
        }
    };
    while let Ok(event) = events.try_recv() {
        printer.handle(&event);
    }
    printer.finish();

    if let SendOutcome::Failed { error } = outcome {
        tracing::debug!("Send failed: {}", error);
    }
    Ok(())
}

// ── One-shot helpers ────────────────────────────────────────────────────

pub fn print_specialists(registry: &SpecialistRegistry, selected: Option<&str>) {
    for specialist in registry.iter() {
        let marker = if Some(specialist.id.as_str()) == selected {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {} {:<22} {:<20} {}",
            specialist.avatar, specialist.id, specialist.name, specialist.description
        );
    }
}

/// Attach files and wait for their upload simulation so the next prompt
/// carries them.
pub async fn attach(controller: &ChatController, paths: &[PathBuf]) {
    let outcome = controller.attach_files(paths).await;
    for name in &outcome.accepted {
        eprintln!("Attached {name}");
    }
    if let Some(error) = outcome.error {
        eprintln!("{error}");
    }

    while controller.attachments().await.iter().any(|a| !a.is_ready()) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

pub async fn report(
    controller: &ChatController,
    events: &mut mpsc::UnboundedReceiver<ChatEvent>,
    request: Option<&str>,
) -> Result<()> {
    eprintln!("Generating report...");
    match controller.generate_report(request).await? {
        ReportOutcome::Ready { preview_url, .. } => println!("Report ready: {preview_url}"),
        ReportOutcome::Failed { error } => eprintln!("Report failed: {error}"),
    }
    drain(events);
    Ok(())
}

async fn toggle_source(controller: &ChatController, label: &str) {
    let sources = controller.data_sources().await;
    let Some(source) = sources
        .iter()
        .find(|s| s.label.eq_ignore_ascii_case(label))
    else {
        eprintln!("Unknown data source: {label}");
        return;
    };
    controller.set_data_source(&source.label, !source.enabled).await;
    println!(
        "{} {}",
        source.label,
        if source.enabled { "disabled" } else { "enabled" }
    );
}

async fn print_sources(controller: &ChatController) {
    for source in controller.data_sources().await.iter() {
        let mark = if source.enabled { "x" } else { " " };
        println!("[{mark}] {}", source.label);
    }
}

async fn print_attachments(controller: &ChatController) {
    let attachments = controller.attachments().await;
    if attachments.is_empty() {
        println!("No attachments.");
    }
    for a in attachments {
        println!("{} ({}, {} bytes, {:?})", a.name, a.mime_type, a.size, a.status);
    }
}

async fn detach(controller: &ChatController, name: &str) {
    let attachments = controller.attachments().await;
    match attachments.iter().find(|a| a.name == name) {
        Some(a) if controller.remove_attachment(&a.id).await => println!("Removed {name}"),
        _ => eprintln!("No attachment named {name}"),
    }
}

// ── Interactive loop ────────────────────────────────────────────────────

pub async fn run_interactive(
    controller: ChatController,
    mut events: mpsc::UnboundedReceiver<ChatEvent>,
    auth: SessionAuth,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type /help for commands.");

    loop {
        let selected = controller.selected_specialist().await;
        let name = controller
            .specialists()
            .get(&selected)
            .map(|s| s.name.clone())
            .unwrap_or(selected);
        print!("{name}> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let result = match commands::handle_command(&line) {
            CommandResult::NotACommand => {
                if controller.current_user().await.is_none() {
                    eprintln!("Signed out. Restart to sign in again.");
                } else {
                    send_and_stream(&controller, &mut events, &line).await?;
                }
                continue;
            }
            other => other,
        };

        match result {
            CommandResult::Message(msg) => println!("{msg}"),
            CommandResult::Quit => break,
            CommandResult::SelectSpecialist(id) => match controller.select_specialist(&id).await {
                Ok(()) => {
                    if let Some(last) = controller.messages(&id).await.last() {
                        println!("{}", last.content);
                    }
                }
                Err(e) => eprintln!("{e}"),
            },
            CommandResult::ListSpecialists => {
                let selected = controller.selected_specialist().await;
                print_specialists(controller.specialists(), Some(selected.as_str()));
            }
            CommandResult::Attach(paths) => attach(&controller, &paths).await,
            CommandResult::Detach(name) => detach(&controller, &name).await,
            CommandResult::ShowAttachments => print_attachments(&controller).await,
            CommandResult::ToggleSource(label) => toggle_source(&controller, &label).await,
            CommandResult::ShowSources => print_sources(&controller).await,
            CommandResult::Report(request) => {
                if let Err(e) = report(&controller, &mut events, request.as_deref()).await {
                    eprintln!("{e}");
                }
            }
            CommandResult::ShowHistory => {
                for record in controller.query_history().await {
                    println!(
                        "{} [{}] {}",
                        record.timestamp.format("%H:%M"),
                        record.specialist_name,
                        record.query
                    );
                }
            }
            CommandResult::ShowStatus => {
                let budget = controller.token_budget().await;
                println!(
                    "Tokens used: {} / {} ({:.1}%)",
                    budget.used(),
                    budget.limit(),
                    budget.percent_used()
                );
            }
            CommandResult::ClearHistory => match controller.clear_history().await {
                Ok(()) => println!("Conversation history cleared."),
                Err(e) => eprintln!("{e}"),
            },
            CommandResult::Logout => {
                auth.sign_out();
                println!("Signed out.");
            }
            CommandResult::NotACommand => {}
        }
        drain(&mut events);
    }

    Ok(())
}
