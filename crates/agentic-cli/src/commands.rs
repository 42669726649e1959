use std::path::PathBuf;

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Switch to another specialist by id.
    SelectSpecialist(String),
    ListSpecialists,
    /// Attach one or more files.
    Attach(Vec<PathBuf>),
    /// Remove an attachment by file name.
    Detach(String),
    ShowAttachments,
    /// Flip a data source on or off.
    ToggleSource(String),
    ShowSources,
    /// Generate a report, with an optional customer request.
    Report(Option<String>),
    /// Show recent queries.
    ShowHistory,
    /// Show token usage and the active specialist.
    ShowStatus,
    /// Delete all stored conversations.
    ClearHistory,
    Logout,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        "/specialist" | "/s" => {
            if arg.is_empty() {
                CommandResult::ListSpecialists
            } else {
                CommandResult::SelectSpecialist(arg.to_string())
            }
        }
        "/specialists" => CommandResult::ListSpecialists,

        "/attach" => {
            if arg.is_empty() {
                CommandResult::ShowAttachments
            } else {
                CommandResult::Attach(arg.split_whitespace().map(PathBuf::from).collect())
            }
        }
        "/detach" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /detach <file-name>".into())
            } else {
                CommandResult::Detach(arg.to_string())
            }
        }

        "/source" | "/sources" => {
            if arg.is_empty() {
                CommandResult::ShowSources
            } else {
                CommandResult::ToggleSource(arg.to_string())
            }
        }

        "/report" => {
            if arg.is_empty() {
                CommandResult::Report(None)
            } else {
                CommandResult::Report(Some(arg.to_string()))
            }
        }

        "/history" => CommandResult::ShowHistory,
        "/status" => CommandResult::ShowStatus,
        "/clear" => CommandResult::ClearHistory,
        "/logout" => CommandResult::Logout,

        _ => CommandResult::Message(format!(
            "Unknown command: {cmd}. Type /help for available commands."
        )),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "Agentic CLI Commands:\n\
         \n\
         /help, /h               Show this help\n\
         /specialist [id]        List specialists or switch to one\n\
         /attach [file...]       List attachments or attach files (max 5, 10 MB each)\n\
         /detach <file-name>     Remove an attachment\n\
         /source [label]         List data sources or toggle one\n\
         /report [request]       Generate a report from the current conversation\n\
         /history                Show recent queries\n\
         /status                 Show token usage\n\
         /clear                  Delete all stored conversations\n\
         /logout                 Sign out\n\
         /exit, /quit, /q        Quit"
            .into(),
    )
}
