use agentic_cli::commands::{handle_command, CommandResult};
use std::path::PathBuf;

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

#[test]
fn test_help_command() {
    let result = handle_command("/help");
    if let CommandResult::Message(msg) = result {
        assert!(msg.contains("Agentic CLI Commands"));
        assert!(msg.contains("/report"));
    } else {
        panic!("expected help text");
    }
}

#[test]
fn test_help_short_alias() {
    assert!(matches!(handle_command("/h"), CommandResult::Message(_)));
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/exit", "/quit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit, "{cmd}");
    }
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(handle_command("What is our churn?"), CommandResult::NotACommand);
    assert_eq!(handle_command("  hello /help"), CommandResult::NotACommand);
}

#[test]
fn test_unknown_command() {
    match handle_command("/frobnicate") {
        CommandResult::Message(msg) => assert!(msg.contains("Unknown command: /frobnicate")),
        other => panic!("unexpected {other:?}"),
    }
}

// --- SPECIALISTS ---

#[test]
fn test_specialist_without_argument_lists() {
    assert_eq!(handle_command("/specialist"), CommandResult::ListSpecialists);
    assert_eq!(handle_command("/specialists"), CommandResult::ListSpecialists);
}

#[test]
fn test_specialist_with_argument_selects() {
    assert_eq!(
        handle_command("/specialist financial-advisor"),
        CommandResult::SelectSpecialist("financial-advisor".to_string())
    );
    assert_eq!(
        handle_command("/s legal-consultant "),
        CommandResult::SelectSpecialist("legal-consultant".to_string())
    );
}

// --- ATTACHMENTS ---

#[test]
fn test_attach_multiple_files() {
    assert_eq!(
        handle_command("/attach q3.pdf notes.md"),
        CommandResult::Attach(vec![PathBuf::from("q3.pdf"), PathBuf::from("notes.md")])
    );
}

#[test]
fn test_attach_without_files_lists() {
    assert_eq!(handle_command("/attach"), CommandResult::ShowAttachments);
}

#[test]
fn test_detach_requires_name() {
    assert!(matches!(handle_command("/detach"), CommandResult::Message(_)));
    assert_eq!(
        handle_command("/detach q3.pdf"),
        CommandResult::Detach("q3.pdf".to_string())
    );
}

// --- DATA SOURCES ---

#[test]
fn test_source_toggle_keeps_spaces() {
    assert_eq!(
        handle_command("/source Web Search"),
        CommandResult::ToggleSource("Web Search".to_string())
    );
    assert_eq!(handle_command("/sources"), CommandResult::ShowSources);
}

// --- REPORTS AND HISTORY ---

#[test]
fn test_report_with_and_without_request() {
    assert_eq!(handle_command("/report"), CommandResult::Report(None));
    assert_eq!(
        handle_command("/report focus on risks"),
        CommandResult::Report(Some("focus on risks".to_string()))
    );
}

#[test]
fn test_session_commands() {
    assert_eq!(handle_command("/history"), CommandResult::ShowHistory);
    assert_eq!(handle_command("/status"), CommandResult::ShowStatus);
    assert_eq!(handle_command("/clear"), CommandResult::ClearHistory);
    assert_eq!(handle_command("/logout"), CommandResult::Logout);
}
