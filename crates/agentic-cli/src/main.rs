use agentic_core::auth::resolve_initial_identity;
use agentic_core::{AuthProvider, ChatController, SessionAuth, Settings, SpecialistRegistry};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "agentic")]
#[command(about = "Agentic - chat with AI business specialists")]
#[command(version)]
struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Specialist to talk to (see --list-specialists)
    #[arg(short, long)]
    specialist: Option<String>,

    /// Continue as a guest with this display name
    #[arg(long, default_value = "Guest")]
    guest: String,

    /// Sign in with an OAuth authorization code instead of as a guest
    #[arg(long, requires_all = ["redirect_uri", "code_verifier"])]
    auth_code: Option<String>,

    /// Redirect URI the authorization code was issued for
    #[arg(long)]
    redirect_uri: Option<String>,

    /// PKCE verifier matching the authorization request
    #[arg(long)]
    code_verifier: Option<String>,

    /// Files to attach to the conversation
    #[arg(short, long, num_args = 1..)]
    attach: Vec<PathBuf>,

    /// Data sources to enable, e.g. "Web Search"
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Generate a report from the conversation after the prompt
    #[arg(long)]
    report: bool,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// List available specialists and exit
    #[arg(long)]
    list_specialists: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if cli.list_specialists {
        app::print_specialists(&SpecialistRegistry::builtin(), None);
        return Ok(());
    }

    let mut settings = Settings::load();
    if let Some(ref model) = cli.model {
        settings.completion.model = model.clone();
    }

    let completion = Arc::new(settings.build_completion_client()?);
    let reports = Arc::new(settings.build_report_dispatcher());
    let store = settings.build_store()?;
    let (controller, mut events) = ChatController::builder(completion, store, reports)
        .with_model(&settings.completion.model)
        .with_token_limit(settings.completion.token_limit)
        .build();

    let auth = SessionAuth::new();
    match (&cli.auth_code, &cli.redirect_uri, &cli.code_verifier) {
        (Some(code), Some(redirect_uri), Some(verifier)) => {
            let request = settings.token_exchange_request(code, redirect_uri, verifier)?;
            let client = settings.build_token_exchange_client();
            let identity = auth.complete_sign_in(&client, &request).await?;
            eprintln!("Signed in as {}", identity.email);
        }
        _ => {
            auth.sign_in_as_guest(&cli.guest)?;
        }
    }
    let identity_rx = auth.subscribe();
    let identity = resolve_initial_identity(identity_rx.clone(), settings.resolve_timeout()).await;
    controller.hydrate(identity).await;
    tokio::spawn({
        let controller = controller.clone();
        async move { controller.follow_identity(identity_rx).await }
    });

    if let Some(ref id) = cli.specialist {
        controller.select_specialist(id).await?;
    }
    for label in &cli.sources {
        controller.set_data_source(label, true).await;
    }
    if !cli.attach.is_empty() {
        app::attach(&controller, &cli.attach).await;
    }

    if cli.prompt.is_none() && !cli.report {
        return app::run_interactive(controller, events, auth).await;
    }

    if let Some(ref prompt) = cli.prompt {
        app::send_and_stream(&controller, &mut events, prompt).await?;
    }
    if cli.report {
        app::report(&controller, &mut events, None).await?;
    }

    Ok(())
}
