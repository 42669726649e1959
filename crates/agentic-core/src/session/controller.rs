use crate::auth::Identity;
use crate::error::{AgenticError, Result};
use crate::llm::{CompletionClient, CompletionRole, Content, GenerateOptions, Part, StreamEvent};
use crate::report::{AnalysisMessage, AnalysisPayload, ReportDispatcher, ReportRequest, REPORT_MESSAGE_WINDOW};
use crate::session::attachment::{
    check_capacity, read_attachment, Attachment, AttachmentStatus, MAX_ATTACHMENTS,
    PROCESSING_DELAY, PROGRESS_INTERVAL,
};
use crate::session::events::ChatEvent;
use crate::session::model::{
    DataSourceFlags, Message, Phase, QueryRecord, Role, SessionSnapshot, TokenBudget,
};
use crate::session::reducer::append_or_merge_last;
use crate::specialist::{Specialist, SpecialistRegistry};
use crate::store::ConversationStore;
use chrono::Utc;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

pub const QUERY_HISTORY_LIMIT: usize = 50;

pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I encountered an error while processing your request. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Completed { response: String },
    /// A collaborator failed. The apology message is already in the log.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Ready { report_id: String, preview_url: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachOutcome {
    pub accepted: Vec<String>,
    /// The first rejection, shown to the user.
    pub error: Option<String>,
}

/// The user and identity epoch a send or report was started under.
struct Owner {
    email: String,
    epoch: u64,
}

struct ControllerState {
    user: Option<Identity>,
    /// Bumped on every identity transition. Work started under an older
    /// epoch no longer owns any state, even if the same user signs back in.
    epoch: u64,
    logs: HashMap<String, Vec<Message>>,
    phases: HashMap<String, Phase>,
    selected: String,
    data_sources: DataSourceFlags,
    attachments: Vec<Attachment>,
    query_history: VecDeque<QueryRecord>,
    token_budget: TokenBudget,
    /// Specialist whose report is being generated.
    generating_report: Option<String>,
}

impl ControllerState {
    fn owner(&self) -> Option<Owner> {
        self.user.as_ref().map(|u| Owner {
            email: u.email.clone(),
            epoch: self.epoch,
        })
    }

    fn owns(&self, owner: &Owner) -> bool {
        self.epoch == owner.epoch && self.user.as_ref().is_some_and(|u| u.email == owner.email)
    }

    fn phase(&self, specialist_id: &str) -> Phase {
        self.phases.get(specialist_id).copied().unwrap_or_default()
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selected_specialist: self.selected.clone(),
            data_sources: self.data_sources.clone(),
            attachments: self.attachments.clone(),
        }
    }
}

struct Inner {
    completion: Arc<dyn CompletionClient>,
    reports: Arc<dyn ReportDispatcher>,
    store: ConversationStore,
    specialists: SpecialistRegistry,
    model: String,
    state: Mutex<ControllerState>,
    events: mpsc::UnboundedSender<ChatEvent>,
}

pub struct ChatControllerBuilder {
    completion: Arc<dyn CompletionClient>,
    reports: Arc<dyn ReportDispatcher>,
    store: ConversationStore,
    specialists: SpecialistRegistry,
    model: String,
    token_limit: u64,
}

impl ChatControllerBuilder {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_specialists(mut self, specialists: SpecialistRegistry) -> Self {
        self.specialists = specialists;
        self
    }

    pub fn with_token_limit(mut self, limit: u64) -> Self {
        self.token_limit = limit;
        self
    }

    pub fn build(self) -> (ChatController, mpsc::UnboundedReceiver<ChatEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let state = ControllerState {
            user: None,
            epoch: 0,
            logs: HashMap::new(),
            phases: HashMap::new(),
            selected: self.specialists.default_id().to_string(),
            data_sources: DataSourceFlags::default(),
            attachments: Vec::new(),
            query_history: VecDeque::new(),
            token_budget: TokenBudget::new(self.token_limit),
            generating_report: None,
        };
        let controller = ChatController {
            inner: Arc::new(Inner {
                completion: self.completion,
                reports: self.reports,
                store: self.store,
                specialists: self.specialists,
                model: self.model,
                state: Mutex::new(state),
                events,
            }),
        };
        (controller, rx)
    }
}

/// Owns the per-specialist conversations of the signed-in user and drives
/// each send through estimate, stream and persistence.
///
/// Cloning is cheap; clones share state. Every mutation made on behalf of a
/// send is keyed by the user and specialist captured when the send started,
/// so switching specialists or signing out never redirects a running stream.
#[derive(Clone)]
pub struct ChatController {
    inner: Arc<Inner>,
}

impl ChatController {
    pub fn builder(
        completion: Arc<dyn CompletionClient>,
        store: ConversationStore,
        reports: Arc<dyn ReportDispatcher>,
    ) -> ChatControllerBuilder {
        ChatControllerBuilder {
            completion,
            reports,
            store,
            specialists: SpecialistRegistry::builtin(),
            model: "gemini-2.5-flash".to_string(),
            token_limit: TokenBudget::DEFAULT_LIMIT,
        }
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.inner.events.send(event);
    }

    fn persist_log(&self, state: &ControllerState, email: &str, specialist_id: &str) {
        if let Some(log) = state.logs.get(specialist_id) {
            if let Err(e) = self.inner.store.save(email, specialist_id, log) {
                tracing::warn!("Failed to persist conversation {}: {}", specialist_id, e);
            }
        }
    }

    fn persist_session(&self, state: &ControllerState) {
        if let Some(ref user) = state.user {
            if let Err(e) = self.inner.store.save_session(user, &state.snapshot()) {
                tracing::warn!("Failed to persist session for {}: {}", user.email, e);
            }
        }
    }

    fn seed_log(specialist: &Specialist, user: &Identity) -> Vec<Message> {
        vec![Message::assistant(specialist.welcome_message(user.first_name()))
            .with_specialist(&specialist.id)]
    }

    // ── Identity ──────────────────────────────────────────────────────────

    /// Load the conversations of `identity`, or drop everything on sign-out.
    ///
    /// Specialists without stored messages get a single welcome message.
    pub async fn hydrate(&self, identity: Option<Identity>) {
        let mut state = self.inner.state.lock().await;
        if state.user == identity {
            return;
        }

        state.epoch += 1;
        state.logs.clear();
        state.phases.clear();
        state.generating_report = None;
        state.selected = self.inner.specialists.default_id().to_string();
        state.data_sources = DataSourceFlags::default();
        state.attachments.clear();

        if let Some(ref user) = identity {
            let mut stored = self.inner.store.load_all(&user.email);
            let restored = stored.len();
            for specialist in self.inner.specialists.iter() {
                let log = match stored.remove(&specialist.id) {
                    Some(messages) if !messages.is_empty() => messages,
                    _ => Self::seed_log(specialist, user),
                };
                state.logs.insert(specialist.id.clone(), log);
            }

            if let Some(snapshot) = self.inner.store.load_session(&user.email) {
                if self.inner.specialists.contains(&snapshot.selected_specialist) {
                    state.selected = snapshot.selected_specialist;
                }
                state.data_sources = snapshot.data_sources;
                // Payloads are already in memory, so an interrupted simulation
                // is simply finished.
                state.attachments = snapshot
                    .attachments
                    .into_iter()
                    .take(MAX_ATTACHMENTS)
                    .map(|mut a| {
                        while a.advance() {}
                        a
                    })
                    .collect();
            }

            tracing::info!(
                "Hydrated {} stored conversation(s) for {}",
                restored,
                user.email
            );
        }

        state.user = identity.clone();
        drop(state);
        self.emit(ChatEvent::IdentityChanged(identity));
    }

    /// Hydrate on every identity transition until the provider goes away.
    pub async fn follow_identity(&self, mut rx: watch::Receiver<Option<Identity>>) {
        loop {
            let identity = rx.borrow_and_update().clone();
            self.hydrate(identity).await;
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    // ── Selection and toggles ─────────────────────────────────────────────

    pub async fn select_specialist(&self, specialist_id: &str) -> Result<()> {
        if !self.inner.specialists.contains(specialist_id) {
            return Err(AgenticError::UnknownSpecialist(specialist_id.to_string()));
        }
        let mut state = self.inner.state.lock().await;
        state.selected = specialist_id.to_string();
        self.persist_session(&state);
        drop(state);
        self.emit(ChatEvent::SpecialistSelected(specialist_id.to_string()));
        Ok(())
    }

    pub async fn set_data_source(&self, label: &str, enabled: bool) {
        let mut state = self.inner.state.lock().await;
        state.data_sources.set(label, enabled);
        self.persist_session(&state);
        drop(state);
        self.emit(ChatEvent::DataSourcesChanged);
    }

    // ── Sending ───────────────────────────────────────────────────────────

    /// Submit `input` to the selected specialist and stream the reply into
    /// its log.
    ///
    /// Rejected inputs (empty, signed out, specialist busy) return `Err` and
    /// change nothing. Collaborator failures return `Ok(SendOutcome::Failed)`
    /// after an apology message has been appended.
    pub async fn send(&self, input: &str) -> Result<SendOutcome> {
        let text = input.trim();
        if text.is_empty() {
            return Err(AgenticError::Validation("Please enter a message".to_string()));
        }

        let (owner, specialist, contents) = {
            let mut state = self.inner.state.lock().await;
            let owner = state.owner().ok_or(AgenticError::NotSignedIn)?;
            let specialist_id = state.selected.clone();
            let specialist = self
                .inner
                .specialists
                .get(&specialist_id)
                .cloned()
                .ok_or_else(|| AgenticError::UnknownSpecialist(specialist_id.clone()))?;
            if state.phase(&specialist_id).is_active() {
                return Err(AgenticError::Busy(specialist.name));
            }

            let mut parts: Vec<Part> = state
                .attachments
                .iter()
                .filter(|a| a.is_ready())
                .map(Attachment::to_part)
                .collect();
            parts.push(Part::text(format!(
                "{}\n\n{}",
                state.data_sources.context_line(),
                text
            )));

            let log = state.logs.entry(specialist_id.clone()).or_default();
            let mut contents: Vec<Content> = log.iter().map(Message::to_content).collect();
            contents.push(Content {
                role: CompletionRole::User,
                parts,
            });

            let message = Message::user(text).with_specialist(&specialist_id);
            log.push(message.clone());

            state.query_history.push_back(QueryRecord {
                query: text.to_string(),
                specialist_name: specialist.name.clone(),
                timestamp: Utc::now(),
            });
            while state.query_history.len() > QUERY_HISTORY_LIMIT {
                state.query_history.pop_front();
            }

            state.phases.insert(specialist_id.clone(), Phase::Sending);
            self.persist_log(&state, &owner.email, &specialist_id);
            drop(state);

            self.emit(ChatEvent::MessageAppended {
                specialist_id: specialist_id.clone(),
                message,
            });
            self.emit(ChatEvent::PhaseChanged {
                specialist_id,
                phase: Phase::Sending,
            });
            (owner, specialist, contents)
        };

        tracing::info!("Sending to {} ({} turns)", specialist.id, contents.len());

        match self.run_completion(&owner, &specialist, &contents).await {
            Ok(response) => {
                self.set_phase(&owner, &specialist.id, Phase::Idle).await;
                tracing::debug!("{} replied with {} chars", specialist.id, response.len());
                Ok(SendOutcome::Completed { response })
            }
            Err(e) => {
                tracing::warn!("Request to {} failed: {}", specialist.id, e);
                self.fail(&owner, &specialist.id, &e).await;
                Ok(SendOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    async fn run_completion(
        &self,
        owner: &Owner,
        specialist: &Specialist,
        contents: &[Content],
    ) -> Result<String> {
        let model = self.inner.model.as_str();

        self.set_phase(owner, &specialist.id, Phase::LoadingEstimate).await;
        let estimate = self.inner.completion.count_tokens(model, contents).await?;
        self.add_tokens(estimate.total_tokens).await;

        self.set_phase(owner, &specialist.id, Phase::Streaming).await;
        let options = GenerateOptions::with_system_instruction(&specialist.system_instruction);
        let mut stream = self
            .inner
            .completion
            .stream_generate(model, contents, &options)
            .await?;

        let mut started = false;
        let mut response = String::new();
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::TextDelta(delta) => {
                    if delta.is_empty() {
                        continue;
                    }
                    response.push_str(&delta);
                    started = self
                        .apply_increment(owner, &specialist.id, started, &delta)
                        .await;
                }
                StreamEvent::Done => break,
                StreamEvent::Error(err) => return Err(AgenticError::Completion(err)),
            }
        }

        if !response.is_empty() {
            let estimate = self
                .inner
                .completion
                .count_tokens(model, &[Content::model(&response)])
                .await?;
            self.add_tokens(estimate.total_tokens).await;
        }

        Ok(response)
    }

    async fn apply_increment(
        &self,
        owner: &Owner,
        specialist_id: &str,
        started: bool,
        delta: &str,
    ) -> bool {
        let mut state = self.inner.state.lock().await;
        if !state.owns(owner) {
            // Identity changed mid-stream; the rest of the reply has nowhere to go.
            return started;
        }

        let log = state.logs.entry(specialist_id.to_string()).or_default();
        let now_started = append_or_merge_last(log, started, delta, specialist_id);
        let event = match log.last() {
            Some(last) if started => ChatEvent::MessageUpdated {
                specialist_id: specialist_id.to_string(),
                content: last.content.clone(),
            },
            Some(last) => ChatEvent::MessageAppended {
                specialist_id: specialist_id.to_string(),
                message: last.clone(),
            },
            None => return now_started,
        };
        self.persist_log(&state, &owner.email, specialist_id);
        drop(state);

        self.emit(event);
        now_started
    }

    async fn set_phase(&self, owner: &Owner, specialist_id: &str, phase: Phase) {
        let mut state = self.inner.state.lock().await;
        if !state.owns(owner) {
            return;
        }
        state.phases.insert(specialist_id.to_string(), phase);
        drop(state);
        self.emit(ChatEvent::PhaseChanged {
            specialist_id: specialist_id.to_string(),
            phase,
        });
    }

    async fn add_tokens(&self, tokens: u64) {
        let mut state = self.inner.state.lock().await;
        state.token_budget.add(tokens);
        let budget = state.token_budget;
        drop(state);
        self.emit(ChatEvent::TokenBudgetChanged(budget));
    }

    async fn fail(&self, owner: &Owner, specialist_id: &str, error: &AgenticError) {
        let mut state = self.inner.state.lock().await;
        if !state.owns(owner) {
            return;
        }
        let message = Message::assistant(APOLOGY_MESSAGE).with_specialist(specialist_id);
        state
            .logs
            .entry(specialist_id.to_string())
            .or_default()
            .push(message.clone());
        state.phases.insert(specialist_id.to_string(), Phase::Idle);
        self.persist_log(&state, &owner.email, specialist_id);
        drop(state);

        self.emit(ChatEvent::MessageAppended {
            specialist_id: specialist_id.to_string(),
            message,
        });
        self.emit(ChatEvent::PhaseChanged {
            specialist_id: specialist_id.to_string(),
            phase: Phase::Idle,
        });
        self.emit(ChatEvent::Error {
            specialist_id: specialist_id.to_string(),
            message: error.to_string(),
        });
    }

    // ── Attachments ───────────────────────────────────────────────────────

    /// Read files into the attachment list and start their upload simulation.
    ///
    /// A batch that would exceed the file cap is rejected whole. Oversized or
    /// unreadable files are skipped; the rest of the batch is still accepted.
    pub async fn attach_files(&self, paths: &[PathBuf]) -> AttachOutcome {
        let mut outcome = AttachOutcome::default();

        let existing = {
            let state = self.inner.state.lock().await;
            if state.user.is_none() {
                outcome.error = Some(AgenticError::NotSignedIn.to_string());
                return outcome;
            }
            state.attachments.len()
        };
        if let Err(e) = check_capacity(existing, paths.len()) {
            self.reject(&mut outcome, e);
            return outcome;
        }

        for path in paths {
            let attachment = match read_attachment(path).await {
                Ok(attachment) => attachment,
                Err(e) => {
                    self.reject(&mut outcome, e);
                    continue;
                }
            };

            let mut state = self.inner.state.lock().await;
            // Another batch may have filled the list while we were reading.
            if let Err(e) = check_capacity(state.attachments.len(), 1) {
                drop(state);
                self.reject(&mut outcome, e);
                break;
            }
            state.attachments.push(attachment.clone());
            self.persist_session(&state);
            drop(state);

            tracing::debug!("Attached {} ({} bytes)", attachment.name, attachment.size);
            self.emit(ChatEvent::AttachmentUpdated {
                id: attachment.id.clone(),
                name: attachment.name.clone(),
                status: attachment.status,
                progress: attachment.progress,
            });
            outcome.accepted.push(attachment.name);

            let controller = self.clone();
            let id = attachment.id;
            tokio::spawn(async move {
                controller.simulate_progress(&id).await;
            });
        }

        outcome
    }

    fn reject(&self, outcome: &mut AttachOutcome, error: AgenticError) {
        let message = error.to_string();
        tracing::warn!("{}", message);
        self.emit(ChatEvent::AttachmentRejected(message.clone()));
        outcome.error.get_or_insert(message);
    }

    /// Walk an attachment from `uploading` to `ready` on a fixed timer.
    /// Cosmetic only; nothing is transferred.
    pub async fn simulate_progress(&self, attachment_id: &str) {
        loop {
            let delay = {
                let state = self.inner.state.lock().await;
                match state.attachments.iter().find(|a| a.id == attachment_id) {
                    Some(a) => match a.status {
                        AttachmentStatus::Uploading => PROGRESS_INTERVAL,
                        AttachmentStatus::Processing => PROCESSING_DELAY,
                        AttachmentStatus::Ready => return,
                    },
                    None => return,
                }
            };
            tokio::time::sleep(delay).await;

            let mut state = self.inner.state.lock().await;
            let Some(attachment) = state.attachments.iter_mut().find(|a| a.id == attachment_id)
            else {
                return;
            };
            attachment.advance();
            let event = ChatEvent::AttachmentUpdated {
                id: attachment.id.clone(),
                name: attachment.name.clone(),
                status: attachment.status,
                progress: attachment.progress,
            };
            let ready = attachment.is_ready();
            if ready {
                self.persist_session(&state);
            }
            drop(state);
            self.emit(event);
            if ready {
                return;
            }
        }
    }

    pub async fn remove_attachment(&self, attachment_id: &str) -> bool {
        let mut state = self.inner.state.lock().await;
        let before = state.attachments.len();
        state.attachments.retain(|a| a.id != attachment_id);
        let removed = state.attachments.len() != before;
        if removed {
            self.persist_session(&state);
        }
        drop(state);
        if removed {
            self.emit(ChatEvent::AttachmentRemoved(attachment_id.to_string()));
        }
        removed
    }

    pub async fn clear_attachments(&self) {
        let mut state = self.inner.state.lock().await;
        let removed: Vec<String> = state.attachments.drain(..).map(|a| a.id).collect();
        self.persist_session(&state);
        drop(state);
        for id in removed {
            self.emit(ChatEvent::AttachmentRemoved(id));
        }
    }

    // ── Reports ───────────────────────────────────────────────────────────

    /// Ask the report backend to summarize the selected conversation and
    /// append the result (a preview link or the error) to its log.
    pub async fn generate_report(&self, customer_request: Option<&str>) -> Result<ReportOutcome> {
        let (owner, specialist_id, request) = {
            let mut state = self.inner.state.lock().await;
            let owner = state.owner().ok_or(AgenticError::NotSignedIn)?;
            if state.generating_report.is_some() {
                return Err(AgenticError::Validation(
                    "A report is already being generated".to_string(),
                ));
            }
            let specialist_id = state.selected.clone();
            let specialist = self
                .inner
                .specialists
                .get(&specialist_id)
                .ok_or_else(|| AgenticError::UnknownSpecialist(specialist_id.clone()))?;
            if state.phase(&specialist_id).is_active() {
                return Err(AgenticError::Busy(specialist.name.clone()));
            }

            let mut messages: Vec<AnalysisMessage> = state
                .logs
                .get(&specialist_id)
                .map(|log| {
                    log.iter()
                        .rev()
                        .filter(|m| m.role == Role::Assistant)
                        .take(REPORT_MESSAGE_WINDOW)
                        .map(|m| AnalysisMessage {
                            content: m.content.clone(),
                            timestamp: m.created_at,
                        })
                        .collect()
                })
                .unwrap_or_default();
            messages.reverse();

            let analysis = AnalysisPayload {
                specialist: specialist.name.clone(),
                messages,
                attachments: state.attachments.iter().map(Attachment::meta).collect(),
                generated_at: Utc::now(),
            };
            let request = ReportRequest {
                specialist_id: specialist_id.clone(),
                customer_request: customer_request
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string),
                user_email: owner.email.clone(),
                analysis,
            };

            state.generating_report = Some(specialist_id.clone());
            drop(state);
            self.emit(ChatEvent::ReportStatusChanged { generating: true });
            (owner, specialist_id, request)
        };

        tracing::info!("Requesting report for {}", specialist_id);
        let outcome = match self.inner.reports.dispatch(&request).await {
            Ok(envelope) => match envelope.report_id() {
                Some(report_id) => ReportOutcome::Ready {
                    report_id: report_id.to_string(),
                    preview_url: self.inner.reports.preview_url(report_id),
                },
                None => ReportOutcome::Failed {
                    error: envelope.error_message(),
                },
            },
            Err(e) => ReportOutcome::Failed {
                error: e.to_string(),
            },
        };

        let content = match outcome {
            ReportOutcome::Ready {
                ref preview_url, ..
            } => format!("Your report is ready. View it here: {}", preview_url),
            ReportOutcome::Failed { ref error } => {
                tracing::warn!("Report generation failed: {}", error);
                format!("Sorry, I couldn't generate your report: {}", error)
            }
        };

        let mut state = self.inner.state.lock().await;
        let appended = if state.owns(&owner) {
            state.generating_report = None;
            let message = Message::assistant(content).with_specialist(&specialist_id);
            state
                .logs
                .entry(specialist_id.clone())
                .or_default()
                .push(message.clone());
            self.persist_log(&state, &owner.email, &specialist_id);
            Some(message)
        } else {
            None
        };
        drop(state);

        // A report from before an identity change has already been reset.
        if let Some(message) = appended {
            self.emit(ChatEvent::MessageAppended {
                specialist_id,
                message,
            });
            self.emit(ChatEvent::ReportStatusChanged { generating: false });
        }
        Ok(outcome)
    }

    // ── History ───────────────────────────────────────────────────────────

    /// Delete the user's stored conversations and start every log afresh.
    pub async fn clear_history(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let user = state.user.clone().ok_or(AgenticError::NotSignedIn)?;
        let busy = state
            .phases
            .iter()
            .find(|(_, p)| p.is_active())
            .map(|(id, _)| id)
            .or(state.generating_report.as_ref());
        if let Some(id) = busy {
            let name = self
                .inner
                .specialists
                .get(id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.clone());
            return Err(AgenticError::Busy(name));
        }

        self.inner.store.clear(&user.email)?;
        state.logs = self
            .inner
            .specialists
            .iter()
            .map(|s| (s.id.clone(), Self::seed_log(s, &user)))
            .collect();
        drop(state);

        tracing::info!("Cleared conversation history for {}", user.email);
        self.emit(ChatEvent::HistoryCleared);
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn specialists(&self) -> &SpecialistRegistry {
        &self.inner.specialists
    }

    pub async fn current_user(&self) -> Option<Identity> {
        self.inner.state.lock().await.user.clone()
    }

    pub async fn messages(&self, specialist_id: &str) -> Vec<Message> {
        self.inner
            .state
            .lock()
            .await
            .logs
            .get(specialist_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn selected_specialist(&self) -> String {
        self.inner.state.lock().await.selected.clone()
    }

    pub async fn phase(&self, specialist_id: &str) -> Phase {
        self.inner.state.lock().await.phase(specialist_id)
    }

    pub async fn token_budget(&self) -> TokenBudget {
        self.inner.state.lock().await.token_budget
    }

    pub async fn attachments(&self) -> Vec<Attachment> {
        self.inner.state.lock().await.attachments.clone()
    }

    pub async fn data_sources(&self) -> DataSourceFlags {
        self.inner.state.lock().await.data_sources.clone()
    }

    pub async fn query_history(&self) -> Vec<QueryRecord> {
        self.inner
            .state
            .lock()
            .await
            .query_history
            .iter()
            .cloned()
            .collect()
    }

    pub async fn is_generating_report(&self) -> bool {
        self.inner.state.lock().await.generating_report.is_some()
    }
}
