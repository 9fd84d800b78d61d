use crate::error::Result;
use crate::models::chat_turn::{render_transcript, ChatTurn};
use crate::models::intent::Intent;
use crate::services::agent_service::ConversationAgent;
use crate::services::auth_service::AuthService;
use crate::services::calendar_service::CalendarService;
use crate::services::event_store::EventStore;
use crate::services::extraction_service::{extract_intent, ProfileMemory};
use crate::utils::time;
use std::fmt;

pub const GREETING: &str = "Hi! How can I help you today?";

/// `exit` and `quit`, in any case, end a session.
pub fn is_exit(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// How a session reacts to calendar intents in agent replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Act on each schedule/cancel intent as soon as the agent announces it.
    Live,
    /// Only record the conversation; scheduling happens after it ends.
    Batch,
}

/// Result of acting on an intent, shown to the user after the agent reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Scheduled { name: String, interviewer: String },
    Cancelled { name: String, email: String },
    Failed(String),
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Scheduled { name, interviewer } => write!(
                f,
                "✅ Meeting scheduled successfully for {} with {}.",
                name, interviewer
            ),
            ActionOutcome::Cancelled { name, email } => {
                write!(f, "❌ Meeting cancelled for {} ({}).", name, email)
            }
            ActionOutcome::Failed(err) => write!(f, "❌ Scheduling/Cancellation error: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub action: Option<ActionOutcome>,
}

/// One conversation with the agent, plus the calendar state it has touched.
pub struct Session<A: ConversationAgent> {
    agent: A,
    auth: AuthService,
    calendar: CalendarService,
    mode: SessionMode,
    history: Vec<ChatTurn>,
    profiles: ProfileMemory,
    events: EventStore,
}

impl<A: ConversationAgent> Session<A> {
    pub fn new(
        agent: A,
        auth: AuthService,
        calendar: CalendarService,
        mode: SessionMode,
        profiles: ProfileMemory,
        events: EventStore,
    ) -> Self {
        Self {
            agent,
            auth,
            calendar,
            mode,
            history: Vec::new(),
            profiles,
            events,
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn transcript(&self) -> String {
        render_transcript(&self.history)
    }

    pub fn profiles(&self) -> &ProfileMemory {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut ProfileMemory {
        &mut self.profiles
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventStore {
        &mut self.events
    }

    /// Relays one user message and, in live mode, acts on any intent the
    /// reply announces. An agent failure leaves the history untouched.
    pub async fn handle_turn(&mut self, user_text: &str) -> Result<TurnOutcome> {
        let reply = self.agent.reply(user_text).await?;
        self.history.push(ChatTurn::new(user_text, reply.clone()));

        let action = match self.mode {
            SessionMode::Batch => None,
            SessionMode::Live => match extract_intent(&reply, time::today(), &mut self.profiles) {
                Some(intent) => Some(self.apply_intent(intent).await),
                None => None,
            },
        };

        Ok(TurnOutcome { reply, action })
    }

    async fn apply_intent(&mut self, intent: Intent) -> ActionOutcome {
        match self.try_apply(intent).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_not_found() => {
                tracing::info!(error = %e, "Nothing to cancel");
                ActionOutcome::Failed(e.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Calendar action failed");
                ActionOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_apply(&mut self, intent: Intent) -> Result<ActionOutcome> {
        let token = self.auth.graph_token().await?;

        match intent {
            Intent::Schedule(mut candidate) => {
                candidate.job_profile = self.profiles.resolve(Some(candidate.job_profile.as_str()));
                self.calendar
                    .create_meeting(&token, &candidate, &mut self.events)
                    .await?;
                self.history
                    .push(ChatTurn::status("Meeting scheduled successfully."));
                Ok(ActionOutcome::Scheduled {
                    name: candidate.name,
                    interviewer: candidate.interviewer.name,
                })
            }
            Intent::Cancel(identity) => {
                self.calendar
                    .cancel_meeting(&token, &identity.email, &mut self.events)
                    .await?;
                self.history.push(ChatTurn::status(format!(
                    "Meeting cancelled for {} ({})",
                    identity.name, identity.email
                )));
                Ok(ActionOutcome::Cancelled {
                    name: identity.name,
                    email: identity.email,
                })
            }
        }
    }
}
