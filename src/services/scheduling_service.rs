use crate::error::Error;
use crate::models::candidate::{Candidate, CandidateEntry, Interviewer, MeetingInfo};
use crate::services::auth_service::AuthService;
use crate::services::calendar_service::{CalendarService, CreatedEvent};
use crate::services::completion_service::CompletionService;
use crate::services::event_store::EventStore;
use crate::utils::text::name_from_email;
use std::fmt;

/// Profile label used when an extracted candidate names none.
pub const BATCH_DEFAULT_PROFILE: &str = "Interview";

/// Conditions that stop a batch before any candidate is attempted.
#[derive(Debug, thiserror::Error)]
pub enum BatchAbort {
    #[error("Extraction failed: {0}")]
    Extraction(Error),

    #[error("No candidates found for scheduling.")]
    NoCandidates,

    #[error("Microsoft Graph Auth failed: {0}")]
    Auth(Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoInterviewer,
    MissingFields(Vec<&'static str>),
}

/// What happened to one extracted candidate. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Scheduled {
        index: usize,
        candidate: Candidate,
        event: CreatedEvent,
    },
    Skipped {
        index: usize,
        reason: SkipReason,
    },
    Failed {
        index: usize,
        error: String,
    },
}

impl CandidateOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, CandidateOutcome::Scheduled { .. })
    }
}

impl fmt::Display for CandidateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateOutcome::Scheduled {
                index,
                candidate,
                event,
            } => write!(
                f,
                "✅ Meeting {}: {} with {} on {} at {} ({})",
                index,
                candidate.name,
                candidate.interviewer.name,
                candidate.date,
                candidate.time,
                event.invitee
            ),
            CandidateOutcome::Skipped {
                index,
                reason: SkipReason::NoInterviewer,
            } => write!(f, "⚠️ Skipping Candidate {}: No interviewer data", index),
            CandidateOutcome::Skipped {
                index,
                reason: SkipReason::MissingFields(fields),
            } => write!(
                f,
                "⚠️ Skipping Candidate {}: Missing fields {}",
                index,
                fields.join(", ")
            ),
            CandidateOutcome::Failed { index, error } => {
                write!(f, "⚠️ Failed Candidate {}: {}", index, error)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub outcomes: Vec<CandidateOutcome>,
}

impl ScheduleReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn scheduled_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_scheduled()).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Successfully scheduled {}/{} meetings!",
            self.scheduled_count(),
            self.total()
        )
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.outcomes.iter().map(ToString::to_string).collect();
        lines.push(self.summary());
        lines
    }
}

/// Turns a raw extracted entry into a schedulable candidate.
///
/// `fallback_email` fills a missing candidate email before the required
/// fields are checked.
pub fn resolve_entry(
    index: usize,
    entry: &CandidateEntry,
    fallback_email: Option<&str>,
) -> std::result::Result<Candidate, CandidateOutcome> {
    let mut entry = entry.clone();
    if entry.email.is_none() {
        entry.email = fallback_email.map(str::to_string);
    }

    let Some(interviewer) = entry.interviewer.clone() else {
        return Err(CandidateOutcome::Skipped {
            index,
            reason: SkipReason::NoInterviewer,
        });
    };

    let missing = entry.missing_fields();
    if !missing.is_empty() {
        return Err(CandidateOutcome::Skipped {
            index,
            reason: SkipReason::MissingFields(missing),
        });
    }

    let (Some(name), Some(email), Some(date), Some(time)) =
        (entry.name, entry.email, entry.date, entry.time)
    else {
        return Err(CandidateOutcome::Skipped {
            index,
            reason: SkipReason::MissingFields(Vec::new()),
        });
    };

    let Some(interviewer_email) = interviewer.email else {
        return Err(CandidateOutcome::Failed {
            index,
            error: format!("Missing interviewer email for {}", name),
        });
    };

    Ok(Candidate {
        name,
        email,
        interviewer: Interviewer {
            name: interviewer
                .name
                .unwrap_or_else(|| name_from_email(&interviewer_email)),
            email: interviewer_email,
        },
        date,
        time,
        job_profile: entry
            .job_profile
            .unwrap_or_else(|| BATCH_DEFAULT_PROFILE.to_string()),
    })
}

/// Schedules every candidate found in a finished conversation.
#[derive(Clone)]
pub struct SchedulingService {
    completion: CompletionService,
    auth: AuthService,
    calendar: CalendarService,
    email_override: Option<String>,
}

impl SchedulingService {
    pub fn new(
        completion: CompletionService,
        auth: AuthService,
        calendar: CalendarService,
        email_override: Option<String>,
    ) -> Self {
        Self {
            completion,
            auth,
            calendar,
            email_override,
        }
    }

    /// Extracts candidates without touching the calendar.
    pub async fn preview(&self, transcript: &str) -> std::result::Result<MeetingInfo, BatchAbort> {
        let info = self
            .completion
            .extract_meeting_info(transcript)
            .await
            .map_err(BatchAbort::Extraction)?;
        if info.candidates.is_empty() {
            return Err(BatchAbort::NoCandidates);
        }
        Ok(info)
    }

    pub async fn schedule_transcript(
        &self,
        transcript: &str,
        store: &mut EventStore,
    ) -> std::result::Result<ScheduleReport, BatchAbort> {
        let info = self.preview(transcript).await?;

        let token = self.auth.graph_token().await.map_err(BatchAbort::Auth)?;
        Ok(self.schedule_all(&token, &info.candidates, store).await)
    }

    /// One candidate's failure never stops the rest.
    pub async fn schedule_all(
        &self,
        token: &str,
        entries: &[CandidateEntry],
        store: &mut EventStore,
    ) -> ScheduleReport {
        let mut report = ScheduleReport::default();

        for (i, entry) in entries.iter().enumerate() {
            let index = i + 1;
            let candidate = match resolve_entry(index, entry, self.email_override.as_deref()) {
                Ok(candidate) => candidate,
                Err(outcome) => {
                    tracing::warn!(index, candidate = entry.display_name(), "{}", outcome);
                    report.outcomes.push(outcome);
                    continue;
                }
            };

            let outcome = match self.calendar.create_meeting(token, &candidate, store).await {
                Ok(event) => CandidateOutcome::Scheduled {
                    index,
                    candidate,
                    event,
                },
                Err(e) => CandidateOutcome::Failed {
                    index,
                    error: e.to_string(),
                },
            };
            report.outcomes.push(outcome);
        }

        tracing::info!(
            scheduled = report.scheduled_count(),
            total = report.total(),
            "Batch scheduling finished"
        );
        report
    }
}
