use crate::models::candidate::{Candidate, CandidateEntry, CandidateIdentity, Interviewer};
use crate::models::intent::Intent;
use crate::utils::json;
use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::sync::OnceLock;

pub const DEFAULT_TIME: &str = "10:00 AM";

fn schedule_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"✅ Interview scheduled for ([\w\s]+) \(([\w\.-]+@[\w\.-]+)\s*&\s*([\w\.-]+@[\w\.-]+)\)",
        )
        .expect("valid regex")
    })
}

fn cancel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"❌ Interview cancelled for ([\w\s]+) \(([\w\.-]+@[\w\.-]+)\s*&\s*([\w\.-]+@[\w\.-]+)\)",
        )
        .expect("valid regex")
    })
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"on (\d{4}-\d{2}-\d{2})").expect("valid regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"at ([\d: ]+[APMapm]+)").expect("valid regex"))
}

fn profile_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"for ([\w\s\-\(\)\.]+) with").expect("valid regex"))
}

/// Last job profile seen in the session, used when a reply names none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileMemory {
    last: String,
}

impl ProfileMemory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            last: initial.into(),
        }
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    pub fn remember(&mut self, profile: &str) {
        self.last = profile.to_string();
    }

    /// Blank or generic (`interview`) profiles fall back to the last one seen.
    /// Whatever is returned becomes the new last-seen profile.
    pub fn resolve(&mut self, profile: Option<&str>) -> String {
        let resolved = match profile.map(str::trim) {
            Some(p) if !p.is_empty() && !p.eq_ignore_ascii_case("interview") => p.to_string(),
            _ => self.last.clone(),
        };
        self.last = resolved.clone();
        resolved
    }
}

/// Intent carried as JSON in the reply: `{"action": "...", "candidate": {...}}`.
#[derive(Debug, Deserialize)]
struct StructuredIntent {
    action: String,
    candidate: CandidateEntry,
}

fn identity_from_captures(caps: &Captures) -> CandidateIdentity {
    let interviewer_email = caps[3].trim();
    CandidateIdentity {
        name: caps[1].trim().to_string(),
        email: caps[2].trim().to_string(),
        interviewer: Interviewer::from_email(interviewer_email),
    }
}

fn schedule_from_identity(
    identity: CandidateIdentity,
    date: Option<String>,
    time: Option<String>,
    profile: Option<&str>,
    today: NaiveDate,
    profiles: &mut ProfileMemory,
) -> Intent {
    Intent::Schedule(Candidate {
        name: identity.name,
        email: identity.email,
        interviewer: identity.interviewer,
        date: date.unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
        time: time.unwrap_or_else(|| DEFAULT_TIME.to_string()),
        job_profile: profiles.resolve(profile),
    })
}

/// Reads a structured intent block if the agent emitted one.
fn structured_intent(
    reply: &str,
    today: NaiveDate,
    profiles: &mut ProfileMemory,
) -> Option<Intent> {
    let value = json::extract_object(reply).ok()?;
    let parsed: StructuredIntent = serde_json::from_value(value).ok()?;
    let entry = parsed.candidate;

    let email = entry.email?;
    let interviewer = entry.interviewer?;
    let interviewer_email = interviewer.email?;
    let identity = CandidateIdentity {
        name: entry.name.unwrap_or_else(|| email.clone()),
        email,
        interviewer: Interviewer {
            name: interviewer
                .name
                .unwrap_or_else(|| crate::utils::text::name_from_email(&interviewer_email)),
            email: interviewer_email,
        },
    };

    match parsed.action.trim().to_lowercase().as_str() {
        "schedule" => Some(schedule_from_identity(
            identity,
            entry.date,
            entry.time,
            entry.job_profile.as_deref(),
            today,
            profiles,
        )),
        "cancel" => Some(Intent::Cancel(identity)),
        _ => None,
    }
}

/// Matches the fixed confirmation phrasing. Schedule is tried before cancel.
fn pattern_intent(reply: &str, today: NaiveDate, profiles: &mut ProfileMemory) -> Option<Intent> {
    if let Some(caps) = schedule_re().captures(reply) {
        let identity = identity_from_captures(&caps);
        let date = date_re().captures(reply).map(|c| c[1].to_string());
        let time = time_re().captures(reply).map(|c| c[1].to_string());
        let profile = profile_re()
            .captures(reply)
            .map(|c| c[1].trim().to_string());
        return Some(schedule_from_identity(
            identity,
            date,
            time,
            profile.as_deref(),
            today,
            profiles,
        ));
    }

    cancel_re()
        .captures(reply)
        .map(|caps| Intent::Cancel(identity_from_captures(&caps)))
}

/// Pulls a schedule or cancel intent out of one agent reply.
///
/// A structured JSON intent wins when present; otherwise the reply is matched
/// against the confirmation phrasing. Returns `None` when neither applies.
pub fn extract_intent(
    reply: &str,
    today: NaiveDate,
    profiles: &mut ProfileMemory,
) -> Option<Intent> {
    let intent = structured_intent(reply, today, profiles)
        .or_else(|| pattern_intent(reply, today, profiles));
    if let Some(intent) = &intent {
        tracing::info!(
            action = intent.action(),
            candidate = intent.candidate_email(),
            "Intent detected in agent reply"
        );
    }
    intent
}
