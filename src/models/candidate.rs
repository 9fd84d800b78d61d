use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

/// Fields a candidate must carry before a meeting can be created, in report order.
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "date", "time"];

/// Treats blank strings and `null` as missing; numbers and booleans are kept as text.
fn deserialize_blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(JsonValue::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Anything other than a JSON object counts as "no interviewer data".
fn deserialize_interviewer<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<InterviewerEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    match value {
        Some(obj @ JsonValue::Object(_)) => serde_json::from_value(obj)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interviewer {
    pub name: String,
    pub email: String,
}

impl Interviewer {
    /// Builds an interviewer whose display name is guessed from the email address.
    pub fn from_email(email: &str) -> Self {
        Self {
            name: crate::utils::text::name_from_email(email),
            email: email.to_string(),
        }
    }
}

/// A candidate with every field resolved, ready to be put on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
    pub interviewer: Interviewer,
    pub date: String,
    pub time: String,
    pub job_profile: String,
}

/// The subset of a candidate a cancellation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateIdentity {
    pub name: String,
    pub email: String,
    pub interviewer: Interviewer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewerEntry {
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub email: Option<String>,
}

/// A candidate as the completion model reported it. Nothing is guaranteed present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CandidateEntry {
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    #[validate(required)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    #[validate(required)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_interviewer")]
    pub interviewer: Option<InterviewerEntry>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    #[validate(required)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    #[validate(required)]
    pub time: Option<String>,
    #[serde(
        default,
        alias = "product",
        deserialize_with = "deserialize_blank_as_none"
    )]
    pub job_profile: Option<String>,
}

impl CandidateEntry {
    /// Names of the required fields that are absent, in `REQUIRED_FIELDS` order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => {
                let field_errors = errors.field_errors();
                REQUIRED_FIELDS
                    .iter()
                    .copied()
                    .filter(|field| field_errors.contains_key(*field))
                    .collect()
            }
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingInfo {
    #[serde(default)]
    pub candidates: Vec<CandidateEntry>,
}
