use crate::models::candidate::{Candidate, CandidateIdentity};
use serde::{Deserialize, Serialize};

/// A calendar action announced by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "candidate", rename_all = "snake_case")]
pub enum Intent {
    Schedule(Candidate),
    Cancel(CandidateIdentity),
}

impl Intent {
    pub fn action(&self) -> &'static str {
        match self {
            Intent::Schedule(_) => "schedule",
            Intent::Cancel(_) => "cancel",
        }
    }

    pub fn candidate_email(&self) -> &str {
        match self {
            Intent::Schedule(c) => &c.email,
            Intent::Cancel(c) => &c.email,
        }
    }
}
