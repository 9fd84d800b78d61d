use crate::error::{Error, Result};
use crate::models::candidate::MeetingInfo;
use crate::models::candidate_table::{CandidateTable, TABLE_COLUMNS};
use crate::utils::json;
use reqwest::Client;
use serde_json::Value as JsonValue;

const MEETING_SYSTEM_PROMPT: &str = "Extract all candidates with their respective interviewer details (name, email), date, time from the chat. \
Return ONLY a single valid JSON object. Output ONLY valid minified JSON. Use double quotes. \
Do not include explanations, comments, or markdown.";

const MEETING_SHAPE: &str = r#"{
  "candidates": [
    {
      "name": "Candidate Name",
      "email": "email@example.com",
      "interviewer": {
        "name": "Interviewer Name",
        "email": "interviewer@example.com"
      },
      "date": "YYYY-MM-DD",
      "time": "HH:MM AM/PM",
      "product": "Interview"
    }
  ]
}"#;

/// Client for the hosted chat-completion endpoint used to pull candidate
/// details out of a whole transcript.
#[derive(Clone)]
pub struct CompletionService {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl CompletionService {
    pub fn new(client: Client, api_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    pub fn meeting_prompt(transcript: &str) -> String {
        format!(
            "Chat log:\n{}\n\nReturn JSON in this shape:\n{}",
            transcript, MEETING_SHAPE
        )
    }

    pub fn table_system_prompt() -> String {
        format!(
            "Extract all candidates and all their available key skills from the chat. \
             For each candidate, show every skill present (do not skip any key skill). \
             Return a list of candidate objects as JSON, with these columns: [{}].",
            TABLE_COLUMNS
                .iter()
                .map(|c| if *c == "Key Skill" { "Key Skill (comma-separated)" } else { *c })
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    /// Asks the model for every candidate in `transcript` with interviewer, date and time.
    pub async fn extract_meeting_info(&self, transcript: &str) -> Result<MeetingInfo> {
        let text = self
            .chat_completion(MEETING_SYSTEM_PROMPT, &Self::meeting_prompt(transcript), 0.2)
            .await?;
        let value = json::extract_object(&text)?;
        let info: MeetingInfo = serde_json::from_value(value).map_err(|e| {
            Error::Extraction(format!("Unexpected meeting info shape: {}", e))
        })?;
        tracing::info!(candidates = info.candidates.len(), "Meeting info extracted");
        Ok(info)
    }

    /// Asks the model for a per-candidate summary table.
    pub async fn extract_candidate_table(&self, transcript: &str) -> Result<CandidateTable> {
        let user_prompt = format!("Chat log:\n{}\nReturn the list as JSON array.", transcript);
        let text = self
            .chat_completion(&Self::table_system_prompt(), &user_prompt, 0.1)
            .await?;
        let value = json::extract_array(&text)?;
        let table = CandidateTable::from_json(&value)?;
        tracing::info!(rows = table.rows.len(), "Candidate table extracted");
        Ok(table)
    }

    async fn chat_completion(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": temperature
        });

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let err = Error::from_response("Completion API", res).await;
            tracing::error!(error = %err, "Completion request failed");
            return Err(err);
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Extraction("Invalid completion response format".to_string()))
    }
}
