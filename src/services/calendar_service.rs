use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::services::event_store::EventStore;
use crate::utils::time::{self, parse_meeting_datetime, to_calendar_string};
use chrono::Duration;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const MEETING_DURATION_MINUTES: i64 = 40;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub subject: String,
    pub body: EventBody,
    pub start: EventTime,
    pub end: EventTime,
    pub location: EventLocation,
    pub attendees: Vec<Attendee>,
    pub is_online_meeting: bool,
    pub online_meeting_provider: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    pub content_type: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email_address: EmailAddress,
    #[serde(rename = "type")]
    pub attendee_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailAddress {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEventResponse {
    id: String,
    online_meeting: Option<OnlineMeeting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnlineMeeting {
    join_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub invitee: String,
    pub join_url: Option<String>,
}

fn required_attendee(address: &str, name: &str) -> Attendee {
    Attendee {
        email_address: EmailAddress {
            address: address.to_string(),
            name: name.to_string(),
        },
        attendee_type: "required".to_string(),
    }
}

/// Creates and deletes interview meetings in a single mailbox's calendar.
#[derive(Clone)]
pub struct CalendarService {
    client: Client,
    graph_base: String,
    mailbox: String,
    time_zone: String,
    email_override: Option<String>,
}

impl CalendarService {
    pub fn new(client: Client, graph_base: String, mailbox: String, time_zone: String) -> Self {
        Self {
            client,
            graph_base: graph_base.trim_end_matches('/').to_string(),
            mailbox,
            time_zone,
            email_override: None,
        }
    }

    /// Sends every candidate invite to `address` instead of the candidate.
    /// Meetings are still tracked under the candidate's own email.
    pub fn with_email_override(mut self, address: Option<String>) -> Self {
        self.email_override = address;
        self
    }

    fn invite_address<'a>(&'a self, candidate: &'a Candidate) -> &'a str {
        self.email_override.as_deref().unwrap_or(&candidate.email)
    }

    fn events_url(&self) -> String {
        format!("{}/users/{}/events", self.graph_base, self.mailbox)
    }

    pub fn build_event_payload(&self, candidate: &Candidate) -> Result<EventPayload> {
        let start = parse_meeting_datetime(&candidate.date, &candidate.time, time::today())?;
        let end = start + Duration::minutes(MEETING_DURATION_MINUTES);
        let profile = &candidate.job_profile;
        let invitee = self.invite_address(candidate);

        Ok(EventPayload {
            subject: format!("Interview: {} with {}", profile, candidate.name),
            body: EventBody {
                content_type: "HTML".to_string(),
                content: format!(
                    "Dear {},<br><br>Your interview for <b>{}</b> with {} has been scheduled.",
                    candidate.name, profile, candidate.interviewer.name
                ),
            },
            start: EventTime {
                date_time: to_calendar_string(start),
                time_zone: self.time_zone.clone(),
            },
            end: EventTime {
                date_time: to_calendar_string(end),
                time_zone: self.time_zone.clone(),
            },
            location: EventLocation {
                display_name: "Microsoft Teams Meeting".to_string(),
            },
            attendees: vec![
                required_attendee(invitee, &candidate.name),
                required_attendee(&candidate.interviewer.email, &candidate.interviewer.name),
            ],
            is_online_meeting: true,
            online_meeting_provider: "teamsForBusiness".to_string(),
        })
    }

    /// Creates the meeting and records its id under the candidate's email.
    pub async fn create_meeting(
        &self,
        token: &str,
        candidate: &Candidate,
        store: &mut EventStore,
    ) -> Result<CreatedEvent> {
        let payload = self.build_event_payload(candidate)?;

        let res = self
            .client
            .post(self.events_url())
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let err = Error::from_response("Graph", res).await;
            tracing::warn!(candidate = %candidate.email, error = %err, "Meeting creation failed");
            return Err(err);
        }

        let created: CreatedEventResponse = res.json().await?;
        // The meeting exists from here on; a failed write only loses the mapping on disk.
        if let Err(e) = store.record(&candidate.email, &created.id).await {
            tracing::warn!(
                candidate = %candidate.email,
                event_id = %created.id,
                error = %e,
                "Meeting created but scheduled events file was not updated"
            );
        }
        tracing::info!(
            candidate = %candidate.email,
            interviewer = %candidate.interviewer.email,
            event_id = %created.id,
            "Meeting created"
        );

        Ok(CreatedEvent {
            id: created.id,
            invitee: self.invite_address(candidate).to_string(),
            join_url: created.online_meeting.and_then(|m| m.join_url),
        })
    }

    /// Deletes the meeting previously recorded for `candidate_email`.
    pub async fn cancel_meeting(
        &self,
        token: &str,
        candidate_email: &str,
        store: &mut EventStore,
    ) -> Result<()> {
        let event_id = store
            .get(candidate_email)
            .ok_or_else(|| {
                Error::NotFound(format!("No scheduled meeting found for {}", candidate_email))
            })?
            .to_string();

        let url = format!("{}/{}", self.events_url(), event_id);
        let res = self.client.delete(&url).bearer_auth(token).send().await?;

        match res.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                if let Err(e) = store.remove(candidate_email).await {
                    tracing::warn!(
                        candidate = %candidate_email,
                        error = %e,
                        "Meeting cancelled but scheduled events file was not updated"
                    );
                }
                tracing::info!(candidate = %candidate_email, event_id = %event_id, "Meeting cancelled");
                Ok(())
            }
            _ => {
                let err = Error::from_response("Graph", res).await;
                tracing::warn!(candidate = %candidate_email, error = %err, "Meeting cancellation failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Interviewer;

    fn candidate() -> Candidate {
        Candidate {
            name: "Asha Rao".into(),
            email: "asha@mail.com".into(),
            interviewer: Interviewer {
                name: "Ravi Kumar".into(),
                email: "ravi.kumar@corp.com".into(),
            },
            date: "2025-07-05".into(),
            time: "11:30 PM".into(),
            job_profile: "Data Engineer".into(),
        }
    }

    #[test]
    fn payload_spans_forty_minutes_and_invites_both_parties() {
        let service = CalendarService::new(
            Client::new(),
            "http://graph.test/v1.0/".into(),
            "hr@corp.com".into(),
            "Asia/Kolkata".into(),
        );
        let payload = service.build_event_payload(&candidate()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["subject"], "Interview: Data Engineer with Asha Rao");
        assert_eq!(json["start"]["dateTime"], "2025-07-05T23:30:00");
        assert_eq!(json["end"]["dateTime"], "2025-07-06T00:10:00");
        assert_eq!(json["end"]["timeZone"], "Asia/Kolkata");
        assert_eq!(json["isOnlineMeeting"], true);
        assert_eq!(json["onlineMeetingProvider"], "teamsForBusiness");
        assert_eq!(json["attendees"][0]["emailAddress"]["address"], "asha@mail.com");
        assert_eq!(json["attendees"][1]["emailAddress"]["name"], "Ravi Kumar");
        assert_eq!(json["attendees"][1]["type"], "required");
        assert!(json["body"]["content"]
            .as_str()
            .unwrap()
            .contains("<b>Data Engineer</b> with Ravi Kumar"));
        assert_eq!(service.events_url(), "http://graph.test/v1.0/users/hr@corp.com/events");
    }

    #[test]
    fn unparseable_time_is_rejected_before_any_request() {
        let service = CalendarService::new(
            Client::new(),
            "http://graph.test".into(),
            "hr@corp.com".into(),
            "UTC".into(),
        );
        let mut c = candidate();
        c.time = "after lunch".into();
        assert!(matches!(
            service.build_event_payload(&c),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn override_redirects_only_the_candidate_invite() {
        let service = CalendarService::new(
            Client::new(),
            "http://graph.test".into(),
            "hr@corp.com".into(),
            "UTC".into(),
        )
        .with_email_override(Some("qa@corp.com".into()));
        let payload = service.build_event_payload(&candidate()).unwrap();

        assert_eq!(payload.attendees[0].email_address.address, "qa@corp.com");
        assert_eq!(payload.attendees[0].email_address.name, "Asha Rao");
        assert_eq!(payload.attendees[1].email_address.address, "ravi.kumar@corp.com");
    }
}
