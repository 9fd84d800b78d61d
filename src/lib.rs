pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    agent_service::{AgentEndpoint, AgentService},
    auth_service::{AuthService, ClientCredentials},
    calendar_service::CalendarService,
    completion_service::CompletionService,
    extraction_service::ProfileMemory,
    history_service::HistoryService,
    scheduling_service::SchedulingService,
};
use reqwest::Client;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub agent_service: AgentService,
    pub auth_service: AuthService,
    pub calendar_service: CalendarService,
    pub completion_service: CompletionService,
    pub history_service: HistoryService,
    pub scheduling_service: SchedulingService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        let auth_service = AuthService::new(
            http_client.clone(),
            config.login_base_url.clone(),
            ClientCredentials {
                tenant_id: config.tenant_id.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            },
        );
        let agent_service = AgentService::new(
            http_client.clone(),
            AgentEndpoint::from_connection_string(&config.azure_conn_str)?,
            auth_service.clone(),
            config.agent_id.clone(),
            config.thread_id.clone(),
        );
        let calendar_service = CalendarService::new(
            http_client.clone(),
            config.graph_api_base.clone(),
            config.user_email.clone(),
            config.calendar_time_zone.clone(),
        )
        .with_email_override(config.candidate_email_override.clone());
        let completion_service = CompletionService::new(
            http_client,
            config.groq_api_url.clone(),
            config.groq_api_key.clone(),
            config.model_name.clone(),
        );
        let history_service = HistoryService::new(config.chat_history_dir.clone());
        let scheduling_service = SchedulingService::new(
            completion_service.clone(),
            auth_service.clone(),
            calendar_service.clone(),
            config.candidate_email_override.clone(),
        );

        Ok(Self {
            config: config.clone(),
            agent_service,
            auth_service,
            calendar_service,
            completion_service,
            history_service,
            scheduling_service,
        })
    }

    pub fn profile_memory(&self) -> ProfileMemory {
        ProfileMemory::new(self.config.default_job_profile.clone())
    }
}
