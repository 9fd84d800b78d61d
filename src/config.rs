use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const DEFAULT_TIME_ZONE: &str = "Asia/Kolkata";
pub const DEFAULT_HISTORY_DIR: &str = "all_chat_history_sr_";
pub const DEFAULT_JOB_PROFILE: &str = "python developer";
pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub azure_conn_str: String,
    pub agent_id: String,
    pub thread_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_email: String,
    pub groq_api_key: String,
    pub groq_api_url: String,
    pub model_name: String,
    pub candidate_email_override: Option<String>,
    pub calendar_time_zone: String,
    pub chat_history_dir: PathBuf,
    pub scheduled_events_path: Option<PathBuf>,
    pub default_job_profile: String,
    pub graph_api_base: String,
    pub login_base_url: String,
    pub log_json: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            azure_conn_str: get_env("AZURE_CONN_STR")?,
            agent_id: get_env("AGENT_ID")?,
            thread_id: get_env("THREAD_ID")?,
            tenant_id: get_env("TENANT_ID")?,
            client_id: get_env("CLIENT_ID")?,
            client_secret: get_env("CLIENT_SECRET")?,
            user_email: get_env("USER_EMAIL")?,
            groq_api_key: get_env("GROQ_API_KEY")?,
            groq_api_url: get_env("GROQ_API_URL")?,
            model_name: get_env("MODEL_NAME")?,
            candidate_email_override: get_env_opt("CANDIDATE_EMAIL_OVERRIDE"),
            calendar_time_zone: get_env_or("CALENDAR_TIME_ZONE", DEFAULT_TIME_ZONE),
            chat_history_dir: PathBuf::from(get_env_or("CHAT_HISTORY_DIR", DEFAULT_HISTORY_DIR)),
            scheduled_events_path: get_env_opt("SCHEDULED_EVENTS_PATH").map(PathBuf::from),
            default_job_profile: get_env_or("DEFAULT_JOB_PROFILE", DEFAULT_JOB_PROFILE),
            graph_api_base: get_env_or("GRAPH_API_BASE", DEFAULT_GRAPH_API_BASE),
            login_base_url: get_env_or("LOGIN_BASE_URL", DEFAULT_LOGIN_BASE_URL),
            log_json: get_env_opt("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

/// Unset and blank values are both treated as absent.
fn get_env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
