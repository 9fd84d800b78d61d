pub mod agent_service;
pub mod auth_service;
pub mod calendar_service;
pub mod completion_service;
pub mod event_store;
pub mod export_service;
pub mod extraction_service;
pub mod history_service;
pub mod scheduling_service;
pub mod session_service;
