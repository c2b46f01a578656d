//! Core services - orchestration logic over the port traits.

mod settings_service;

pub use settings_service::SettingsService;
