//! chatvox composition root.
//!
//! The [`Orchestrator`] wires the speaker catalog, synthesis
//! dispatcher, playback queue, download manager, and connection
//! supervisor behind the named command surface a presentation layer
//! calls. Long-running work (chat reading, playback, downloads) runs as
//! independent background activities reporting through the
//! [`EventBus`](chatvox_core::EventBus); commands stay short.
//!
//! The orchestrator is an owned, explicitly constructed value — there
//! are no ambient singletons, and tests construct a fresh one per case.

pub mod error;
pub mod orchestrator;
pub mod settings_repo;

pub use error::CommandError;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use settings_repo::JsonSettingsRepository;
