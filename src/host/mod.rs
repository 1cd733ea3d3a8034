//! Interfaces to the hosting game server
//!
//! The engine never touches the world, chat or player storage directly. It
//! emits [`HostCommand`]s which [`HostServices`] executes against the
//! collaborator traits implemented by the host.

pub mod commands;
pub mod logging;
pub mod recording;
pub mod services;

pub use commands::HostCommand;
pub use logging::TracingHost;
pub use recording::RecordingHost;
pub use services::{
    AnnouncementSink, HostServices, PersistenceSink, RelocationService, WorldEventTrigger,
};
