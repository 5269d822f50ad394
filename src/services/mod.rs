pub mod dictionary;
pub mod expansion_engine;
pub mod focus_tracker;
pub mod handoff;
pub mod key_capture;
pub mod key_injector;
pub mod keymap;
pub mod session;
pub mod supervisor;

pub use expansion_engine::ExpansionEngine;
pub use focus_tracker::refresh_channel;
pub use handoff::handoff;
pub use key_capture::KeyCapture;
pub use session::create_sessions;
pub use supervisor::SessionSupervisor;
