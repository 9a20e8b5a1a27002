// Library surface for headless/integration tests and reuse.
// The binary in main.rs only owns the CLI and terminal setup.
pub mod app;
pub mod app_dirs;
pub mod chunk;
pub mod clock;
pub mod config;
pub mod error;
pub mod levels;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod runtime;
pub mod session;
pub mod ui;

pub use app::{App, AppState, PracticeSource};
pub use chunk::ChunkWindow;
pub use error::{LevelError, SessionError, TutorError};
pub use session::{
    KeystrokeError, KeystrokeOutcome, SessionEvent, SessionStatus, TypingSession,
};

/// Interval at which the UI re-polls live metrics
pub const TICK_RATE_MS: u64 = 100;
