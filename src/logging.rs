use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};

use crate::app_dirs::AppDirs;

/// Environment variable holding the log filter, e.g. `KEYTUTOR_LOG=debug`.
pub const LOG_ENV: &str = "KEYTUTOR_LOG";

/// Routes `log` output to a file in the state directory; the terminal belongs to the UI.
///
/// Logging is silently disabled when the file cannot be opened.
pub fn init() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = Builder::from_env(Env::default().filter_or(LOG_ENV, "warn"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init();
}
