use crate::config;

/// Load settings, falling back to defaults when the file or environment is
/// unusable. The second value describes what went wrong, for logging once
/// the subscriber is up.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(e) => (
                config::Settings::default(),
                Some(format!("{e}, using defaults")),
            ),
        },
        // Config is optional; failures should not prevent the app from starting.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}
