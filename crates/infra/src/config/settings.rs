//! Live API settings
//!
//! The endpoint and token may be rotated while the service runs, so the
//! transport asks for them on every send instead of caching them at startup.

use course_export_core::ApiSettingsSource;
use course_export_domain::ApiConfig;

use super::loader::{ENV_API_TOKEN, ENV_API_URL};

/// Reads `COURSE_EXPORT_API_URL` and `COURSE_EXPORT_API_TOKEN` on each call.
///
/// Unset variables yield empty strings; the transport reports an empty URL as
/// a malformed URL when it is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvApiSettings;

impl ApiSettingsSource for EnvApiSettings {
    fn api_settings(&self) -> ApiConfig {
        ApiConfig::new(
            std::env::var(ENV_API_URL).unwrap_or_default(),
            std::env::var(ENV_API_TOKEN).unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::tests::ENV_LOCK;

    #[test]
    fn picks_up_rotated_token() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let settings = EnvApiSettings;

        std::env::set_var(ENV_API_URL, "https://lms.example.com/api");
        std::env::set_var(ENV_API_TOKEN, "first");
        let before = settings.api_settings();

        std::env::set_var(ENV_API_TOKEN, "second");
        let after = settings.api_settings();

        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_TOKEN);

        assert_eq!(before.token, "first");
        assert_eq!(after.token, "second");
        assert_eq!(after.url, "https://lms.example.com/api");
    }

    #[test]
    fn unset_variables_yield_empty_settings() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_TOKEN);

        let settings = EnvApiSettings.api_settings();

        assert!(settings.url.is_empty());
        assert!(settings.token.is_empty());
    }
}
