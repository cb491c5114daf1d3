use course_export_domain::{CourseExportError, LoggingConfig, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Fails if a global
/// subscriber is already installed or the directive does not parse.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|err| CourseExportError::Config(format!("failed to install logger: {err}")))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|err| {
        CourseExportError::Config(format!("invalid log level '{}': {err}", config.level))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_directive() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig { level: "course_export=loud".into(), json: false };

        assert!(matches!(build_filter(&config), Err(CourseExportError::Config(_))));
    }

    #[test]
    fn accepts_module_directives() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig { level: "info,course_export_infra=debug".into(), json: true };

        assert!(build_filter(&config).is_ok());
    }
}
