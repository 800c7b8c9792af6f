// ABOUTME: Shared logging setup for the sshhook service
// ABOUTME: init_for() installs crate-filtered stderr logging with a RUST_LOG override

use tracing_subscriber::EnvFilter;

/// Crate-filtered logging to stderr. Default: INFO for the named crate, WARN for
/// everything else. Used by the callback service so hyper/axum stay quiet.
pub fn init_for(crate_name: &str) {
    tracing_subscriber::fmt().with_env_filter(filter_for(crate_name)).init();
}

fn filter_for(crate_name: &str) -> EnvFilter {
    let directive = format!("{crate_name}=info");
    EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into())
        .add_directive(
            directive
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        )
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_filter_for_names_crate() {
        let filter = super::filter_for("sshhook");
        let rendered = filter.to_string();
        assert!(rendered.contains("sshhook=info"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn test_filter_for_other_crate() {
        let filter = super::filter_for("sshhook_core");
        assert!(filter.to_string().contains("sshhook_core=info"));
    }
}
