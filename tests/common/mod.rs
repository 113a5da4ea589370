use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_test_writer()
                    .with_filter(env_filter),
            )
            .try_init()
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to set up logging: {}", e);
            });
    });
}
