//! Console logging for the `tickflake` binary.
//!
//! Events are written to stderr so that minted identifiers on stdout can be
//! piped without filtering. The level is controlled with `RUST_LOG` and
//! defaults to `info`; `RUST_LOG=tickflake=trace` shows every period
//! transition inside the generator.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_target(false),
        )
        .try_init()?;
    Ok(())
}
