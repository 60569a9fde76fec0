//! Process wiring shared by the `api` server and the `annotate` binary

pub mod settings;
pub mod wiring;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Install the global subscriber, writing formatted events to `writer`
pub fn init_tracing<W>(writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,annotate=info,stats=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();
}
