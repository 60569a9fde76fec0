//! Stdin Annotator
//!
//! Reads one entity reference per line (a numeric ID or any text containing
//! `XID=<digits>`) and prints a badge line per resolved entity. Input is
//! consumed as it arrives, so it can be fed by a long-running producer.
//!
//! Logs go to stderr; stdout carries only badge lines.

use std::io::Write;

use api::settings::Settings;
use api::wiring;
use futures::{Stream, StreamExt};
use platform::kv::FileKvStore;
use stats::models::DeltaResult;
use stats::presentation::badge::{BadgeTier, badge_text};
use stats::{Discovered, EntityId, RetryingAnnotator};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    api::init_tracing(std::io::stderr);

    let settings = Settings::from_env()?;
    let credential = wiring::load_credential()?;
    let stats_api = wiring::build_api(&settings.stats, credential)?;
    let store = FileKvStore::open(&settings.cache_path).await?;
    let computer = wiring::build_computer(stats_api, store, &settings.stats).await;

    let renderer = |line: &String, entity_id: EntityId, delta: &DeltaResult| {
        let mut out = std::io::stdout().lock();
        let tier = BadgeTier::for_play(delta.play);
        if let Err(e) = writeln!(
            out,
            "{entity_id}\t{}\t{}\t{line}",
            tier.color(),
            badge_text(delta)
        ) {
            tracing::error!(error = %e, "Failed to write badge");
        }
    };

    let annotator = RetryingAnnotator::new(
        computer,
        settings.stats.retry_policy(),
        settings.stats.default_window()?,
        renderer,
    )
    .with_max_in_flight(settings.stats.max_concurrent_annotations);

    let summary = annotator.run(discover_stdin()).await?;

    tracing::info!(
        rendered = summary.rendered,
        skipped = summary.skipped,
        "Stdin exhausted"
    );

    Ok(())
}

/// Lines of stdin that parse as entity references, until EOF
fn discover_stdin() -> impl Stream<Item = Discovered<String>> + Send {
    let lines = BufReader::new(tokio::io::stdin()).lines();

    futures::stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                None
            }
        }
    })
    .filter_map(|line| async move {
        match line.parse::<EntityId>() {
            Ok(entity_id) => Some(Discovered::new(entity_id, line)),
            Err(e) => {
                if !line.trim().is_empty() {
                    tracing::warn!(error = %e, "Ignoring line without an entity ID");
                }
                None
            }
        }
    })
}
