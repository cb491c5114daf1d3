//! course-exporter - course completion export service
//!
//! Reads newline-delimited completion events (JSON) from stdin, queues an
//! export for each, and delivers them in the background. Stops on EOF or
//! Ctrl-C after running whatever is still due.

use anyhow::Context;
use course_export_app::utils::init_logging;
use course_export_app::AppContext;
use course_export_domain::CompletionEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

const INTAKE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = course_export_infra::config::load().context("failed to load configuration")?;
    init_logging(&config.logging).context("failed to initialise logging")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) => info!(error = %e, "no .env file loaded"),
    }

    let mut ctx = AppContext::from_loaded(config).context("failed to build application context")?;
    ctx.health_check().context("database health check failed")?;

    let mut completed = ctx.events.subscribe();
    let announcer = tokio::spawn(async move {
        loop {
            match completed.recv().await {
                Ok(event) => info!(
                    record_id = event.object_id,
                    user_id = event.related_user_id,
                    course_id = event.course_id(),
                    url = %event.url(),
                    "export completed"
                ),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "export completed events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let (tx, rx) = mpsc::channel(INTAKE_CAPACITY);
    ctx.start(rx).context("failed to start export pipeline")?;
    info!("course-exporter started; reading completion events from stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        read = forward_events(stdin, tx) => {
            let forwarded = read.context("failed to read stdin")?;
            let scheduled = ctx.finish_intake().await?;
            info!(forwarded, scheduled, "end of input");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            info!("interrupt received");
        }
    }

    let summary = ctx.shutdown().await?;
    announcer.abort();
    info!(failed = summary.failed, "course-exporter stopped");
    Ok(())
}

/// Parse one event per line into `tx` until EOF or the receiver is gone.
async fn forward_events<R>(reader: R, tx: mpsc::Sender<CompletionEvent>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0_usize;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: CompletionEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "skipping malformed completion event");
                continue;
            }
        };

        if tx.send(event).await.is_err() {
            warn!("completion listener stopped; no longer reading input");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}
