//! `chunkup upload`: run the full check/upload/merge pipeline.

use std::sync::Mutex;

use anyhow::{Context, Result};
use chunkup_upload::{
    HttpBackend, Phase, ProgressReporter, ProgressView, UploadOrchestrator, UploadOutcome,
};
use tracing::{debug, info, warn};

use super::UploadArgs;
use crate::config::Config;

pub async fn run(args: UploadArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load config, using defaults");
            Config::default()
        }),
    };
    args.apply(&mut config);

    let backend = HttpBackend::new(config.backend_config())?;
    let mut orchestrator = UploadOrchestrator::new(config.upload_options());
    let mut events = orchestrator
        .take_events()
        .context("upload events already taken")?;

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling upload");
            cancel.cancel();
        }
    });

    let reporter = tokio::spawn(async move {
        let mut reporter = ProgressReporter::new();
        let last_phase = Mutex::new(Phase::Idle);
        reporter.on_change(Box::new(move |view| log_view(&last_phase, view)));
        reporter.run(&mut events).await
    });

    info!(
        file = %args.file.display(),
        server = %config.server_url,
        chunk_size = config.chunk_size,
        concurrency = config.concurrency,
        "starting upload"
    );
    let result = orchestrator.upload_file(&args.file, &backend).await;
    let view = reporter.await?;
    debug!(phase = ?view.phase, percent = view.percent, "final progress");

    let outcome = result.with_context(|| format!("upload of {} failed", args.file.display()))?;
    println!("{}", describe(&outcome));
    Ok(())
}

/// Logs phase transitions at info and percentage steps at debug.
fn log_view(last_phase: &Mutex<Phase>, view: &ProgressView) {
    let mut last = last_phase.lock().unwrap();
    if *last != view.phase {
        *last = view.phase;
        info!(phase = ?view.phase, percent = view.percent, "upload phase");
    } else {
        debug!(phase = ?view.phase, percent = view.percent, "upload progress");
    }
    if let Some(message) = &view.message {
        debug!(%message, "server note");
    }
}

fn describe(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::AlreadyStored { file_hash, message } => match message {
            Some(m) => format!("{file_hash}  already stored ({m})"),
            None => format!("{file_hash}  already stored"),
        },
        UploadOutcome::Uploaded { file_hash, chunks } => {
            format!("{file_hash}  uploaded in {chunks} chunk(s)")
        }
    }
}
