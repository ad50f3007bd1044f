//! `chunkup hash`: chunk and hash a file locally.

use anyhow::{Context, Result};
use chunkup_protocol::WorkerMessage;
use chunkup_transfer::{ProcessOptions, ProcessedFile, spawn_processing};

use super::HashArgs;

pub async fn run(args: HashArgs) -> Result<()> {
    let file = hash_file(&args).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&WorkerMessage::from(&file))?);
    } else {
        print!("{}", render_plan(&file));
    }
    Ok(())
}

async fn hash_file(args: &HashArgs) -> Result<ProcessedFile> {
    let options = ProcessOptions::with_chunk_size(args.chunk_size);
    let mut handle = spawn_processing(args.file.clone(), options);

    if let Some(mut progress) = handle.take_progress() {
        while let Some(event) = progress.recv().await {
            tracing::debug!(
                current = event.current,
                total = event.total,
                percent = event.percent,
                "hashing"
            );
        }
    }

    handle
        .join()
        .await
        .with_context(|| format!("failed to hash {}", args.file.display()))
}

fn render_plan(file: &ProcessedFile) -> String {
    let mut out = format!(
        "{}  {}\n{} bytes in {} chunk(s)\n",
        file.file_hash, file.file_name, file.total_size, file.total_chunks
    );
    for span in &file.chunks {
        out.push_str(&format!(
            "  {:>6}  {:>12}..{:<12}  {} bytes\n",
            span.index,
            span.start,
            span.end,
            span.len()
        ));
    }
    out
}
