//! Build command: assemble one artifact per day

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::output::Output;
use super::plan_cmd::{resolve_plan, ScheduleArgs};
use crate::domain::{Corpus, Plan};
use crate::pipeline::{
    Assembler, AssemblySummary, ChapterSource, PipelineError, Progress, MAX_LOOKAHEAD,
};
use crate::storage::{ArtifactKind, Config, DirSource, DirectoryWriter, HttpSource};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Output directory for day files
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out: PathBuf,

    /// Artifact type
    #[arg(long, value_enum, default_value = "audio")]
    pub kind: ArtifactKind,

    /// Read chapter payloads from a local directory (`{id}.{ext}`)
    #[arg(long, value_name = "DIR", conflicts_with = "base_url")]
    pub source_dir: Option<PathBuf>,

    /// Fetch chapter payloads from this URL instead of the configured one
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Parallel chapter fetches
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Days fetching may run ahead of writing
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(..=MAX_LOOKAHEAD as u64))]
    pub lookahead: Option<u64>,

    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

pub fn run(args: BuildArgs, config: &Config, corpus: &Corpus, output: &Output) -> Result<()> {
    let section = args.schedule.apply(&config.schedule);
    let today = chrono::Local::now().date_naive();
    let plan = resolve_plan(&section, corpus, today)?;

    if plan.is_empty() {
        output.warn("Plan is empty; only the manifest will be written");
    }

    let workers = args
        .workers
        .map(|n| n as usize)
        .unwrap_or(config.pipeline.workers);
    let lookahead = args
        .lookahead
        .map(|n| n as usize)
        .unwrap_or(config.pipeline.lookahead);
    let extension = match args.kind {
        ArtifactKind::Audio => config.source.audio_extension.as_str(),
        ArtifactKind::Text => config.source.text_extension.as_str(),
    };

    let source = open_source(&args, config, extension)?;
    let mut writer = DirectoryWriter::create(&args.out, args.kind, extension, plan.len())
        .with_context(|| format!("Failed to open output directory: {}", args.out.display()))?;

    output.verbose_ctx(
        "build",
        &format!(
            "{} days, {} chapters, {} workers, lookahead {}",
            plan.len(),
            plan.chapter_count(),
            workers,
            lookahead
        ),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let assembler = Assembler::new(workers, lookahead);
    let result = runtime.block_on(assemble(&assembler, &plan, source, &mut writer, *output));
    let written = writer.entries().len();

    let summary = match result {
        Ok(summary) => summary,
        Err(PipelineError::Cancelled) => {
            anyhow::bail!("Build cancelled after {} of {} days", written, plan.len())
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Build stopped after {} of {} days", written, plan.len())
            })
        }
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "out": args.out.display().to_string(),
            "kind": args.kind,
            "summary": summary,
        }));
    } else {
        output.success(&format!(
            "Wrote {} days ({} chapters fetched, {} reused) to {} in {:.1?}",
            summary.days_written,
            summary.chapters_fetched,
            summary.chapters_reused,
            args.out.display(),
            summary.elapsed
        ));
    }

    Ok(())
}

fn open_source(args: &BuildArgs, config: &Config, extension: &str) -> Result<Arc<dyn ChapterSource>> {
    if let Some(dir) = &args.source_dir {
        if !dir.is_dir() {
            anyhow::bail!("Source directory not found: {}", dir.display());
        }
        return Ok(Arc::new(DirSource::new(dir, extension)));
    }

    let base_url = match (&args.base_url, args.kind) {
        (Some(url), _) => url.as_str(),
        (None, ArtifactKind::Audio) => config.source.audio_base_url.as_str(),
        (None, ArtifactKind::Text) => config.source.text_base_url.as_str(),
    };
    let timeout = Duration::from_secs(config.source.timeout_secs);
    let source = HttpSource::new(base_url, extension, timeout).context("Failed to create HTTP client")?;

    Ok(Arc::new(source))
}

/// Runs the pipeline with Ctrl-C cancellation and verbose progress lines
async fn assemble(
    assembler: &Assembler,
    plan: &Plan,
    source: Arc<dyn ChapterSource>,
    writer: &mut DirectoryWriter,
    output: Output,
) -> Result<AssemblySummary, PipelineError> {
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling build");
                cancel.cancel();
            }
        })
    };
    let reporter = tokio::spawn(report_progress(assembler.progress(), output));

    let result = assembler.run(plan, source, writer, &cancel).await;

    interrupt.abort();
    reporter.abort();
    result
}

async fn report_progress(mut progress: watch::Receiver<Progress>, output: Output) {
    let mut last_written = 0;
    while progress.changed().await.is_ok() {
        let snapshot = *progress.borrow_and_update();
        if snapshot.written_days != last_written {
            last_written = snapshot.written_days;
            output.verbose_ctx(
                "build",
                &format!(
                    "{}/{} days written, {}/{} chapters fetched, {} buffered",
                    snapshot.written_days,
                    snapshot.total_days,
                    snapshot.fetched_chapters,
                    snapshot.total_chapters,
                    snapshot.buffered_days
                ),
            );
        }
    }
}
