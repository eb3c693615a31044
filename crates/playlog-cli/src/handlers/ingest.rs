use anyhow::{Result, bail};
use playlog_runtime::{
    Config, IngestOutcome, IngestRequest, IngestionJob, WorkspacePaths, run_in_background,
};

use crate::views;

pub fn handle(config: Config, paths: WorkspacePaths, request: IngestRequest) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let job = IngestionJob::new(config, paths);

    let outcome = runtime.block_on(run_in_background(job, request, |progress| {
        views::print_progress(&progress)
    }))?;

    match outcome {
        IngestOutcome::Completed(summary) => {
            views::print_summary(&summary);
            Ok(())
        }
        IngestOutcome::Failed { message } => bail!(message),
    }
}
