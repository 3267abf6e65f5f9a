use anyhow::{Context, Result};
use std::io::Write;

use committime::exposition;

use crate::args::{CollectArgs, GlobalArgs};
use crate::setup::{make_collector, runtime};

pub fn run(_global_args: &GlobalArgs, args: &CollectArgs) -> Result<()> {
    let runtime = runtime()?;
    let namespaces = args.collector.namespaces();

    let text = runtime.block_on(async {
        let mut collector = make_collector(&args.collector)?;
        let metrics = collector
            .collect_all(namespaces.as_deref())
            .await
            .context("Failed to discover namespaces")?;
        exposition::render(&metrics).context("Failed to render metrics")
    })?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes()).context("Failed to write metrics")?;
    stdout.flush()?;
    Ok(())
}
