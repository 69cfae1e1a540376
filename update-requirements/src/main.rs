use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use update_requirements::{
    Args, ChangeRenderer, FileProcessor, PyPiClient, Settings, Sink, logging,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init(args.debug);

    let settings = Settings::load(&args)?;
    tracing::debug!("settings: {settings:?}");

    let client = PyPiClient::new(settings.pre_release)
        .with_index_url(&settings.index_url)
        .with_timeout(settings.timeout);

    let stderr_is_terminal = std::io::stderr().is_terminal();
    let processor = FileProcessor::new(&settings, settings.update.then_some(&client))
        .with_progress(stderr_is_terminal && !settings.debug);
    let sink = Sink::new(settings.inplace);
    let renderer = ChangeRenderer::new(stderr_is_terminal);

    let mut failed = 0usize;
    for path in &settings.files {
        match processor.run(path, sink).await {
            Ok(report) => {
                if sink == Sink::InPlace && settings.update {
                    renderer.render(&report);
                }
            }
            Err(e) => {
                tracing::error!("{e}");
                failed += 1;
            }
        }
    }

    tracing::debug!("done");

    if failed > 0 {
        tracing::error!("{failed} of {} file(s) failed", settings.files.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
