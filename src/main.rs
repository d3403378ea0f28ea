// Entrypoint for the poster.
// - Keeps `main` small: load settings, build the transport, run once.
// - Any failure is printed in red and turns into a non-zero exit code.

use anyhow::Context;
use comic_poster::{
    config::Settings,
    http::ReqwestTransport,
    pipeline::{Pipeline, PostedComic},
    ui::{self, StageSpinner},
};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    // Log lines go through the spinner so they never interleave with its redraws.
    let spinner = StageSpinner::new();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(spinner.log_writer())
        .init();

    let outcome = try_main(&spinner);
    spinner.finish();

    match outcome {
        Ok(posted) => {
            ui::print_success(&posted);
            ExitCode::SUCCESS
        }
        Err(err) => {
            ui::print_error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn try_main(spinner: &StageSpinner) -> anyhow::Result<PostedComic> {
    // Reads VK_GROUP_ID and VK_ACCESS_TOKEN (plus optional overrides) from
    // the environment or a `.env` file. See `config::Settings::from_lookup`.
    let settings = Settings::from_env().context("Failed to load settings")?;
    let transport =
        ReqwestTransport::new(settings.http_timeout).context("Failed to build HTTP client")?;

    let posted = Pipeline::new(&settings, &transport)
        .run(&mut rand::rng(), |stage| spinner.advance(stage))?;
    Ok(posted)
}
