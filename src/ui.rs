// UI layer: a spinner that follows the pipeline stages and coloured result
// lines. Everything here is presentation only.

use crate::pipeline::{PostedComic, Stage};
use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

/// Spinner shown while a run is in progress.
pub struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        StageSpinner { bar }
    }

    /// Observer callback for `Pipeline::run`.
    pub fn advance(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}..."));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Writer factory for `tracing-subscriber`: each log line is printed with
    /// the spinner hidden so the two never share a terminal line.
    pub fn log_writer(&self) -> impl Fn() -> SpinnerLog + Send + Sync + 'static {
        let bar = self.bar.clone();
        move || SpinnerLog { bar: bar.clone() }
    }
}

/// Stderr writer that suspends the spinner around every write.
pub struct SpinnerLog {
    bar: ProgressBar,
}

impl Write for SpinnerLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.bar.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl Default for StageSpinner {
    fn default() -> Self {
        Self::new()
    }
}

pub fn print_success(posted: &PostedComic) {
    let title = posted.caption.lines().next().unwrap_or_default();
    println!(
        "{} comic #{} \"{}\" as {}",
        "Posted".green(),
        posted.comic_id,
        title,
        posted.attachment
    );
}

pub fn print_error(err: impl Display) {
    eprintln!("{}", format!("ERROR: {err}").red());
}
