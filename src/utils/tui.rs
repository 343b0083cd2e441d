use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Run `task` behind a spinner on stderr, clearing it once the task settles.
///
/// The spinner hides itself when stderr is not a terminal, so piping the
/// CLI's output stays clean.
pub async fn with_spinner<F>(message: impl Into<String>, task: F) -> F::Output
where
    F: Future,
{
    let spinner = ProgressBar::new_spinner().with_message(message.into());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    spinner.enable_steady_tick(TICK_INTERVAL);

    let output = task.await;
    spinner.finish_and_clear();
    output
}
