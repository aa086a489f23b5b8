use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner()
        .with_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?)
        .with_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}
