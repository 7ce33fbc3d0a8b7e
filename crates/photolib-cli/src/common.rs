use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

/// Warnings only unless `-v` is given; info lines are per file and would
/// interleave with the spinner. Without `-v`, `RUST_LOG` wins.
pub fn init_logger(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = verbosity_level(verbose) {
        builder.filter_level(level);
    }
    builder.init();
}

/// `-v` info, `-vv` debug, `-vvv` and up trace.
fn verbosity_level(verbose: u8) -> Option<LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

pub fn spinner() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} [{prefix}] {pos} {wide_msg}")?);
    Ok(pb)
}

/// Feed one progress callback event into the spinner. `total` is 0 when the
/// core does not know how much work is left.
pub fn update(pb: &ProgressBar, stage: &str, current: u64, total: u64, message: &str) {
    pb.set_prefix(stage.to_string());
    if total > 0 {
        pb.set_length(total);
    }
    pb.set_position(current + 1);
    pb.set_message(message.to_string());
    pb.tick();
}

pub fn display(path: &Path, root: &Path) -> String {
    photolib_core::report::relative_to(path, root).display().to_string()
}
