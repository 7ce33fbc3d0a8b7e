mod common;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use photolib_core::report::write_report;
use photolib_core::{CommandFaceDetector, FaceDetector, VerifyOptions};

#[derive(Parser)]
#[command(name = "photo-verify", version, about = "Check that every source photo exists, by content, somewhere in the library")]
struct Cli {
    /// Directory whose files must all be present in the library
    #[arg(short = 's', long = "source_dir", alias = "source-dir")]
    source_dir: PathBuf,

    /// Library root to search
    #[arg(short = 'd', long = "dest_dir", alias = "dest-dir")]
    dest_dir: PathBuf,

    /// Skip source paths matching this regular expression
    #[arg(short, long, value_name = "REGEX")]
    ignore: Option<String>,

    /// Only check photos in which a face is detected
    #[arg(long)]
    faces_only: bool,

    /// Face detection program (exit 0 = face, 1 = no face)
    #[arg(long, value_name = "PROGRAM")]
    face_detector: Option<PathBuf>,

    /// Check every source file, not only recognized media
    #[arg(long)]
    all_files: bool,

    /// Write the full report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    common::init_logger(cli.verbose);

    let detector = match (&cli.face_detector, cli.faces_only) {
        (Some(program), true) => Some(CommandFaceDetector::new(program)),
        (None, true) => bail!("--faces-only needs --face-detector PROGRAM"),
        (Some(_), false) => {
            log::warn!("--face-detector has no effect without --faces-only");
            None
        }
        (None, false) => None,
    };

    let options = VerifyOptions::new(&cli.source_dir, &cli.dest_dir)
        .with_ignore(cli.ignore.clone())
        .with_faces_only(cli.faces_only)
        .with_extension_filter(!cli.all_files);

    let pb = common::spinner()?;
    let report = photolib_core::verify(
        &options,
        detector.as_ref().map(|d| d as &dyn FaceDetector),
        &|stage, current, total, message| common::update(&pb, stage, current, total, message),
    );
    pb.finish_and_clear();
    let report = report?;

    let src = &cli.source_dir;
    println!("Unique files in source: {}", report.source_unique);
    println!("Unique files in destination: {}", report.dest_unique);
    if report.ignored > 0 {
        println!("Ignored by pattern: {}", report.ignored);
    }
    if cli.faces_only {
        println!("Photos without faces: {}", report.no_face);
        for skipped in &report.skipped {
            println!("  skipped {}: {}", common::display(&skipped.path, src), skipped.reason);
        }
    }
    println!("Not found in destination: {}", report.unmatched.len());
    for unmatched in &report.unmatched {
        match &unmatched.same_name_hint {
            Some(hint) => println!(
                "  {} (different content in {})",
                common::display(&unmatched.path, src),
                common::display(hint, &cli.dest_dir)
            ),
            None => println!("  {}", common::display(&unmatched.path, src)),
        }
    }
    if !report.failures.is_empty() {
        println!("Unreadable ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.message);
        }
    }

    if let Some(path) = &cli.report {
        write_report("photo-verify", &cli.source_dir, &cli.dest_dir, &report, path)
            .with_context(|| format!("writing report {}", path.display()))?;
    }

    if !report.is_complete() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
