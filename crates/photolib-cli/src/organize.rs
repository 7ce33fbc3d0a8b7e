mod common;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use photolib_core::report::write_report;
use photolib_core::{
    BucketDepth, DateParsing, Exiftool, MetadataExtractor, NativeMetadata,
    OrganizeOptions, TransferMode,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExtractorKind {
    /// Run the exiftool program for each file
    Exiftool,
    /// Read EXIF in-process, falling back to the file modification time
    Native,
}

#[derive(Parser)]
#[command(name = "photo-organize", version, about = "Copy or move photos and videos into YYYY/MM folders by capture date")]
struct Cli {
    /// Directory to take media from
    #[arg(short = 's', long = "source_dir", alias = "source-dir")]
    source_dir: PathBuf,

    /// Root of the date-organized library
    #[arg(short = 'd', long = "dest_dir", alias = "dest-dir")]
    dest_dir: PathBuf,

    /// Descend into subdirectories of the source
    #[arg(short, long)]
    recurse: bool,

    /// Move files instead of copying them
    #[arg(short = 'm', long = "move")]
    move_files: bool,

    /// Limit how many directory levels below the source are visited
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Organize into YYYY/MM/DD instead of YYYY/MM
    #[arg(long)]
    by_day: bool,

    /// Leave files undated unless their date is a real calendar date
    #[arg(long)]
    strict_dates: bool,

    /// Never fall back to the file modification date
    #[arg(long)]
    embedded_only: bool,

    /// Where capture dates come from
    #[arg(long, value_enum, default_value_t = ExtractorKind::Exiftool)]
    extractor: ExtractorKind,

    /// exiftool executable
    #[arg(long, value_name = "PATH", default_value = "exiftool")]
    exiftool: PathBuf,

    /// Write the full result as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    common::init_logger(cli.verbose);

    let extractor: Box<dyn MetadataExtractor> = match cli.extractor {
        ExtractorKind::Exiftool => {
            let exiftool = Exiftool::new(&cli.exiftool);
            let version = exiftool.version().with_context(|| {
                format!(
                    "cannot run {} (install exiftool or pass --extractor native)",
                    cli.exiftool.display()
                )
            })?;
            log::debug!("Using exiftool {}", version);
            Box::new(exiftool)
        }
        ExtractorKind::Native => Box::new(NativeMetadata),
    };

    let options = OrganizeOptions::new(&cli.source_dir, &cli.dest_dir)
        .with_recurse(cli.recurse)
        .with_max_depth(cli.max_depth)
        .with_transfer(if cli.move_files { TransferMode::Move } else { TransferMode::Copy })
        .with_bucket_depth(if cli.by_day { BucketDepth::YearMonthDay } else { BucketDepth::YearMonth })
        .with_date_parsing(if cli.strict_dates { DateParsing::Strict } else { DateParsing::Lenient })
        .with_embedded_only(cli.embedded_only);

    let t_total = std::time::Instant::now();
    let pb = common::spinner()?;
    let result = photolib_core::organize(&options, &*extractor, &|stage, current, total, message| {
        common::update(&pb, stage, current, total, message)
    });
    pb.finish_and_clear();
    let result = result?;

    let src = &cli.source_dir;
    println!("Files examined: {}", result.files_processed);
    println!("Total files transferred: {}", result.files_transferred);
    if result.files_renamed > 0 {
        println!("  of which renamed after a name collision: {}", result.files_renamed);
    }
    println!("Already present: {}", result.files_identical);

    if !result.skipped_no_date.is_empty() {
        println!("Files without a date ({}):", result.skipped_no_date.len());
        for path in &result.skipped_no_date {
            println!("  {}", common::display(path, src));
        }
    }
    if !result.skipped_exists.is_empty() {
        println!("Name collisions ({}):", result.skipped_exists.len());
        for path in &result.skipped_exists {
            println!("  {}", common::display(path, src));
        }
    }
    if !result.failures.is_empty() {
        println!("Failed ({}):", result.failures.len());
        for failure in &result.failures {
            println!("  {}: {}", common::display(&failure.path, src), failure.message);
        }
    }
    let partial = result.partial_moves().count();
    if partial > 0 {
        println!("{} file(s) were copied but their source could not be removed", partial);
    }

    if let Some(path) = &cli.report {
        write_report("photo-organize", &cli.source_dir, &cli.dest_dir, &result, path)
            .with_context(|| format!("writing report {}", path.display()))?;
    }

    eprintln!("Done ({:.2}s)", t_total.elapsed().as_secs_f64());

    if result.has_failures() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
