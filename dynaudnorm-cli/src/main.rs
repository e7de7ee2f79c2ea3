mod args;
mod report;

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use dynaudnorm_core::{EngineConfiguration, LogFacadeLogger, PcmReader, PcmWriter, Result};

use args::{CliArgs, USAGE};
use report::ProcessingReport;

/// Frames per processing block.
const BUFFER_FRAMES: usize = 4096;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = env::args().skip(1).collect();
    let (args, engine_version) = match start(&argv) {
        Ok(started) => started,
        Err(usage) => {
            eprintln!("{}", usage);
            return ExitCode::from(2);
        }
    };

    match run(&args, engine_version) {
        Ok(report) => {
            println!(
                "Done: {} frames in, {} frames out. Output SHA-256: {}",
                report.stats.frames_read,
                report.stats.frames_written(),
                report.output_checksum
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// Parse the command line, then print the banner. A usage error returns the
/// message to show and leaves the engine unloaded.
fn start(argv: &[String]) -> std::result::Result<(CliArgs, Option<String>), String> {
    let args = CliArgs::parse(argv).map_err(|err| format!("{}\n\n{}", err, USAGE))?;
    Ok((args, print_banner()))
}

/// Print version and build banner. Returns the version string if the engine
/// could be queried.
fn print_banner() -> Option<String> {
    let version = match dynaudnorm_native::version_info() {
        Ok(version) => Some(version.to_string()),
        Err(err) => {
            log::warn!("Engine version unavailable: {}", err);
            None
        }
    };

    println!("===========================================================================");
    match &version {
        Some(version) => println!("Dynamic Audio Normalizer, Version {}", version),
        None => println!("Dynamic Audio Normalizer, Unknown Version"),
    }
    if let Ok(build) = dynaudnorm_native::build_info() {
        for (key, value) in build.to_map() {
            println!("  {:<13} {}", key, value);
        }
    }
    println!("===========================================================================");
    version
}

fn run(args: &CliArgs, engine_version: Option<String>) -> Result<ProcessingReport> {
    let started_at = chrono::Utc::now().to_rfc3339();
    let channels = args.channels as usize;

    if let Err(err) = dynaudnorm_native::set_logging_handler(Some(Arc::new(LogFacadeLogger))) {
        log::warn!("Engine log forwarding disabled: {}", err);
    }

    log::info!("Opening {} and {}", args.input.display(), args.output.display());
    let mut reader = PcmReader::open(&args.input, channels, args.format)?;
    let mut writer = PcmWriter::create(&args.output, channels, args.format)?;

    log::info!("Creating normalizer instance");
    let config = EngineConfiguration::new(args.channels, args.sample_rate);
    let session = dynaudnorm_native::create_session(config.clone())?;
    let applied = session.get_configuration()?;
    let internal_delay = session.get_internal_delay()?;
    log::debug!("Applied configuration: {:?}, delay {} frames", applied.to_map(), internal_delay);

    log::info!("Processing input samples");
    let stats = session.process_stream(&mut reader, &mut writer, BUFFER_FRAMES)?;

    // Not needed before release; exercises the reset path.
    log::info!("Resetting normalizer instance");
    session.reset()?;

    let output_bytes = writer.bytes_written();
    writer.finish()?;
    session.release()?;

    let report = ProcessingReport {
        input: args.input.display().to_string(),
        output: args.output.display().to_string(),
        format: args.format,
        configuration: config,
        applied,
        internal_delay,
        engine_version,
        stats,
        output_bytes,
        output_checksum: report::sha256_file(&args.output)?,
        started_at,
        finished_at: chrono::Utc::now().to_rfc3339(),
    };
    let path = report::write_report(&report, &args.output)?;
    log::info!("Report written to {}", path.display());
    Ok(report)
}
