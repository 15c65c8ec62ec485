use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Input;
use tracing::{Level, info, warn};

use ulvpack::image::{MechanismTimeline, ProgramImage};
use ulvpack::params::{FLASH_BYTES, HEADER_LEN, MECH_RATE, TARGET_SAMPLE_RATE};
use ulvpack::program::ControlProgram;
use ulvpack::{Channel, EncodeParams, OverflowPolicy, encode_program, wav};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct Clocks {
    /// Audio playback rate of the board in Hz
    #[arg(long, default_value_t = TARGET_SAMPLE_RATE)]
    sample_rate: u32,

    /// Mechanism update rate in Hz
    #[arg(long, default_value_t = MECH_RATE)]
    mech_rate: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a control program and its song into a .ulv image
    Build {
        /// Control program text file. Prompted for if omitted.
        program: Option<PathBuf>,

        /// Output image (default: <audio name>.ulv next to the program)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        clocks: Clocks,

        /// Flash size of the target in bytes
        #[arg(long, default_value_t = FLASH_BYTES)]
        flash_size: u64,

        /// What to do when the image does not fit: reject, allow or truncate
        #[arg(long, default_value_t = OverflowPolicy::Reject)]
        overflow: OverflowPolicy,
    },

    /// Describe an existing .ulv image
    Inspect {
        image: PathBuf,

        #[command(flatten)]
        clocks: Clocks,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Build { program, output, clocks, flash_size, overflow } => {
            let params = EncodeParams {
                target_sample_rate: clocks.sample_rate,
                mech_rate: clocks.mech_rate,
                capacity: flash_size,
                overflow,
            };
            let program = match program {
                Some(p) => p,
                None => prompt_program()?,
            };
            build(&program, output, &params)
        }
        Commands::Inspect { image, clocks } => inspect(&image, clocks),
    }
}

fn prompt_program() -> Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt("Programming text file")
        .interact_text()
        .context("Failed to read program file name")?;
    Ok(PathBuf::from(path.trim()))
}

fn build(program_path: &Path, output: Option<PathBuf>, params: &EncodeParams) -> Result<()> {
    let program = ControlProgram::load(program_path)?;
    info!("Programming file read.");

    let audio_path = program.audio_path(program_path);
    let wave = wav::read_wav(&audio_path)?;
    info!(
        "Read {} ({:.2} s at {} Hz)",
        audio_path.display(),
        wave.duration_secs(),
        wave.sample_rate
    );
    if program.mechanism.is_silent() {
        warn!("Control program has no toggles; the figure will not move");
    }

    let stream = encode_program(&wave, &program.mechanism, params)?;

    let out = output.unwrap_or_else(|| program.default_output(program_path));
    info!("Writing {} bytes to file '{}' ...", stream.len(), out.display());
    stream
        .write_to(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("Done!");
    Ok(())
}

fn inspect(path: &Path, clocks: Clocks) -> Result<()> {
    let params = EncodeParams {
        target_sample_rate: clocks.sample_rate,
        mech_rate: clocks.mech_rate,
        ..Default::default()
    };
    params.validate()?;

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let image = ProgramImage::decode(&bytes, params.interleave_period())
        .with_context(|| format!("{} is not a valid program image", path.display()))?;
    let timeline = MechanismTimeline::from_bytes(&image.mechanism, params.mech_rate);

    println!("{}", path.display());
    println!(
        "  payload:    {} bytes ({} with header)",
        image.payload_length,
        image.payload_length as u64 + HEADER_LEN
    );
    println!(
        "  audio:      {} samples, {:.2} s",
        image.audio.len(),
        image.duration_secs(params.target_sample_rate)
    );
    println!("  mechanism:  {} bytes", image.mechanism.len());
    for channel in Channel::ALL {
        let label = format!("{}:", channel);
        println!("  {:<10}  {} toggles", label, timeline.toggles(channel).len());
    }
    println!(
        "  playable:   {}",
        if image.firmware_playable() { "yes" } else { "no (too large for the firmware)" }
    );
    Ok(())
}
