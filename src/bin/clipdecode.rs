use std::{io::Write as _, path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clipdecode", version)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a video into an audio data URI and frame data URIs (requires `ffmpeg` on PATH).
    Decode(DecodeArgs),
    /// Print a file as a data URI.
    Encode(EncodeArgs),
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Video file path or `data:` URI.
    #[arg(long = "in")]
    source: String,

    /// Frames sampled per second (`2` or `num/den`).
    #[arg(long, default_value = "2")]
    fps: clipdecode::Fps,

    /// ffmpeg binary (defaults to $CLIPDECODE_FFMPEG, then `ffmpeg`).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Kill a transcode stage that runs longer than this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Reject inputs larger than this many bytes.
    #[arg(long)]
    max_input_bytes: Option<u64>,

    /// Print a one-line summary instead of the JSON artifacts.
    #[arg(long)]
    summary: bool,
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// File to encode.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// MIME type (inferred from the extension when omitted).
    #[arg(long)]
    mime: Option<String>,
}

#[derive(serde::Serialize)]
struct DecodeReport<'a> {
    audio: &'a str,
    images: &'a [String],
    frame_numbers: &'a [u32],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Decode(args) => cmd_decode(args),
        Command::Encode(args) => cmd_encode(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_decode(args: DecodeArgs) -> anyhow::Result<()> {
    let mut transcoder = clipdecode::FfmpegTranscoder::default();
    if let Some(program) = args.ffmpeg {
        transcoder = transcoder.with_program(program);
    }
    if let Some(secs) = args.timeout_secs {
        transcoder = transcoder.with_timeout(Duration::from_secs(secs));
    }
    if !transcoder.is_available() {
        anyhow::bail!(
            "'{}' is required for decoding, but could not be run",
            transcoder.program().display()
        );
    }

    let mut opts = clipdecode::DecodeOpts::new().with_fps(args.fps);
    if let Some(limit) = args.max_input_bytes {
        opts = opts.with_max_input_bytes(limit);
    }

    let decoded = clipdecode::Decoder::new(transcoder, opts)
        .decode(&args.source)
        .context("decode video")?;

    let mut stdout = std::io::stdout().lock();
    if args.summary {
        writeln!(
            stdout,
            "audio: {} bytes, frames: {} ({:?})",
            decoded.audio().len(),
            decoded.len(),
            decoded.frame_numbers()
        )?;
    } else {
        let report = DecodeReport {
            audio: decoded.audio(),
            images: decoded.images(),
            frame_numbers: decoded.frame_numbers(),
        };
        serde_json::to_writer(&mut stdout, &report).context("write JSON report")?;
        writeln!(stdout)?;
    }

    decoded.close().context("remove workspace")?;
    Ok(())
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let uri = match args.mime.as_deref() {
        Some(mime) => clipdecode::datauri::encode(&args.in_path, mime),
        None => clipdecode::datauri::encode_file(&args.in_path),
    }
    .with_context(|| format!("encode '{}'", args.in_path.display()))?;
    println!("{uri}");
    Ok(())
}
