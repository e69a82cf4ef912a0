/// Amp Bench — offline render and measurement CLI for the GainForge engine.
///
/// Usage:
///   amp-bench render --input IN.wav --output OUT.wav [--state S.json] [param flags] [--block-size N]
///   amp-bench impulse [param flags] [--length N] [--csv FILE]
///   amp-bench sweep [--start F1] [--end F2] [--points N] [--csv FILE] [param flags]
///
/// Param flags: --gain --bass --mid --treble --presence --master --drive (0..1),
/// --tube, --voice raw|mid|mod, --mode clean|crunch|modern.
use std::f64::consts::PI;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};

use gainforge_dsp::tone_stack::{ToneSettings, ToneStack};
use gainforge_dsp::{AmpDriver, AmpParams, AmpState, Mode, RectifierMode, Voice};

/// Output samples below this count as silence when measuring tails (-120 dB).
const TAIL_THRESHOLD: f32 = 1e-6;

#[derive(Parser)]
#[command(name = "amp-bench", version, about = "GainForge offline render and measurement")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a WAV file through the amp
    Render {
        /// Input WAV (mono or stereo; 16/24/32-bit int or 32-bit float)
        #[arg(short, long)]
        input: PathBuf,
        /// Output WAV (32-bit float, same layout as the input)
        #[arg(short, long)]
        output: PathBuf,
        /// Host block size
        #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..))]
        block_size: u32,
        #[command(flatten)]
        amp: AmpArgs,
    },
    /// Summarize the impulse response of the full chain
    Impulse {
        /// Response length in samples
        #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u32).range(1..))]
        length: u32,
        /// Sample rate in Hz (8000 or more)
        #[arg(long, default_value_t = 44100, value_parser = clap::value_parser!(u32).range(8000..))]
        sample_rate: u32,
        /// Write the response as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        #[command(flatten)]
        amp: AmpArgs,
    },
    /// Tone-stack magnitude response (log-spaced sine measurement)
    Sweep {
        #[arg(long, default_value_t = 20.0)]
        start: f64,
        #[arg(long, default_value_t = 20000.0)]
        end: f64,
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(2..))]
        points: u32,
        /// Sample rate in Hz (8000 or more)
        #[arg(long, default_value_t = 44100, value_parser = clap::value_parser!(u32).range(8000..))]
        sample_rate: u32,
        /// Write frequency/gain pairs as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        #[command(flatten)]
        amp: AmpArgs,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VoiceArg {
    Raw,
    Mid,
    Mod,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Clean,
    Crunch,
    Modern,
}

/// Amp controls. Flags override the state file, which overrides defaults.
#[derive(Args, Debug)]
struct AmpArgs {
    /// Flat JSON parameter state (keys GAIN, BASS, ..., BYPASS)
    #[arg(long)]
    state: Option<PathBuf>,
    #[arg(long)]
    gain: Option<f32>,
    #[arg(long)]
    bass: Option<f32>,
    #[arg(long)]
    mid: Option<f32>,
    #[arg(long)]
    treble: Option<f32>,
    #[arg(long)]
    presence: Option<f32>,
    #[arg(long)]
    master: Option<f32>,
    #[arg(long)]
    drive: Option<f32>,
    /// Tube rectifier (default silicon)
    #[arg(long)]
    tube: bool,
    #[arg(long, value_enum)]
    voice: Option<VoiceArg>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

impl AmpArgs {
    fn resolve(&self) -> Result<AmpParams> {
        let mut p = match &self.state {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading state file {}", path.display()))?;
                let state = AmpState::from_json(&json)
                    .with_context(|| format!("parsing state file {}", path.display()))?;
                AmpParams::from(&state)
            }
            None => AmpParams::default(),
        };

        let knobs = [
            (self.gain, &mut p.gain),
            (self.bass, &mut p.bass),
            (self.mid, &mut p.mid),
            (self.treble, &mut p.treble),
            (self.presence, &mut p.presence),
            (self.master, &mut p.master),
            (self.drive, &mut p.drive),
        ];
        for (flag, slot) in knobs {
            if let Some(v) = flag {
                *slot = v;
            }
        }
        if self.tube {
            p.rectifier = RectifierMode::Tube;
        }
        if let Some(v) = self.voice {
            p.voice = match v {
                VoiceArg::Raw => Voice::Raw,
                VoiceArg::Mid => Voice::Mid,
                VoiceArg::Mod => Voice::Mod,
            };
        }
        if let Some(m) = self.mode {
            p.mode = match m {
                ModeArg::Clean => Mode::Clean,
                ModeArg::Crunch => Mode::Crunch,
                ModeArg::Modern => Mode::Modern,
            };
        }

        let p = p.sanitized();
        debug!("amp params: {p:?}");
        Ok(p)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render { input, output, block_size, amp } => {
            cmd_render(&input, &output, block_size as usize, &amp.resolve()?)
        }
        Commands::Impulse { length, sample_rate, csv, amp } => {
            cmd_impulse(length as usize, sample_rate as f64, csv.as_deref(), &amp.resolve()?)
        }
        Commands::Sweep { start, end, points, sample_rate, csv, amp } => cmd_sweep(
            start,
            end,
            points as usize,
            sample_rate as f64,
            csv.as_deref(),
            &amp.resolve()?,
        ),
    }
}

// ─── Render ─────────────────────────────────────────────────────────────────

/// Read a WAV into one f32 vector per channel.
fn read_wav(path: &Path) -> Result<(hound::WavSpec, Vec<Vec<f32>>)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if !(1..=2).contains(&channels) {
        bail!("{}: {channels} channels, expected mono or stereo", path.display());
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("decoding {}", path.display()))?,
        (hound::SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 * scale) as f32))
                .collect::<Result<_, _>>()
                .with_context(|| format!("decoding {}", path.display()))?
        }
        (format, bits) => bail!("{}: unsupported {bits}-bit {format:?} WAV", path.display()),
    };

    let mut split = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &s) in split.iter_mut().zip(frame) {
            ch.push(s);
        }
    }
    Ok((spec, split))
}

fn write_wav(path: &Path, sample_rate: u32, channels: &[Vec<f32>]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    let frames = channels.first().map_or(0, Vec::len);
    for i in 0..frames {
        for ch in channels {
            writer.write_sample(ch[i])?;
        }
    }
    writer.finalize().with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

fn cmd_render(input: &Path, output: &Path, block_size: usize, params: &AmpParams) -> Result<()> {
    let (spec, mut channels) = read_wav(input)?;
    let frames = channels[0].len();
    info!(
        "rendering {} ({} ch, {} Hz, {frames} frames) in blocks of {block_size}",
        input.display(),
        channels.len(),
        spec.sample_rate
    );

    let mut driver = AmpDriver::new();
    driver.prepare(spec.sample_rate as f64, block_size);

    let mut start = 0;
    while start < frames {
        let end = (start + block_size).min(frames);
        let mut block: Vec<&mut [f32]> =
            channels.iter_mut().map(|ch| &mut ch[start..end]).collect();
        driver.process(&mut block, params);
        start = end;
    }

    let peak = channels
        .iter()
        .flatten()
        .fold(0.0f32, |m, s| m.max(s.abs()));
    write_wav(output, spec.sample_rate, &channels)?;
    info!("wrote {} (peak {peak:.4})", output.display());
    Ok(())
}

// ─── Impulse response ───────────────────────────────────────────────────────

fn cmd_impulse(length: usize, sample_rate: f64, csv: Option<&Path>, params: &AmpParams) -> Result<()> {
    let mut driver = AmpDriver::new();
    driver.prepare(sample_rate, length);

    let mut response = vec![0.0f32; length];
    response[0] = 1.0;
    driver.process(&mut [&mut response[..]], params);

    let peak = response.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let energy: f64 = response.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let tail = response
        .iter()
        .rposition(|s| s.abs() > TAIL_THRESHOLD)
        .map_or(0, |i| i + 1);

    println!("Impulse response ({length} samples @ {sample_rate:.0} Hz)");
    println!("  Peak:     {peak:.4}");
    println!("  Energy:   {energy:.6}");
    println!(
        "  Tail:     {tail} samples ({:.2} ms above -120 dB)",
        tail as f64 / sample_rate * 1000.0
    );

    if let Some(path) = csv {
        let mut file =
            fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        writeln!(file, "sample,value")?;
        for (i, s) in response.iter().enumerate() {
            writeln!(file, "{i},{s}")?;
        }
        info!("wrote {}", path.display());
    }
    Ok(())
}

// ─── Tone-stack sweep ───────────────────────────────────────────────────────

/// Steady-state gain of the tone stack at one frequency.
fn measure_tone_gain(stack: &mut ToneStack, freq: f64) -> f64 {
    let sr = stack.sample_rate();
    stack.reset();

    let n_settle = (sr * 0.2) as usize;
    let n_measure = (sr * 0.1) as usize;
    let mut block: Vec<f64> = (0..n_settle + n_measure)
        .map(|i| (2.0 * PI * freq * i as f64 / sr).sin())
        .collect();
    stack.process_block(&mut block);

    block[n_settle..].iter().fold(0.0f64, |m, s| m.max(s.abs()))
}

fn cmd_sweep(
    start: f64,
    end: f64,
    points: usize,
    sample_rate: f64,
    csv: Option<&Path>,
    params: &AmpParams,
) -> Result<()> {
    if !(start > 0.0 && end > start) {
        bail!("sweep needs 0 < start < end, got {start}..{end}");
    }

    let mut stack = ToneStack::new(sample_rate);
    stack.update(&ToneSettings {
        bass: params.bass as f64,
        mid: params.mid as f64,
        treble: params.treble as f64,
        presence: params.presence as f64,
    });

    let ratio = (end / start).powf(1.0 / (points - 1) as f64);
    let results: Vec<(f64, f64)> = (0..points)
        .map(|i| start * ratio.powi(i as i32))
        .filter(|&f| f < sample_rate / 2.0)
        .map(|f| (f, 20.0 * measure_tone_gain(&mut stack, f).log10()))
        .collect();

    println!(
        "Tone stack response (bass {:.2}, mid {:.2}, treble {:.2}, presence {:.2})",
        params.bass, params.mid, params.treble, params.presence
    );
    println!("{:>10}  {:>8}", "Freq (Hz)", "Gain dB");
    for &(f, db) in &results {
        println!("{f:>10.1}  {db:>8.2}");
    }

    if let Some(path) = csv {
        let mut file =
            fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        writeln!(file, "freq_hz,gain_db")?;
        for (f, db) in &results {
            writeln!(file, "{f:.3},{db:.4}")?;
        }
        info!("wrote {}", path.display());
    }
    Ok(())
}
