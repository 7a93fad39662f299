use clap::Parser;
use std::path::PathBuf;

use lightsync::{BrightnessMapping, ColorMapping};

#[derive(Parser, Debug)]
#[command(name = "lightsync", about = "Generate beat-synchronized lighting timelines from music")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Device list (JSON array of devices)
    #[arg(short, long)]
    pub devices: Option<PathBuf>,

    /// Latency profiles (JSON object keyed by entity id)
    #[arg(short, long)]
    pub profiles: Option<PathBuf>,

    /// Output timeline file
    #[arg(short, long, default_value = "timeline.json")]
    pub output: PathBuf,

    /// Timeline name (defaults to the input file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Config file (defaults to lightsync.toml or the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Lighting intensity (0.0-1.0)
    #[arg(long, default_value_t = 0.8)]
    pub intensity: f32,

    #[arg(long, value_enum, default_value_t = ColorMapping::Frequency)]
    pub color_mapping: ColorMapping,

    #[arg(long, value_enum, default_value_t = BrightnessMapping::Amplitude)]
    pub brightness_mapping: BrightnessMapping,

    /// Disable beat emphasis
    #[arg(long)]
    pub no_beat_sync: bool,

    /// Disable smooth transitions
    #[arg(long)]
    pub no_smooth: bool,

    /// Minimum interval between commands per device, in milliseconds
    #[arg(long, default_value_t = 100.0)]
    pub min_interval: f64,

    /// FFT size (power of two)
    #[arg(long, default_value_t = 2048)]
    pub fft_size: usize,

    /// Hop size in samples
    #[arg(long, default_value_t = 512)]
    pub hop_size: usize,

    /// Run the redundancy optimizer on the generated timeline
    #[arg(long)]
    pub optimize: bool,

    /// Print audio analysis and exit
    #[arg(long)]
    pub analyze_only: bool,
}
