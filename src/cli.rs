use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inktrace", about = "Audio-reactive generative ink trail renderer")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output image of the finished canvas
    #[arg(short, long, default_value = "trail.png")]
    pub output: PathBuf,

    /// Motion variant: free-roam, drift, grid
    #[arg(short, long, default_value = "drift")]
    pub variant: String,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 960)]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 640)]
    pub height: u32,

    /// Simulation frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Spectrum resolution profile: small (256 bins) or full (512 bins)
    #[arg(long, default_value = "full")]
    pub resolution: String,

    /// Temporal smoothing of the spectrum (0.0-1.0)
    #[arg(long, default_value_t = 0.8)]
    pub smoothing: f32,

    /// RNG seed. Omit for a different drawing every run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Render only the first N seconds of the track
    #[arg(long)]
    pub limit: Option<f32>,

    /// Write per-frame band energies to a JSON file
    #[arg(long)]
    pub band_trace: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
