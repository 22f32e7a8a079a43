use std::path::PathBuf;

use clap::Parser;

use bloom_pulse::{EngineConfig, EngineError};

/// Full-window bloom-pulse display synced to a simulated clip loop.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding `img/video-0N-{first,end}.jpg`.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Length of each simulated clip, in seconds.
    #[arg(long, default_value_t = 8.0)]
    clip_seconds: f32,

    /// Starting texture index of the pair selector.
    #[arg(long, default_value_t = 1)]
    start_index: usize,
}

pub fn main() -> Result<(), EngineError> {
    let args = Args::parse();

    let mut config = EngineConfig::default()
        .with_initial_index(args.start_index)
        .with_clip_seconds(args.clip_seconds);
    if let Some(dir) = args.assets {
        config = config.with_asset_dir(dir);
    }
    bloom_pulse::run_with(config)
}
