use std::path::PathBuf;

pub const CAMERA_FOV_Y_DEG: f32 = 70.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1500.0;
pub const CAMERA_DISTANCE: f32 = 1500.0;
/// Used when no valid aspect has been observed yet (first resize had zero height).
pub const FALLBACK_ASPECT: f32 = 1.0;

pub const GRID_RATIO: f32 = 1.745;
pub const GRID_WIDTH: f32 = 480.0 * GRID_RATIO;
pub const GRID_HEIGHT: f32 = 820.0 * GRID_RATIO;
pub const GRID_SEGMENTS_X: u32 = 480;
pub const GRID_SEGMENTS_Y: u32 = 820;

pub const BLOOM_THRESHOLD: f32 = 0.0;
pub const BLOOM_STRENGTH: f32 = 0.0;
pub const BLOOM_RADIUS: f32 = 0.0;
/// Bloom targets are rendered at 1/N of the output size.
pub const BLOOM_DOWNSAMPLE: u32 = 2;

// Transition timeline, in seconds of transition-local time.
pub const TRANSITION_MIDPOINT: f32 = 2.0;
pub const TRANSITION_DURATION: f32 = 4.0;
pub const DISTORTION_PEAK: f32 = 5.0;
pub const BLOOM_STRENGTH_PEAK: f32 = 20.0;
pub const PROGRESS_START: f32 = 1.5;
pub const PROGRESS_DURATION: f32 = 1.0;

pub const TEXTURE_POOL_SIZE: usize = 6;
pub const INITIAL_SELECTOR_INDEX: usize = 1;

pub const DEFAULT_TEXTURES: [&str; TEXTURE_POOL_SIZE] = [
    "img/video-01-first.jpg",
    "img/video-01-end.jpg",
    "img/video-02-first.jpg",
    "img/video-02-end.jpg",
    "img/video-03-first.jpg",
    "img/video-03-end.jpg",
];

pub const DEFAULT_CLIPS: [&str; 3] = [
    "media/video-01.mp4",
    "media/video-02.mp4",
    "media/video-03.mp4",
];

pub const DEFAULT_CLIP_SECONDS: f32 = 8.0;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Ordered (first-frame, end-frame) pairs, one pair per clip.
    pub textures: Vec<PathBuf>,
    pub initial_index: usize,
    pub clear_color: wgpu::Color,
    pub clips: Vec<String>,
    pub clip_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            textures: DEFAULT_TEXTURES.iter().map(PathBuf::from).collect(),
            initial_index: INITIAL_SELECTOR_INDEX,
            clear_color: wgpu::Color::BLACK,
            clips: DEFAULT_CLIPS.iter().map(|c| c.to_string()).collect(),
            clip_seconds: DEFAULT_CLIP_SECONDS,
        }
    }
}

impl EngineConfig {
    /// Resolves the default texture names against `dir`.
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.textures = DEFAULT_TEXTURES.iter().map(|t| dir.join(t)).collect();
        self
    }

    pub fn with_initial_index(mut self, index: usize) -> Self {
        self.initial_index = index;
        self
    }

    pub fn with_clip_seconds(mut self, seconds: f32) -> Self {
        self.clip_seconds = seconds.max(0.1);
        self
    }
}
