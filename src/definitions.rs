// Frame rate assumed when a video reports a frame rate that is zero, negative or NaN.
pub const DEFAULT_FPS: f64 = 30.0;

// Hash definitions
pub const DEFAULT_HASH_SIZE: u32 = 8;

//The DCT hash is computed over an image this many times larger (per side) than the hash grid.
pub const DCT_OVERSAMPLE: u32 = 4;

//Number of quantization levels (and therefore thermometer bits) per colour channel in
//the colour-moment block of the MeanColor hash.
pub const COLOR_LEVELS: u32 = 16;
pub const COLOR_CHANNELS: u32 = 3;

// Loop detection definitions
//Frames wider than this are downscaled (preserving aspect ratio) before SSIM comparison.
pub const LOOP_MAX_GRAY_WIDTH: u32 = 480;

//Side of the square windows that structural similarity is averaged over. Smaller images cannot be compared.
pub const SSIM_WINDOW: u32 = 8;

//Progress callbacks fire at most once per this many iterations.
pub const PROGRESS_EVERY_N_FRAMES: u64 = 10;

/// The default tolerance when searching for similar frame pairs. A pair matches when its
/// similarity is greater than `1 - tolerance`.
///
/// Reccomended range: 0.05-0.30.
pub const DEFAULT_SIMILAR_THRESHOLD: f64 = 0.15;
pub const MIN_SIMILAR_THRESHOLD: f64 = 0.05;
pub const MAX_SIMILAR_THRESHOLD: f64 = 0.30;

/// The default sampling stride when searching for similar frame pairs.
pub const DEFAULT_SIMILAR_FRAME_SKIP: u64 = 10;
pub const MAX_SIMILAR_FRAME_SKIP: u64 = 100;

/// The default tolerance when comparing frames against the first frame.
///
/// Reccomended range: 0.05-0.50.
pub const DEFAULT_FIRST_FRAME_THRESHOLD: f64 = 0.20;
pub const MIN_FIRST_FRAME_THRESHOLD: f64 = 0.05;
pub const MAX_FIRST_FRAME_THRESHOLD: f64 = 0.50;

/// The default sampling stride when comparing frames against the first frame.
pub const DEFAULT_FIRST_FRAME_SKIP: u64 = 5;
pub const MAX_FIRST_FRAME_SKIP: u64 = 50;

/// The minimum SSIM score for two frames to be reported as a loop candidate.
///
/// Reccomended range: 0.50-0.99.
pub const DEFAULT_LOOP_SSIM_THRESHOLD: f64 = 0.85;
pub const MIN_LOOP_SSIM_THRESHOLD: f64 = 0.50;
pub const MAX_LOOP_SSIM_THRESHOLD: f64 = 0.99;

/// The default sampling stride for loop detection.
pub const DEFAULT_LOOP_FRAME_SKIP: u64 = 30;
pub const MAX_LOOP_FRAME_SKIP: u64 = 100;

/// How far back (in frames, not samples) loop detection looks for a matching frame.
pub const DEFAULT_LOOP_SEARCH_RANGE: u64 = 300;
pub const MIN_LOOP_SEARCH_RANGE: u64 = 10;
pub const MAX_LOOP_SEARCH_RANGE: u64 = 1000;

/// The maximum number of downsampled frames held by loop detection at any time.
pub const DEFAULT_LOOP_CACHE_CAPACITY: usize = 50;
pub const MAX_LOOP_CACHE_CAPACITY: usize = 10_000;

//An ffmpeg process that produces no frame for this long is assumed to have stalled.
pub const FRAME_READ_TIMEOUT_SECS: u64 = 30;

//A forward read by index further than this many frames ahead of the open decoder seeks instead
//of decoding every frame in between.
pub const MAX_FORWARD_DECODE_FRAMES: u64 = 250;
