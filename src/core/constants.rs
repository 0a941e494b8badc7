//! Default values shared across the pipeline.

/// Default limit applied to the detection input side length.
pub const DEFAULT_LIMIT_SIDE_LEN: u32 = 960;

/// Hard upper bound for either side of the detection input.
pub const DEFAULT_MAX_SIDE_LIMIT: u32 = 4000;

/// Detection inputs are rounded to a multiple of this stride.
pub const DETECTION_STRIDE: u32 = 32;

/// Default height of rectified text strips.
pub const DEFAULT_STRIP_HEIGHT: u32 = 48;

/// Default maximum width of rectified text strips.
pub const DEFAULT_MAX_STRIP_WIDTH: u32 = 800;

/// Default region-level confidence threshold.
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.6;

/// Default pixel-level threshold used to binarize the detection heatmap.
pub const DEFAULT_BINARIZATION_THRESHOLD: f32 = 0.3;

/// Default IoU above which overlapping regions are suppressed.
pub const DEFAULT_NMS_OVERLAP_THRESHOLD: f32 = 0.5;

/// Default polygon expansion ratio.
pub const DEFAULT_UNCLIP_RATIO: f32 = 1.5;

/// Default number of contours considered per image.
pub const DEFAULT_MAX_CANDIDATES: usize = 1000;

/// Default minimum short side of a candidate region, in heatmap pixels.
pub const DEFAULT_MIN_REGION_SIZE: f32 = 3.0;

/// Default number of beams kept by the beam decoder.
pub const DEFAULT_BEAM_WIDTH: usize = 8;

/// Default per-region time budget.
pub const DEFAULT_PER_REGION_TIMEOUT_MS: u64 = 10_000;

/// Default row-grouping tolerance, as a fraction of the row height.
pub const DEFAULT_LINE_HEIGHT_TOLERANCE: f32 = 0.5;

/// Rows of a lattice must sum to one within this tolerance.
pub const LATTICE_ROW_SUM_TOLERANCE: f32 = 1e-3;

/// Regions taller than this multiple of their width are read as vertical text.
pub const VERTICAL_TEXT_ASPECT: f32 = 1.5;

/// Polygons with a smaller area (in pixels squared) are degenerate.
pub const MIN_POLYGON_AREA: f32 = 1.0;

/// Regions above this pixel count are scored with rayon.
pub const PARALLEL_SCORE_AREA: usize = 8_000;

/// Latin alphabet of the ocrs recognition models, in label order (label 0 is the CTC blank).
pub const DEFAULT_ALPHABET: &str = " 0123456789!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~€ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
