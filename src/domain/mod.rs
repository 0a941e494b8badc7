//! Data flowing through the pipeline: image, regions, strips, lattices and
//! the final transcript.

pub mod image;
pub mod lattice;
pub mod region;
pub mod transcript;
pub mod vocabulary;

pub use self::image::Image;
pub use lattice::{Lattice, LatticeEncoding, LatticeLayout};
pub use region::{DetectedRegion, RectifiedStrip, RegionId};
pub use transcript::{RegionFailure, Transcript, TranscriptEntry, TranscriptStatus};
pub use vocabulary::Vocabulary;
