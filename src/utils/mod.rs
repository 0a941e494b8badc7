//! Utility functions for the OCR pipeline.
//!
//! Image loading, perspective warping and logging setup.

pub mod image;
pub mod transform;

pub use self::image::{load_image, load_image_from_memory};
pub use transform::{get_perspective_transform, warp_perspective, warp_quad_to_rect};

/// Initializes the tracing subscriber for logging.
///
/// Installs an environment filter (`RUST_LOG`) and a formatting layer. It's
/// typically called once at the start of an application.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
