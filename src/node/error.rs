use thiserror::Error;

/// Reason why an image buffer couldn't be created.
#[derive(Debug, Error)]
pub enum RasterError {
	/// Width or height is zero; there is nothing to partition.
	#[error("image dimensions cannot be zero (got {width}x{height})")]
	ZeroDimension { width: u32, height: u32 },
	/// A pixel vector of the wrong length was supplied for the dimensions.
	#[error("expected {expected} pixels, got {actual}")]
	PixelCountMismatch { expected: usize, actual: usize },
}

/// Reason why a compression run couldn't be completed.
#[derive(Debug, Error)]
pub enum CompressError {
	/// The input didn't describe a usable image.
	#[error(transparent)]
	Raster(#[from] RasterError),
	/// The image file couldn't be decoded or encoded.
	#[error("image codec error: {0}")]
	Codec(#[from] image::ImageError),
	/// Filesystem trouble outside of the codec.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
