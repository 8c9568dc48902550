//! Content-aware lossy image compression.
//!
//! An image is recursively cut in two, always where the hue entropy of the
//! two halves is lowest, until regions are near-uniform. Subtrees whose
//! area is mostly close to their average color are then collapsed, and
//! the remaining regions are painted with their average colors.

pub mod color;
pub mod compress;
pub mod node;
pub mod quality;
pub mod raster;
pub mod stats;

pub use color::Hsla;
pub use compress::{
	build_tree, compress, compress_file, compress_file_with, compress_series, compress_series_with,
	compress_tree, compress_with_config, compress_with_options, Compression,
};
pub use node::error::{CompressError, RasterError};
pub use node::prune::PruneConfig;
pub use node::{BuildOptions, PartitionTree, RegionNode, Split, SplitSearch};
pub use quality::{Quality, QualityLevel};
pub use raster::HslaImage;
pub use stats::{Rect, RegionStats};
