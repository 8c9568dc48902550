use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, debug_span};

use crate::node::error::CompressError;
use crate::node::prune::PruneConfig;
use crate::node::{BuildOptions, PartitionTree};
use crate::quality::{Quality, QualityLevel};
use crate::raster::HslaImage;
use crate::stats::RegionStats;

/// Everything produced by one compression run.
#[derive(Clone, Debug)]
pub struct Compression {
	/// The region-averaged approximation of the input.
	pub image: HslaImage,
	/// Regions per original pixel, in `(0, 1]`. Lower means more
	/// compression.
	pub ratio: f64,
	pub original_pixels: u64,
	/// Number of solid-color regions (tree leaves) in the output.
	pub regions: usize,
	pub elapsed: Duration,
}

/// Compresses `image` at the given quality, either a score in `[0, 1]`
/// or a [`QualityLevel`].
pub fn compress<Q: Into<Quality>>(image: &HslaImage, quality: Q) -> Compression {
	compress_with_config(image, quality.into().config())
}

/// Compresses `image` with explicit pruning thresholds.
pub fn compress_with_config(image: &HslaImage, config: PruneConfig) -> Compression {
	compress_with_options(image, config, &BuildOptions::default())
}

/// Compresses `image` with explicit pruning thresholds and tree build
/// options.
pub fn compress_with_options(image: &HslaImage, config: PruneConfig, options: &BuildOptions) -> Compression {
	let _span = debug_span!("compress", width = image.width(), height = image.height()).entered();
	let start = Instant::now();
	let mut tree = build_tree(image, options);
	tree.prune(&config);
	finish(&tree, start)
}

/// Builds the unpruned partition tree for `image`.
///
/// The statistics tables only live for the duration of this call.
pub fn build_tree(image: &HslaImage, options: &BuildOptions) -> PartitionTree {
	let stats = RegionStats::new(image);
	PartitionTree::build_with(&stats, options)
}

/// Prunes an independent copy of `tree` and renders it; `tree` itself is
/// left untouched.
pub fn compress_tree(tree: &PartitionTree, config: PruneConfig) -> Compression {
	let start = Instant::now();
	let mut copy = tree.clone();
	copy.prune(&config);
	finish(&copy, start)
}

/// Compresses `image` at every [`QualityLevel`], best first, reusing a
/// single tree build.
///
/// Each result's `elapsed` includes the shared build time.
pub fn compress_series(image: &HslaImage) -> Vec<(QualityLevel, Compression)> {
	compress_series_with(image, &BuildOptions::default())
}

/// [`compress_series`] with explicit tree build options.
pub fn compress_series_with(image: &HslaImage, options: &BuildOptions) -> Vec<(QualityLevel, Compression)> {
	let _span = debug_span!("compress_series", width = image.width(), height = image.height()).entered();
	let start = Instant::now();
	let tree = build_tree(image, options);
	let build_time = start.elapsed();
	QualityLevel::ALL.iter()
		.map(|&level| {
			let mut result = compress_tree(&tree, level.config());
			result.elapsed += build_time;
			(level, result)
		})
		.collect()
}

/// Loads an image file, compresses it and saves the result to `output`.
pub fn compress_file<P, Q, R>(input: P, output: Q, quality: R) -> Result<Compression, CompressError>
where
	P: AsRef<Path>,
	Q: AsRef<Path>,
	R: Into<Quality>,
{
	compress_file_with(input, output, quality, &BuildOptions::default())
}

/// [`compress_file`] with explicit tree build options.
pub fn compress_file_with<P, Q, R>(
	input: P,
	output: Q,
	quality: R,
	options: &BuildOptions,
) -> Result<Compression, CompressError>
where
	P: AsRef<Path>,
	Q: AsRef<Path>,
	R: Into<Quality>,
{
	let image = HslaImage::open(input)?;
	let result = compress_with_options(&image, quality.into().config(), options);
	result.image.save(output)?;
	Ok(result)
}

fn finish(tree: &PartitionTree, start: Instant) -> Compression {
	let image = tree.render();
	let regions = tree.leaf_count();
	let result = Compression {
		image,
		ratio: tree.compression_ratio(),
		original_pixels: tree.pixel_count(),
		regions,
		elapsed: start.elapsed(),
	};
	debug!(regions, ratio = result.ratio, elapsed = ?result.elapsed, "compressed image");
	result
}
