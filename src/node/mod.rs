pub mod error;
pub mod image;
pub mod prune;

use tracing::{debug, trace};

use crate::color::Hsla;
use crate::stats::{Rect, RegionStats};

/// Uniform regions whose hue entropy falls below this are left unsplit by
/// default.
pub const DEFAULT_UNIFORM_ENTROPY: f64 = 0.1;

/// Default cap on split positions tried per axis in sampled mode.
pub const DEFAULT_SAMPLED_CANDIDATES: u32 = 8;

/// How split positions are searched along each axis of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitSearch {
	/// Every row and column boundary is tried. This is the reference
	/// behavior.
	Exhaustive,
	/// Only a handful of positions (quartiles, thirds, the middle, then
	/// evenly spaced steps) are tried on axes with more than
	/// `max_candidates` positions. Much faster on large images, but the
	/// resulting tree differs from the exhaustive one.
	Sampled { max_candidates: u32 },
}

impl Default for SplitSearch {
	fn default() -> Self {
		SplitSearch::Exhaustive
	}
}

impl SplitSearch {
	/// Sampled search with the default candidate cap.
	pub fn sampled() -> Self {
		SplitSearch::Sampled { max_candidates: DEFAULT_SAMPLED_CANDIDATES }
	}

	/// Split positions to try between `start` and `end` (inclusive
	/// coordinates of a region along one axis). Position `p` means the
	/// first part ends at `p` and the second starts at `p + 1`.
	fn candidates(&self, start: u32, end: u32) -> Vec<u32> {
		let span = end - start;
		let max = match *self {
			SplitSearch::Sampled { max_candidates } if span > max_candidates.max(1) => max_candidates.max(1) as usize,
			_ => return (start..end).collect(),
		};

		let at = |num: u64, den: u64| start + (span as u64 * num / den) as u32;
		let mut picks = Vec::with_capacity(max);
		let fractions = [at(1, 4), at(1, 3), at(1, 2), at(2, 3), at(3, 4)];
		let step = (span / 10).max(1) as usize;
		let stepped = (start..end).skip(step).step_by(step);
		for pos in fractions.iter().copied().chain(stepped) {
			if picks.len() == max {
				break;
			}
			if !picks.contains(&pos) {
				picks.push(pos);
			}
		}
		picks
	}
}

/// Settings for building a [`PartitionTree`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildOptions {
	pub split_search: SplitSearch,
	/// Regions with hue entropy below this stay leaves without searching
	/// for a split, as long as all their pixels share one color. Stopping
	/// there never changes the pruned output, only the work done to get it.
	/// `None` splits everything down to single pixels.
	pub uniform_entropy: Option<f64>,
}

impl Default for BuildOptions {
	fn default() -> Self {
		BuildOptions {
			split_search: SplitSearch::Exhaustive,
			uniform_entropy: Some(DEFAULT_UNIFORM_ENTROPY),
		}
	}
}

impl BuildOptions {
	/// Exhaustive search with no early termination: every pixel ends up
	/// as its own leaf.
	pub fn full_depth() -> Self {
		BuildOptions { split_search: SplitSearch::Exhaustive, uniform_entropy: None }
	}
}

/// Where a region is cut in two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
	/// First part is the rows up to and including this one.
	Rows(u32),
	/// First part is the columns up to and including this one.
	Cols(u32),
}

impl Split {
	pub fn apply(&self, region: &Rect) -> (Rect, Rect) {
		match *self {
			Split::Rows(row) => region.split_rows(row),
			Split::Cols(col) => region.split_cols(col),
		}
	}
}

/// Node in a binary space partition of an image.
///
/// May contain two subnodes (branch node) or none (leaf node). The two
/// subnodes exactly partition this node's region.
///
/// It must always contain a color, the average of its whole region taken
/// from the image statistics, so that pruning can turn any branch into a
/// leaf without recomputing anything.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionNode {
	pub region: Rect,
	pub color: Hsla,
	pub sections: Option<Box<[RegionNode; 2]>>,
}

impl RegionNode {
	pub fn leaf(region: Rect, color: Hsla) -> Self {
		RegionNode { region, color, sections: None }
	}

	pub fn is_leaf(&self) -> bool {
		self.sections.is_none()
	}

	pub fn leaf_count(&self) -> usize {
		match self.sections {
			Some(ref sects) => sects.iter().map(RegionNode::leaf_count).sum(),
			None => 1,
		}
	}

	/// Number of levels below and including this node.
	pub fn depth(&self) -> usize {
		match self.sections {
			Some(ref sects) => 1 + sects.iter().map(RegionNode::depth).max().unwrap_or(0),
			None => 1,
		}
	}

	/// Leaves of this subtree, first subnode before second.
	pub fn leaves(&self) -> Leaves<'_> {
		Leaves { stack: vec![self] }
	}

	/// Recursively builds the subtree for `region`.
	fn build(stats: &RegionStats, region: Rect, options: &BuildOptions) -> Self {
		let mut node = RegionNode::leaf(region, stats.average_color(&region));
		if region.is_pixel() {
			return node;
		}
		if let Some(threshold) = options.uniform_entropy {
			// Hue entropy alone can't see saturation or luminance changes
			if stats.is_uniform(&region) && stats.entropy(&region) < threshold {
				return node;
			}
		}
		if let Some(split) = best_split(stats, &region, &options.split_search) {
			let (first, second) = split.apply(&region);
			node.sections = Some(Box::new([
				RegionNode::build(stats, first, options),
				RegionNode::build(stats, second, options),
			]));
		}
		node
	}
}

/// Finds the split of `region` with the lowest area-weighted entropy.
///
/// Row splits are tried before column splits, each in increasing
/// position; on ties the first one found wins. Returns `None` only for a
/// single pixel.
pub fn best_split(stats: &RegionStats, region: &Rect, search: &SplitSearch) -> Option<Split> {
	let total = stats.area(region) as f64;
	let mut best: Option<(f64, Split)> = None;

	let rows = if region.height() > 1 {
		search.candidates(region.y0, region.y1).into_iter().map(Split::Rows).collect()
	} else {
		Vec::new()
	};
	let cols = if region.width() > 1 {
		search.candidates(region.x0, region.x1).into_iter().map(Split::Cols).collect()
	} else {
		Vec::new()
	};

	for split in rows.into_iter().chain(cols) {
		let (first, second) = split.apply(region);
		let score = (stats.entropy(&first) * stats.area(&first) as f64
			+ stats.entropy(&second) * stats.area(&second) as f64)
			/ total;
		if best.map_or(true, |(best_score, _)| score < best_score) {
			best = Some((score, split));
		}
	}

	if let Some((score, split)) = best {
		trace!(?region, ?split, score, "chose split");
	}
	best.map(|(_, split)| split)
}

/// Depth-first iterator over the leaves of a subtree.
pub struct Leaves<'a> {
	stack: Vec<&'a RegionNode>,
}

impl<'a> Iterator for Leaves<'a> {
	type Item = &'a RegionNode;

	fn next(&mut self) -> Option<Self::Item> {
		while let Some(node) = self.stack.pop() {
			match node.sections {
				Some(ref sects) => {
					self.stack.push(&sects[1]);
					self.stack.push(&sects[0]);
				}
				None => return Some(node),
			}
		}
		None
	}
}

/// A partition tree covering a whole image.
///
/// Cloning makes a fully independent deep copy, so one build can be
/// pruned several different ways.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionTree {
	root: RegionNode,
	width: u32,
	height: u32,
}

impl PartitionTree {
	/// Builds a tree with the default [`BuildOptions`].
	pub fn build(stats: &RegionStats) -> Self {
		Self::build_with(stats, &BuildOptions::default())
	}

	/// Recursively splits the image described by `stats` into regions of
	/// near-uniform hue.
	pub fn build_with(stats: &RegionStats, options: &BuildOptions) -> Self {
		let (width, height) = stats.dimensions();
		let root = RegionNode::build(stats, stats.bounds(), options);
		let tree = PartitionTree { root, width, height };
		debug!(width, height, leaves = tree.leaf_count(), depth = tree.depth(), "built partition tree");
		tree
	}

	pub fn root(&self) -> &RegionNode {
		&self.root
	}

	pub fn dimensions(&self) -> (u32, u32) {
		(self.width, self.height)
	}

	pub fn pixel_count(&self) -> u64 {
		self.width as u64 * self.height as u64
	}

	/// Number of regions the image is currently divided into.
	pub fn leaf_count(&self) -> usize {
		self.root.leaf_count()
	}

	pub fn depth(&self) -> usize {
		self.root.depth()
	}

	pub fn leaves(&self) -> Leaves<'_> {
		self.root.leaves()
	}

	/// Leaves per original pixel. Smaller means more compression; 1.0
	/// means every pixel is its own region.
	pub fn compression_ratio(&self) -> f64 {
		self.leaf_count() as f64 / self.pixel_count() as f64
	}
}
