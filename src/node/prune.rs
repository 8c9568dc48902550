use tracing::debug;

use crate::color::Hsla;

/// Thresholds deciding when a subtree collapses into one region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PruneConfig {
	/// Fraction of a subtree's area, in `(0, 1]`, that must be close to
	/// the subtree's average color for it to collapse.
	pub min_similarity: f64,
	/// Largest [`Hsla::distance`] at which a leaf still counts as close.
	pub tolerance: f64,
}

impl PruneConfig {
	pub const fn new(min_similarity: f64, tolerance: f64) -> Self {
		PruneConfig { min_similarity, tolerance }
	}

	/// Never collapses anything that isn't an exact color match.
	pub const fn lossless() -> Self {
		PruneConfig::new(1., 0.)
	}
}

impl Default for PruneConfig {
	fn default() -> Self {
		PruneConfig::new(0.95, 0.1)
	}
}

impl super::RegionNode {
	/// Collapses subtrees bottom-up.
	///
	/// Subnodes are pruned first; then this node becomes a leaf if enough
	/// of its (remaining) leaves' area is within `config.tolerance` of its
	/// own average color.
	pub fn prune(&mut self, config: &PruneConfig) {
		match self.sections {
			Some(ref mut sects) => sects.iter_mut().for_each(|s| s.prune(config)),
			None => return,
		}
		if self.similar_fraction(&self.color, config.tolerance) >= config.min_similarity {
			self.sections = None;
		}
	}

	/// Pixel area of the leaves below this node whose color is within
	/// `tolerance` of `reference`.
	pub fn similar_area(&self, reference: &Hsla, tolerance: f64) -> u64 {
		self.leaves()
			.filter(|leaf| leaf.color.distance(reference) <= tolerance)
			.map(|leaf| leaf.region.area())
			.sum()
	}

	/// [`similar_area`](Self::similar_area) as a fraction of this node's area.
	pub fn similar_fraction(&self, reference: &Hsla, tolerance: f64) -> f64 {
		self.similar_area(reference, tolerance) as f64 / self.region.area() as f64
	}
}

impl super::PartitionTree {
	/// "Trims" the tree by collapsing subtrees that are close enough to a
	/// single color. See [`RegionNode::prune`](super::RegionNode::prune).
	pub fn prune(&mut self, config: &PruneConfig) {
		let before = self.leaf_count();
		self.root.prune(config);
		debug!(
			min_similarity = config.min_similarity,
			tolerance = config.tolerance,
			before,
			after = self.leaf_count(),
			"pruned partition tree"
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::{BuildOptions, PartitionTree, RegionNode};
	use crate::raster::HslaImage;
	use crate::stats::{Rect, RegionStats};

	fn branch(region: Rect, color: Hsla, first: RegionNode, second: RegionNode) -> RegionNode {
		RegionNode { region, color, sections: Some(Box::new([first, second])) }
	}

	#[test]
	fn leaf_is_untouched() {
		let mut leaf = RegionNode::leaf(Rect::new(0, 0, 1, 1), Hsla::default());
		leaf.prune(&PruneConfig::new(0., 100.));
		assert!(leaf.is_leaf());
	}

	#[test]
	fn collapse_depends_on_similar_area() {
		let gray = Hsla::opaque(0., 0., 0.5);
		let near = Hsla::opaque(0., 0., 0.52);
		let far = Hsla::opaque(0., 0., 0.9);
		// 3 of 4 pixels near the parent color
		let node = branch(
			Rect::new(0, 0, 3, 0),
			gray,
			RegionNode::leaf(Rect::new(0, 0, 2, 0), near),
			RegionNode::leaf(Rect::new(3, 0, 3, 0), far),
		);
		assert_eq!(node.similar_area(&gray, 0.05), 3);

		let mut strict = node.clone();
		strict.prune(&PruneConfig::new(0.8, 0.05));
		assert!(!strict.is_leaf());

		let mut loose = node.clone();
		loose.prune(&PruneConfig::new(0.75, 0.05));
		assert!(loose.is_leaf());
		assert_eq!(loose.color, gray);
	}

	#[test]
	fn children_prune_before_parent() {
		let red = Hsla::opaque(0., 1., 0.5);
		let blue = Hsla::opaque(240., 1., 0.5);
		// Right half is a collapsible pair; the whole is not
		let right = branch(
			Rect::new(2, 0, 3, 0),
			blue,
			RegionNode::leaf(Rect::new(2, 0, 2, 0), blue),
			RegionNode::leaf(Rect::new(3, 0, 3, 0), blue),
		);
		let mut root = branch(
			Rect::new(0, 0, 3, 0),
			Hsla::opaque(300., 1., 0.5),
			RegionNode::leaf(Rect::new(0, 0, 1, 0), red),
			right,
		);
		root.prune(&PruneConfig::new(0.9, 0.01));
		assert_eq!(root.leaf_count(), 2);
		let sects = root.sections.as_ref().unwrap();
		assert!(sects[1].is_leaf());
	}

	#[test]
	fn lossless_keeps_distinct_pixels() {
		let img = HslaImage::from_fn(3, 3, |x, y| Hsla::opaque((x * 100 + y * 30) as f64, 0.8, 0.5)).unwrap();
		let mut tree = PartitionTree::build_with(&RegionStats::new(&img), &BuildOptions::full_depth());
		tree.prune(&PruneConfig::lossless());
		assert_eq!(tree.leaf_count(), 9);
	}

	#[test]
	fn permissive_collapses_everything() {
		let img = HslaImage::from_fn(4, 4, |x, y| Hsla::opaque((x * 90) as f64, 0.5, 0.1 * y as f64)).unwrap();
		let mut tree = PartitionTree::build(&RegionStats::new(&img));
		tree.prune(&PruneConfig::new(0.1, 10.));
		assert_eq!(tree.leaf_count(), 1);
	}
}
