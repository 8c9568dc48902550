use bitvec::order::Lsb0;
use bitvec::vec::BitVec;

use crate::raster::HslaImage;

impl super::RegionNode {
	/// Paints every leaf below this node into `img` as a solid rectangle
	/// of its color. Branch colors are never drawn.
	pub fn render_into(&self, img: &mut HslaImage) {
		match self.sections {
			Some(ref sects) => sects.iter().for_each(|s| s.render_into(img)),
			None => img.fill_rect(&self.region, self.color),
		}
	}
}

impl super::PartitionTree {
	/// Generates a new image of the tree's dimensions from its leaves.
	///
	/// Since the leaves partition the image, every pixel is written exactly
	/// once.
	pub fn render(&self) -> HslaImage {
		let mut img = HslaImage::blank(self.width, self.height);
		self.root.render_into(&mut img);
		img
	}

	/// [`render`](Self::render), converted to 8-bit RGBA.
	pub fn render_rgba(&self) -> image::RgbaImage {
		self.render().to_rgba()
	}

	/// Checks that the leaves cover every pixel of the image exactly once.
	pub fn covers_exactly(&self) -> bool {
		let width = self.width as usize;
		let mut seen: BitVec<usize, Lsb0> = BitVec::repeat(false, self.pixel_count() as usize);
		for leaf in self.leaves() {
			let r = leaf.region;
			if r.x0 > r.x1 || r.y0 > r.y1 || r.x1 >= self.width || r.y1 >= self.height {
				return false;
			}
			for y in r.y0..=r.y1 {
				for x in r.x0..=r.x1 {
					let i = y as usize * width + x as usize;
					if seen[i] {
						return false;
					}
					seen.set(i, true);
				}
			}
		}
		seen.all()
	}
}

#[cfg(test)]
mod tests {
	use crate::color::Hsla;
	use crate::node::{BuildOptions, PartitionTree, RegionNode};
	use crate::raster::HslaImage;
	use crate::stats::{Rect, RegionStats};

	fn stripes() -> HslaImage {
		HslaImage::from_fn(6, 4, |x, y| Hsla::opaque(((x / 2) * 120) as f64, 1., 0.25 + 0.125 * (y / 2) as f64)).unwrap()
	}

	#[test]
	fn unpruned_full_depth_render_is_lossless() {
		let img = stripes();
		let tree = PartitionTree::build_with(&RegionStats::new(&img), &BuildOptions::full_depth());
		let out = tree.render();
		for (a, b) in img.pixels().iter().zip(out.pixels()) {
			assert!(a.distance(b) < 1e-9, "{:?} vs {:?}", a, b);
		}
	}

	#[test]
	fn render_is_repeatable() {
		let tree = PartitionTree::build(&RegionStats::new(&stripes()));
		assert_eq!(tree.render(), tree.render());
	}

	#[test]
	fn leaves_cover_image() {
		let tree = PartitionTree::build(&RegionStats::new(&stripes()));
		assert!(tree.covers_exactly());
	}

	#[test]
	fn detects_overlap_and_gaps() {
		let img = HslaImage::new(2, 1).unwrap();
		let mut tree = PartitionTree::build_with(&RegionStats::new(&img), &BuildOptions::full_depth());
		assert!(tree.covers_exactly());
		let c = Hsla::default();

		tree.root.sections = Some(Box::new([
			RegionNode::leaf(Rect::new(0, 0, 1, 0), c),
			RegionNode::leaf(Rect::new(1, 0, 1, 0), c),
		]));
		assert!(!tree.covers_exactly());

		tree.root.sections = Some(Box::new([
			RegionNode::leaf(Rect::new(0, 0, 0, 0), c),
			RegionNode::leaf(Rect::new(0, 0, 0, 0), c),
		]));
		assert!(!tree.covers_exactly());

		tree.root.sections = None;
		assert!(tree.covers_exactly());
	}

	#[test]
	fn pruned_leaf_fills_region() {
		let img = stripes();
		let stats = RegionStats::new(&img);
		let mut tree = PartitionTree::build(&stats);
		tree.prune(&crate::node::prune::PruneConfig::new(0., 10.));
		let avg = stats.average_color(&stats.bounds());
		assert!(tree.render().pixels().iter().all(|p| *p == avg));
	}
}
