//! Summed-area tables over an [`HslaImage`], answering average color,
//! area and hue entropy queries for any rectangle without rescanning pixels.

use crate::color::{normalize_degrees, Hsla};
use crate::raster::HslaImage;

/// Number of hue histogram bins; each covers 10 degrees.
pub const HUE_BINS: usize = 36;

/// Width of one hue bin in degrees.
const BIN_DEGREES: f64 = 360. / HUE_BINS as f64;

/// Histogram of hue bin counts for one rectangle.
pub type HueHistogram = [u32; HUE_BINS];

/// Inclusive pixel bounds `(x0, y0)`-`(x1, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
	pub x0: u32,
	pub y0: u32,
	pub x1: u32,
	pub y1: u32,
}

impl Rect {
	pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
		Rect { x0, y0, x1, y1 }
	}

	/// The rectangle covering a whole `width` by `height` image.
	///
	/// Both dimensions must be nonzero.
	pub fn covering(width: u32, height: u32) -> Self {
		debug_assert!(width > 0 && height > 0);
		Rect::new(0, 0, width - 1, height - 1)
	}

	pub fn width(&self) -> u32 {
		self.x1 - self.x0 + 1
	}

	pub fn height(&self) -> u32 {
		self.y1 - self.y0 + 1
	}

	/// Number of pixels covered.
	pub fn area(&self) -> u64 {
		self.width() as u64 * self.height() as u64
	}

	pub fn is_pixel(&self) -> bool {
		self.x0 == self.x1 && self.y0 == self.y1
	}

	/// Splits into the rows `y0..=row` and `row + 1..=y1`.
	pub fn split_rows(&self, row: u32) -> (Rect, Rect) {
		debug_assert!(row >= self.y0 && row < self.y1);
		(
			Rect::new(self.x0, self.y0, self.x1, row),
			Rect::new(self.x0, row + 1, self.x1, self.y1),
		)
	}

	/// Splits into the columns `x0..=col` and `col + 1..=x1`.
	pub fn split_cols(&self, col: u32) -> (Rect, Rect) {
		debug_assert!(col >= self.x0 && col < self.x1);
		(
			Rect::new(self.x0, self.y0, col, self.y1),
			Rect::new(col + 1, self.y0, self.x1, self.y1),
		)
	}

	pub fn contains(&self, x: u32, y: u32) -> bool {
		(self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
	}
}

/// Which of the four inclusion-exclusion shapes a rectangle query takes.
///
/// Keeping these separate avoids ever looking up the (nonexistent) row or
/// column at index -1.
enum Corner {
	Origin,
	LeftEdge,
	TopEdge,
	Interior,
}

impl Corner {
	fn of(rect: &Rect) -> Corner {
		match (rect.x0 == 0, rect.y0 == 0) {
			(true, true) => Corner::Origin,
			(true, false) => Corner::LeftEdge,
			(false, true) => Corner::TopEdge,
			(false, false) => Corner::Interior,
		}
	}
}

/// Per-pixel prefix sums built once per image.
///
/// Cell `(x, y)` of each table holds the sum over the rectangle
/// `(0, 0)`-`(x, y)`.
#[derive(Clone, Debug)]
pub struct RegionStats {
	width: u32,
	height: u32,
	hue_x: Vec<f64>,
	hue_y: Vec<f64>,
	saturation: Vec<f64>,
	luminance: Vec<f64>,
	/// `width * height * HUE_BINS` cumulative bin counts.
	hue_hist: Vec<u32>,
	/// Cumulative counts of pixels whose color differs from the pixel to
	/// their left.
	edges_x: Vec<u32>,
	/// Same, for the pixel above.
	edges_y: Vec<u32>,
}

/// Whether two samples render identically. Hue only matters through the
/// saturation-scaled hue vector, so all grays compare equal in hue.
fn same_color(a: &Hsla, b: &Hsla) -> bool {
	a.hue_vector() == b.hue_vector() && a.saturation == b.saturation && a.luminance == b.luminance
}

/// Hue histogram bin for a hue in degrees, clamped to the last bin.
pub fn hue_bin(hue: f64) -> usize {
	if hue <= 0. || hue.is_nan() {
		return 0;
	}
	((hue / BIN_DEGREES) as usize).min(HUE_BINS - 1)
}

/// Shannon entropy in bits of a histogram whose counts sum to `area`.
pub fn entropy_of(hist: &HueHistogram, area: u64) -> f64 {
	if area == 0 {
		return 0.;
	}
	let area = area as f64;
	hist.iter()
		.filter(|&&count| count > 0)
		.map(|&count| {
			let p = count as f64 / area;
			-p * p.log2()
		})
		.sum()
}

impl RegionStats {
	/// Builds the tables in a single pass over `image`, each cell derived
	/// from its already computed left, top and top-left neighbours.
	pub fn new(image: &HslaImage) -> Self {
		let (width, height) = image.dimensions();
		let cells = width as usize * height as usize;
		let mut stats = RegionStats {
			width,
			height,
			hue_x: vec![0.; cells],
			hue_y: vec![0.; cells],
			saturation: vec![0.; cells],
			luminance: vec![0.; cells],
			hue_hist: vec![0; cells * HUE_BINS],
			edges_x: vec![0; cells],
			edges_y: vec![0; cells],
		};

		for y in 0..height {
			for x in 0..width {
				let pixel = image.pixel(x, y);
				let (hx, hy) = pixel.hue_vector();
				let here = stats.index(x, y);
				let mut sums = [hx, hy, pixel.saturation, pixel.luminance];

				// Neighbours added (left, top) and subtracted (top-left)
				let left = if x > 0 { Some(stats.index(x - 1, y)) } else { None };
				let top = if y > 0 { Some(stats.index(x, y - 1)) } else { None };
				let diag = if x > 0 && y > 0 { Some(stats.index(x - 1, y - 1)) } else { None };

				for (sum, table) in sums.iter_mut().zip(stats.scalar_tables().iter()) {
					let at = |cell: Option<usize>| cell.map_or(0., |i| table[i]);
					*sum += at(left) + at(top) - at(diag);
				}
				stats.hue_x[here] = sums[0];
				stats.hue_y[here] = sums[1];
				stats.saturation[here] = sums[2];
				stats.luminance[here] = sums[3];

				let base = here * HUE_BINS;
				for bin in 0..HUE_BINS {
					let at = |cell: Option<usize>| cell.map_or(0, |i| stats.hue_hist[i * HUE_BINS + bin]);
					let count = at(left) + at(top) - at(diag);
					stats.hue_hist[base + bin] = count;
				}
				stats.hue_hist[base + hue_bin(pixel.hue)] += 1;

				let step_x = x > 0 && !same_color(&pixel, &image.pixel(x - 1, y));
				let step_y = y > 0 && !same_color(&pixel, &image.pixel(x, y - 1));
				let at = |table: &[u32], cell: Option<usize>| cell.map_or(0, |i| table[i]);
				let count_x = at(&stats.edges_x[..], left) + at(&stats.edges_x[..], top) - at(&stats.edges_x[..], diag);
				let count_y = at(&stats.edges_y[..], left) + at(&stats.edges_y[..], top) - at(&stats.edges_y[..], diag);
				stats.edges_x[here] = count_x + step_x as u32;
				stats.edges_y[here] = count_y + step_y as u32;
			}
		}
		stats
	}

	fn scalar_tables(&self) -> [&[f64]; 4] {
		[&self.hue_x, &self.hue_y, &self.saturation, &self.luminance]
	}

	fn index(&self, x: u32, y: u32) -> usize {
		y as usize * self.width as usize + x as usize
	}

	pub fn dimensions(&self) -> (u32, u32) {
		(self.width, self.height)
	}

	/// The rectangle covering the whole image.
	pub fn bounds(&self) -> Rect {
		Rect::covering(self.width, self.height)
	}

	fn in_bounds(&self, rect: &Rect) -> bool {
		rect.x0 <= rect.x1 && rect.y0 <= rect.y1 && rect.x1 < self.width && rect.y1 < self.height
	}

	/// Sum of one scalar table over `rect`.
	fn rect_sum(&self, table: &[f64], rect: &Rect) -> f64 {
		let br = table[self.index(rect.x1, rect.y1)];
		match Corner::of(rect) {
			Corner::Origin => br,
			Corner::LeftEdge => br - table[self.index(rect.x1, rect.y0 - 1)],
			Corner::TopEdge => br - table[self.index(rect.x0 - 1, rect.y1)],
			Corner::Interior => {
				br - table[self.index(rect.x0 - 1, rect.y1)]
					- table[self.index(rect.x1, rect.y0 - 1)]
					+ table[self.index(rect.x0 - 1, rect.y0 - 1)]
			}
		}
	}

	/// Sum of one integer table over `rect`.
	fn rect_count(&self, table: &[u32], rect: &Rect) -> u32 {
		let br = table[self.index(rect.x1, rect.y1)];
		match Corner::of(rect) {
			Corner::Origin => br,
			Corner::LeftEdge => br - table[self.index(rect.x1, rect.y0 - 1)],
			Corner::TopEdge => br - table[self.index(rect.x0 - 1, rect.y1)],
			Corner::Interior => {
				(br + table[self.index(rect.x0 - 1, rect.y0 - 1)])
					- (table[self.index(rect.x0 - 1, rect.y1)] + table[self.index(rect.x1, rect.y0 - 1)])
			}
		}
	}

	/// Whether every pixel in `rect` has the same color.
	///
	/// Counts color changes between horizontally and vertically adjacent
	/// pixels inside `rect`; there are none exactly when it is uniform.
	pub fn is_uniform(&self, rect: &Rect) -> bool {
		debug_assert!(self.in_bounds(rect), "rectangle {:?} outside image", rect);
		let across = rect.x0 == rect.x1
			|| self.rect_count(&self.edges_x, &Rect::new(rect.x0 + 1, rect.y0, rect.x1, rect.y1)) == 0;
		let down = rect.y0 == rect.y1
			|| self.rect_count(&self.edges_y, &Rect::new(rect.x0, rect.y0 + 1, rect.x1, rect.y1)) == 0;
		across && down
	}

	/// Pixel count of `rect`.
	pub fn area(&self, rect: &Rect) -> u64 {
		debug_assert!(self.in_bounds(rect), "rectangle {:?} outside image", rect);
		rect.area()
	}

	/// Area-weighted mean color of `rect`.
	///
	/// Hue is the circular mean of the saturation-scaled hue vectors;
	/// saturation and luminance are arithmetic means. The result is always
	/// fully opaque.
	pub fn average_color(&self, rect: &Rect) -> Hsla {
		debug_assert!(self.in_bounds(rect), "rectangle {:?} outside image", rect);
		let area = rect.area() as f64;
		let hue_x = self.rect_sum(&self.hue_x, rect) / area;
		let hue_y = self.rect_sum(&self.hue_y, rect) / area;
		let saturation = self.rect_sum(&self.saturation, rect) / area;
		let luminance = self.rect_sum(&self.luminance, rect) / area;
		let hue = normalize_degrees(hue_y.atan2(hue_x).to_degrees());
		Hsla::opaque(hue, saturation, luminance)
	}

	/// Fills `hist` with the hue bin counts of `rect`.
	pub fn hue_histogram_into(&self, rect: &Rect, hist: &mut HueHistogram) {
		debug_assert!(self.in_bounds(rect), "rectangle {:?} outside image", rect);
		let cell = |x: u32, y: u32| self.index(x, y) * HUE_BINS;
		let br = cell(rect.x1, rect.y1);
		let corner = Corner::of(rect);
		for (bin, count) in hist.iter_mut().enumerate() {
			let at = |base: usize| self.hue_hist[base + bin];
			*count = match corner {
				Corner::Origin => at(br),
				Corner::LeftEdge => at(br) - at(cell(rect.x1, rect.y0 - 1)),
				Corner::TopEdge => at(br) - at(cell(rect.x0 - 1, rect.y1)),
				// Grouped so the intermediate never goes negative
				Corner::Interior => {
					(at(br) + at(cell(rect.x0 - 1, rect.y0 - 1)))
						- (at(cell(rect.x0 - 1, rect.y1)) + at(cell(rect.x1, rect.y0 - 1)))
				}
			};
		}
	}

	/// Hue bin counts of `rect`.
	pub fn hue_histogram(&self, rect: &Rect) -> HueHistogram {
		let mut hist = [0; HUE_BINS];
		self.hue_histogram_into(rect, &mut hist);
		hist
	}

	/// Shannon entropy, in bits, of the hue distribution within `rect`.
	///
	/// Always in `[0, log2(HUE_BINS)]`.
	pub fn entropy(&self, rect: &Rect) -> f64 {
		entropy_of(&self.hue_histogram(rect), self.area(rect))
	}
}
