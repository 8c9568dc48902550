use std::path::Path;

use crate::color::Hsla;
use crate::node::error::RasterError;
use crate::stats::Rect;

/// A fixed-size grid of HSLA samples, stored row-major.
///
/// Both dimensions are always nonzero; constructors reject anything else.
#[derive(Clone, Debug, PartialEq)]
pub struct HslaImage {
	width: u32,
	height: u32,
	pixels: Vec<Hsla>,
}

fn check_dimensions(width: u32, height: u32) -> Result<(), RasterError> {
	if width == 0 || height == 0 {
		return Err(RasterError::ZeroDimension { width, height });
	}
	Ok(())
}

impl HslaImage {
	/// Creates an image filled with opaque white.
	pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
		Self::from_pixel(width, height, Hsla::default())
	}

	/// Creates an image filled with `color`.
	pub fn from_pixel(width: u32, height: u32, color: Hsla) -> Result<Self, RasterError> {
		check_dimensions(width, height)?;
		Ok(HslaImage {
			width,
			height,
			pixels: vec![color; width as usize * height as usize],
		})
	}

	/// Creates an image by calling `f(x, y)` for every pixel.
	pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, RasterError>
	where
		F: FnMut(u32, u32) -> Hsla,
	{
		check_dimensions(width, height)?;
		let pixels = (0..height)
			.flat_map(|y| (0..width).map(move |x| (x, y)))
			.map(|(x, y)| f(x, y))
			.collect();
		Ok(HslaImage { width, height, pixels })
	}

	/// Wraps a row-major pixel vector.
	pub fn from_pixels(width: u32, height: u32, pixels: Vec<Hsla>) -> Result<Self, RasterError> {
		check_dimensions(width, height)?;
		let expected = width as usize * height as usize;
		if pixels.len() != expected {
			return Err(RasterError::PixelCountMismatch { expected, actual: pixels.len() });
		}
		Ok(HslaImage { width, height, pixels })
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn dimensions(&self) -> (u32, u32) {
		(self.width, self.height)
	}

	pub fn pixel_count(&self) -> u64 {
		self.width as u64 * self.height as u64
	}

	/// All samples, row-major.
	pub fn pixels(&self) -> &[Hsla] {
		&self.pixels
	}

	fn index(&self, x: u32, y: u32) -> Option<usize> {
		if x < self.width && y < self.height {
			Some(y as usize * self.width as usize + x as usize)
		} else {
			None
		}
	}

	/// The sample at `(x, y)`, or `None` if out of bounds.
	pub fn get(&self, x: u32, y: u32) -> Option<Hsla> {
		self.index(x, y).map(|i| self.pixels[i])
	}

	/// The sample at `(x, y)`.
	///
	/// Panics if the coordinates are out of bounds; use [`get`](Self::get)
	/// when that is not already guaranteed.
	pub fn pixel(&self, x: u32, y: u32) -> Hsla {
		match self.get(x, y) {
			Some(p) => p,
			None => panic!("pixel ({}, {}) outside {}x{} image", x, y, self.width, self.height),
		}
	}

	/// Writes the sample at `(x, y)`; returns `false` if out of bounds.
	pub fn put(&mut self, x: u32, y: u32, color: Hsla) -> bool {
		match self.index(x, y) {
			Some(i) => {
				self.pixels[i] = color;
				true
			}
			None => false,
		}
	}

	/// Opaque white image for dimensions already known to be nonzero.
	pub(crate) fn blank(width: u32, height: u32) -> Self {
		debug_assert!(width > 0 && height > 0);
		HslaImage {
			width,
			height,
			pixels: vec![Hsla::default(); width as usize * height as usize],
		}
	}

	/// Sets every pixel of `rect` that lies inside the image to `color`.
	pub fn fill_rect(&mut self, rect: &Rect, color: Hsla) {
		if rect.x0 >= self.width || rect.y0 >= self.height {
			return;
		}
		let x1 = rect.x1.min(self.width - 1) as usize;
		let y1 = rect.y1.min(self.height - 1);
		let row_len = self.width as usize;
		for y in rect.y0..=y1 {
			let row = y as usize * row_len;
			self.pixels[row + rect.x0 as usize..=row + x1].fill(color);
		}
	}

	/// Converts an 8-bit RGBA buffer.
	pub fn from_rgba(img: &image::RgbaImage) -> Result<Self, RasterError> {
		check_dimensions(img.width(), img.height())?;
		let pixels = img.pixels().map(|p| Hsla::from_rgba(*p)).collect();
		Ok(HslaImage { width: img.width(), height: img.height(), pixels })
	}

	/// Converts to an 8-bit RGBA buffer.
	pub fn to_rgba(&self) -> image::RgbaImage {
		image::RgbaImage::from_fn(self.width, self.height, |x, y| self.pixel(x, y).to_rgba())
	}

	/// Decodes an image file (PNG, or anything else `image` was built with).
	pub fn open<Q: AsRef<Path>>(path: Q) -> Result<Self, crate::CompressError> {
		let decoded = image::open(path)?.into_rgba8();
		Ok(Self::from_rgba(&decoded)?)
	}

	/// Encodes to an image file; the format follows the extension.
	pub fn save<Q: AsRef<Path>>(&self, path: Q) -> Result<(), crate::CompressError> {
		self.to_rgba().save(path)?;
		Ok(())
	}
}
