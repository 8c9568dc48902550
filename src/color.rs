use std::sync::OnceLock;

use palette::{FromColor, Hsl, Srgb};

/// `palette` representation used for conversions to and from RGB.
type SrgbHsl = Hsl<palette::encoding::Srgb, f64>;

/// A single color sample in HSLA space.
///
/// `hue` is in degrees, in `[0, 360)`. `saturation`, `luminance` and `alpha`
/// are all in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
	pub hue: f64,
	pub saturation: f64,
	pub luminance: f64,
	pub alpha: f64,
}

impl Default for Hsla {
	/// Opaque white.
	fn default() -> Self {
		Hsla::opaque(0., 0., 1.)
	}
}

impl Hsla {
	pub const fn new(hue: f64, saturation: f64, luminance: f64, alpha: f64) -> Self {
		Hsla { hue, saturation, luminance, alpha }
	}

	pub const fn opaque(hue: f64, saturation: f64, luminance: f64) -> Self {
		Hsla::new(hue, saturation, luminance, 1.)
	}

	/// Perceptual distance between two colors.
	///
	/// The hue difference is taken the short way around the color wheel and
	/// scaled by 180 degrees, then combined with the raw saturation and
	/// luminance differences as a Euclidean norm. Alpha is ignored.
	///
	/// This is the only color comparison used when deciding whether regions
	/// are similar enough to merge.
	pub fn distance(&self, other: &Hsla) -> f64 {
		let mut hue_diff = (self.hue - other.hue).abs() % 360.;
		if hue_diff > 180. {
			hue_diff = 360. - hue_diff;
		}
		let hue_diff = hue_diff / 180.;
		let sat_diff = self.saturation - other.saturation;
		let lum_diff = self.luminance - other.luminance;
		(hue_diff * hue_diff + sat_diff * sat_diff + lum_diff * lum_diff).sqrt()
	}

	/// Hue as a point on the unit circle, scaled by saturation.
	///
	/// Summing these and taking `atan2` of the result gives the circular
	/// mean hue; grays contribute nothing to it.
	pub fn hue_vector(&self) -> (f64, f64) {
		let (cos, sin) = hue_cos_sin(self.hue);
		(self.saturation * cos, self.saturation * sin)
	}

	/// Converts an 8-bit sRGB(A) pixel. Achromatic pixels get hue 0.
	pub fn from_rgba(pixel: image::Rgba<u8>) -> Self {
		let [r, g, b, a] = pixel.0;
		let rgb: Srgb<f64> = Srgb::new(r, g, b).into_format();
		let hsl = SrgbHsl::from_color(rgb);
		let hue = if hsl.saturation > 0. {
			normalize_degrees(hsl.hue.into_positive_degrees())
		} else {
			0.
		};
		Hsla {
			hue,
			saturation: hsl.saturation,
			luminance: hsl.lightness,
			alpha: a as f64 / 255.,
		}
	}

	/// Converts back to an 8-bit sRGB(A) pixel, clamping out-of-range
	/// components.
	pub fn to_rgba(&self) -> image::Rgba<u8> {
		let hsl = SrgbHsl::new(
			normalize_degrees(self.hue),
			self.saturation.clamp(0., 1.),
			self.luminance.clamp(0., 1.),
		);
		let rgb: Srgb<u8> = Srgb::from_color(hsl).into_format();
		image::Rgba([
			rgb.red,
			rgb.green,
			rgb.blue,
			(self.alpha.clamp(0., 1.) * 255.).round() as u8,
		])
	}
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
	let wrapped = degrees.rem_euclid(360.);
	// rem_euclid can round up to exactly 360 for tiny negative inputs
	if wrapped >= 360. { 0. } else { wrapped }
}

static DEGREE_TRIG: OnceLock<[(f64, f64); 360]> = OnceLock::new();

/// Cosine and sine of every whole degree, computed once per process.
fn degree_trig() -> &'static [(f64, f64); 360] {
	DEGREE_TRIG.get_or_init(|| {
		let mut table = [(0., 0.); 360];
		for (deg, entry) in table.iter_mut().enumerate() {
			let rad = (deg as f64).to_radians();
			*entry = (rad.cos(), rad.sin());
		}
		table
	})
}

/// `(cos, sin)` of an angle given in degrees.
///
/// Whole-degree hues (the common case for images decoded from 8-bit
/// sources with pure primaries, and for synthetic images) come from a
/// shared table; anything else is computed directly, so both paths give
/// identical results for the same input.
pub fn hue_cos_sin(hue: f64) -> (f64, f64) {
	if hue.fract() == 0. && (0. ..360.).contains(&hue) {
		degree_trig()[hue as usize]
	} else {
		let rad = hue.to_radians();
		(rad.cos(), rad.sin())
	}
}
