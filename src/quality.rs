//! Maps a single human-facing quality setting to pruning thresholds.

use std::fmt;

use tracing::warn;

use crate::node::prune::PruneConfig;

/// Score used when none is given, or when the given one is unusable.
pub const DEFAULT_SCORE: f64 = 0.5;

/// The five fixed quality presets.
///
/// Their thresholds come from a fixed table rather than the continuous
/// score curves, so existing outputs stay reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualityLevel {
	Highest,
	High,
	Medium,
	Low,
	Lowest,
}

impl Default for QualityLevel {
	fn default() -> Self {
		QualityLevel::Medium
	}
}

impl QualityLevel {
	/// Every level, best quality first.
	pub const ALL: [QualityLevel; 5] = [
		QualityLevel::Highest,
		QualityLevel::High,
		QualityLevel::Medium,
		QualityLevel::Low,
		QualityLevel::Lowest,
	];

	pub fn config(self) -> PruneConfig {
		match self {
			QualityLevel::Highest => PruneConfig::new(0.99, 0.025),
			QualityLevel::High => PruneConfig::new(0.99, 0.05),
			QualityLevel::Medium => PruneConfig::new(0.99, 0.10),
			QualityLevel::Low => PruneConfig::new(0.95, 0.15),
			QualityLevel::Lowest => PruneConfig::new(0.90, 0.20),
		}
	}

	/// Short name, e.g. `"high"`.
	pub fn name(self) -> &'static str {
		match self {
			QualityLevel::Highest => "highest",
			QualityLevel::High => "high",
			QualityLevel::Medium => "medium",
			QualityLevel::Low => "low",
			QualityLevel::Lowest => "lowest",
		}
	}

	/// Long name used in output file names, e.g. `"high-quality"`.
	pub fn label(self) -> &'static str {
		match self {
			QualityLevel::Highest => "highest-quality",
			QualityLevel::High => "high-quality",
			QualityLevel::Medium => "medium-quality",
			QualityLevel::Low => "low-quality",
			QualityLevel::Lowest => "lowest-quality",
		}
	}

	/// Looks a level up by its short or long name, ignoring case.
	pub fn from_name(name: &str) -> Option<QualityLevel> {
		let name = name.trim().to_ascii_lowercase();
		QualityLevel::ALL.iter()
			.copied()
			.find(|level| level.name() == name || level.label() == name)
	}

	/// Like [`from_name`](Self::from_name), falling back to
	/// [`QualityLevel::Medium`] for unknown names.
	pub fn from_name_or_default(name: &str) -> QualityLevel {
		QualityLevel::from_name(name).unwrap_or_else(|| {
			warn!(input = name, "unknown quality level, using medium");
			QualityLevel::default()
		})
	}
}

impl fmt::Display for QualityLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Either a continuous quality score or one of the fixed levels.
///
/// Both resolve to a [`PruneConfig`] before any compression work starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Quality {
	/// `0.0` (most compression) to `1.0` (least). Values outside that
	/// range are clamped.
	Score(f64),
	Level(QualityLevel),
}

impl Default for Quality {
	fn default() -> Self {
		Quality::Score(DEFAULT_SCORE)
	}
}

impl From<f64> for Quality {
	fn from(score: f64) -> Self {
		Quality::Score(score)
	}
}

impl From<QualityLevel> for Quality {
	fn from(level: QualityLevel) -> Self {
		Quality::Level(level)
	}
}

impl Quality {
	pub fn config(&self) -> PruneConfig {
		match *self {
			Quality::Score(score) => config_for_score(score),
			Quality::Level(level) => level.config(),
		}
	}

	pub fn name(&self) -> &'static str {
		match *self {
			Quality::Score(score) => name_for_score(score),
			Quality::Level(level) => level.name(),
		}
	}

	/// Interprets user input: a number becomes a (clamped) score, a level
	/// name becomes that level, and anything else falls back to
	/// [`QualityLevel::Medium`] with a warning.
	pub fn parse(input: &str) -> Quality {
		match input.trim().parse::<f64>() {
			Ok(score) => Quality::Score(clamp_score(score)),
			Err(_) => Quality::Level(QualityLevel::from_name_or_default(input)),
		}
	}

	/// Suffix identifying this quality in file names: the score with two
	/// decimals, or the level's long name.
	pub fn file_suffix(&self) -> String {
		match *self {
			Quality::Score(score) => format!("{:.2}", clamp_score(score)),
			Quality::Level(level) => level.label().to_string(),
		}
	}
}

impl fmt::Display for Quality {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Quality::Score(score) => write!(f, "{:.2} ({})", clamp_score(score), self.name()),
			Quality::Level(level) => write!(f, "{}", level),
		}
	}
}

/// Clamps a score into `[0, 1]`, warning if it wasn't already there.
///
/// NaN becomes [`DEFAULT_SCORE`].
pub fn clamp_score(score: f64) -> f64 {
	if score.is_nan() {
		warn!("quality score is NaN, using {}", DEFAULT_SCORE);
		return DEFAULT_SCORE;
	}
	if !(0. ..=1.).contains(&score) {
		warn!(score, "quality score outside [0, 1], clamping");
	}
	score.clamp(0., 1.)
}

/// Pruning thresholds for a continuous score.
///
/// Similarity rises from 0.85 to 0.995 along `q^1.5`; tolerance falls
/// from 0.30 along `(1 - q)^2`, floored at 0.005.
pub fn config_for_score(score: f64) -> PruneConfig {
	let q = clamp_score(score);
	let similarity = 0.85 + 0.145 * q.powf(1.5);
	let tolerance = (0.30 * (1. - q).powi(2)).max(0.005);
	PruneConfig::new(similarity, tolerance)
}

/// Display name for a continuous score.
pub fn name_for_score(score: f64) -> &'static str {
	let q = clamp_score(score);
	if q >= 0.9 {
		"highest"
	} else if q >= 0.7 {
		"high"
	} else if q >= 0.3 {
		"medium"
	} else if q >= 0.1 {
		"low"
	} else {
		"lowest"
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-12
	}

	#[test]
	fn score_endpoints() {
		let low = config_for_score(0.);
		assert!(close(low.min_similarity, 0.85));
		assert!(close(low.tolerance, 0.30));
		let high = config_for_score(1.);
		assert!(close(high.min_similarity, 0.995));
		assert!(close(high.tolerance, 0.005));
	}

	#[test]
	fn curves_are_monotonic() {
		let mut prev = config_for_score(0.);
		for i in 1..=100 {
			let next = config_for_score(i as f64 / 100.);
			assert!(next.min_similarity >= prev.min_similarity);
			assert!(next.tolerance <= prev.tolerance);
			prev = next;
		}
	}

	#[test]
	fn out_of_range_scores_clamp() {
		assert_eq!(config_for_score(-3.), config_for_score(0.));
		assert_eq!(config_for_score(7.), config_for_score(1.));
		assert_eq!(config_for_score(f64::NAN), config_for_score(DEFAULT_SCORE));
		assert_eq!(name_for_score(2.), "highest");
	}

	#[test]
	fn level_table() {
		assert_eq!(QualityLevel::Highest.config(), PruneConfig::new(0.99, 0.025));
		assert_eq!(QualityLevel::High.config(), PruneConfig::new(0.99, 0.05));
		assert_eq!(QualityLevel::Medium.config(), PruneConfig::new(0.99, 0.10));
		assert_eq!(QualityLevel::Low.config(), PruneConfig::new(0.95, 0.15));
		assert_eq!(QualityLevel::Lowest.config(), PruneConfig::new(0.90, 0.20));
	}

	#[test]
	fn score_names() {
		assert_eq!(name_for_score(1.), "highest");
		assert_eq!(name_for_score(0.9), "highest");
		assert_eq!(name_for_score(0.89), "high");
		assert_eq!(name_for_score(0.7), "high");
		assert_eq!(name_for_score(0.5), "medium");
		assert_eq!(name_for_score(0.3), "medium");
		assert_eq!(name_for_score(0.2), "low");
		assert_eq!(name_for_score(0.1), "low");
		assert_eq!(name_for_score(0.05), "lowest");
	}

	#[test]
	fn parses_numbers_and_names() {
		assert_eq!(Quality::parse("0.75"), Quality::Score(0.75));
		assert_eq!(Quality::parse("1.5"), Quality::Score(1.));
		assert_eq!(Quality::parse("High"), Quality::Level(QualityLevel::High));
		assert_eq!(Quality::parse("lowest-quality"), Quality::Level(QualityLevel::Lowest));
		assert_eq!(Quality::parse("superb"), Quality::Level(QualityLevel::Medium));
	}

	#[test]
	fn suffixes() {
		assert_eq!(Quality::Score(0.5).file_suffix(), "0.50");
		assert_eq!(Quality::Level(QualityLevel::Low).file_suffix(), "low-quality");
		assert_eq!(Quality::Score(0.75).to_string(), "0.75 (high)");
	}

	#[test]
	fn both_shapes_resolve_to_configs() {
		assert_eq!(Quality::from(QualityLevel::Low).config(), QualityLevel::Low.config());
		assert_eq!(Quality::from(0.25).config(), config_for_score(0.25));
		assert_eq!(Quality::default().name(), "medium");
	}
}
