use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bsptree_img::{compress_file_with, compress_series_with};
use bsptree_img::{BuildOptions, Compression, CompressError, HslaImage, Quality, SplitSearch};

/// Worker stack size; tree construction recurses once per tree level.
const WORKER_STACK_BYTES: usize = 64 << 20;

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

/// Settings shared by every file in a batch.
struct Job {
	quality: Quality,
	series: bool,
	options: BuildOptions,
	output_dir: PathBuf,
}

/// One written output image.
struct Written {
	path: PathBuf,
	regions: usize,
	pixels: u64,
	ratio: f64,
}

/// Result of processing one input file.
struct Report {
	outputs: Vec<Written>,
	elapsed: Duration,
}

/// Lists the `.png` files (any case) directly inside `dir`, sorted.
fn find_pngs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
	let mut found = Vec::new();
	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		let is_png = path.extension()
			.and_then(|e| e.to_str())
			.map_or(false, |e| e.eq_ignore_ascii_case("png"));
		if is_png && path.is_file() {
			found.push(path);
		}
	}
	found.sort();
	Ok(found)
}

impl Written {
	fn new(path: PathBuf, result: &Compression) -> Self {
		Written {
			path,
			regions: result.regions,
			pixels: result.original_pixels,
			ratio: result.ratio,
		}
	}
}

/// Compresses one file into one output, or five with `--series` (sharing
/// a single tree build).
fn process(input: &Path, job: &Job) -> Result<Report, CompressError> {
	let start = Instant::now();
	info!(input = %input.display(), "compressing");
	let stem = input.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_default();

	let mut outputs = Vec::new();
	if job.series {
		let image = HslaImage::open(input)?;
		for (level, result) in compress_series_with(&image, &job.options) {
			let path = job.output_dir.join(format!("{}-{}.png", stem, level.label()));
			result.image.save(&path)?;
			outputs.push(Written::new(path, &result));
		}
	} else {
		let path = job.output_dir.join(format!("{}_q{}.png", stem, job.quality.file_suffix()));
		let result = compress_file_with(input, &path, job.quality, &job.options)?;
		outputs.push(Written::new(path, &result));
	}
	Ok(Report { outputs, elapsed: start.elapsed() })
}

/// `clap`-based CLI for compressing a directory of PNG files.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 10: other, potentially unknown error
///
/// Failures on individual images are reported and skipped.
fn main() {
	let clap_matches = clap::App::new("bsptree_img")
		.version(env!("CARGO_PKG_VERSION"))
		.author("vkcz")
		.about("Compresses PNG images by merging regions of similar color.")
		.arg_from_usage("-s, --series 'Write one output per named quality level instead of using QUALITY'")
		.arg_from_usage("--sampled=[N] 'Try at most N split positions per axis; defaults to 8'")
		.arg_from_usage("--exhaustive 'Try every split position (slow on large images, reference output)'")
		.arg_from_usage("--no-early-exit 'Keep splitting regions even when every pixel in them is the same color'")
		.arg_from_usage("-j, --threads=[N] 'Number of images to compress at once; defaults to one per CPU'")
		.arg_from_usage("-v, --verbose 'Log progress to stderr (overridden by RUST_LOG)'")
		.arg_from_usage("<INPUT_DIR> 'Directory containing PNG images'")
		.arg_from_usage("<OUTPUT_DIR> 'Directory for compressed images; created if missing'")
		.arg_from_usage("[QUALITY] 'From 0.0 (smallest) to 1.0 (best), or highest/high/medium/low/lowest; defaults to 0.5'")
		.get_matches();

	let default_filter = if clap_matches.is_present("verbose") { "info" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	let quality = clap_matches.value_of("QUALITY")
		.map(Quality::parse)
		.unwrap_or_default();
	let split_search = match clap_matches.value_of("sampled").map(str::parse::<u32>) {
		_ if clap_matches.is_present("exhaustive") => SplitSearch::Exhaustive,
		None => SplitSearch::sampled(),
		Some(Ok(n)) if n > 0 => SplitSearch::Sampled { max_candidates: n },
		Some(_) => error_exit("Value for sampled must be a positive integer", 2),
	};
	let mut options = BuildOptions { split_search, ..BuildOptions::default() };
	if clap_matches.is_present("no-early-exit") {
		options.uniform_entropy = None;
	}
	let threads = match clap_matches.value_of("threads").map(str::parse::<usize>) {
		None => None,
		Some(Ok(n)) => Some(n),
		Some(Err(_)) => error_exit("Non-numeric value for threads", 2),
	};

	// Both are required by clap
	let input_dir = Path::new(clap_matches.value_of("INPUT_DIR").unwrap_or_default());
	let output_dir = PathBuf::from(clap_matches.value_of("OUTPUT_DIR").unwrap_or_default());

	let inputs = match find_pngs(input_dir) {
		Ok(v) => v,
		Err(_) => error_exit(&format!("Input directory could not be read: {}", input_dir.display()), 3),
	};
	if inputs.is_empty() {
		println!("No PNG files found in input directory: {}", input_dir.display());
		return;
	}
	if !output_dir.exists() {
		match fs::create_dir_all(&output_dir) {
			Ok(()) => println!("Created output directory: {}", output_dir.display()),
			Err(_) => error_exit("Could not create output directory", 3),
		}
	}

	println!("Found {} PNG file(s) to compress", inputs.len());
	if clap_matches.is_present("series") {
		println!("Quality: all levels");
	} else {
		println!("Quality: {}", quality);
	}
	println!("Output directory: {}\n", output_dir.display());

	let job = Job {
		quality,
		series: clap_matches.is_present("series"),
		options,
		output_dir,
	};

	let mut pool = rayon::ThreadPoolBuilder::new().stack_size(WORKER_STACK_BYTES);
	if let Some(n) = threads {
		pool = pool.num_threads(n);
	}
	let pool = match pool.build() {
		Ok(p) => p,
		Err(_) => error_exit("Could not start worker threads", 10),
	};
	let reports: Vec<_> = pool.install(|| {
		inputs.par_iter()
			.map(|input| (input, process(input, &job)))
			.collect()
	});

	let (mut processed, mut total_time) = (0, Duration::default());
	let (mut total_pixels, mut total_regions) = (0u64, 0u64);
	for (input, report) in reports.iter() {
		let name = input.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
		match report {
			Ok(report) => {
				processed += 1;
				total_time += report.elapsed;
				for out in report.outputs.iter() {
					total_pixels += out.pixels;
					total_regions += out.regions as u64;
					println!(
						"{} -> {}: {} regions, {:.1}% compression ratio",
						name,
						out.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
						out.regions,
						out.ratio * 100.,
					);
				}
				println!("{}: done in {:.2}s", name, report.elapsed.as_secs_f64());
			}
			Err(e) => println!("{}: error: {}", name, e),
		}
	}

	println!("\n=== Compression Summary ===");
	println!("Files processed: {}/{}", processed, inputs.len());
	println!("Total processing time: {:.2} seconds", total_time.as_secs_f64());
	if processed > 0 {
		println!("Average compression ratio: {:.1}%", total_regions as f64 / total_pixels as f64 * 100.);
		println!("Average time per image: {:.2} seconds", total_time.as_secs_f64() / processed as f64);
	}
}
