use bsptree_img::quality::{config_for_score, name_for_score};
use bsptree_img::{
	compress, compress_file, BuildOptions, CompressError, Hsla, HslaImage, PartitionTree,
	PruneConfig, Quality, QualityLevel, RasterError, Rect, RegionStats,
};

const RED: Hsla = Hsla::opaque(0., 1., 0.5);
const GREEN: Hsla = Hsla::opaque(120., 1., 0.5);
const BLUE: Hsla = Hsla::opaque(240., 1., 0.5);
const GRAY: Hsla = Hsla::opaque(0., 0., 0.5);

fn close(a: f64, b: f64) -> bool {
	(a - b).abs() < 1e-9
}

#[test]
fn solid_image_is_one_region() {
	let img = HslaImage::from_pixel(4, 4, RED).unwrap();
	let result = compress(&img, 0.);
	assert_eq!(result.regions, 1);
	assert_eq!(result.original_pixels, 16);
	assert!(close(result.ratio, 1. / 16.));
	for p in result.image.pixels() {
		assert!(p.distance(&RED) < 1e-9);
		assert_eq!(p.alpha, 1.);
	}
}

#[test]
fn distinct_colors_survive_best_quality() {
	let img = HslaImage::from_pixels(2, 2, vec![RED, GREEN, BLUE, GRAY]).unwrap();
	let result = compress(&img, 1.);
	assert_eq!(result.regions, 4);
	assert!(close(result.ratio, 1.));
	for (a, b) in img.pixels().iter().zip(result.image.pixels()) {
		assert!(a.distance(b) < 1e-9, "{:?} vs {:?}", a, b);
	}
}

#[test]
fn distinct_colors_survive_in_every_layout() {
	let colors = [RED, GREEN, BLUE, GRAY];
	// Every ordering of the four colors over the 2x2 grid
	let layouts = (0..256usize)
		.map(|n| [n % 4, n / 4 % 4, n / 16 % 4, n / 64])
		.filter(|l| (0..4).all(|i| l.contains(&i)));
	let mut seen = 0;
	for layout in layouts {
		let img = HslaImage::from_pixels(2, 2, layout.iter().map(|&i| colors[i]).collect()).unwrap();
		let result = compress(&img, 1.);
		assert_eq!(result.regions, 4, "layout {:?}", layout);
		assert!(close(result.ratio, 1.));
		seen += 1;
	}
	assert_eq!(seen, 24);
}

#[test]
fn black_and_white_checkerboard_keeps_every_square() {
	let img = HslaImage::from_fn(8, 8, |x, y| Hsla::opaque(0., 0., ((x + y) % 2) as f64)).unwrap();
	let result = compress(&img, 1.);
	assert_eq!(result.regions, 64);
	for (a, b) in img.pixels().iter().zip(result.image.pixels()) {
		assert!(a.distance(b) < 1e-9, "{:?} vs {:?}", a, b);
	}
}

#[test]
fn first_split_separates_the_rows() {
	let img = HslaImage::from_pixels(2, 2, vec![RED, GREEN, BLUE, GRAY]).unwrap();
	let tree = PartitionTree::build(&RegionStats::new(&img));
	let sections = tree.root().sections.as_ref().unwrap();
	assert_eq!(sections[0].region, Rect::new(0, 0, 1, 0));
	assert_eq!(sections[1].region, Rect::new(0, 1, 1, 1));
	assert_eq!(tree.depth(), 3);
}

#[test]
fn mapper_endpoints() {
	let worst = config_for_score(0.);
	assert!(close(worst.min_similarity, 0.85));
	assert!(close(worst.tolerance, 0.30));
	let best = config_for_score(1.);
	assert!(close(best.min_similarity, 0.995));
	assert!(close(best.tolerance, 0.005));
	assert_eq!(name_for_score(0.), "lowest");
	assert_eq!(name_for_score(1.), "highest");
}

#[test]
fn average_matches_direct_scan() {
	let img = HslaImage::from_fn(13, 9, |x, y| {
		Hsla::opaque(((x * 29 + y * 71) % 360) as f64 + 0.5, 0.2 + (x % 4) as f64 / 5., (y % 7) as f64 / 6.)
	})
	.unwrap();
	let stats = RegionStats::new(&img);
	for rect in &[Rect::new(0, 0, 12, 8), Rect::new(3, 2, 9, 7), Rect::new(0, 4, 5, 8), Rect::new(7, 0, 12, 3)] {
		let (mut hx, mut hy, mut sat, mut lum) = (0., 0., 0., 0.);
		for y in rect.y0..=rect.y1 {
			for x in rect.x0..=rect.x1 {
				let p = img.pixel(x, y);
				let rad = p.hue.to_radians();
				hx += p.saturation * rad.cos();
				hy += p.saturation * rad.sin();
				sat += p.saturation;
				lum += p.luminance;
			}
		}
		let area = rect.area() as f64;
		let expected = Hsla::opaque(hy.atan2(hx).to_degrees().rem_euclid(360.), sat / area, lum / area);
		let got = stats.average_color(rect);
		assert!(got.distance(&expected) < 1e-6, "{:?}: {:?} vs {:?}", rect, got, expected);
	}
}

#[test]
fn lossless_pruning_keeps_every_leaf() {
	let img = HslaImage::from_pixels(2, 2, vec![RED, GREEN, BLUE, GRAY]).unwrap();
	let stats = RegionStats::new(&img);
	let mut tree = PartitionTree::build_with(&stats, &BuildOptions::full_depth());
	tree.prune(&PruneConfig::lossless());
	assert_eq!(tree.leaf_count(), 4);
}

#[test]
fn quality_inputs() {
	assert_eq!(Quality::parse(" 0.3 ").name(), "medium");
	assert_eq!(Quality::parse("LOW"), Quality::Level(QualityLevel::Low));
	assert_eq!(Quality::parse("-1").config(), config_for_score(0.));
	assert_eq!(Quality::parse("nonsense").config(), QualityLevel::Medium.config());
}

#[test]
fn zero_dimensions_are_rejected() {
	assert!(matches!(HslaImage::new(0, 0), Err(RasterError::ZeroDimension { .. })));
	assert!(matches!(
		HslaImage::from_pixels(3, 1, vec![RED; 2]),
		Err(RasterError::PixelCountMismatch { expected: 3, actual: 2 })
	));
}

#[test]
fn compresses_files_on_disk() {
	let dir = std::env::temp_dir().join(format!("bsptree_img-test-{}", std::process::id()));
	std::fs::create_dir_all(&dir).unwrap();
	let input = dir.join("in.png");
	let output = dir.join("out.png");

	let src = image::RgbaImage::from_fn(8, 6, |x, _| {
		if x < 4 { image::Rgba([255, 0, 0, 255]) } else { image::Rgba([0, 0, 255, 255]) }
	});
	src.save(&input).unwrap();

	let result = compress_file(&input, &output, QualityLevel::Medium).unwrap();
	assert_eq!(result.regions, 2);
	let written = image::open(&output).unwrap().into_rgba8();
	assert_eq!(written, src);

	let missing = compress_file(dir.join("missing.png"), dir.join("never.png"), 0.5);
	assert!(matches!(missing, Err(CompressError::Codec(_)) | Err(CompressError::Io(_))));

	std::fs::remove_dir_all(&dir).unwrap();
}
