//! Image fitting and pixel sampling.
//!
//! The image is contain-fitted into the container, rasterized at device
//! resolution, and sampled on a square grid. Each cell keeps its most opaque
//! pixel so that thin antialiased edges still produce particles.

use crate::components::theme::Color;

use super::state::Particle;
use super::types::FieldError;

/// Hard cap on particles per field; the sampling step grows to respect it.
pub const MAX_PARTICLES: usize = 20_000;
/// Cells whose most opaque pixel is at or below this alpha are skipped.
pub const ALPHA_THRESHOLD: u8 = 10;
/// Canvas margin as a multiple of the dispersion radius.
pub const PAD_RADIUS_FACTOR: f64 = 2.5;

/// Contain-fit `(w, h)` into `(box_w, box_h)`, preserving aspect ratio.
pub fn fit_contain(w: f64, h: f64, box_w: f64, box_h: f64) -> (f64, f64) {
	if w <= 0.0 || h <= 0.0 {
		return (0.0, 0.0);
	}
	let scale = (box_w / w).min(box_h / h);
	(w * scale, h * scale)
}

/// Cached geometry for one build. Rebuilt on image, size, or DPR change.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldLayout {
	pub dpr: f64,
	/// Margin on every side of the image, in device px.
	pub pad: f64,
	/// Fitted image size in CSS px.
	pub css_width: f64,
	pub css_height: f64,
	/// Image position inside the container, in CSS px.
	pub offset_x: f64,
	pub offset_y: f64,
	/// Rasterized image size in device px.
	pub buffer_width: u32,
	pub buffer_height: u32,
	/// Canvas size in device px (image plus padding).
	pub canvas_width: u32,
	pub canvas_height: u32,
}

impl FieldLayout {
	/// Compute the layout for an image of natural size `natural_w × natural_h`
	/// shown in a `container_w × container_h` box (CSS px).
	///
	/// A collapsed container height is replaced by the aspect-correct height
	/// for the container width.
	pub fn compute(
		natural_w: f64,
		natural_h: f64,
		container_w: f64,
		container_h: f64,
		dpr: f64,
		dispersion_radius: f64,
	) -> Result<Self, FieldError> {
		if !(natural_w >= 1.0 && natural_h >= 1.0) {
			return Err(FieldError::EmptyImage);
		}
		let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
		let box_w = if container_w >= 1.0 { container_w } else { natural_w };
		let box_h = if container_h >= 1.0 {
			container_h
		} else {
			box_w * natural_h / natural_w
		};

		let (css_width, css_height) = fit_contain(natural_w, natural_h, box_w, box_h);
		let pad = (dispersion_radius.max(0.0) * PAD_RADIUS_FACTOR * dpr).ceil();
		let buffer_width = ((css_width * dpr).round() as u32).max(1);
		let buffer_height = ((css_height * dpr).round() as u32).max(1);

		Ok(Self {
			dpr,
			pad,
			css_width,
			css_height,
			offset_x: (box_w - css_width) / 2.0,
			offset_y: (box_h - css_height) / 2.0,
			buffer_width,
			buffer_height,
			canvas_width: buffer_width + 2 * pad as u32,
			canvas_height: buffer_height + 2 * pad as u32,
		})
	}

	/// Map a container-relative CSS position into particle space.
	pub fn to_particle_space(&self, css_x: f64, css_y: f64) -> (f64, f64) {
		(
			(css_x - self.offset_x) * self.dpr + self.pad,
			(css_y - self.offset_y) * self.dpr + self.pad,
		)
	}

	/// Canvas placement in CSS px: `(left, top, width, height)` relative to
	/// the container.
	pub fn canvas_css_rect(&self) -> (f64, f64, f64, f64) {
		let pad_css = self.pad / self.dpr;
		(
			self.offset_x - pad_css,
			self.offset_y - pad_css,
			self.canvas_width as f64 / self.dpr,
			self.canvas_height as f64 / self.dpr,
		)
	}
}

/// Grid step in device px for the requested particle size, coarsened until
/// the grid cannot exceed [`MAX_PARTICLES`] cells.
pub fn sampling_step(particle_size: f64, dpr: f64, width: usize, height: usize) -> usize {
	let mut step = ((particle_size * dpr).round() as usize).max(1);
	let cells = |s: usize| width.div_ceil(s) * height.div_ceil(s);
	let area_floor = ((width * height) as f64 / MAX_PARTICLES as f64).sqrt().floor() as usize;
	step = step.max(area_floor);
	while cells(step) > MAX_PARTICLES {
		step += 1;
	}
	step
}

/// Sample an RGBA buffer (`width × height`, row-major) into particles.
///
/// One particle per grid cell whose most opaque pixel exceeds
/// [`ALPHA_THRESHOLD`], placed at the cell's top-left corner offset by `pad`.
pub fn sample_particles(
	pixels: &[u8],
	width: usize,
	height: usize,
	step: usize,
	pad: f64,
) -> Vec<Particle> {
	let step = step.max(1);
	// Ignore rows the buffer doesn't actually contain.
	let height = if width == 0 {
		0
	} else {
		height.min(pixels.len() / (width * 4))
	};
	let mut particles = Vec::new();

	for cell_y in (0..height).step_by(step) {
		for cell_x in (0..width).step_by(step) {
			let mut best: Option<(u8, usize)> = None;
			for y in cell_y..(cell_y + step).min(height) {
				for x in cell_x..(cell_x + step).min(width) {
					let i = (y * width + x) * 4;
					let alpha = pixels[i + 3];
					if best.is_none_or(|(a, _)| alpha > a) {
						best = Some((alpha, i));
					}
				}
			}
			let Some((alpha, i)) = best else {
				continue;
			};
			if alpha <= ALPHA_THRESHOLD {
				continue;
			}
			particles.push(Particle::new(
				cell_x as f64 + pad,
				cell_y as f64 + pad,
				Color::rgb(pixels[i], pixels[i + 1], pixels[i + 2]),
				step as f64,
			));
		}
	}
	particles
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rgba(width: usize, height: usize, f: impl Fn(usize, usize) -> [u8; 4]) -> Vec<u8> {
		let mut buf = Vec::with_capacity(width * height * 4);
		for y in 0..height {
			for x in 0..width {
				buf.extend_from_slice(&f(x, y));
			}
		}
		buf
	}

	#[test]
	fn contain_fit_preserves_aspect() {
		assert_eq!(fit_contain(200.0, 100.0, 100.0, 100.0), (100.0, 50.0));
		assert_eq!(fit_contain(100.0, 200.0, 300.0, 100.0), (50.0, 100.0));
	}

	#[test]
	fn layout_pads_by_radius_and_dpr() {
		let layout = FieldLayout::compute(400.0, 200.0, 200.0, 200.0, 2.0, 10.0).unwrap();
		assert_eq!(layout.pad, 50.0);
		assert_eq!((layout.css_width, layout.css_height), (200.0, 100.0));
		assert_eq!((layout.buffer_width, layout.buffer_height), (400, 200));
		assert_eq!((layout.canvas_width, layout.canvas_height), (500, 300));
		assert_eq!(layout.offset_y, 50.0);
		assert_eq!(layout.to_particle_space(0.0, 50.0), (50.0, 50.0));
		assert_eq!(layout.canvas_css_rect(), (-25.0, 25.0, 250.0, 150.0));
	}

	#[test]
	fn collapsed_height_uses_aspect_ratio() {
		let layout = FieldLayout::compute(400.0, 200.0, 300.0, 0.0, 1.0, 10.0).unwrap();
		assert_eq!((layout.css_width, layout.css_height), (300.0, 150.0));
	}

	#[test]
	fn zero_sized_image_is_an_error() {
		assert_eq!(
			FieldLayout::compute(0.0, 10.0, 100.0, 100.0, 1.0, 10.0),
			Err(FieldError::EmptyImage)
		);
	}

	#[test]
	fn transparent_image_has_no_particles() {
		let pixels = rgba(10, 10, |_, _| [255, 255, 255, 0]);
		assert!(sample_particles(&pixels, 10, 10, 2, 0.0).is_empty());
	}

	#[test]
	fn thin_edge_still_produces_a_particle() {
		// Only the bottom-right pixel of the first 4×4 cell is visible.
		let pixels = rgba(8, 8, |x, y| {
			if (x, y) == (3, 3) {
				[10, 20, 30, 200]
			} else {
				[0, 0, 0, 0]
			}
		});
		let particles = sample_particles(&pixels, 8, 8, 4, 5.0);
		assert_eq!(particles.len(), 1);
		let p = &particles[0];
		assert_eq!((p.origin_x, p.origin_y), (5.0, 5.0));
		assert_eq!(p.color, Color::rgb(10, 20, 30));
		assert_eq!(p.size, 4.0);
	}

	#[test]
	fn every_visible_cell_maps_to_one_particle() {
		// Checkerboard of 3×3 cells, visible on even cells, partial edge cells included.
		let (w, h, step) = (10, 7, 3);
		let pixels = rgba(w, h, |x, y| {
			if (x / step + y / step) % 2 == 0 {
				[1, 2, 3, 255]
			} else {
				[0, 0, 0, 5]
			}
		});
		let particles = sample_particles(&pixels, w, h, step, 0.0);
		let visible_cells = (0..h.div_ceil(step))
			.flat_map(|cy| (0..w.div_ceil(step)).map(move |cx| (cx, cy)))
			.filter(|(cx, cy)| (cx + cy) % 2 == 0)
			.count();
		assert_eq!(particles.len(), visible_cells);
		for p in &particles {
			assert!(p.origin_x < w as f64 && p.origin_y < h as f64);
		}
	}

	#[test]
	fn particle_count_is_capped() {
		let (w, h) = (600, 600);
		let step = sampling_step(1.0, 1.0, w, h);
		assert!(step > 1);
		let pixels = vec![255u8; w * h * 4];
		let particles = sample_particles(&pixels, w, h, step, 0.0);
		assert!(!particles.is_empty());
		assert!(particles.len() <= MAX_PARTICLES);
	}

	#[test]
	fn small_images_keep_requested_step() {
		assert_eq!(sampling_step(2.0, 2.0, 100, 100), 4);
	}

	#[test]
	fn short_buffer_is_not_overread() {
		let pixels = vec![255u8; 4 * 4 * 4];
		let particles = sample_particles(&pixels, 4, 100, 2, 0.0);
		assert_eq!(particles.len(), 4);
	}
}
