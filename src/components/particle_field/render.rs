//! Canvas work for the particle field: rasterizing the source image and
//! painting frames.
//!
//! Frames use erase-and-redraw: the clean base image is blitted first, the
//! rest cells of displaced particles are cleared, then only displaced
//! particles (and their trails) are painted. Settled regions stay
//! pixel-exact copies of the image.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::layout::FieldLayout;
use super::state::{ParticleField, trail_marks};
use super::types::FieldError;

/// Offscreen raster of the fitted image. Owned by the simulation and
/// replaced wholesale on rebuild.
pub struct BaseImage {
	pub canvas: HtmlCanvasElement,
}

/// Get the 2D context of a canvas.
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, FieldError> {
	canvas
		.get_context("2d")
		.map_err(|e| FieldError::Canvas(format!("{e:?}")))?
		.ok_or_else(|| FieldError::Canvas("2d context not supported".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| FieldError::Canvas("unexpected context type".into()))
}

/// Draw `image` into a new offscreen canvas at device resolution and read
/// its RGBA pixels back.
pub fn rasterize(
	image: &HtmlImageElement,
	layout: &FieldLayout,
) -> Result<(BaseImage, Vec<u8>), FieldError> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| FieldError::Canvas("no document".into()))?;
	let canvas: HtmlCanvasElement = document
		.create_element("canvas")
		.map_err(|e| FieldError::Canvas(format!("{e:?}")))?
		.dyn_into()
		.map_err(|_| FieldError::Canvas("created element is not a canvas".into()))?;
	canvas.set_width(layout.buffer_width);
	canvas.set_height(layout.buffer_height);

	let ctx = context_2d(&canvas)?;
	let (w, h) = (layout.buffer_width as f64, layout.buffer_height as f64);
	ctx.draw_image_with_html_image_element_and_dw_and_dh(image, 0.0, 0.0, w, h)
		.map_err(|e| FieldError::Canvas(format!("{e:?}")))?;
	// Fails for cross-origin images served without CORS headers.
	let data = ctx
		.get_image_data(0.0, 0.0, w, h)
		.map_err(|e| FieldError::Readback(format!("{e:?}")))?;

	Ok((BaseImage { canvas }, data.data().0))
}

/// Wipe whatever the canvas currently shows.
pub fn clear(canvas: &HtmlCanvasElement) {
	if let Ok(ctx) = context_2d(canvas) {
		ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
	}
}

/// Paint the base image alone. Used for reduced motion and settled frames.
pub fn render_static(ctx: &CanvasRenderingContext2d, base: &BaseImage, layout: &FieldLayout) {
	ctx.clear_rect(
		0.0,
		0.0,
		layout.canvas_width as f64,
		layout.canvas_height as f64,
	);
	let _ = ctx.draw_image_with_html_canvas_element(&base.canvas, layout.pad, layout.pad);
}

/// Paint one simulation frame.
pub fn render(
	field: &ParticleField,
	ctx: &CanvasRenderingContext2d,
	base: &BaseImage,
	layout: &FieldLayout,
) {
	render_static(ctx, base, layout);

	for p in field.displaced() {
		ctx.clear_rect(p.origin_x, p.origin_y, p.size, p.size);
	}

	for p in field.displaced() {
		let mut marks = trail_marks(p).peekable();
		if marks.peek().is_none() {
			continue;
		}
		ctx.set_fill_style_str(&p.color.to_css());
		for mark in marks {
			ctx.set_global_alpha(mark.alpha * p.color.a);
			ctx.fill_rect(mark.x, mark.y, p.size, p.size);
		}
	}
	ctx.set_global_alpha(1.0);

	for p in field.displaced() {
		ctx.set_fill_style_str(&p.color.to_css());
		ctx.fill_rect(p.x, p.y, p.size, p.size);
	}
}
