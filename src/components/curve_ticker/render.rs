//! DOM writes for the ticker. Only compositor-friendly properties are
//! touched per frame: `transform`, `opacity` and `visibility`.

use web_sys::HtmlElement;

use super::motion::ItemFrame;

/// Write `frame` into `node`'s inline style. `previous` is what the node
/// showed last frame; unchanged visibility is not rewritten.
pub fn apply_frame(node: &HtmlElement, frame: &ItemFrame, previous: Option<&ItemFrame>) {
	let style = node.style();
	let was_visible = previous.map(|p| p.visible);
	if !frame.visible {
		if was_visible != Some(false) {
			let _ = style.set_property("visibility", "hidden");
		}
		return;
	}
	if was_visible != Some(true) {
		let _ = style.set_property("visibility", "visible");
	}
	let _ = style.set_property("transform", &frame.transform());
	let _ = style.set_property("opacity", &format!("{:.3}", frame.opacity));
}

/// Apply every frame to its node. Extra frames or nodes are ignored.
pub fn apply_frames(nodes: &[HtmlElement], frames: &[ItemFrame], previous: &[ItemFrame]) {
	for (idx, (node, frame)) in nodes.iter().zip(frames).enumerate() {
		apply_frame(node, frame, previous.get(idx));
	}
}
