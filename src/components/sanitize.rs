//! Allow-list sanitizer for inline SVG item markup.
//!
//! Markup is parsed by the browser's `DOMParser` into a [`MarkupNode`] tree,
//! filtered here, and serialized back to a string for insertion. Elements
//! outside the allow-list are dropped together with their subtree. Event
//! handler attributes and script-bearing URLs are removed.

use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{DomParser, Element, Node, SupportedType};

/// Parsed trees deeper than this are cut off.
const MAX_DEPTH: usize = 64;

const ALLOWED_ELEMENTS: &[&str] = &[
	"svg",
	"g",
	"path",
	"circle",
	"ellipse",
	"rect",
	"line",
	"polyline",
	"polygon",
	"text",
	"tspan",
	"defs",
	"lineargradient",
	"radialgradient",
	"stop",
	"clippath",
	"mask",
	"use",
	"title",
	"desc",
	"symbol",
	"pattern",
];

const URL_ATTRIBUTES: &[&str] = &["href", "xlink:href", "src"];

/// Element tree independent of the DOM.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkupNode {
	Element {
		name: String,
		attrs: Vec<(String, String)>,
		children: Vec<MarkupNode>,
	},
	Text(String),
}

fn is_allowed_element(name: &str) -> bool {
	ALLOWED_ELEMENTS.iter().any(|allowed| allowed.eq_ignore_ascii_case(name))
}

fn is_valid_attribute_name(name: &str) -> bool {
	!name.is_empty()
		&& name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

/// Lowercased value with whitespace and control characters removed, the
/// way browsers read URL schemes.
fn normalized_scheme(value: &str) -> String {
	value
		.chars()
		.filter(|c| !c.is_whitespace() && !c.is_control())
		.flat_map(char::to_lowercase)
		.collect()
}

fn is_safe_url(value: &str) -> bool {
	let url = normalized_scheme(value);
	if url.starts_with("javascript:") || url.starts_with("vbscript:") {
		return false;
	}
	if url.starts_with("data:") {
		return url.starts_with("data:image/") && !url.starts_with("data:image/svg");
	}
	true
}

fn is_allowed_attribute(name: &str, value: &str) -> bool {
	let lower = name.to_ascii_lowercase();
	if !is_valid_attribute_name(name) || lower.starts_with("on") {
		return false;
	}
	if URL_ATTRIBUTES.contains(&lower.as_str()) {
		return is_safe_url(value);
	}
	if lower == "style" {
		let style = normalized_scheme(value);
		return !style.contains("javascript:") && !style.contains("expression(");
	}
	true
}

/// Filter `node`, returning `None` when it is dropped entirely.
pub fn sanitize(node: &MarkupNode) -> Option<MarkupNode> {
	sanitize_at(node, 0)
}

fn sanitize_at(node: &MarkupNode, depth: usize) -> Option<MarkupNode> {
	match node {
		MarkupNode::Text(text) => Some(MarkupNode::Text(text.clone())),
		MarkupNode::Element {
			name,
			attrs,
			children,
		} => {
			if depth >= MAX_DEPTH || !is_allowed_element(name) {
				return None;
			}
			Some(MarkupNode::Element {
				name: name.clone(),
				attrs: attrs
					.iter()
					.filter(|(k, v)| is_allowed_attribute(k, v))
					.cloned()
					.collect(),
				children: children
					.iter()
					.filter_map(|child| sanitize_at(child, depth + 1))
					.collect(),
			})
		}
	}
}

fn escape_into(out: &mut String, text: &str, quote: bool) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' if quote => out.push_str("&quot;"),
			_ => out.push(c),
		}
	}
}

/// Serialize a tree back to markup.
pub fn serialize(node: &MarkupNode) -> String {
	let mut out = String::new();
	serialize_into(&mut out, node);
	out
}

fn serialize_into(out: &mut String, node: &MarkupNode) {
	match node {
		MarkupNode::Text(text) => escape_into(out, text, false),
		MarkupNode::Element {
			name,
			attrs,
			children,
		} => {
			out.push('<');
			out.push_str(name);
			for (key, value) in attrs {
				out.push(' ');
				out.push_str(key);
				out.push_str("=\"");
				escape_into(out, value, true);
				out.push('"');
			}
			if children.is_empty() {
				out.push_str("/>");
				return;
			}
			out.push('>');
			for child in children {
				serialize_into(out, child);
			}
			out.push_str("</");
			out.push_str(name);
			out.push('>');
		}
	}
}

fn from_dom(node: &Node, depth: usize) -> Option<MarkupNode> {
	match node.node_type() {
		Node::TEXT_NODE | Node::CDATA_SECTION_NODE => node.text_content().map(MarkupNode::Text),
		Node::ELEMENT_NODE if depth < MAX_DEPTH => {
			let element: &Element = node.dyn_ref()?;
			let attributes = element.attributes();
			let attrs = (0..attributes.length())
				.filter_map(|i| attributes.item(i))
				.map(|attr| (attr.name(), attr.value()))
				.collect();
			let child_nodes = node.child_nodes();
			let children = (0..child_nodes.length())
				.filter_map(|i| child_nodes.item(i))
				.filter_map(|child| from_dom(&child, depth + 1))
				.collect();
			Some(MarkupNode::Element {
				name: element.tag_name(),
				attrs,
				children,
			})
		}
		_ => None,
	}
}

/// Parse `markup` as SVG and return it sanitized. Returns `None` when the
/// markup does not parse or its root element is not allowed.
pub fn sanitize_svg(markup: &str) -> Option<String> {
	let parser = DomParser::new().ok()?;
	let document = parser
		.parse_from_string(markup, SupportedType::ImageSvgXml)
		.ok()?;
	if document.get_elements_by_tag_name("parsererror").length() > 0 {
		warn!("fx-widgets: ticker item SVG failed to parse, skipping");
		return None;
	}
	let root = document.document_element()?;
	let tree = from_dom(&root, 0)?;
	match sanitize(&tree) {
		Some(clean @ MarkupNode::Element { .. }) => Some(serialize(&clean)),
		_ => {
			warn!("fx-widgets: ticker item SVG root <{}> not allowed", root.tag_name());
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn element(name: &str, attrs: &[(&str, &str)], children: Vec<MarkupNode>) -> MarkupNode {
		MarkupNode::Element {
			name: name.to_string(),
			attrs: attrs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
			children,
		}
	}

	fn text(text: &str) -> MarkupNode {
		MarkupNode::Text(text.to_string())
	}

	#[test]
	fn keeps_allowed_shapes_and_case() {
		let tree = element(
			"svg",
			&[("viewBox", "0 0 10 10")],
			vec![
				element("linearGradient", &[("id", "g")], vec![]),
				element("path", &[("d", "M0 0L10 10"), ("fill", "url(#g)")], vec![]),
			],
		);
		assert_eq!(sanitize(&tree), Some(tree.clone()));
		assert_eq!(
			serialize(&tree),
			r#"<svg viewBox="0 0 10 10"><linearGradient id="g"/><path d="M0 0L10 10" fill="url(#g)"/></svg>"#
		);
	}

	#[test]
	fn drops_disallowed_subtrees() {
		let tree = element(
			"svg",
			&[],
			vec![
				element("script", &[], vec![text("alert(1)")]),
				element(
					"foreignObject",
					&[],
					vec![element("iframe", &[("src", "x")], vec![])],
				),
				element("style", &[], vec![text("*{}")]),
				element("circle", &[("r", "4")], vec![]),
			],
		);
		let clean = serialize(&sanitize(&tree).unwrap());
		assert_eq!(clean, r#"<svg><circle r="4"/></svg>"#);
	}

	#[test]
	fn strips_event_handlers_and_script_urls() {
		let tree = element(
			"svg",
			&[("onload", "alert(1)"), ("ONCLICK", "x()")],
			vec![
				element("use", &[("xlink:href", " java\tscript:alert(1)")], vec![]),
				element("use", &[("href", "#icon")], vec![]),
				element("use", &[("href", "data:text/html,<b>")], vec![]),
				element("rect", &[("style", "fill: expression(alert(1))")], vec![]),
			],
		);
		let clean = serialize(&sanitize(&tree).unwrap());
		assert_eq!(
			clean,
			r##"<svg><use/><use href="#icon"/><use/><rect/></svg>"##
		);
	}

	#[test]
	fn rejects_disallowed_root() {
		let tree = element("html", &[], vec![element("svg", &[], vec![])]);
		assert_eq!(sanitize(&tree), None);
	}

	#[test]
	fn escapes_text_and_attribute_values() {
		let tree = element(
			"text",
			&[("data-x", r#"a"b<c"#)],
			vec![text("1 < 2 & 3 > 2")],
		);
		assert_eq!(
			serialize(&tree),
			r#"<text data-x="a&quot;b&lt;c">1 &lt; 2 &amp; 3 &gt; 2</text>"#
		);
	}

	#[test]
	fn data_urls_only_for_raster_images() {
		assert!(is_safe_url("data:image/png;base64,AAAA"));
		assert!(!is_safe_url("data:image/svg+xml,<svg onload=x>"));
		assert!(!is_safe_url("DATA:text/html,hi"));
		assert!(is_safe_url("https://example.com/a.png"));
	}
}
