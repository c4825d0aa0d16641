//! Computed-visibility approximation from inline styles and attributes.
//!
//! There is no layout engine behind the simulated page, so "hidden by layout"
//! is approximated from what markup can state directly: the `hidden`
//! attribute, hidden inputs, and inline `display`, `visibility`, `opacity`,
//! `width` and `height` declarations.

use super::{Document, Element, NodeId};

impl Document {
    /// True when the element itself is hidden by style or has zero size.
    ///
    /// Ancestors are not consulted; tree walkers skip hidden subtrees.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.element(id).map_or(true, element_is_hidden)
    }

    /// True when neither the element nor any ancestor element is hidden.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        !self.is_hidden(id)
            && std::iter::successors(self.parent(id), |node| self.parent(*node))
                .filter_map(|node| self.element(node))
                .all(|el| !element_is_hidden(el))
    }

    /// Set one inline style declaration, replacing an existing one.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let Some(el) = self.element(id) else {
            return;
        };
        let mut declarations: Vec<(String, String)> = declarations(el)
            .into_iter()
            .filter(|(prop, _)| prop != property)
            .collect();
        declarations.push((property.to_string(), value.to_string()));
        let style = declarations
            .iter()
            .map(|(prop, value)| format!("{prop}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(id, "style", style);
    }
}

fn element_is_hidden(el: &Element) -> bool {
    if el.attrs.contains_key("hidden") {
        return true;
    }
    if el.tag == "input"
        && el
            .attrs
            .get("type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("hidden"))
    {
        return true;
    }
    declarations(el).iter().any(|(prop, value)| match prop.as_str() {
        "display" => value == "none",
        "visibility" => value == "hidden" || value == "collapse",
        "opacity" => value.parse::<f64>().is_ok_and(|opacity| opacity == 0.0),
        "width" | "height" => is_zero_length(value),
        _ => false,
    })
}

fn is_zero_length(value: &str) -> bool {
    let number = value
        .trim_end_matches("px")
        .trim_end_matches("rem")
        .trim_end_matches("em")
        .trim_end_matches('%');
    number.trim().parse::<f64>().is_ok_and(|n| n == 0.0)
}

/// Lowercased `(property, value)` pairs of the inline `style` attribute.
fn declarations(el: &Element) -> Vec<(String, String)> {
    let Some(style) = el.attrs.get("style") else {
        return Vec::new();
    };
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let value = value.trim().trim_end_matches("!important").trim();
            Some((prop.trim().to_ascii_lowercase(), value.to_ascii_lowercase()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(doc: &Document, tag: &str) -> NodeId {
        doc.find_first(doc.root(), |el| el.tag == tag).unwrap()
    }

    #[test]
    fn inline_styles_hide_elements() {
        for markup in [
            r#"<div style="display: none">x</div>"#,
            r#"<div style="visibility:hidden">x</div>"#,
            r#"<div style="opacity: 0">x</div>"#,
            r#"<div style="width:0px; height: 20px">x</div>"#,
            r#"<div style="height: 0 !important">x</div>"#,
            r#"<div hidden>x</div>"#,
        ] {
            let doc = Document::parse("https://shop.test/", markup);
            assert!(doc.is_hidden(first(&doc, "div")), "expected hidden: {markup}");
        }
    }

    #[test]
    fn visible_elements_stay_visible() {
        let doc = Document::parse(
            "https://shop.test/",
            r#"<div style="display:flex; opacity: 0.5; width: 10px">x</div>"#,
        );
        assert!(!doc.is_hidden(first(&doc, "div")));
    }

    #[test]
    fn hidden_inputs_are_hidden() {
        let doc = Document::parse("https://shop.test/", r#"<input type="hidden" name="csrf">"#);
        assert!(doc.is_hidden(first(&doc, "input")));
    }

    #[test]
    fn set_style_replaces_declaration() {
        let mut doc = Document::parse("https://shop.test/", r#"<div style="display:none">x</div>"#);
        let div = first(&doc, "div");
        doc.set_style(div, "display", "block");
        assert!(!doc.is_hidden(div));
        assert_eq!(doc.attr(div, "style"), Some("display: block"));
    }

    #[test]
    fn hidden_ancestor_hides_descendants() {
        let doc = Document::parse(
            "https://shop.test/",
            r#"<section style="display:none"><div><button>Gone</button></div></section><p>Shown</p>"#,
        );
        let button = first(&doc, "button");
        assert!(!doc.is_hidden(button));
        assert!(!doc.is_rendered(button));
        assert!(doc.is_rendered(first(&doc, "p")));
    }
}
