//! "Pizza Town": a small scripted storefront for demos and end-to-end runs.
//!
//! Home page with a search box, a results page listing three restaurants,
//! and restaurant menus whose Add buttons open an addon modal.

use crate::dom::{DomEvent, DomEventKind, Document, NodeId};
use crate::page::{FollowLinks, PageProcess, PageScript, ScriptEffect, Site};

pub const HOME_URL: &str = "https://pizza-town.test/";
pub const SEARCH_URL: &str = "https://pizza-town.test/search";
pub const RESTAURANTS: [&str; 3] = ["Slice Co", "Dough Bros", "Napoli"];

const HOME_HTML: &str = r#"<html><head><title>Pizza Town</title></head><body>
<header><a href="/" aria-label="Pizza Town home">Pizza Town</a></header>
<main>
  <h1>Hungry?</h1>
  <div class="search">
    <input type="text" placeholder="Search for restaurants and food" data-testid="search-input">
    <button data-testid="search-submit">Search</button>
  </div>
</main>
</body></html>"#;

const ADDON_MODAL: &str = r#"<div role="dialog" data-testid="addon-modal">
  <p>Customise your pizza</p>
  <label><input type="checkbox" data-testid="extra-cheese">Extra cheese</label>
  <button data-testid="confirm-add">Add item</button>
  <button data-testid="skip-addons">Add without addons</button>
</div>"#;

fn slug(name: &str) -> String {
    name.to_ascii_lowercase().replace(' ', "-")
}

pub fn restaurant_url(name: &str) -> String {
    format!("{HOME_URL}r/{}", slug(name))
}

fn search_html() -> String {
    let links: String = RESTAURANTS
        .iter()
        .map(|name| format!("<a href=\"/r/{}\" data-testid=\"restaurant\">{name}</a>\n", slug(name)))
        .collect();
    format!(
        "<html><head><title>Search results | Pizza Town</title></head><body>\n<main><h2>Restaurants</h2>\n{links}</main></body></html>"
    )
}

fn restaurant_html(name: &str) -> String {
    format!(
        r#"<html><head><title>{name} | Pizza Town</title></head><body>
<header><span data-testid="cart-count">Cart (0)</span></header>
<main><h1>{name}</h1>
<div><p>Margherita</p><button data-testid="add-margherita">Add</button></div>
<div><p>Pepperoni</p><button data-testid="add-pepperoni">Add</button></div>
</main></body></html>"#
    )
}

/// Every page of the storefront.
pub fn site() -> Site {
    let mut site = Site::new()
        .with_page(HOME_URL, HOME_HTML)
        .with_page(SEARCH_URL, search_html());
    for name in RESTAURANTS {
        site.insert(&restaurant_url(name), restaurant_html(name));
    }
    site
}

/// A page process serving the storefront, starting on a blank tab.
pub fn page_process() -> PageProcess {
    PageProcess::new(site()).with_script(PizzaTown::default())
}

/// Site behaviour: search submission, the addon modal and the cart badge.
#[derive(Debug, Default)]
pub struct PizzaTown {
    cart: u32,
}

impl PageScript for PizzaTown {
    fn react(&mut self, doc: &mut Document, events: &[DomEvent]) -> ScriptEffect {
        for event in events {
            let Some(target) = event.target else {
                continue;
            };
            let test_id = closest_test_id(doc, target);
            match (&event.kind, test_id.as_deref()) {
                (DomEventKind::KeyDown(key), Some("search-input")) if key.key == "Enter" => {
                    return submit_search(doc);
                }
                (DomEventKind::Click, Some("search-submit")) => return submit_search(doc),
                (DomEventKind::Click, Some(id)) if id.starts_with("add-") => {
                    open_addon_modal(doc);
                    return ScriptEffect::Stay;
                }
                (DomEventKind::Click, Some("confirm-add" | "skip-addons")) => {
                    self.add_to_cart(doc);
                    return ScriptEffect::Stay;
                }
                _ => {}
            }
        }
        FollowLinks.react(doc, events)
    }
}

impl PizzaTown {
    fn add_to_cart(&mut self, doc: &mut Document) {
        if let Some(modal) = find_test_id(doc, "addon-modal") {
            doc.remove(modal);
        }
        self.cart += 1;
        if let Some(badge) = find_test_id(doc, "cart-count") {
            doc.set_text(badge, &format!("Cart ({})", self.cart));
        }
    }
}

fn submit_search(doc: &Document) -> ScriptEffect {
    let query = find_test_id(doc, "search-input")
        .and_then(|input| doc.value(input))
        .unwrap_or_default();
    if query.trim().is_empty() {
        ScriptEffect::Stay
    } else {
        ScriptEffect::Navigate(SEARCH_URL.to_string())
    }
}

fn open_addon_modal(doc: &mut Document) {
    if find_test_id(doc, "addon-modal").is_none() {
        let body = doc.body();
        doc.append_html(body, ADDON_MODAL);
    }
}

fn find_test_id(doc: &Document, id: &str) -> Option<NodeId> {
    doc.find_first(doc.root(), |el| {
        el.attrs.get("data-testid").is_some_and(|value| value == id)
    })
}

fn closest_test_id(doc: &Document, node: NodeId) -> Option<String> {
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(value) = doc.attr(id, "data-testid") {
            return Some(value.to_string());
        }
        current = doc.parent(id);
    }
    None
}
