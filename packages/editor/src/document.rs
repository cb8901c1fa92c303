//! # Page Document
//!
//! A PageDocument owns the authoritative page tree of one edited page,
//! its version counter and the id generator used for adopted fragments.
//!
//! ## Lifecycle
//!
//! ```text
//! Init fragment → rebuild → Mutations → Pipeline diff
//!       ↓            ↓          ↓             ↓
//!    markup        Page     version++     ViewPatch
//! ```

use npb_tree::{rebuild_from_html, Element, IdGenerator, NodeId, Page, TreeError};

#[derive(Debug, Clone)]
pub struct PageDocument {
    /// Key of the edited page (path or URL), seeds node ids
    pub page_key: String,

    /// Current version number (increments on each applied mutation)
    pub version: u64,

    page: Page,
    ids: IdGenerator,
}

impl PageDocument {
    /// Empty page
    pub fn new(page_key: impl Into<String>) -> Self {
        Self::from_page(page_key, Page::new())
    }

    pub fn from_page(page_key: impl Into<String>, page: Page) -> Self {
        let page_key = page_key.into();
        Self {
            ids: IdGenerator::new(&page_key),
            page_key,
            version: 0,
            page,
        }
    }

    /// Document from rendered page markup
    pub fn from_markup(page_key: impl Into<String>, html: &str) -> Result<Self, TreeError> {
        Ok(Self::from_page(page_key, rebuild_from_html(html)?))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Swap the whole tree (page init, explicit resync)
    pub fn replace_page(&mut self, page: Page) -> u64 {
        self.page = page;
        self.version += 1;
        self.version
    }

    pub(crate) fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Fresh node id, never colliding with ids already in the page
    pub fn next_id(&mut self) -> NodeId {
        loop {
            let id = self.ids.new_id();
            if !self.page.contains(&id) {
                return id;
            }
        }
    }

    /// Give every node element of an adopted fragment a fresh id. The
    /// renderer's ids are not trusted to be unique in this page.
    pub fn assign_ids(&mut self, fragment: &mut Element) {
        let mut pending = vec![fragment];
        while let Some(element) = pending.pop() {
            if is_node_element(element) {
                let id = self.next_id();
                element.set_attr("id", id.as_str());
            }
            pending.extend(element.child_elements_mut());
        }
    }
}

fn is_node_element(element: &Element) -> bool {
    npb_tree::NodeKind::ALL
        .iter()
        .any(|kind| element.has_class(kind.marker_class()))
}
