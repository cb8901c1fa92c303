//! Shared test renderer: answers fragment requests with minimal markup that
//! follows the renderer's class conventions.

#![allow(dead_code)]

use npb_editor::{FetchError, FragmentRenderer, FragmentRequest};
use npb_tree::Variant;
use std::future::Future;
use std::sync::Mutex;

pub const EMPTY_PAGE: &str = r#"<div id="npb"><div id="npb-rows-wrapper"></div></div>"#;

#[derive(Debug)]
pub struct FakeRenderer {
    page: String,
    failing: Mutex<Vec<&'static str>>,
    requests: Mutex<Vec<FragmentRequest>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::with_page(EMPTY_PAGE)
    }

    pub fn with_page(page: &str) -> Self {
        Self {
            page: page.to_string(),
            failing: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer 404 for an endpoint from now on
    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().push(endpoint);
    }

    pub fn requests(&self) -> Vec<FragmentRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn render(&self, request: &FragmentRequest) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        let endpoint = request.endpoint();
        if self.failing.lock().unwrap().contains(&endpoint) {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: 404,
            });
        }

        Ok(match request {
            FragmentRequest::Page => self.page.clone(),
            FragmentRequest::Row { pattern } => {
                let (class, inner) = match Variant::for_row_pattern(pattern) {
                    Variant::Full => ("npb-row-full", r#"<div class="npb-blocks-wrapper"></div>"#),
                    Variant::Special => (
                        "npb-row-special",
                        r#"<div class="npb-row-special-blocks"></div><div class="npb-row-special-section"></div>"#,
                    ),
                    Variant::Standard => ("npb-row-normal", ""),
                };
                format!(
                    r#"<div id="tpl-row" class="npb-row {}" data-pattern="{}">{}</div>"#,
                    class, pattern, inner
                )
            }
            FragmentRequest::Section { pattern, section_type } => format!(
                r#"<div id="tpl-section" class="npb-section npb-section-{}" data-pattern="{}"><div class="npb-blocks-wrapper"></div></div>"#,
                section_type.as_str(),
                pattern
            ),
            FragmentRequest::Block {
                pattern, iteration, ..
            } => format!(
                r#"<div id="tpl-block" class="npb-block" data-pattern="{}" data-settings="{{&quot;iteration&quot;:{}}}"></div>"#,
                pattern, iteration
            ),
            FragmentRequest::Picker { kind, .. } => {
                format!(r#"<div class="npb-fixed-modal" data-type="{}"></div>"#, kind)
            }
            FragmentRequest::Panel { panel_type, .. } => {
                format!(r#"<aside class="npb-panel npb-panel-{}"></aside>"#, panel_type.as_str())
            }
        })
    }
}

impl FragmentRenderer for FakeRenderer {
    fn fetch(&self, request: &FragmentRequest) -> impl Future<Output = Result<String, FetchError>> + Send {
        let result = self.render(request);
        async move { result }
    }
}
