//! Fragment renderer over HTTP: every request is a form-encoded POST to
//! `<base>/neo-page-builder/<endpoint>`.

use crate::errors::FetchError;
use crate::synchronizer::{FragmentRenderer, FragmentRequest};
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpFragmentRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFragmentRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, request: &FragmentRequest) -> String {
        format!(
            "{}/neo-page-builder/{}",
            self.base_url.trim_end_matches('/'),
            request.endpoint()
        )
    }
}

impl FragmentRenderer for HttpFragmentRenderer {
    fn fetch(&self, request: &FragmentRequest) -> impl Future<Output = Result<String, FetchError>> + Send {
        let url = self.url_for(request);
        let form = request.form();
        let endpoint = request.endpoint();
        let client = self.client.clone();

        async move {
            debug!(%url, "Fetching fragment");
            let response = client
                .post(&url)
                .form(&form)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                });
            }

            response
                .text()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let renderer = HttpFragmentRenderer::new("http://cms.local/");
        assert_eq!(
            renderer.url_for(&FragmentRequest::Page),
            "http://cms.local/neo-page-builder/page"
        );
        assert_eq!(
            renderer.url_for(&FragmentRequest::Picker {
                kind: npb_tree::NodeKind::Row,
                is_special: None,
            }),
            "http://cms.local/neo-page-builder/fixed-modal"
        );
    }
}
