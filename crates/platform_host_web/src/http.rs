//! `fetch`-backed HTTP client for browser contexts.

use platform_host::{HttpClient, HttpFuture, HttpResponse};

#[derive(Debug, Clone, Copy, Default)]
/// Browser HTTP client issuing unauthenticated `GET` requests through `fetch`.
pub struct WebHttpClient;

impl HttpClient for WebHttpClient {
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a, Result<HttpResponse, String>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                let response = gloo_net::http::Request::get(url)
                    .send()
                    .await
                    .map_err(|err| format!("fetch {url} failed: {err}"))?;
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .map_err(|err| format!("reading body of {url} failed: {err}"))?;
                Ok(HttpResponse { status, body })
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                Err(format!(
                    "browser fetch is only available when compiled for wasm32: {url}"
                ))
            }
        })
    }
}
