//! HTTP fetch host-service contracts and an in-memory adapter for tests.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use futures::{
    channel::oneshot,
    future::{FutureExt, Shared},
};

/// Object-safe boxed future used by [`HttpClient`].
pub type HttpFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Status and text body of a completed HTTP request.
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// `200 OK` with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Response with an arbitrary status and empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    /// Returns whether the status is in the `2xx` range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Host service for unauthenticated `GET` requests.
pub trait HttpClient {
    /// Issues a `GET` for `url`.
    ///
    /// Transport failures resolve to `Err`; any completed response (including non-2xx) resolves to
    /// `Ok`.
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a, Result<HttpResponse, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// HTTP client for targets without network access; every request fails.
pub struct NoopHttpClient;

impl HttpClient for NoopHttpClient {
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a, Result<HttpResponse, String>> {
        Box::pin(async move { Err(format!("network unavailable for {url}")) })
    }
}

type Gate = Shared<oneshot::Receiver<()>>;

#[derive(Clone, Default)]
/// In-memory HTTP client serving canned responses by exact URL and recording every request.
///
/// Unknown URLs resolve to a transport error. [`MemoryHttpClient::hold`] parks responses until
/// [`MemoryHttpClient::release`], like a slow network.
pub struct MemoryHttpClient {
    routes: Rc<RefCell<HashMap<String, Result<HttpResponse, String>>>>,
    requests: Rc<RefCell<Vec<String>>>,
    gate: Rc<RefCell<Option<Gate>>>,
    release: Rc<RefCell<Option<oneshot::Sender<()>>>>,
}

impl MemoryHttpClient {
    /// Serves `response` for `url`.
    pub fn respond(&self, url: impl Into<String>, response: HttpResponse) {
        self.routes.borrow_mut().insert(url.into(), Ok(response));
    }

    /// Fails requests to `url` with a transport error.
    pub fn fail(&self, url: impl Into<String>, error: impl Into<String>) {
        self.routes.borrow_mut().insert(url.into(), Err(error.into()));
    }

    /// Removes any canned response for `url`.
    pub fn forget(&self, url: &str) {
        self.routes.borrow_mut().remove(url);
    }

    /// Parks responses until [`MemoryHttpClient::release`] is called.
    pub fn hold(&self) {
        let (sender, receiver) = oneshot::channel();
        *self.gate.borrow_mut() = Some(receiver.shared());
        *self.release.borrow_mut() = Some(sender);
    }

    /// Delivers every parked response.
    pub fn release(&self) {
        self.gate.borrow_mut().take();
        if let Some(sender) = self.release.borrow_mut().take() {
            let _ = sender.send(());
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Number of requests issued for `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }
}

impl HttpClient for MemoryHttpClient {
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a, Result<HttpResponse, String>> {
        self.requests.borrow_mut().push(url.to_string());
        let gate = self.gate.borrow().clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.routes
                .borrow()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(format!("connection refused: {url}")))
        })
    }
}
