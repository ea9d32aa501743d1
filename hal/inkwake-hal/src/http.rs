//! HTTP transport abstraction
//!
//! The controller only ever POSTs a small payload and streams the reply, so
//! the trait is a single exchange returning a status code and a pull-based
//! body.

/// Reply to a request
#[derive(Debug)]
pub struct HttpResponse<B> {
    /// HTTP status code
    pub status: u16,
    /// Response body, read incrementally
    pub body: B,
}

impl<B> HttpResponse<B> {
    /// Whether the status is in the 2xx class
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP client
pub trait HttpClient {
    /// Streamed response body
    type Body<'a>: embedded_io::Read
    where
        Self: 'a;

    /// Transport-level failure (DNS, connect, TLS, timeout)
    type Error: core::fmt::Debug;

    /// POST `payload` to `url`
    ///
    /// A non-2xx status is not an error at this level.
    fn post<'a>(
        &'a mut self,
        url: &str,
        payload: &[u8],
    ) -> Result<HttpResponse<Self::Body<'a>>, Self::Error>;
}
