//! HTTP transport
//!
//! `http(s)://` goes out through a blocking reqwest client. `file://` reads a
//! saved response frame from disk, which is handy for exercising the device
//! without a server.

use std::fs::File;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use inkwake_hal::{HttpClient, HttpResponse};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;

/// Streamed response body
pub enum SimBody {
    Remote(Response),
    File(File),
}

impl embedded_io::ErrorType for SimBody {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for SimBody {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let result = match self {
            SimBody::Remote(response) => io::Read::read(response, buf),
            SimBody::File(file) => io::Read::read(file, buf),
        };
        result.map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            _ => embedded_io::ErrorKind::Other,
        })
    }
}

pub struct SimHttp {
    client: Client,
}

impl SimHttp {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("inkwake-sim/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl HttpClient for SimHttp {
    type Body<'a> = SimBody where Self: 'a;
    type Error = anyhow::Error;

    fn post<'a>(
        &'a mut self,
        url: &str,
        payload: &[u8],
    ) -> Result<HttpResponse<Self::Body<'a>>, Self::Error> {
        if let Some(path) = url.strip_prefix("file://") {
            debug!("replaying {}", path);
            let file = File::open(path).with_context(|| format!("failed to open {path}"))?;
            return Ok(HttpResponse {
                status: 200,
                body: SimBody::File(file),
            });
        }

        debug!("POST {} ({} bytes)", url, payload.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload.to_vec())
            .send()
            .with_context(|| format!("POST {url} failed"))?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            body: SimBody::Remote(response),
        })
    }
}
