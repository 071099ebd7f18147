//! Authenticated HTTP client wrapper with bounded retry.

use crate::config::PackageManagerProperties;
use crate::core::{PackMgrError, PackMgrResult};
use crate::http::response::{html_reports_error, html_to_text, PACKAGE_MANAGER_ERROR_INDICATION};
use crate::http::retry::RetryPolicy;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Basic authentication credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// Executes requests against the package manager or Felix console
///
/// Each call owns its response for the duration of the call only; the body is
/// fully read (or the stream handed to the caller) before control returns.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    credentials: Option<Credentials>,
    retry: RetryPolicy,
}

impl Transport {
    /// Build a transport from the package manager properties
    pub fn new(props: &PackageManagerProperties, credentials: Option<Credentials>) -> PackMgrResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(props.http_connect_timeout_sec))
            .timeout(Duration::from_secs(props.http_socket_timeout_sec))
            .cookie_store(true)
            .danger_accept_invalid_certs(props.relaxed_ssl_check);

        for proxy in &props.proxies {
            let proxy_url = proxy.url();
            let matcher = proxy.clone();
            let mut reqwest_proxy = reqwest::Proxy::custom(move |url| {
                match url.host_str() {
                    Some(host) if matcher.is_non_proxy_host(host) => None,
                    _ => Some(proxy_url.clone()),
                }
            });
            if proxy.use_authentication() {
                reqwest_proxy = reqwest_proxy.basic_auth(
                    proxy.username.as_deref().unwrap_or_default(),
                    proxy.password.as_deref().unwrap_or_default(),
                );
            }
            debug!("Using HTTP proxy {}", proxy.url());
            builder = builder.proxy(reqwest_proxy);
        }

        let client = builder
            .build()
            .map_err(|e| PackMgrError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            retry: RetryPolicy::from_properties(props),
        })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client, credentials: Option<Credentials>, retry: RetryPolicy) -> Self {
        Self {
            client,
            credentials,
            retry,
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match self.credentials {
            Some(ref c) => request.basic_auth(&c.user, Some(&c.password)),
            None => request,
        }
    }

    /// Send a request, retrying network failures, 5xx and "still processing" statuses
    ///
    /// `build` is invoked once per attempt so that non-cloneable bodies
    /// (multipart forms) can be recreated. On success the response is handed
    /// back unread; on failure its body is read into the error.
    async fn send_with_retry<F>(&self, method: Method, url: &str, build: F) -> PackMgrResult<Response>
    where
        F: Fn(RequestBuilder) -> PackMgrResult<RequestBuilder>,
    {
        let mut attempt: u32 = 0;
        loop {
            debug!("Call URL: {} {}", method, url);
            let request = build(self.request(method.clone(), url))?;

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    PackMgrError::transport(url, status, &body)
                }
                Err(e) => match PackMgrError::from(e) {
                    PackMgrError::Network { message, .. } => PackMgrError::Network {
                        url: url.to_string(),
                        message,
                    },
                    other => other,
                },
            };

            if !error.is_retryable() || attempt >= self.retry.max_retries {
                return Err(error);
            }

            attempt += 1;
            let delay = self.retry.delay_for(attempt);
            info!("ERROR: {}", error);
            info!(
                "HTTP call failed, try again ({}/{}) after {} second(s)...",
                attempt,
                self.retry.max_retries,
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Execute a request and read the whole response
    pub async fn execute<F>(&self, method: Method, url: &str, build: F) -> PackMgrResult<HttpResponse>
    where
        F: Fn(RequestBuilder) -> PackMgrResult<RequestBuilder>,
    {
        let response = self.send_with_retry(method, url, build).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| PackMgrError::Network {
            url: url.to_string(),
            message: format!("Failed to read response body: {}", e),
        })?;
        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    /// Execute a request and parse the body as a JSON object
    pub async fn execute_json<F>(&self, method: Method, url: &str, build: F) -> PackMgrResult<Value>
    where
        F: Fn(RequestBuilder) -> PackMgrResult<RequestBuilder>,
    {
        let response = self.execute(method, url, build).await?;
        let text = response.text();
        debug!("Package manager response:\n{}", text);
        serde_json::from_str(&text).map_err(|e| {
            PackMgrError::parse(format!("JSON response from {}", url), format!("{}\n{}", e, text))
        })
    }

    /// Execute a request and return the body as text
    pub async fn execute_text<F>(&self, method: Method, url: &str, build: F) -> PackMgrResult<String>
    where
        F: Fn(RequestBuilder) -> PackMgrResult<RequestBuilder>,
    {
        let text = self.execute(method, url, build).await?.text();
        debug!("Package manager response:\n{}", text);
        Ok(text)
    }

    /// Execute a console command returning HTML and log its plain-text message
    ///
    /// Fails with an install error if the message reports a processing error.
    pub async fn execute_html_message<F>(&self, method: Method, url: &str, build: F) -> PackMgrResult<String>
    where
        F: Fn(RequestBuilder) -> PackMgrResult<RequestBuilder>,
    {
        let html = self.execute_text(method, url, build).await?;
        let message = html_to_text(&html);
        info!("{}", message.trim());
        if html_reports_error(&message) {
            return Err(PackMgrError::Install(format!(
                "Package installation failed: {}\n{}\n{}",
                PACKAGE_MANAGER_ERROR_INDICATION,
                url,
                message.trim()
            )));
        }
        Ok(message)
    }

    /// Start a streaming GET; the caller consumes the body
    pub async fn get_stream(&self, url: &str) -> PackMgrResult<Response> {
        self.send_with_retry(Method::GET, url, Ok).await
    }
}
