use async_trait::async_trait;
use haven_core::{
    Credentials, FetchOptions, Network, NetworkError, Opaque, Payload, RequestDescriptor,
    RequestMode, Response, ResponseType,
};
use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};
use reqwest::Client;
use url::Url;

/// Network transport over a [`reqwest::Client`].
///
/// `origin` is the application origin; it decides whether a response is
/// `basic`, `cors` or opaque, and whether credentials are sent under
/// [`Credentials::SameOrigin`].
///
/// Cloning is cheap; clones share the client's connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestNetwork {
    client: Client,
    origin: Url,
}

impl ReqwestNetwork {
    /// Creates a transport with a default client.
    pub fn new(origin: Url) -> Self {
        Self::with_client(Client::new(), origin)
    }

    /// Creates a transport over an existing client.
    pub fn with_client(client: Client, origin: Url) -> Self {
        Self { client, origin }
    }

    /// The application origin.
    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

fn outgoing_headers(request: &RequestDescriptor, send_credentials: bool) -> HeaderMap {
    let mut headers = request.headers().clone();
    if !send_credentials {
        headers.remove(COOKIE);
        headers.remove(AUTHORIZATION);
    }
    headers
}

fn map_error(error: reqwest::Error) -> NetworkError {
    if error.is_connect() || error.is_timeout() {
        NetworkError::Unreachable(error.to_string())
    } else if error.is_builder() {
        NetworkError::InvalidRequest(error.to_string())
    } else {
        NetworkError::Transport(Box::new(error))
    }
}

#[async_trait]
impl Network for ReqwestNetwork {
    async fn fetch(
        &self,
        request: &RequestDescriptor,
        options: FetchOptions,
    ) -> Result<Response, NetworkError> {
        let same_origin = request.is_same_origin(&self.origin);
        if options.mode == RequestMode::SameOrigin && !same_origin {
            return Err(NetworkError::InvalidRequest(format!(
                "same-origin fetch to {}",
                request.url()
            )));
        }

        let send_credentials = match options.credentials {
            Credentials::Omit => false,
            Credentials::SameOrigin => same_origin,
            Credentials::Include => true,
        };

        let response = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(outgoing_headers(request, send_credentials))
            .send()
            .await
            .map_err(map_error)?;

        let redirected = response.url() != request.url();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_error)?;

        tracing::debug!(
            url = %request.url(),
            mode = %options.mode,
            status = status.as_u16(),
            redirected,
            "fetched"
        );

        if options.mode == RequestMode::NoCors && !same_origin {
            return Ok(Response::Opaque(Opaque::new(body)));
        }

        let response_type = if same_origin {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        };
        Ok(Payload::new(status, body)
            .with_headers(headers)
            .with_type(response_type)
            .with_redirected(redirected)
            .into())
    }
}
