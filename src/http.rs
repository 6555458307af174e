//! Transport primitives shared by every outbound provider call.
//!
//! The module exposes [`RemoteHttpClient`] so downstream crates can plug custom HTTP stacks into
//! the engine. One transport powers everything: discovery fetches, OAuth 1.0 request-token calls,
//! authorization-code exchanges, JWKS refreshes, and authenticated resource requests. Handles
//! implement `oauth2`'s [`AsyncHttpClient`] so the same transport drives the token-exchange
//! facade without adapters.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::EndpointError};

/// Abstraction over HTTP transports capable of executing provider requests.
///
/// The trait is the engine's only dependency on an HTTP stack. Callers provide an implementation
/// (typically behind `Arc<T>` where `T: RemoteHttpClient`) and the engine requests short-lived
/// [`AsyncHttpClient`] handles per call. Implementations must be `Send + Sync + 'static` so one
/// client can be shared across concurrent flows, and the handles they return must own whatever
/// state is required so their request futures remain `Send` for the lifetime of the in-flight
/// operation.
pub trait RemoteHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle executing a single logical request sequence.
	///
	/// Each handle must satisfy `Send + Sync` so engine futures can hop executors without cloning
	/// transports unnecessarily, and the request future returned by [`AsyncHttpClient::call`]
	/// must also be `Send`.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a fresh [`AsyncHttpClient`] handle.
	fn handle(&self) -> Self::Handle;
}

/// Maps an [`HttpClientError`] emitted by any transport into the engine taxonomy.
///
/// Request-construction failures become [`ConfigError`](crate::error::ConfigError) values,
/// network/IO failures pass through as [`TransportError`](crate::error::TransportError), and
/// anything else surfaces as an [`EndpointError`].
pub fn map_http_client_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => crate::error::TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => crate::error::ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => crate::error::TransportError::Io(inner).into(),
		HttpClientError::Other(message) => EndpointError::Unexpected {
			message: format!("HTTP client error occurred while calling the provider: {message}"),
		}
		.into(),
		_ => EndpointError::Unexpected {
			message: "HTTP client error occurred while calling the provider.".into(),
		}
		.into(),
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token endpoints
/// return results directly instead of delegating to another URI. Configure any custom
/// [`ReqwestClient`] accordingly, because the engine passes this client into the `oauth2` crate
/// when it performs code exchanges.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RemoteHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`RemoteHttpClient::Handle`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
