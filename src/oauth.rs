//! Transport error mapping plus the request and response helpers shared by the flow steps.

pub use oauth2;

// crates.io
use oauth2::{HttpClientError, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::TokenHttpClient,
	obs::FlowStep,
};

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while running `step` into a broker error.
	fn map_transport_error(&self, step: FlowStep, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, step: FlowStep, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(step, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(source) => TransportError::Io { step, source }.into(),
			HttpClientError::Other(message) => TransportError::Other { step, message }.into(),
			_ => TransportError::Other { step, message: "unclassified transport failure".into() }
				.into(),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(step: FlowStep, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::timeout(step, err).into();
	}

	TransportError::network(step, err).into()
}

/// Executes `request` through the transport and maps transport failures for `step`.
pub(crate) async fn send<C, M>(
	client: &C,
	mapper: &M,
	step: FlowStep,
	request: HttpRequest,
) -> Result<HttpResponse>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client.execute(request).await.map_err(|err| mapper.map_transport_error(step, err))
}

/// Deserializes a JSON body, reporting the failing path on error.
pub(crate) fn parse_json<T>(step: FlowStep, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransportError::MalformedBody { step, source }.into())
}

/// Returns `Err(Transport(UnexpectedStatus))` when the response carries a `5xx` status.
pub(crate) fn reject_server_error(step: FlowStep, response: &HttpResponse) -> Result<()> {
	let status = response.status();

	if status.is_server_error() {
		return Err(TransportError::UnexpectedStatus { step, status: status.as_u16() }.into());
	}

	Ok(())
}
