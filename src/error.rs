//! Broker-level error types shared across the protocol, the cache, and configuration.

// self
use crate::{_prelude::*, auth::CacheKey, obs::FlowStep};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts, unreadable bodies).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Okta rejected the credentials or the session.
	#[error("Okta rejected the {step} step: {reason}.")]
	Authentication {
		/// Step that observed the rejection.
		step: FlowStep,
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
	/// A well-formed response lacked an expected field or element.
	#[error("Okta {step} response violated the protocol: {reason}.")]
	Protocol {
		/// Step that observed the violation.
		step: FlowStep,
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
	/// Token load failed inside the cache; every concurrent waiter receives the same source.
	#[error("Token load for cache key `{key}` failed.")]
	CacheLoad {
		/// Cache key whose load failed.
		key: CacheKey,
		/// Failure raised by the loader, shared across waiters.
		#[source]
		source: Arc<Error>,
	},
	/// The caller cancelled the request before it completed.
	#[error("Token request was cancelled.")]
	Cancelled,
}
impl Error {
	/// Returns the originating error, unwrapping any [`Error::CacheLoad`] layers.
	pub fn root(&self) -> &Error {
		match self {
			Error::CacheLoad { source, .. } => source.root(),
			other => other,
		}
	}

	/// Returns the protocol step that failed, when the error carries one.
	pub fn step(&self) -> Option<FlowStep> {
		match self.root() {
			Error::Authentication { step, .. } | Error::Protocol { step, .. } => Some(*step),
			Error::Transport(err) => err.step(),
			_ => None,
		}
	}

	pub(crate) fn authentication(step: FlowStep, reason: impl Into<String>) -> Self {
		Self::Authentication { step, reason: reason.into() }
	}

	pub(crate) fn protocol(step: FlowStep, reason: impl Into<String>) -> Self {
		Self::Protocol { step, reason: reason.into() }
	}
}

/// Configuration and validation failures raised while wiring the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A required builder field was not supplied.
	#[error("Configuration is missing the `{field}` field.")]
	MissingField {
		/// Builder field name.
		field: &'static str,
	},
	/// Identity zone or client identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Okta base URL cannot host the derived endpoints.
	#[error("Okta base URL `{url}` cannot be used as an endpoint base.")]
	InvalidBaseUrl {
		/// Rejected URL.
		url: String,
	},
	/// Endpoint URL uses a scheme other than HTTPS.
	#[error("The {endpoint} URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which URL failed validation.
		endpoint: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// Duration-valued settings must be positive.
	#[error("The `{field}` duration must be positive.")]
	NonPositiveDuration {
		/// Builder field name.
		field: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, unreadable responses).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred during the {step} step.")]
	Network {
		/// Step whose round trip failed.
		step: FlowStep,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The round trip exceeded its timeout.
	#[error("The {step} step timed out.")]
	Timeout {
		/// Step whose round trip timed out.
		step: FlowStep,
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during the {step} step.")]
	Io {
		/// Step whose round trip failed.
		step: FlowStep,
		/// IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Response body could not be parsed as the expected JSON document.
	#[error("The {step} step returned a malformed response body.")]
	MalformedBody {
		/// Step whose response failed to parse.
		step: FlowStep,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Okta answered with a server-side failure status.
	#[error("The {step} step returned HTTP {status}.")]
	UnexpectedStatus {
		/// Step whose response carried the status.
		step: FlowStep,
		/// HTTP status code.
		status: u16,
	},
	/// The transport failed without a more specific classification.
	#[error("HTTP client error occurred during the {step} step: {message}.")]
	Other {
		/// Step whose round trip failed.
		step: FlowStep,
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(step: FlowStep, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { step, source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(step: FlowStep, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { step, source: Box::new(src) }
	}

	/// Returns the step whose round trip failed.
	pub fn step(&self) -> Option<FlowStep> {
		match self {
			Self::Network { step, .. }
			| Self::Timeout { step, .. }
			| Self::Io { step, .. }
			| Self::MalformedBody { step, .. }
			| Self::UnexpectedStatus { step, .. }
			| Self::Other { step, .. } => Some(*step),
		}
	}
}
