// self
use crate::{
	_prelude::*,
	obs::{CacheEvent, FlowStep},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by protocol steps.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided protocol step.
	pub fn new(step: FlowStep) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("okta_pkce_broker.flow", step = step.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = step;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug` event describing cache activity for `key`.
pub fn trace_cache_event(event: CacheEvent, key: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(event = event.as_str(), key, "okta_pkce_broker.cache");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, key);
	}
}

/// Emits a `warn` event when a protocol step fails; the error never carries secrets.
pub fn trace_step_failure(step: FlowStep, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(step = step.as_str(), error = %error, "Okta protocol step failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (step, error);
	}
}
