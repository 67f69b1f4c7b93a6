// crates.io
use tracing::{Span, instrument::Instrumented, span::EnteredSpan};
// self
use crate::{_prelude::*, obs::FlowKind};

/// Future wrapped in a flow span.
pub type InstrumentedFlow<F> = Instrumented<F>;

/// A span builder used by session flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind and stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		let span = tracing::info_span!("bearer_session.flow", flow = kind.as_str(), stage);

		Self { span }
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> FlowSpanGuard {
		FlowSpanGuard { _guard: self.span.entered() }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

/// RAII guard returned by [`FlowSpan::entered`].
pub struct FlowSpanGuard {
	_guard: EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}
