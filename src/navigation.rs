//! Navigation hook invoked when the session ends.

/// Options passed alongside a navigation target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigateOptions {
	/// Replace the current history entry instead of pushing a new one.
	pub replace: bool,
}
impl NavigateOptions {
	/// Options that replace the current history entry.
	pub const REPLACE: Self = Self { replace: true };
}

/// Routes the embedding application to a view, typically the login screen.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to `path`.
	fn navigate(&self, path: &str, options: NavigateOptions);
}
impl<F> Navigator for F
where
	F: Fn(&str, NavigateOptions) + Send + Sync,
{
	fn navigate(&self, path: &str, options: NavigateOptions) {
		self(path, options)
	}
}

/// Navigator that ignores every request, for headless embeddings.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn navigate(&self, _: &str, _: NavigateOptions) {}
}
