//! Error taxonomy for the router core.
//!
//! Hand-rolled error enums throughout: no `thiserror`, no `anyhow`, just
//! `Display` + `std::error::Error` and a couple of `From` conversions for
//! the error kinds that wrap an underlying engine error.

use std::fmt;

/// Raised when a route pattern fails to compile, or when the engine itself
/// rejects the compiled regex during the construction-time validation probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCompilationError {
    /// The namespace the pattern was compiled under (empty if none).
    pub namespace: String,
    /// The original, unmodified pattern string supplied by the caller.
    pub pattern: String,
    /// The underlying regex engine's message.
    pub message: String,
}

impl fmt::Display for PatternCompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "failed to compile pattern '{}': {}", self.pattern, self.message)
        } else {
            write!(
                f,
                "failed to compile pattern '{}' (namespace '{}'): {}",
                self.pattern, self.namespace, self.message
            )
        }
    }
}

impl std::error::Error for PatternCompilationError {}

/// Raised at registration time: a handler is not invocable (caught by the
/// type system in this crate, so this really only fires for method names),
/// or a method name is not one of the nine canonical HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    UnknownMethod(String),
    EmptyPattern,
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidArgument::UnknownMethod(m) => write!(f, "'{}' is not a canonical HTTP method", m),
            InvalidArgument::EmptyPattern => write!(f, "route pattern must not be empty"),
        }
    }
}

impl std::error::Error for InvalidArgument {}

/// Everything that can go wrong while building a single `Route`: either
/// its pattern failed to compile, or one of its declared methods/arguments
/// was invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteBuildError {
    Pattern(PatternCompilationError),
    Argument(InvalidArgument),
}

impl fmt::Display for RouteBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteBuildError::Pattern(e) => write!(f, "{}", e),
            RouteBuildError::Argument(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RouteBuildError {}

impl From<PatternCompilationError> for RouteBuildError {
    fn from(e: PatternCompilationError) -> Self {
        RouteBuildError::Pattern(e)
    }
}

impl From<InvalidArgument> for RouteBuildError {
    fn from(e: InvalidArgument) -> Self {
        RouteBuildError::Argument(e)
    }
}

/// An HTTP-level failure: a status code the dispatcher (or a handler via
/// `DispatchSignal::Abort(Some(code))`) wants surfaced to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpError(pub u16);

impl HttpError {
    pub const NOT_FOUND: HttpError = HttpError(404);
    pub const METHOD_NOT_ALLOWED: HttpError = HttpError(405);

    pub fn code(self) -> u16 {
        self.0
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP error {}", self.0)
    }
}

impl std::error::Error for HttpError {}

/// Raised by reverse routing when no route was ever registered under the
/// requested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNotFound(pub String);

impl fmt::Display for RouteNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no route registered under name '{}'", self.0)
    }
}

impl std::error::Error for RouteNotFound {}

/// What triggered a given HTTP-error dispatch: fed to HTTP-error handlers
/// alongside the numeric code so they can distinguish "nothing matched"
/// from "a handler asked for this explicitly" without string-matching a
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorCause {
    /// No countable route matched the request path at all.
    NotFound,
    /// At least one route matched path-wise but none matched the method.
    MethodNotAllowed,
    /// A handler raised `abort(code)`.
    Aborted,
}

/// The three named exits a handler can take from the dispatch loop, plus a
/// bare `abort`. These are *not* errors: they are typed control signals,
/// threaded back to the dispatcher through `Result::Err` so the non-error
/// control flow reads as ordinary `?`-propagation instead of exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSignal {
    /// Abandon this route's contribution; continue with the next.
    SkipThis,
    /// Skip the next `n` candidate routes after this one.
    SkipNext(usize),
    /// Stop the dispatch loop entirely.
    SkipRemaining,
    /// Raise an HTTP error of the given code, or a generic dispatch halt if
    /// no code is given.
    Abort(Option<u16>),
}

/// Any other exception that escaped a handler and that no error-callback
/// chain handled. The dispatcher sets the response code to 500 and
/// re-raises this to the caller of dispatch.
#[derive(Debug)]
pub struct UnhandledError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UnhandledError {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(source: E) -> Self {
        UnhandledError {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn msg<S: Into<String>>(message: S) -> Self {
        UnhandledError { message: message.into(), source: None }
    }
}

impl fmt::Display for UnhandledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unhandled error: {}", self.message)
    }
}

impl std::error::Error for UnhandledError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Top-level error returned by a single dispatch pass, after flow-control
/// signals have been fully absorbed internally: a halt signal never
/// surfaces past dispatch as an error in its own right.
#[derive(Debug)]
pub enum DispatchError {
    Http(HttpError),
    Unhandled(UnhandledError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Http(e) => write!(f, "{}", e),
            DispatchError::Unhandled(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Http(e) => Some(e),
            DispatchError::Unhandled(e) => Some(e),
        }
    }
}

impl From<HttpError> for DispatchError {
    fn from(e: HttpError) -> Self {
        DispatchError::Http(e)
    }
}

impl From<UnhandledError> for DispatchError {
    fn from(e: UnhandledError) -> Self {
        DispatchError::Unhandled(e)
    }
}
