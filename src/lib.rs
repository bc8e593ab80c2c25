//! `routeforge`: the core of an HTTP request router — pattern compilation,
//! radix-style route indexing, and the method/path/flow-control dispatch
//! loop. Request parsing, response transmission, and everything else a
//! full web framework bolts on around a router are out of scope; see
//! `context::Request`/`context::Response` for the (intentionally thin)
//! shape those external collaborators present to this crate.

// Type aliases (must be declared before other modules that use it)
pub mod alias;
pub mod debug;

pub mod collection;
pub mod context;
pub mod error;
pub mod handler;
pub mod index;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod percent;
pub mod prefix;
pub mod route;
pub mod router;

// Re-export commonly used type aliases
pub use alias::{PMutex, PMutexGuard, PRwLock, PRwLockReadGuard, PRwLockWriteGuard};

pub use context::{DispatchContext, MatchedMethods, MatchedRoutes, Request, Response};
pub use error::{
    DispatchError, DispatchSignal, HttpError, HttpErrorCause, InvalidArgument,
    PatternCompilationError, RouteBuildError, RouteNotFound, UnhandledError,
};
pub use handler::{Handler, HandlerOutcome};
pub use route::{MethodFilter, Route};
pub use router::{AfterDispatchHook, ErrorHandler, HookOutcome, Router, UnknownErrorHandler, UnknownErrorOutcome}; 
