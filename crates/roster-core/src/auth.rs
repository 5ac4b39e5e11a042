//! The authorization gate.
//!
//! Token verification happens upstream; by the time a request reaches the
//! store, its verified identity (if any) travels inside a [`RequestContext`]
//! as an [`Authenticator`]. The store resolves it through
//! [`require_authentication`] before touching any row.

use std::{
  fmt,
  sync::Arc,
  time::{Duration, Instant},
};

use crate::{Error, Result};

/// A verified caller, as produced by whatever verified the request's token.
pub trait Authenticator: Send + Sync {
  /// The caller's opaque authentication id, or `None` if verification did
  /// not yield one.
  fn auth_id(&self) -> Option<&str>;
}

/// An authenticator for an identity that is already known, e.g. one taken
/// from trusted configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAuthenticator {
  auth_id: Option<String>,
}

impl StaticAuthenticator {
  pub fn new(auth_id: impl Into<String>) -> Self {
    Self { auth_id: Some(auth_id.into()) }
  }

  /// An authenticator that ran but could not establish an identity.
  pub fn anonymous() -> Self { Self { auth_id: None } }
}

impl Authenticator for StaticAuthenticator {
  fn auth_id(&self) -> Option<&str> { self.auth_id.as_deref() }
}

/// Request-scoped state bound to a store for the lifetime of one call.
#[derive(Clone, Default)]
pub struct RequestContext {
  authenticator: Option<Arc<dyn Authenticator>>,
  deadline:      Option<Instant>,
}

impl RequestContext {
  /// A context with no authenticator attached.
  pub fn new() -> Self { Self::default() }

  pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
    self.authenticator = Some(Arc::new(authenticator));
    self
  }

  /// Shorthand for a context authenticated as `auth_id`.
  pub fn authenticated(auth_id: impl Into<String>) -> Self {
    Self::new().with_authenticator(StaticAuthenticator::new(auth_id))
  }

  pub fn with_deadline(mut self, deadline: Instant) -> Self {
    self.deadline = Some(deadline);
    self
  }

  pub fn with_timeout(self, timeout: Duration) -> Self {
    self.with_deadline(Instant::now() + timeout)
  }

  pub fn authenticator(&self) -> Option<&dyn Authenticator> { self.authenticator.as_deref() }

  pub fn deadline(&self) -> Option<Instant> { self.deadline }

  /// True once the deadline, if any, has passed.
  pub fn is_expired(&self) -> bool { self.deadline.is_some_and(|d| Instant::now() >= d) }
}

impl fmt::Debug for RequestContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RequestContext")
      .field("authenticated", &self.authenticator.is_some())
      .field("deadline", &self.deadline)
      .finish()
  }
}

/// Resolve the caller's authentication id.
///
/// A missing context means the store was never bound to a request, which is
/// a server misconfiguration rather than a client fault.
pub fn require_authentication(ctx: Option<&RequestContext>) -> Result<String> {
  let ctx =
    ctx.ok_or_else(|| Error::Authorization("required context not found".into()))?;

  ctx
    .authenticator()
    .and_then(|a| a.auth_id())
    .filter(|id| !id.is_empty())
    .map(str::to_owned)
    .ok_or_else(|| Error::Forbidden("request is not authorized".into()))
}
