//! Transport seam for generated bindings.
//!
//! The codec performs no I/O. Generated clients hand encoded arguments to an
//! [`Agent`], which delivers them and returns the raw reply bytes.

use crate::error::Error;
use crate::principal::Principal;
use crate::types::FuncMode;

/// How a method is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallMode {
    /// State-changing call.
    Update,
    /// Read-only call.
    Query,
    /// Call without a reply.
    Oneway,
    /// Read-only call that may call other queries.
    CompositeQuery,
}

impl CallMode {
    /// Derives the call mode from function annotations.
    #[must_use]
    pub fn from_modes(modes: &[FuncMode]) -> Self {
        if modes.contains(&FuncMode::Oneway) {
            Self::Oneway
        } else if modes.contains(&FuncMode::CompositeQuery) {
            Self::CompositeQuery
        } else if modes.contains(&FuncMode::Query) {
            Self::Query
        } else {
            Self::Update
        }
    }

    /// Returns true for calls that produce no reply.
    #[must_use]
    pub const fn is_oneway(self) -> bool {
        matches!(self, Self::Oneway)
    }
}

/// Delivers encoded calls to a service.
pub trait Agent {
    /// Transport failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends `args` to `method` of `destination` and returns the reply bytes.
    ///
    /// For [`CallMode::Oneway`] the returned bytes are ignored.
    ///
    /// # Errors
    /// Returns the transport's error.
    fn call(
        &self,
        destination: &Principal,
        method: &str,
        mode: CallMode,
        args: Vec<u8>,
    ) -> Result<Vec<u8>, Self::Error>;
}

/// Failure of a generated binding call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The agent failed to deliver the call.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Arguments or reply failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] Error),
}

impl CallError {
    /// Wraps a transport error.
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(error))
    }
}
