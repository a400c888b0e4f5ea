//! Logic errors raised by the shell core
//!
//! These are contract violations by a caller or by the window management
//! policy. They are propagated to whoever called the public [`Shell`] API and
//! never recovered from internally. Expected absence (an empty registry, a
//! session without surfaces) is modelled with `Option`, not with this type.
//!
//! [`Shell`]: crate::shell::Shell

use crate::session::SessionId;
use crate::surface::{SurfaceAttribute, SurfaceId};
use thiserror::Error;

pub type ShellResult<T> = std::result::Result<T, ShellError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("session {0} is not registered with the shell")]
    SessionNotRegistered(SessionId),

    #[error("session {0} is closing")]
    SessionClosing(SessionId),

    #[error("surface {surface} is not owned by session {session}")]
    SurfaceNotFound { session: SessionId, surface: SurfaceId },

    #[error("surface {surface} belongs to session {owner}, not session {session}")]
    SurfaceNotOwned {
        surface: SurfaceId,
        owner: SessionId,
        session: SessionId,
    },

    #[error("surface {0} was given without its session")]
    MissingSession(SurfaceId),

    #[error("window management policy returned without building the surface")]
    BuildNotInvoked,

    #[error("window management policy built the surface {0} times")]
    BuildInvokedRepeatedly(usize),

    #[error("invalid value {value} for surface attribute {attribute:?}")]
    InvalidAttributeValue { attribute: SurfaceAttribute, value: i32 },
}
