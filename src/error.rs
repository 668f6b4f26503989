use std::fmt;

/// Control-plane and endpoint-level errors. Per-packet decode failures stay
/// local to the codec/reflector/sender (logged, never propagated here) —
/// see §7 of the design notes for the split.
#[derive(Debug)]
pub enum TwampError {
    /// Server-Greeting did not advertise the unauthenticated mode bit.
    UnsupportedMode,
    /// Server-Start or Accept-Session carried a non-zero accept code.
    ServerRejected(u8),
    /// The control TCP stream closed or errored mid-session.
    ControlLinkBroken,
    /// The UDP or TCP endpoint could not be bound.
    BindFailure(std::io::Error),
    /// A socket option (currently only do-not-fragment) has no equivalent
    /// on this platform.
    PlatformUnsupported(&'static str),
    /// The role's running flag was cleared by the signal handler.
    Signalled,
}

impl fmt::Display for TwampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedMode => {
                write!(f, "server does not advertise unauthenticated mode")
            }
            Self::ServerRejected(code) => write!(f, "server rejected session (code {code})"),
            Self::ControlLinkBroken => write!(f, "control channel closed or errored"),
            Self::BindFailure(e) => write!(f, "failed to bind endpoint: {e}"),
            Self::PlatformUnsupported(what) => {
                write!(f, "{what} is not supported on this platform")
            }
            Self::Signalled => write!(f, "interrupted by signal"),
        }
    }
}

impl std::error::Error for TwampError {}
