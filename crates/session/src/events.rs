//! Session lifecycle events and navigation outcomes.

/// Where the UI shell should land after a session transition.
///
/// Callers already on the target surface treat the outcome as "stay".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Unauthenticated: show the login screen
    ToLogin,
    /// Authenticated: show the dashboard
    ToDashboard,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out
    UserRequested,
    /// A background refresh failed and the session could not be kept alive
    SessionExpired,
}

/// Lifecycle events published on the controller's watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionEvent {
    /// Process start; nothing adopted yet
    #[default]
    Idle,
    /// A session was established (login or bootstrap)
    LoggedIn,
    /// The session ended; `reason` distinguishes a user-requested logout
    /// from an expired session the UI should notify about
    LoggedOut { reason: LogoutReason },
}
