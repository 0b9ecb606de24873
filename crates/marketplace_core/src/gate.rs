//! Navigation gate: which screen may be shown for a session phase.

use crate::{Route, SessionPhase};

/// Outcome of gating a requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session not resolved yet; render nothing.
    Suspended,
    Show(Route),
    Redirect { requested: Route, to: Route },
}

impl Navigation {
    /// The screen to mount, if any.
    pub fn screen(&self) -> Option<&Route> {
        match self {
            Navigation::Suspended => None,
            Navigation::Show(route) | Navigation::Redirect { to: route, .. } => Some(route),
        }
    }
}

/// Pure and deterministic for a given `(phase, requested)`.
pub fn resolve(phase: &SessionPhase, requested: &Route) -> Navigation {
    match phase {
        SessionPhase::Unknown => Navigation::Suspended,
        SessionPhase::SignedOut if requested.requires_session() => Navigation::Redirect {
            requested: requested.clone(),
            to: Route::Auth,
        },
        SessionPhase::SignedIn(_) if !requested.requires_session() => Navigation::Redirect {
            requested: requested.clone(),
            to: Route::HOME,
        },
        SessionPhase::SignedOut | SessionPhase::SignedIn(_) => Navigation::Show(requested.clone()),
    }
}

pub fn is_reachable(phase: &SessionPhase, route: &Route) -> bool {
    match phase {
        SessionPhase::Unknown => false,
        SessionPhase::SignedOut => !route.requires_session(),
        SessionPhase::SignedIn(_) => route.requires_session(),
    }
}
