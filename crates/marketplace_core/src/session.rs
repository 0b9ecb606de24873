//! Session lifecycle as an explicit three-state machine.
//!
//! `Unknown` is left exactly once, when the startup session check resolves
//! or an earlier auth attempt completes. Every sign-out bumps an epoch so
//! that auth completions started before it are recognised as stale.

use crate::Session;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Unknown,
    SignedOut,
    SignedIn(Session),
}

impl SessionPhase {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionPhase::SignedIn(session) => Some(session),
            SessionPhase::Unknown | SessionPhase::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionPhase::SignedIn(_))
    }
}

/// Correlates an auth completion with the epoch it was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTicket {
    epoch: u64,
}

impl AuthTicket {
    pub fn epoch(self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The phase changed; carries the new phase.
    Changed(SessionPhase),
    /// Accepted, but the phase is what it already was.
    Unchanged,
    /// A completion arrived for an epoch that has since ended.
    Discarded,
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Transition::Changed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionMachine {
    phase: SessionPhase,
    epoch: u64,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Applies the startup session check. Ignored once the phase is known.
    pub fn resolve_initial(&mut self, session: Option<Session>) -> Transition {
        if self.phase != SessionPhase::Unknown {
            return Transition::Unchanged;
        }
        let next = match session {
            Some(session) => SessionPhase::SignedIn(session),
            None => SessionPhase::SignedOut,
        };
        self.set(next)
    }

    pub fn begin_auth(&self) -> AuthTicket {
        AuthTicket { epoch: self.epoch }
    }

    /// Accepts a successful sign-in/sign-up unless a sign-out happened since `ticket` was issued.
    pub fn complete_auth(&mut self, ticket: AuthTicket, session: Session) -> Transition {
        if ticket.epoch != self.epoch {
            return Transition::Discarded;
        }
        self.set(SessionPhase::SignedIn(session))
    }

    /// Whether a failure for `ticket` still belongs to the current epoch.
    pub fn is_current(&self, ticket: AuthTicket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Local sign-out. Always succeeds and invalidates outstanding tickets.
    pub fn sign_out(&mut self) -> Transition {
        self.epoch += 1;
        match self.phase {
            SessionPhase::SignedIn(_) => self.set(SessionPhase::SignedOut),
            SessionPhase::Unknown | SessionPhase::SignedOut => Transition::Unchanged,
        }
    }

    /// The remote side declared the token dead.
    pub fn invalidate(&mut self) -> Transition {
        self.sign_out()
    }

    fn set(&mut self, next: SessionPhase) -> Transition {
        if self.phase == next {
            return Transition::Unchanged;
        }
        self.phase = next.clone();
        Transition::Changed(next)
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionMachine, SessionPhase, Transition};
    use crate::{Role, Session, UserId};

    fn session(id: &str) -> Session {
        Session::new(UserId::new(id), Role::Customer)
    }

    #[test]
    fn initial_resolution_happens_once() {
        let mut machine = SessionMachine::new();
        assert_eq!(machine.phase(), &SessionPhase::Unknown);

        let first = machine.resolve_initial(None);
        assert_eq!(first, Transition::Changed(SessionPhase::SignedOut));

        let second = machine.resolve_initial(Some(session("u1")));
        assert_eq!(second, Transition::Unchanged);
        assert_eq!(machine.phase(), &SessionPhase::SignedOut);
    }

    #[test]
    fn sign_out_discards_in_flight_sign_in() {
        let mut machine = SessionMachine::new();
        machine.resolve_initial(None);

        let ticket = machine.begin_auth();
        machine.sign_out();
        let late = machine.complete_auth(ticket, session("u1"));

        assert_eq!(late, Transition::Discarded);
        assert_eq!(machine.phase(), &SessionPhase::SignedOut);
        assert!(!machine.is_current(ticket));
    }

    #[test]
    fn ticket_issued_after_sign_out_is_accepted() {
        let mut machine = SessionMachine::new();
        machine.resolve_initial(Some(session("u1")));
        assert!(machine.sign_out().is_changed());

        let ticket = machine.begin_auth();
        let accepted = machine.complete_auth(ticket, session("u2"));
        assert_eq!(
            accepted,
            Transition::Changed(SessionPhase::SignedIn(session("u2")))
        );
    }

    #[test]
    fn auth_completion_leaves_unknown_and_blocks_late_startup_check() {
        let mut machine = SessionMachine::new();
        let ticket = machine.begin_auth();
        machine.complete_auth(ticket, session("u1"));

        assert_eq!(machine.resolve_initial(None), Transition::Unchanged);
        assert!(machine.phase().is_signed_in());
    }
}
