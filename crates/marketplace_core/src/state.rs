use crate::view_model::AppViewModel;
use crate::{gate, AuthTicket, PortfolioPost, Route, Session, SessionMachine, SessionPhase, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading,
    Refreshing,
    Ready,
    Failed,
}

impl FeedStatus {
    pub fn is_busy(self) -> bool {
        matches!(self, FeedStatus::Loading | FeedStatus::Refreshing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    session: SessionMachine,
    route: Route,
    feed_status: FeedStatus,
    posts: Vec<PortfolioPost>,
    error: Option<String>,
    auth_pending: bool,
    tick: u64,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: SessionMachine::new(),
            route: Route::Auth,
            feed_status: FeedStatus::Idle,
            posts: Vec::new(),
            error: None,
            auth_pending: false,
            tick: 0,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            screen: gate::resolve(self.session.phase(), &self.route),
            session: self.session.phase().clone(),
            feed_status: self.feed_status,
            posts: self.posts.clone(),
            error: self.error.clone(),
            auth_pending: self.auth_pending,
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        self.session.phase()
    }

    pub fn requested_route(&self) -> &Route {
        &self.route
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub(crate) fn is_signed_in(&self) -> bool {
        self.session.phase().is_signed_in()
    }

    pub(crate) fn resolve_initial(&mut self, session: Option<Session>) -> bool {
        let transition = self.session.resolve_initial(session);
        self.after_transition(transition)
    }

    pub(crate) fn begin_auth(&mut self) -> AuthTicket {
        self.auth_pending = true;
        self.error = None;
        self.mark_dirty();
        self.session.begin_auth()
    }

    /// Returns true when the session entered `SignedIn`.
    pub(crate) fn complete_auth(&mut self, ticket: AuthTicket, session: Session) -> bool {
        if !self.session.is_current(ticket) {
            return false;
        }
        self.auth_pending = false;
        self.mark_dirty();
        let transition = self.session.complete_auth(ticket, session);
        self.after_transition(transition)
    }

    pub(crate) fn fail_auth(&mut self, ticket: AuthTicket, message: String) {
        if !self.session.is_current(ticket) {
            return;
        }
        self.auth_pending = false;
        self.set_error(message);
    }

    pub(crate) fn sign_out(&mut self) -> bool {
        let transition = self.session.sign_out();
        self.auth_pending = false;
        self.mark_dirty();
        self.after_transition(transition)
    }

    pub(crate) fn invalidate(&mut self, message: String) -> bool {
        let transition = self.session.invalidate();
        self.auth_pending = false;
        let changed = self.after_transition(transition);
        if changed {
            self.set_error(message);
        }
        changed
    }

    pub(crate) fn navigate(&mut self, route: Route) {
        if self.route != route {
            self.route = route;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_feed_status(&mut self, status: FeedStatus) {
        if self.feed_status != status {
            self.feed_status = status;
            self.mark_dirty();
        }
    }

    pub(crate) fn feed_status(&self) -> FeedStatus {
        self.feed_status
    }

    pub(crate) fn replace_posts(&mut self, posts: Vec<PortfolioPost>) {
        self.posts = posts;
        self.feed_status = FeedStatus::Ready;
        self.mark_dirty();
    }

    pub(crate) fn update_post(&mut self, post: PortfolioPost) {
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == post.id) {
            if *slot != post {
                *slot = post;
                self.mark_dirty();
            }
        }
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.mark_dirty();
        }
    }

    /// Resets per-session state on a phase change. Returns true when the
    /// new phase is `SignedIn`.
    fn after_transition(&mut self, transition: Transition) -> bool {
        let Transition::Changed(phase) = transition else {
            return false;
        };
        self.mark_dirty();
        self.posts.clear();
        self.feed_status = FeedStatus::Idle;
        match phase {
            SessionPhase::SignedIn(_) => {
                self.route = Route::HOME;
                true
            }
            SessionPhase::SignedOut | SessionPhase::Unknown => {
                self.route = Route::Auth;
                false
            }
        }
    }
}
