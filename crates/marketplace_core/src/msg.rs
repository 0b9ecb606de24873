use crate::{AuthError, AuthTicket, PortfolioPost, PostId, Role, Route, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// App launched; the stored session has not been checked yet.
    AppStarted,
    /// Startup session check finished.
    SessionResolved(Option<Session>),
    /// User submitted the sign-in form.
    SignInSubmitted { email: String, password: String },
    /// User submitted the sign-up form.
    SignUpSubmitted {
        name: String,
        email: String,
        password: String,
        role: Role,
    },
    /// Auth provider accepted a sign-in or sign-up.
    AuthSucceeded { ticket: AuthTicket, session: Session },
    /// Auth provider rejected a sign-in or sign-up.
    AuthFailed { ticket: AuthTicket, error: AuthError },
    /// User tapped Sign out.
    SignOutClicked,
    /// Backend reported the session token as no longer valid.
    TokenInvalidated,
    /// User or deep link requested a screen.
    Navigate(Route),
    /// Feed load or refresh finished with a full batch.
    FeedLoaded(Vec<PortfolioPost>),
    /// Feed load or refresh failed; the previous posts stay visible.
    FeedFailed { reason: String },
    /// User pulled the feed to refresh.
    PullToRefresh,
    /// A cached post changed (optimistic delta or rollback).
    PostUpdated(PortfolioPost),
    LikeTapped(PostId),
    CommentSubmitted { post_id: PostId, body: String },
    ShareTapped(PostId),
    /// An optimistic interaction was rolled back.
    InteractionFailed { post_id: PostId, reason: String },
    /// User dismissed the error banner.
    DismissError,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
