use crate::{AuthTicket, Credentials, PostId, SignUpRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ResolveSession,
    SignIn {
        ticket: AuthTicket,
        credentials: Credentials,
    },
    SignUp {
        ticket: AuthTicket,
        request: SignUpRequest,
    },
    /// Local state is already cleared; this revokes the remote token.
    SignOut,
    LoadFeed,
    RefreshFeed,
    Like { post_id: PostId },
    Comment { post_id: PostId, body: String },
    Share { post_id: PostId },
}
