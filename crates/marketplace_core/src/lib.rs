//! Marketplace core: pure session/navigation state machine and view-model helpers.
mod effect;
mod error;
mod gate;
mod model;
mod msg;
mod route;
mod session;
mod state;
mod update;
mod validate;
mod view_model;

pub use effect::Effect;
pub use error::{AuthError, RouteError, ValidationError};
pub use gate::{is_reachable, resolve, Navigation};
pub use model::{
    InteractionKind, MediaType, PendingInteraction, PortfolioPost, PostId, Role, Session,
    UnknownRole, UserId,
};
pub use msg::Msg;
pub use route::{BookingId, MainTab, PackageId, ProId, Route};
pub use session::{AuthTicket, SessionMachine, SessionPhase, Transition};
pub use state::{AppState, FeedStatus};
pub use update::update;
pub use validate::{comment_body, Credentials, SignUpRequest};
pub use view_model::AppViewModel;
