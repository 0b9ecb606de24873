use crate::{FeedStatus, Navigation, PortfolioPost, SessionPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub screen: Navigation,
    pub session: SessionPhase,
    pub feed_status: FeedStatus,
    pub posts: Vec<PortfolioPost>,
    pub error: Option<String>,
    pub auth_pending: bool,
    pub dirty: bool,
}
