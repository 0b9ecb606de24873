use marketplace_core::{
    AppViewModel, FeedStatus, MainTab, MediaType, Navigation, PortfolioPost, Route, SessionPhase,
};

/// Renders the view model as plain text lines for the terminal.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    let session_label = match &view.session {
        SessionPhase::Unknown => "checking session".to_string(),
        SessionPhase::SignedOut => "signed out".to_string(),
        SessionPhase::SignedIn(session) => {
            format!("signed in as {} ({})", session.user_id, session.role)
        }
    };
    let screen_label = match &view.screen {
        Navigation::Suspended => "(loading)".to_string(),
        Navigation::Show(route) => route.to_string(),
        Navigation::Redirect { requested, to } => format!("{to} (redirected from {requested})"),
    };
    let mut header = format!("[{screen_label}] {session_label}");
    if view.auth_pending {
        header.push_str(" | authenticating...");
    }
    lines.push(header);

    if let Some(error) = &view.error {
        lines.push(format!("! {error}"));
    }

    // Only the feed tab shows posts.
    if view.screen.screen() != Some(&Route::Main(MainTab::Feed)) {
        return lines;
    }

    let status = match view.feed_status {
        FeedStatus::Idle => None,
        FeedStatus::Loading => Some("loading feed..."),
        FeedStatus::Refreshing => Some("refreshing..."),
        FeedStatus::Ready if view.posts.is_empty() => Some("no posts yet"),
        FeedStatus::Ready => None,
        FeedStatus::Failed => Some("feed unavailable; showing last known posts"),
    };
    if let Some(status) = status {
        lines.push(status.to_string());
    }
    lines.extend(view.posts.iter().map(post_line));
    lines
}

fn post_line(post: &PortfolioPost) -> String {
    let media = match post.media_type {
        MediaType::Image => "image",
        MediaType::Video => "video",
    };
    let mut line = format!(
        "  {} | {} by {} | {} likes",
        post.id, media, post.pro_id, post.likes_count
    );
    if !post.caption.is_empty() {
        line.push_str(" | ");
        line.push_str(&post.caption);
    }
    if !post.tags.is_empty() {
        let tags: Vec<String> = post.tags.iter().map(|tag| format!("#{tag}")).collect();
        line.push(' ');
        line.push_str(&tags.join(" "));
    }
    line
}
