use crate::validate::comment_body;
use crate::{AppState, Credentials, Effect, FeedStatus, Msg, SignUpRequest};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppStarted => vec![Effect::ResolveSession],
        Msg::SessionResolved(session) => {
            if state.resolve_initial(session) {
                start_feed_load(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::SignInSubmitted { email, password } => match Credentials::new(&email, &password) {
            Ok(credentials) => {
                let ticket = state.begin_auth();
                vec![Effect::SignIn {
                    ticket,
                    credentials,
                }]
            }
            Err(err) => {
                state.set_error(err.to_string());
                Vec::new()
            }
        },
        Msg::SignUpSubmitted {
            name,
            email,
            password,
            role,
        } => match SignUpRequest::new(&name, &email, &password, role) {
            Ok(request) => {
                let ticket = state.begin_auth();
                vec![Effect::SignUp { ticket, request }]
            }
            Err(err) => {
                state.set_error(err.to_string());
                Vec::new()
            }
        },
        Msg::AuthSucceeded { ticket, session } => {
            if state.complete_auth(ticket, session) {
                start_feed_load(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::AuthFailed { ticket, error } => {
            state.fail_auth(ticket, error.to_string());
            Vec::new()
        }
        Msg::SignOutClicked => {
            // Cleared here, before any later Navigate is processed.
            state.sign_out();
            vec![Effect::SignOut]
        }
        Msg::TokenInvalidated => {
            state.invalidate("session expired, please sign in again".to_string());
            Vec::new()
        }
        Msg::Navigate(route) => {
            state.navigate(route);
            Vec::new()
        }
        Msg::FeedLoaded(posts) => {
            if state.is_signed_in() {
                state.replace_posts(posts);
            }
            Vec::new()
        }
        Msg::FeedFailed { reason } => {
            if state.is_signed_in() {
                state.set_feed_status(FeedStatus::Failed);
                state.set_error(reason);
            }
            Vec::new()
        }
        Msg::PullToRefresh => {
            if state.is_signed_in() {
                if !state.feed_status().is_busy() {
                    state.set_feed_status(FeedStatus::Refreshing);
                }
                state.clear_error();
                vec![Effect::RefreshFeed]
            } else {
                Vec::new()
            }
        }
        Msg::PostUpdated(post) => {
            state.update_post(post);
            Vec::new()
        }
        Msg::LikeTapped(post_id) => signed_in_only(&state, Effect::Like { post_id }),
        Msg::CommentSubmitted { post_id, body } => match comment_body(&body) {
            Ok(body) => signed_in_only(&state, Effect::Comment { post_id, body }),
            Err(err) => {
                state.set_error(err.to_string());
                Vec::new()
            }
        },
        Msg::ShareTapped(post_id) => signed_in_only(&state, Effect::Share { post_id }),
        Msg::InteractionFailed { post_id, reason } => {
            if state.is_signed_in() {
                state.set_error(format!("could not update post {post_id}: {reason}"));
            }
            Vec::new()
        }
        Msg::DismissError => {
            state.clear_error();
            Vec::new()
        }
        Msg::Tick => {
            state.advance_tick();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_feed_load(state: &mut AppState) -> Vec<Effect> {
    state.set_feed_status(FeedStatus::Loading);
    vec![Effect::LoadFeed]
}

fn signed_in_only(state: &AppState, effect: Effect) -> Vec<Effect> {
    if state.is_signed_in() {
        vec![effect]
    } else {
        Vec::new()
    }
}
