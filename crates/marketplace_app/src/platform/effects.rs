use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use marketplace_core::{Effect, Msg};
use marketplace_engine::{EngineCommand, EngineEvent, EngineHandle};
use marketplace_logging::{market_debug, market_info, market_warn};

/// Forwards core effects to the engine and engine events back as messages.
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        let runner = Self {
            engine: Arc::new(engine),
        };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            let command = command_for(effect);
            market_debug!("Engine command {:?}", command);
            self.engine.send(command);
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            let Some(event) = engine.try_recv() else {
                thread::sleep(Duration::from_millis(20));
                continue;
            };
            let Some(msg) = msg_for(event) else {
                continue;
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        });
    }
}

pub(crate) fn command_for(effect: Effect) -> EngineCommand {
    match effect {
        Effect::ResolveSession => EngineCommand::ResolveSession,
        Effect::SignIn {
            ticket,
            credentials,
        } => EngineCommand::SignIn {
            ticket,
            credentials,
        },
        Effect::SignUp { ticket, request } => EngineCommand::SignUp { ticket, request },
        Effect::SignOut => EngineCommand::SignOut,
        Effect::LoadFeed => EngineCommand::LoadFeed,
        Effect::RefreshFeed => EngineCommand::RefreshFeed,
        Effect::Like { post_id } => EngineCommand::Like(post_id),
        Effect::Comment { post_id, body } => EngineCommand::Comment { post_id, body },
        Effect::Share { post_id } => EngineCommand::Share(post_id),
    }
}

/// Engine events the UI does not render are logged and dropped.
pub(crate) fn msg_for(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::SessionResolved(session) => Msg::SessionResolved(session),
        EngineEvent::AuthCompleted { ticket, result } => match result {
            Ok(session) => Msg::AuthSucceeded { ticket, session },
            Err(error) => Msg::AuthFailed { ticket, error },
        },
        EngineEvent::SessionInvalidated => Msg::TokenInvalidated,
        EngineEvent::FeedReplaced { posts, .. } => Msg::FeedLoaded(posts),
        EngineEvent::FeedFailed(err) => Msg::FeedFailed {
            reason: err.to_string(),
        },
        EngineEvent::PostUpdated(post) => Msg::PostUpdated(post),
        EngineEvent::InteractionRolledBack {
            post_id,
            kind,
            error,
        } => {
            market_warn!("{} on {} rolled back: {}", kind, post_id, error);
            Msg::InteractionFailed {
                post_id,
                reason: format!("{kind} failed: {error}"),
            }
        }
        event @ (EngineEvent::InteractionConfirmed { .. }
        | EngineEvent::InteractionAbandoned { .. }) => {
            market_info!("{}", event);
            return None;
        }
    };
    Some(msg)
}
