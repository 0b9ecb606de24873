use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use marketplace_core::{update, AppState, Msg};
use marketplace_engine::EngineHandle;
use marketplace_logging::{market_info, market_warn, set_frame};

use super::config::{self, AppConfig};
use super::effects::EffectRunner;
use super::logging;
use super::ui::input::{self, Input};
use super::ui::render;

const TICK_INTERVAL: Duration = Duration::from_millis(75);

/// Terminal front end: reads commands from stdin and prints the view.
pub fn run_app() -> anyhow::Result<()> {
    let path = config::config_path(std::env::args().nth(1));
    let (config, config_error) = match config::load(&path) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::initialize(config.log_destination, config.log_level());
    if let Some(err) = config_error {
        market_warn!("{}; using defaults", err);
    }
    market_info!("Starting against {}", config.remote.base_url);

    let engine = EngineHandle::new(&config.remote.settings(), config.feed_max_age())
        .context("failed to start engine")?;

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let (quit_tx, quit_rx) = mpsc::channel::<()>();
    let runner = EffectRunner::new(engine, msg_tx.clone());

    // Background tick to throttle rendering.
    {
        let msg_tx = msg_tx.clone();
        thread::spawn(move || {
            while msg_tx.send(Msg::Tick).is_ok() {
                thread::sleep(TICK_INTERVAL);
            }
        });
    }
    spawn_input_reader(msg_tx.clone(), quit_tx);

    println!("{}", input::HELP);
    let mut driver = Driver::new(runner);
    driver.dispatch(Msg::AppStarted);

    while quit_rx.try_recv().is_err() {
        match msg_rx.recv_timeout(TICK_INTERVAL) {
            Ok(msg) => driver.dispatch(msg),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    market_info!("Shutting down");
    Ok(())
}

fn spawn_input_reader(msg_tx: mpsc::Sender<Msg>, quit_tx: mpsc::Sender<()>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match input::parse(&line) {
                Input::Dispatch(msg) => {
                    if msg_tx.send(msg).is_err() {
                        return;
                    }
                }
                Input::Help => println!("{}", input::HELP),
                Input::Invalid(reason) => println!("? {reason}"),
                Input::Quit => break,
            }
        }
        let _ = quit_tx.send(());
    });
}

/// Owns the app state and applies messages to it one at a time.
struct Driver {
    state: AppState,
    runner: EffectRunner,
}

impl Driver {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let is_tick = matches!(msg, Msg::Tick);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if is_tick {
            set_frame(state.tick());
        }
        self.runner.enqueue(effects);
        if state.consume_dirty() {
            print_view(&render::render(&state.view()));
        }
        self.state = state;
    }
}

fn print_view(lines: &[String]) {
    let mut out = io::stdout().lock();
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = out.flush();
}
