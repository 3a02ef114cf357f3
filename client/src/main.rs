use std::{
    sync::{Arc, RwLock},
    thread,
};

use settings::{SETTINGS_PATH, Settings};
use state::State;
use ticker::TickerHost;

mod cli;
mod renderer;
mod settings;
mod state;
mod ticker;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load(SETTINGS_PATH)?;
    let state = State::new(settings, SETTINGS_PATH)?;

    log::info!("{}", state.status_line());

    let state_arc = Arc::new(RwLock::new(state));
    let ticker = TickerHost::start(state_arc.clone());

    let cli_state_arc = state_arc.clone();
    thread::spawn(move || cli::run_cli(cli_state_arc));

    let result = renderer::run(state_arc);
    ticker.stop();

    result
}
