use std::{
    sync::{
        Arc, RwLock,
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::state::{State, write_state};

/// Drives [`liblife::Simulation::step`] from a background thread.
///
/// Every tick takes the write lock, steps (a no-op while paused), reads the
/// current interval and waits for it, so interval changes apply from the next tick.
/// The wait ends early when the host is stopped.
pub struct TickerHost {
    stop_sender: Sender<()>,
    handle: JoinHandle<()>,
}

impl TickerHost {
    pub fn start(state_arc: Arc<RwLock<State>>) -> Self {
        let (stop_sender, stop_receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            loop {
                let interval = {
                    let mut state = write_state(&state_arc);
                    state.simulation.step();
                    Duration::from_millis(state.simulation.interval_ms())
                };

                match stop_receiver.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            log::debug!("ticker stopped");
        });

        Self {
            stop_sender,
            handle,
        }
    }

    /// Stops the thread and waits for it to exit.
    pub fn stop(self) {
        // The thread is gone already if the receiver was dropped.
        let _ = self.stop_sender.send(());

        if self.handle.join().is_err() {
            log::error!("ticker thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::state::{read_state, tests::test_state};

    #[test]
    fn steps_only_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        state.simulation.set_interval(1).unwrap();
        let state_arc = Arc::new(RwLock::new(state));

        let ticker = TickerHost::start(state_arc.clone());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(read_state(&state_arc).simulation.generation(), 0);

        write_state(&state_arc).simulation.toggle_pause();

        let deadline = Instant::now() + Duration::from_secs(5);
        while read_state(&state_arc).simulation.generation() < 3 {
            assert!(Instant::now() < deadline, "ticker never stepped");
            thread::sleep(Duration::from_millis(5));
        }

        ticker.stop();
    }

    #[test]
    fn stop_interrupts_a_long_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        state.simulation.set_interval(600_000).unwrap();
        state.simulation.toggle_pause();
        let state_arc = Arc::new(RwLock::new(state));

        let ticker = TickerHost::start(state_arc.clone());

        let deadline = Instant::now() + Duration::from_secs(5);
        while read_state(&state_arc).simulation.generation() < 1 {
            assert!(Instant::now() < deadline, "ticker never stepped");
            thread::sleep(Duration::from_millis(5));
        }

        let stopping = Instant::now();
        ticker.stop();
        assert!(stopping.elapsed() < Duration::from_secs(5));
        assert_eq!(read_state(&state_arc).simulation.generation(), 1);
    }
}
