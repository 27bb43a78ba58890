//! enigo Pointer Backend
//!
//! `enigo::Enigo` is not `Send` on every platform, so it is confined to a
//! dedicated thread. [`EnigoSink`] only holds the sending half of a bounded
//! channel, which keeps `move_relative` non-blocking.
//!
//! ```text
//! Playback task                      enigo thread (std::thread)
//! ━━━━━━━━━━━━━                      ━━━━━━━━━━━━━━━━━━━━━━━━━━
//! EnigoSink ──(dx, dy)──────────────> Enigo::move_mouse(dx, dy, Rel)
//!   try_send                            errors logged here
//! ```

use crossbeam_channel::{bounded, Sender, TrySendError};
use enigo::{Coordinate, Enigo, Mouse, Settings};
use std::thread;
use tracing::{info, warn};

use super::{PointerSink, SinkError};

/// Queue depth between the playback task and the enigo thread
const QUEUE_DEPTH: usize = 256;

enum Command {
    Move(i32, i32),
    Shutdown,
}

/// Pointer sink backed by `enigo`
pub struct EnigoSink {
    command_tx: Sender<Command>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl EnigoSink {
    /// Connect to the platform input backend and start the worker thread
    pub fn new() -> Result<Self, SinkError> {
        let (command_tx, command_rx) = bounded::<Command>(QUEUE_DEPTH);
        let (ready_tx, ready_rx) = bounded::<Result<(), SinkError>>(1);

        let thread_handle = thread::Builder::new()
            .name("enigo-pointer".to_string())
            .spawn(move || {
                let mut enigo = match Enigo::new(&Settings::default()) {
                    Ok(enigo) => {
                        let _ = ready_tx.send(Ok(()));
                        enigo
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(SinkError::Backend(e.to_string())));
                        return;
                    }
                };

                while let Ok(command) = command_rx.recv() {
                    match command {
                        Command::Move(dx, dy) => {
                            if let Err(e) = enigo.move_mouse(dx, dy, Coordinate::Rel) {
                                warn!("enigo move ({}, {}) failed: {}", dx, dy, e);
                            }
                        }
                        Command::Shutdown => break,
                    }
                }
            })
            .map_err(|e| SinkError::Backend(format!("Thread spawn failed: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| SinkError::Disconnected)??;

        info!("enigo pointer backend started");

        Ok(Self {
            command_tx,
            thread_handle: Some(thread_handle),
        })
    }
}

impl PointerSink for EnigoSink {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), SinkError> {
        self.command_tx
            .try_send(Command::Move(dx, dy))
            .map_err(|e| match e {
                TrySendError::Full(_) => SinkError::QueueFull,
                TrySendError::Disconnected(_) => SinkError::Disconnected,
            })
    }
}

impl Drop for EnigoSink {
    fn drop(&mut self) {
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}
