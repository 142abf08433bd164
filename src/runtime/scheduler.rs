//! Thread-per-node scheduler for streaming pipelines
//!
//! Spawns a dedicated thread for each node and calls `work()` in a loop until
//! the node reports `Shutdown`, fails, or asks to stop. When a node's loop ends
//! its output is closed so the next stage sees end-of-stream.

use super::channel::{Receiver, Sender};
use super::node::{ProcessNode, WorkError};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver as StdReceiver, Sender as StdSender, channel};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Runtime scheduler that executes a streaming pipeline
pub struct Scheduler {
    threads: Vec<(String, JoinHandle<()>)>,
    stop_signal: Arc<AtomicBool>,
    completion_tx: StdSender<String>,
    completion_rx: StdReceiver<String>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        let (completion_tx, completion_rx) = channel();
        Self {
            threads: Vec::new(),
            stop_signal: Arc::new(AtomicBool::new(false)),
            completion_tx,
            completion_rx,
        }
    }

    /// Start a process node in its own thread, named after the node
    pub fn start_process<N: ProcessNode + 'static>(
        &mut self,
        mut node: N,
        mut input: Receiver<N::Input>,
        output: Sender<N::Output>,
    ) -> io::Result<()> {
        let stop_signal = Arc::clone(&self.stop_signal);
        let completion_tx = self.completion_tx.clone();
        let name = node.name().to_string();
        let thread_name = name.clone();

        debug!("Starting process node: {}", name);

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let mut items_produced = 0usize;

            loop {
                if stop_signal.load(Ordering::Relaxed) || node.should_stop() {
                    break;
                }

                match node.work(&mut input, &output) {
                    Ok(n) => items_produced += n,
                    Err(WorkError::Shutdown) => break,
                    Err(e) => {
                        error!("[{}] Work error: {}", thread_name, e);
                        break;
                    }
                }
            }

            info!(
                "[{}] Shutdown. Produced {} items.",
                thread_name, items_produced
            );

            output.close();
            drop(output);
            drop(input);
            drop(node);

            let _ = completion_tx.send(thread_name);
        })?;

        self.threads.push((name, handle));
        Ok(())
    }

    /// Signal all nodes to stop
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::Relaxed);
    }

    /// Wait for all node threads to complete, joining them as they finish
    pub fn wait(self) {
        let Scheduler {
            threads,
            completion_tx,
            completion_rx,
            ..
        } = self;

        // Drop the main completion sender so the channel closes when all threads complete
        drop(completion_tx);

        let total_threads = threads.len();
        let mut completed = 0;
        let mut threads_by_name: HashMap<String, JoinHandle<()>> = threads.into_iter().collect();

        info!("Waiting for {} threads to complete...", total_threads);

        while completed < total_threads {
            let Ok(thread_name) = completion_rx.recv() else {
                break;
            };
            completed += 1;
            if let Some(handle) = threads_by_name.remove(&thread_name) {
                match handle.join() {
                    Ok(_) => info!(
                        "[{}] Thread completed ({}/{})",
                        thread_name, completed, total_threads
                    ),
                    Err(e) => error!(
                        "[{}] Thread panicked ({}/{}): {:?}",
                        thread_name, completed, total_threads, e
                    ),
                }
            }
        }

        // Threads whose completion message never arrived (panicked before sending)
        for (thread_name, handle) in threads_by_name {
            if handle.join().is_err() {
                error!("[{}] Thread panicked", thread_name);
            }
        }

        info!("All {} threads completed", total_threads);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
