//! Background generation worker.
//!
//! The host asks for chunks by count and drains finished chunks from a FIFO.
//! The worker thread owns the [`ChunkStream`] outright; resets travel down
//! the same command channel as requests, so the mole population and the
//! random source are only ever touched by the worker.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use delve_core::config::CaveConfig;
use delve_core::CaveChunk;

use crate::error::SchedulerError;
use crate::rng::resolve_seed;
use crate::stream::ChunkStream;

enum Command {
    Request(usize),
    Reset {
        config: CaveConfig,
        ack: Sender<u64>,
    },
    Shutdown,
}

/// Handle to the generation worker. Dropping it shuts the worker down.
pub struct Scheduler {
    commands: Sender<Command>,
    finished: Receiver<CaveChunk>,
    pending: Arc<AtomicUsize>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    config: CaveConfig,
    seed: u64,
}

impl Scheduler {
    /// Start a worker generating from depth 0 with `config`. Nothing is
    /// generated until chunks are requested.
    pub fn spawn(config: CaveConfig) -> Result<Self, SchedulerError> {
        let seed = resolve_seed(config.seed);
        let config = CaveConfig { seed, ..config };

        let (commands, command_rx) = mpsc::channel();
        let (finished_tx, finished) = mpsc::channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let cancel = Arc::new(AtomicBool::new(false));

        let worker = {
            let pending = Arc::clone(&pending);
            let cancel = Arc::clone(&cancel);
            let config = config.clone();
            // The stream is built on the worker and never leaves it.
            thread::Builder::new()
                .name("delve-generator".into())
                .spawn(move || {
                    let stream = ChunkStream::new(config);
                    run_worker(stream, command_rx, finished_tx, pending, cancel)
                })?
        };

        Ok(Self {
            commands,
            finished,
            pending,
            cancel,
            worker: Some(worker),
            config,
            seed,
        })
    }

    /// Effective seed of the current world.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Chunks requested but not yet produced, as last seen by the worker.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Ask for `count` more chunks. They arrive in depth order.
    pub fn request_chunks(&self, count: usize) -> Result<(), SchedulerError> {
        if count == 0 {
            return Ok(());
        }
        self.commands
            .send(Command::Request(count))
            .map_err(|_| SchedulerError::Disconnected)
    }

    /// Next finished chunk, if one is ready. Never blocks.
    pub fn try_dequeue_finished(&self) -> Option<CaveChunk> {
        self.finished.try_recv().ok()
    }

    /// Next finished chunk, waiting up to `timeout` for it.
    pub fn dequeue_finished_timeout(&self, timeout: Duration) -> Option<CaveChunk> {
        self.finished.recv_timeout(timeout).ok()
    }

    /// Restart the world from depth 0 with a new seed (0 picks one from the
    /// clock). Returns the effective seed.
    pub fn reset(&mut self, seed: u64) -> Result<u64, SchedulerError> {
        let config = CaveConfig {
            seed,
            ..self.config.clone()
        };
        self.reset_with(config)
    }

    /// Restart from depth 0 with a whole new config. Outstanding requests
    /// are dropped, and chunks of the old world still in the queue are
    /// discarded before this returns.
    pub fn reset_with(&mut self, config: CaveConfig) -> Result<u64, SchedulerError> {
        let config = CaveConfig {
            seed: resolve_seed(config.seed),
            ..config
        };
        let (ack, ack_rx) = mpsc::channel();
        self.commands
            .send(Command::Reset {
                config: config.clone(),
                ack,
            })
            .map_err(|_| SchedulerError::Disconnected)?;
        let seed = ack_rx.recv().map_err(|_| SchedulerError::Disconnected)?;

        // Everything the worker sent before the ack belongs to the old world.
        let stale = self.finished.try_iter().count();
        if stale > 0 {
            log::debug!("Discarded {stale} chunks from the previous world");
        }

        self.config = config;
        self.seed = seed;
        log::info!("World reset with seed {seed}");
        Ok(seed)
    }

    /// Stop the worker and wait for it. The chunk in progress, if any, is
    /// abandoned. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<(), SchedulerError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.cancel.store(true, Ordering::Release);
        // The worker may already be gone; the join below reports how.
        let _ = self.commands.send(Command::Shutdown);
        worker.join().map_err(|_| SchedulerError::WorkerPanicked)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Generation worker shutdown failed: {e}");
        }
    }
}

fn run_worker(
    mut stream: ChunkStream,
    commands: Receiver<Command>,
    finished: Sender<CaveChunk>,
    pending: Arc<AtomicUsize>,
    cancel: Arc<AtomicBool>,
) {
    log::info!("Generation worker started (seed {})", stream.seed());

    while !cancel.load(Ordering::Acquire) {
        // Sleep on the channel while idle; between chunks only poll it.
        let command = if pending.load(Ordering::Acquire) == 0 {
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        } else {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        };

        match command {
            Some(Command::Request(count)) => {
                pending.fetch_add(count, Ordering::AcqRel);
            }
            Some(Command::Reset { config, ack }) => {
                pending.store(0, Ordering::Release);
                stream.reset(config);
                // The host may have given up waiting; nothing to do then.
                let _ = ack.send(stream.seed());
            }
            Some(Command::Shutdown) => break,
            None => {
                let chunk = stream.advance();
                if cancel.load(Ordering::Acquire) {
                    break;
                }
                if finished.send(chunk).is_err() {
                    break;
                }
                pending.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }

    log::info!("Generation worker stopped at depth {}", stream.depth());
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::types::ChunkDepth;

    const WAIT: Duration = Duration::from_secs(30);

    fn config(seed: u64) -> CaveConfig {
        CaveConfig {
            seed,
            ..CaveConfig::default()
        }
    }

    fn collect(scheduler: &Scheduler, count: usize) -> Vec<CaveChunk> {
        (0..count)
            .map(|_| {
                scheduler
                    .dequeue_finished_timeout(WAIT)
                    .expect("worker produced no chunk")
            })
            .collect()
    }

    #[test]
    fn test_chunks_arrive_in_order() {
        let mut scheduler = Scheduler::spawn(config(12345)).unwrap();
        scheduler.request_chunks(3).unwrap();
        scheduler.request_chunks(2).unwrap();
        let depths: Vec<ChunkDepth> = collect(&scheduler, 5).iter().map(|c| c.depth()).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 4]);
        scheduler.shutdown().unwrap();
    }

    #[test]
    fn test_matches_direct_stream() {
        let mut scheduler = Scheduler::spawn(config(777)).unwrap();
        scheduler.request_chunks(4).unwrap();
        let threaded = collect(&scheduler, 4);

        let mut stream = ChunkStream::new(config(777));
        let direct: Vec<CaveChunk> = (0..4).map(|_| stream.advance()).collect();
        assert_eq!(threaded, direct);
        scheduler.shutdown().unwrap();
    }

    #[test]
    fn test_idle_worker_produces_nothing() {
        let scheduler = Scheduler::spawn(config(1)).unwrap();
        assert!(scheduler
            .dequeue_finished_timeout(Duration::from_millis(50))
            .is_none());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_reset_restarts_at_depth_zero() {
        let mut scheduler = Scheduler::spawn(config(42)).unwrap();
        scheduler.request_chunks(3).unwrap();
        let first = collect(&scheduler, 3);

        // Ask for more, then reset before consuming them.
        scheduler.request_chunks(5).unwrap();
        let seed = scheduler.reset(42).unwrap();
        assert_eq!(seed, 42);
        assert!(scheduler.try_dequeue_finished().is_none());
        assert_eq!(scheduler.pending(), 0);

        scheduler.request_chunks(3).unwrap();
        let again = collect(&scheduler, 3);
        assert_eq!(first, again);
        scheduler.shutdown().unwrap();
    }

    #[test]
    fn test_reset_with_zero_seed_reports_effective_seed() {
        let mut scheduler = Scheduler::spawn(config(5)).unwrap();
        let seed = scheduler.reset(0).unwrap();
        assert_ne!(seed, 0);
        assert_eq!(scheduler.seed(), seed);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut scheduler = Scheduler::spawn(config(9)).unwrap();
        scheduler.request_chunks(10_000).unwrap();
        scheduler.shutdown().unwrap();
        scheduler.shutdown().unwrap();

        // Whatever was finished before the stop is whole and in order.
        let leftover: Vec<ChunkDepth> = std::iter::from_fn(|| scheduler.try_dequeue_finished())
            .map(|chunk| chunk.depth())
            .collect();
        assert!(leftover.len() < 10_000, "worker ignored shutdown");
        assert!(leftover.iter().copied().eq(0..leftover.len() as ChunkDepth));

        assert!(matches!(
            scheduler.request_chunks(1),
            Err(SchedulerError::Disconnected)
        ));
    }
}
