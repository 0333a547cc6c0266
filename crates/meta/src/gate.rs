// ABOUTME: FIFO-fair concurrency gate bounding simultaneous page fetches.
// ABOUTME: Slots are returned when the Permit guard drops; the limit can change at runtime.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

/// Default number of simultaneous page fetches.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug)]
struct GateState {
    active: usize,
    max: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl GateState {
    /// Hand free slots to queued waiters, earliest first. Waiters that went
    /// away are skipped.
    fn grant(&mut self) {
        while self.active < self.max {
            match self.waiters.pop_front() {
                Some(tx) => {
                    if tx.send(()).is_ok() {
                        self.active += 1;
                    }
                }
                None => break,
            }
        }
    }
}

/// Counting gate with a FIFO waiter queue.
#[derive(Debug)]
pub struct Gate {
    state: Mutex<GateState>,
}

/// One granted slot. Dropping it releases the slot.
#[must_use = "the slot is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct Permit {
    gate: Arc<Gate>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// A queued acquire. If it is dropped after being granted but before
/// observing the grant, the slot goes back to the gate.
struct Waiting {
    gate: Arc<Gate>,
    rx: Option<oneshot::Receiver<()>>,
}

impl Drop for Waiting {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            if rx.try_recv().is_ok() {
                self.gate.release();
            }
        }
    }
}

impl Gate {
    pub fn new(max: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GateState {
                active: 0,
                max: max.max(1),
                waiters: VecDeque::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait for a slot. Resolves immediately when one is free and nobody is queued.
    pub async fn acquire(self: &Arc<Self>) -> Permit {
        let rx = {
            let mut state = self.lock();
            if state.active < state.max && state.waiters.is_empty() {
                state.active += 1;
                return Permit { gate: self.clone() };
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        let mut waiting = Waiting {
            gate: self.clone(),
            rx: Some(rx),
        };
        if let Some(rx) = waiting.rx.as_mut() {
            // The gate owns every sender, so the channel only closes on a grant.
            let _ = rx.await;
        }
        waiting.rx = None;
        Permit { gate: self.clone() }
    }

    fn release(&self) {
        let mut state = self.lock();
        state.active = state.active.saturating_sub(1);
        state.grant();
    }

    /// Change the limit. Raising it admits queued waiters at once; lowering it
    /// lets active permits drain. Zero is clamped to one.
    pub fn set_max(&self, max: usize) {
        let mut state = self.lock();
        state.max = max.max(1);
        state.grant();
    }

    pub fn max(&self) -> usize {
        self.lock().max
    }

    /// Slots currently held.
    pub fn active(&self) -> usize {
        self.lock().active
    }

    /// Callers queued for a slot.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }
}
