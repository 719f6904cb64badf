// ABOUTME: Bounded-concurrency gate for upstream inference calls
// ABOUTME: FIFO admission with RAII slots so every acquisition is released exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Concurrency Gate
//!
//! Caps the number of simultaneous in-flight calls to the inference backend.
//! Callers beyond the cap queue in arrival order; when a slot frees it is
//! handed directly to the longest-waiting caller, so a later arrival can never
//! take it first.
//!
//! A slot is a [`GateSlot`] value. Dropping it releases the slot, which covers
//! success, error, and a cancelled future alike.
//!
//! There is no timeout: a caller whose work never finishes keeps its slot and
//! the queue behind it waits indefinitely.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Point-in-time view of gate occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateSnapshot {
    /// Configured maximum of simultaneous slots
    pub limit: usize,
    /// Slots currently held
    pub in_flight: usize,
    /// Callers queued for a slot
    pub waiters: usize,
}

#[derive(Debug, Default)]
struct GateCounters {
    in_flight: AtomicUsize,
    waiters: AtomicUsize,
}

/// Counting gate with a FIFO wait list
///
/// Cloning is cheap and yields a handle to the same gate.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    counters: Arc<GateCounters>,
    limit: usize,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `max_concurrent` callers at once
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when `max_concurrent` is zero or exceeds the
    /// semaphore's permit limit.
    pub fn new(max_concurrent: usize) -> AppResult<Self> {
        if max_concurrent == 0 {
            return Err(AppError::config_invalid(
                "max_concurrent",
                "concurrency limit must be at least 1",
            ));
        }
        if max_concurrent > Semaphore::MAX_PERMITS {
            return Err(AppError::config_invalid(
                "max_concurrent",
                format!("concurrency limit must not exceed {}", Semaphore::MAX_PERMITS),
            ));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            counters: Arc::new(GateCounters::default()),
            limit: max_concurrent,
        })
    }

    /// Current occupancy
    #[must_use]
    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            limit: self.limit,
            in_flight: self.counters.in_flight.load(Ordering::Acquire),
            waiters: self.counters.waiters.load(Ordering::Acquire),
        }
    }

    /// Wait for a free slot
    ///
    /// Returns immediately while fewer than `limit` slots are held; otherwise
    /// the caller joins the back of the queue.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the gate has been closed. Gates are never
    /// closed by this crate.
    pub async fn acquire_slot(&self) -> AppResult<GateSlot> {
        let waiter = WaiterGuard::register(&self.counters);
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AppError::internal(format!("Concurrency gate closed: {e}")))?;
        drop(waiter);

        let in_flight = self.counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(in_flight, limit = self.limit, "Concurrency gate slot acquired");

        Ok(GateSlot {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Run `work` while holding a slot
    ///
    /// The slot is released when `work` completes, whether it succeeded or
    /// failed, and also when the returned future is dropped early.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a gate error converted into
    /// `E` if no slot could be obtained.
    pub async fn with_gate<F, Fut, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AppError>,
    {
        let slot = self.acquire_slot().await?;
        let result = work().await;
        drop(slot);
        result
    }
}

/// A held gate slot; dropping it releases the slot to the next waiter
#[derive(Debug)]
pub struct GateSlot {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl Drop for GateSlot {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

struct WaiterGuard<'a> {
    counters: &'a GateCounters,
}

impl<'a> WaiterGuard<'a> {
    fn register(counters: &'a GateCounters) -> Self {
        counters.waiters.fetch_add(1, Ordering::AcqRel);
        Self { counters }
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.counters.waiters.fetch_sub(1, Ordering::AcqRel);
    }
}
