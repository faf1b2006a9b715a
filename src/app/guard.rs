//! Stale-result protection for view fetches.
//!
//! A view may start several fetches and be closed while one is still in
//! flight. Each fetch takes a [`FetchTicket`]; when the result arrives it is
//! applied only if the view is still mounted and no newer fetch was started.

use super::prompt::Prompt;
use crate::errors::Result;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tracing::{debug, warn};

#[derive(Debug)]
struct GuardState {
    mounted: AtomicBool,
    generation: AtomicU64,
}

/// Tracks whether a view is mounted and which fetch is the latest.
#[derive(Debug, Clone)]
pub struct ViewGuard {
    state: Arc<GuardState>,
}

impl Default for ViewGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewGuard {
    /// A guard for a freshly mounted view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(GuardState {
                mounted: AtomicBool::new(true),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Starts a fetch, superseding any fetch started before it.
    #[must_use]
    pub fn begin(&self) -> FetchTicket {
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket {
            state: Arc::clone(&self.state),
            generation,
        }
    }

    /// Marks the view as closed; every outstanding ticket becomes stale.
    pub fn unmount(&self) {
        self.state.mounted.store(false, Ordering::SeqCst);
    }

    /// Whether the view is still open.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state.mounted.load(Ordering::SeqCst)
    }
}

/// Proof that a fetch was started; checked before its result is applied.
#[derive(Debug)]
pub struct FetchTicket {
    state: Arc<GuardState>,
    generation: u64,
}

impl FetchTicket {
    /// True while the view is mounted and no newer fetch has started.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.state.mounted.load(Ordering::SeqCst)
            && self.state.generation.load(Ordering::SeqCst) == self.generation
    }
}

/// Data shown by a view together with its loading flag.
///
/// A failed fetch keeps whatever was shown before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loadable<T> {
    /// A fetch is in flight
    pub loading: bool,
    /// Last successfully loaded data
    pub data: T,
}

impl<T> Loadable<T> {
    /// Wraps initial data, not loading.
    pub const fn new(data: T) -> Self {
        Self {
            loading: false,
            data,
        }
    }

    /// Marks a fetch as started.
    pub const fn start(&mut self) {
        self.loading = true;
    }

    /// Applies a fetch result if its ticket is still current.
    ///
    /// Success replaces the data. Failure keeps the previous data and alerts
    /// `"Erro ao <action>: <message>"`. Stale results are dropped silently.
    /// Returns whether the result was applied.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: Result<T>,
        prompt: &dyn Prompt,
        action: &str,
    ) -> bool {
        if !ticket.is_current() {
            debug!("Discarding stale result ({action})");
            return false;
        }

        self.loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                true
            }
            Err(e) => {
                warn!("Failed to {action}: {e}");
                prompt.alert(&format!("Erro ao {action}: {e}"));
                false
            }
        }
    }
}
