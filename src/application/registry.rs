//! Service types and the per-type singleton registry.

use std::any::{Any, TypeId};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::application::interceptor::CacheProxy;
use crate::domain::metadata::ClassMetadata;
use crate::error::{BoxError, CacheError};

/// A service type that can be handed out by the provider.
///
/// `Interface` is the trait object callers use. A type with cacheable
/// methods supplies a decorator implementing the same interface that routes
/// each declared method through the [`CacheProxy`]:
///
/// ```ignore
/// impl ServiceClass for PriceService {
///     type Interface = dyn PriceLookup;
///     const NAME: &'static str = "PriceService";
///
///     fn metadata() -> ClassMetadata { /* ... */ }
///     fn construct() -> Result<Self, BoxError> { Ok(PriceService::default()) }
///     fn into_plain(self) -> Arc<dyn PriceLookup> { Arc::new(self) }
///     fn into_cached(self, proxy: CacheProxy) -> Arc<dyn PriceLookup> {
///         Arc::new(CachedPriceService::new(self, proxy))
///     }
/// }
/// ```
pub trait ServiceClass: Sized + Send + Sync + 'static {
    type Interface: ?Sized + Send + Sync + 'static;

    /// Name used in logs, errors and wrapping reports.
    const NAME: &'static str;

    /// Declaration table scanned by the eligibility validator.
    fn metadata() -> ClassMetadata;

    /// Builds a fresh instance. Runs at most once per successful registration.
    fn construct() -> Result<Self, BoxError>;

    fn into_plain(self) -> Arc<Self::Interface>;

    fn into_cached(self, proxy: CacheProxy) -> Arc<Self::Interface>;
}

/// Progress of one type's construction.
#[derive(Default)]
enum Phase {
    #[default]
    Empty,
    Building {
        attempt: u64,
    },
    Failed {
        attempt: u64,
        message: String,
    },
    Built(Arc<dyn Any + Send + Sync>),
}

#[derive(Default)]
struct SlotState {
    phase: Phase,
    attempts: u64,
}

/// Single-flight construction cell of one type.
#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    settled: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, phase: Phase) {
        self.lock().phase = phase;
        self.settled.notify_all();
    }
}

/// Marks an attempt failed if the build unwinds.
struct AttemptGuard<'a> {
    slot: &'a Slot,
    attempt: u64,
    armed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slot.settle(Phase::Failed {
                attempt: self.attempt,
                message: "construction panicked".to_string(),
            });
        }
    }
}

/// One lazily built instance per service type.
///
/// Each type has its own cell and no lock is held while building, so
/// constructing one type may request another. A type must not request itself
/// while it is being constructed.
#[derive(Default)]
pub struct SingletonRegistry {
    slots: DashMap<TypeId, Arc<Slot>>,
}

impl SingletonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance of `C`, running `build` if there is none yet.
    ///
    /// Concurrent first callers wait for a single `build` and all observe its
    /// outcome: the same instance, or a [`CacheError::Construction`] carrying
    /// the failure. A failed attempt stores nothing; the next request runs
    /// `build` again.
    pub fn get_or_build<C, F>(&self, build: F) -> Result<Arc<C::Interface>, CacheError>
    where
        C: ServiceClass,
        F: FnOnce() -> Result<Arc<C::Interface>, CacheError>,
    {
        let slot = Arc::clone(&self.slots.entry(TypeId::of::<C>()).or_default());

        let mut state = slot.lock();
        let attempt = loop {
            match &state.phase {
                Phase::Built(instance) => return downcast::<C>(instance),
                Phase::Building { attempt } => {
                    let awaited = *attempt;
                    state = slot
                        .settled
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                    if let Phase::Failed { attempt, message } = &state.phase
                        && *attempt == awaited
                    {
                        return Err(CacheError::construction(
                            C::NAME,
                            format!("construction failed in a concurrent request: {message}"),
                        ));
                    }
                }
                Phase::Empty | Phase::Failed { .. } => {
                    state.attempts += 1;
                    let attempt = state.attempts;
                    state.phase = Phase::Building { attempt };
                    break attempt;
                }
            }
        };
        drop(state);

        let mut guard = AttemptGuard {
            slot: &slot,
            attempt,
            armed: true,
        };
        let result = build();
        guard.armed = false;

        match result {
            Ok(instance) => {
                let stored: Arc<dyn Any + Send + Sync> = Arc::new(instance);
                slot.settle(Phase::Built(Arc::clone(&stored)));
                downcast::<C>(&stored)
            }
            Err(e) => {
                slot.settle(Phase::Failed {
                    attempt,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Whether an instance of `C` has been built.
    pub fn contains<C: ServiceClass>(&self) -> bool {
        self.slots
            .get(&TypeId::of::<C>())
            .is_some_and(|slot| matches!(slot.lock().phase, Phase::Built(_)))
    }

    /// Forgets every instance; the next request builds again.
    pub fn reset(&self) {
        self.slots.clear();
    }
}

fn downcast<C: ServiceClass>(
    stored: &Arc<dyn Any + Send + Sync>,
) -> Result<Arc<C::Interface>, CacheError> {
    stored
        .downcast_ref::<Arc<C::Interface>>()
        .cloned()
        .ok_or_else(|| CacheError::construction(C::NAME, "registry slot holds another type"))
}
