use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::errors::CoreError;
use crate::models::catalog::FundCatalog;
use crate::models::overlay::PriceOverlay;
use crate::models::settings::{Settings, SimulationScope};

/// Random-walk step applied to the price overlay.
///
/// Each tick adds a uniform delta in `[-half_width, +half_width]` to the
/// fund's current overlay value (or its baseline on the first tick). There
/// is no clamping and no mean reversion; drift accumulates from the last
/// value, independent of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSimulator {
    half_width: f64,
    scope: SimulationScope,
}

impl PriceSimulator {
    pub fn new(half_width: f64, scope: SimulationScope) -> Result<Self, CoreError> {
        // `gen_range` over `-hw..=hw` panics when the span overflows to infinity.
        if !(2.0 * half_width).is_finite() || half_width < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Drift half-width must be finite and non-negative (got {half_width})"
            )));
        }
        Ok(Self { half_width, scope })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        Self::new(settings.drift_half_width, settings.simulation_scope)
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn scope(&self) -> SimulationScope {
        self.scope
    }

    /// Perturb every fund in scope once. Returns the number of funds updated.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        catalog: &FundCatalog,
        overlay: &mut PriceOverlay,
        rng: &mut R,
    ) -> usize {
        let limit = match self.scope {
            SimulationScope::All => catalog.len(),
            SimulationScope::Prefix(n) => n.min(catalog.len()),
        };

        let updates: Vec<(String, f64)> = catalog.funds()[..limit]
            .iter()
            .map(|fund| {
                let delta = rng.gen_range(-self.half_width..=self.half_width);
                (fund.id.clone(), overlay.current_change(fund) + delta)
            })
            .collect();

        let updated = updates.len();
        overlay.merge(updates);
        updated
    }
}

/// Seed a `StdRng` from OS entropy.
pub fn entropy_rng() -> Result<StdRng, CoreError> {
    let mut seed = [0u8; 32];
    getrandom::getrandom(&mut seed)
        .map_err(|e| CoreError::Entropy(format!("Failed to seed price simulation: {e}")))?;
    Ok(StdRng::from_seed(seed))
}

/// Recurring driver for [`PriceSimulator`].
pub struct PriceClock;

impl PriceClock {
    /// Spawn the recurring tick task on the current tokio runtime.
    ///
    /// The first tick fires one `period` after start. A tick holds the overlay
    /// write lock for its whole read-compute-write cycle, and the single task
    /// never runs two ticks at once. Late ticks are delayed, not bursted.
    pub fn start(
        catalog: Arc<FundCatalog>,
        overlay: Arc<RwLock<PriceOverlay>>,
        simulator: PriceSimulator,
        period: Duration,
        mut rng: StdRng,
    ) -> PriceClockHandle {
        let ticks = Arc::new(AtomicU64::new(0));
        let tick_counter = Arc::clone(&ticks);

        info!(
            "Price clock started: every {:?}, half-width {}, scope {:?}",
            period, simulator.half_width, simulator.scope
        );

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let updated = {
                    let mut guard = overlay.write().unwrap_or_else(|e| e.into_inner());
                    simulator.tick(&catalog, &mut guard, &mut rng)
                };
                let n = tick_counter.fetch_add(1, Ordering::SeqCst) + 1;
                debug!("Price tick #{n}: {updated} funds updated");
            }
        });

        PriceClockHandle {
            task: Some(task),
            ticks,
        }
    }
}

/// Owner of a running price clock. Stopping or dropping it cancels the task.
#[must_use = "dropping the handle stops the price clock"]
pub struct PriceClockHandle {
    task: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl PriceClockHandle {
    /// Number of ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the recurring task. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Price clock stopped after {} ticks", self.ticks());
        }
    }
}

impl Drop for PriceClockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PriceClockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceClockHandle")
            .field("running", &self.task.is_some())
            .field("ticks", &self.ticks())
            .finish()
    }
}
