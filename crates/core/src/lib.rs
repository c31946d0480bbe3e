pub mod catalog;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use catalog::builtin::builtin_catalog;
use catalog::synthetic::DEFAULT_SYNTHETIC_COUNT;
use models::{
    catalog::FundCatalog,
    display::{FundDetail, FundListing},
    fund::FundRecord,
    narrative::{Narrative, NarrativePrompt},
    overlay::PriceOverlay,
    selection::{FundSortOrder, Selection, ViewMode},
    settings::Settings,
    taxonomy::ALL_TAXONOMY_ID,
};
use providers::{gemini::GeminiProvider, traits::NarrativeProvider};
use services::{
    favorites_service::FavoritesRegistry,
    filter_service::FilterService,
    narrative_service::NarrativeService,
    presenter_service::PresenterService,
    price_simulation_service::{entropy_rng, PriceClock, PriceClockHandle, PriceSimulator},
};
use storage::KeyValueStore;

use errors::CoreError;

/// Main entry point for the fund dashboard core library.
///
/// An explicit, process-scoped state container: the immutable catalog, the
/// user's selection, the persisted favorites, the simulated price overlay and
/// the services operating on them. Nothing lives in globals.
#[must_use]
pub struct FundDashboard {
    catalog: Arc<FundCatalog>,
    settings: Settings,
    selection: Selection,
    favorites: FavoritesRegistry,
    overlay: Arc<RwLock<PriceOverlay>>,
    filter_service: FilterService,
    presenter_service: PresenterService,
    narrative_service: NarrativeService,
    simulator: PriceSimulator,
    clock: Option<PriceClockHandle>,
}

impl std::fmt::Debug for FundDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundDashboard")
            .field("funds", &self.catalog.len())
            .field("selection", &self.selection)
            .field("favorites", &self.favorites.len())
            .field("narrative", &self.narrative_service)
            .field("clock", &self.clock)
            .finish()
    }
}

impl FundDashboard {
    /// Build a dashboard over `catalog`, loading favorites from `store`.
    ///
    /// A Gemini provider is registered when the settings carry an API key;
    /// otherwise narrative requests fall back to the fixed message.
    pub fn new(
        catalog: FundCatalog,
        settings: Settings,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;

        let provider = GeminiProvider::from_settings(&settings.narrative)
            .map(|p| Box::new(p) as Box<dyn NarrativeProvider>);
        let narrative_service = NarrativeService::new(provider, settings.narrative.grounded_search);
        let favorites = FavoritesRegistry::load(store, settings.favorites_key.clone());
        let simulator = PriceSimulator::from_settings(&settings)?;
        let presenter_service = PresenterService::new(settings.drawdown_bar);

        Ok(Self {
            catalog: Arc::new(catalog),
            settings,
            selection: Selection::default(),
            favorites,
            overlay: Arc::new(RwLock::new(PriceOverlay::new())),
            filter_service: FilterService::new(),
            presenter_service,
            narrative_service,
            simulator,
            clock: None,
        })
    }

    /// Demo dashboard: the curated funds followed by a generated tail whose
    /// histories end today. Seeded from OS entropy, so contents differ per run.
    pub fn demo(settings: Settings, store: Box<dyn KeyValueStore>) -> Result<Self, CoreError> {
        let mut rng = entropy_rng()?;
        let today = chrono::Utc::now().date_naive();
        let catalog =
            builtin_catalog()?.with_synthetic_tail(&mut rng, DEFAULT_SYNTHETIC_COUNT, today)?;
        Self::new(catalog, settings, store)
    }

    /// Replace the narrative provider (e.g. with a different backend or a test double).
    pub fn with_narrative_provider(mut self, provider: Box<dyn NarrativeProvider>) -> Self {
        self.narrative_service =
            NarrativeService::new(Some(provider), self.settings.narrative.grounded_search);
        self
    }

    // ── Catalog & Settings ──────────────────────────────────────────

    #[must_use]
    pub fn catalog(&self) -> &FundCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn get_fund(&self, id: &str) -> Option<&FundRecord> {
        self.catalog.get(id)
    }

    // ── Selection ───────────────────────────────────────────────────

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.selection.search_text = text.into();
    }

    /// Select a category/sector by id, or [`ALL_TAXONOMY_ID`].
    /// Ids that are not part of the catalog's taxonomy are rejected.
    pub fn select_taxonomy(&mut self, id: &str) -> Result<(), CoreError> {
        if id != ALL_TAXONOMY_ID && self.catalog.taxonomy().get(id).is_none() {
            return Err(CoreError::ValidationError(format!(
                "Unknown category/sector '{id}'"
            )));
        }
        self.selection.taxonomy_id = id.to_string();
        Ok(())
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.selection.view_mode = mode;
    }

    pub fn set_sort_order(&mut self, order: FundSortOrder) {
        self.selection.sort_order = order;
    }

    /// Flip the sidebar flag; returns the new state.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.selection.sidebar_collapsed = !self.selection.sidebar_collapsed;
        self.selection.sidebar_collapsed
    }

    /// Back to all funds, no search, catalog order. Keeps the sidebar state.
    pub fn reset_filters(&mut self) {
        let sidebar_collapsed = self.selection.sidebar_collapsed;
        self.selection = Selection {
            sidebar_collapsed,
            ..Selection::default()
        };
    }

    // ── Visible Funds ───────────────────────────────────────────────

    /// Funds matching the current selection, in display order.
    #[must_use]
    pub fn visible_funds(&self) -> Vec<&FundRecord> {
        let mut funds = self.filter_service.visible_funds(
            &self.catalog,
            self.favorites.all(),
            self.selection.view_mode,
            &self.selection.taxonomy_id,
            &self.selection.search_text,
        );
        if self.selection.sort_order != FundSortOrder::Catalog {
            let overlay = self.read_overlay();
            self.filter_service
                .sort_funds(&mut funds, self.selection.sort_order, &overlay);
        }
        funds
    }

    /// Cards for the visible funds, or the no-results state.
    #[must_use]
    pub fn listing(&self) -> FundListing {
        let funds = self.visible_funds();
        let overlay = self.read_overlay();
        let cards = funds
            .iter()
            .map(|f| {
                self.presenter_service
                    .card(f, &overlay, self.favorites.is_favorite(&f.id))
            })
            .collect();
        self.presenter_service
            .listing(self.catalog.taxonomy(), &self.selection.taxonomy_id, cards)
    }

    /// Detail panel for one fund, with the live change applied.
    pub fn fund_detail(&self, id: &str) -> Result<FundDetail, CoreError> {
        let fund = self
            .catalog
            .get(id)
            .ok_or_else(|| CoreError::FundNotFound(id.to_string()))?;
        let overlay = self.read_overlay();
        Ok(self
            .presenter_service
            .detail(fund, &overlay, self.favorites.is_favorite(id)))
    }

    // ── Favorites ───────────────────────────────────────────────────

    /// Flip a fund's favorite flag and persist the whole set.
    /// Returns whether the fund is now a favorite.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool, CoreError> {
        if !self.catalog.contains(id) {
            return Err(CoreError::FundNotFound(id.to_string()));
        }
        self.favorites.toggle(id)
    }

    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.is_favorite(id)
    }

    #[must_use]
    pub fn favorites(&self) -> &BTreeSet<String> {
        self.favorites.all()
    }

    // ── Simulated Prices ────────────────────────────────────────────

    /// Change percent currently displayed for a fund (overlay or baseline).
    #[must_use]
    pub fn current_change(&self, id: &str) -> Option<f64> {
        let fund = self.catalog.get(id)?;
        Some(self.read_overlay().current_change(fund))
    }

    /// Copy of the overlay as it is right now.
    #[must_use]
    pub fn overlay_snapshot(&self) -> PriceOverlay {
        self.read_overlay().clone()
    }

    /// Run one simulation step synchronously with the given random source.
    pub fn tick_prices<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let mut overlay = self.overlay.write().unwrap_or_else(|e| e.into_inner());
        self.simulator.tick(&self.catalog, &mut overlay, rng)
    }

    /// Start the recurring price clock seeded from OS entropy.
    /// Must be called inside a tokio runtime. Restarts a running clock.
    pub fn start_price_clock(&mut self) -> Result<(), CoreError> {
        let rng = entropy_rng()?;
        self.start_price_clock_with_rng(rng);
        Ok(())
    }

    /// Start the recurring price clock with an explicit random source.
    pub fn start_price_clock_with_rng(&mut self, rng: StdRng) {
        self.stop_price_clock();
        self.clock = Some(PriceClock::start(
            Arc::clone(&self.catalog),
            Arc::clone(&self.overlay),
            self.simulator,
            self.settings.tick_interval(),
            rng,
        ));
    }

    /// Cancel the recurring price clock. Safe to call when not running.
    pub fn stop_price_clock(&mut self) {
        if let Some(mut clock) = self.clock.take() {
            clock.stop();
        }
    }

    #[must_use]
    pub fn is_price_clock_running(&self) -> bool {
        self.clock.as_ref().is_some_and(|c| c.is_running())
    }

    /// Ticks completed by the current clock (0 when stopped).
    #[must_use]
    pub fn price_ticks(&self) -> u64 {
        self.clock.as_ref().map_or(0, |c| c.ticks())
    }

    // ── AI Narrative ────────────────────────────────────────────────

    /// General market commentary. Failures yield the fallback text.
    pub async fn request_market_narrative(&self) -> Narrative {
        self.narrative_service.request(&NarrativePrompt::Market).await
    }

    /// Commentary on one fund. Failures yield the fallback text.
    pub async fn request_fund_narrative(&self, id: &str) -> Result<Narrative, CoreError> {
        let fund = self
            .catalog
            .get(id)
            .ok_or_else(|| CoreError::FundNotFound(id.to_string()))?;
        let prompt = NarrativePrompt::for_fund(fund);
        Ok(self.narrative_service.request(&prompt).await)
    }

    #[must_use]
    pub fn is_narrative_loading(&self) -> bool {
        self.narrative_service.is_loading()
    }

    #[must_use]
    pub fn latest_narrative(&self) -> Option<Narrative> {
        self.narrative_service.latest()
    }

    pub fn dismiss_narrative(&self) {
        self.narrative_service.clear();
    }

    // ── Internal ────────────────────────────────────────────────────

    fn read_overlay(&self) -> std::sync::RwLockReadGuard<'_, PriceOverlay> {
        self.overlay.read().unwrap_or_else(|e| e.into_inner())
    }
}
