use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::{info, warn};

use crate::errors::CoreError;
use crate::models::narrative::{Narrative, NarrativePrompt, NarrativeRequest};
use crate::providers::traits::NarrativeProvider;

/// Requests AI commentary and turns every failure into the fallback text.
///
/// The loading flag is only advisory: the UI disables its trigger while it is
/// set, but overlapping requests are not rejected here. The last completed
/// request wins.
pub struct NarrativeService {
    provider: Option<Box<dyn NarrativeProvider>>,
    grounded: bool,
    loading: AtomicBool,
    latest: Mutex<Option<Narrative>>,
}

/// Clears the loading flag on every exit path, including cancellation of the future.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        LoadingGuard(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl NarrativeService {
    pub fn new(provider: Option<Box<dyn NarrativeProvider>>, grounded: bool) -> Self {
        Self {
            provider,
            grounded,
            loading: AtomicBool::new(false),
            latest: Mutex::new(None),
        }
    }

    /// A service with no provider; every request returns the fallback.
    pub fn disabled() -> Self {
        Self::new(None, false)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Issue one request. Never fails: errors become [`Narrative::fallback`].
    pub async fn request(&self, prompt: &NarrativePrompt) -> Narrative {
        let _guard = LoadingGuard::acquire(&self.loading);
        self.clear();

        let request = NarrativeRequest {
            prompt: prompt.to_text(),
            grounded: self.grounded,
        };
        let result = match &self.provider {
            Some(provider) => provider.generate(&request).await,
            None => Err(CoreError::NoProvider(
                "set narrative.api_key or GEMINI_API_KEY".into(),
            )),
        };
        let source = self.provider_name().unwrap_or("none");

        let narrative = match result {
            Ok(text) => {
                info!("Narrative received from {source} ({} chars)", text.chars().count());
                Narrative::new(text)
            }
            Err(e) => {
                warn!("Narrative request to {source} failed: {e}");
                Narrative::fallback()
            }
        };

        self.store(narrative.clone());
        narrative
    }

    /// Most recent completed narrative, if not dismissed.
    pub fn latest(&self) -> Option<Narrative> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Dismiss the current narrative.
    pub fn clear(&self) {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn store(&self, narrative: Narrative) {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(narrative);
    }
}

impl std::fmt::Debug for NarrativeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeService")
            .field("provider", &self.provider_name())
            .field("grounded", &self.grounded)
            .field("loading", &self.is_loading())
            .finish()
    }
}
