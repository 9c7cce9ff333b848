use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::RwLock;
use tokio::{
    runtime::{Handle, Runtime},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::errors::InterfaceError;
use crate::localisation::{
    crowdin::TranslationsApi,
    languages::{default_language, language_by_code},
    models::{LangType, Translations},
    storage::KeyValueStorage,
};

/// Storage key under which the selected language code is persisted.
pub const CACHE_KEY: &str = "pancakeSwapLanguage";

#[derive(Default)]
struct LanguageState {
    selected_language: Option<LangType>,
    translated_language: Option<LangType>,
    translations: Translations,
}

struct Inner {
    storage: Arc<dyn KeyValueStorage>,
    api: Arc<dyn TranslationsApi>,
    state: RwLock<LanguageState>,
    initialized: AtomicBool,
}

/// Returns the current runtime handle, or starts a runtime owned by the caller when none is
/// running.
fn runtime_handle() -> Result<(Handle, Option<Arc<Runtime>>), InterfaceError> {
    match Handle::try_current() {
        Ok(handle) => Ok((handle, None)),
        Err(_) => {
            let runtime = Runtime::new()?;
            Ok((runtime.handle().clone(), Some(Arc::new(runtime))))
        }
    }
}

/// Holds the selected UI language and the translations fetched for it.
///
/// Cloning is cheap and every clone shares the same state, so the provider can be handed to any
/// number of UI components. Every selection change fires a translation fetch on the tokio
/// runtime. In-flight fetches are never cancelled: when selections change quickly, whichever
/// response resolves last determines the translations.
#[derive(Clone)]
pub struct LanguageProvider {
    inner: Arc<Inner>,
    runtime_handle: Handle,
    // Keeps the runtime alive when the provider was created outside of one.
    #[allow(dead_code)]
    runtime: Option<Arc<Runtime>>,
}

impl LanguageProvider {
    /// Creates a provider spawning its fetches on the current tokio runtime, or on a runtime of
    /// its own when called outside of one.
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        api: Arc<dyn TranslationsApi>,
    ) -> Result<Self, InterfaceError> {
        let (runtime_handle, runtime) = runtime_handle()?;
        Ok(Self {
            inner: Arc::new(Inner {
                storage,
                api,
                state: RwLock::new(LanguageState::default()),
                initialized: AtomicBool::new(false),
            }),
            runtime_handle,
            runtime,
        })
    }

    /// Selects the stored language, or the default one when nothing known is stored.
    ///
    /// Runs once per provider. Later calls return `None` and change nothing. The returned handle
    /// resolves when the translation fetch for the initial language has been applied.
    pub fn initialize(&self) -> Option<JoinHandle<()>> {
        if self
            .inner
            .initialized
            .swap(true, Ordering::SeqCst)
        {
            return None;
        }

        let stored_code = self
            .inner
            .storage
            .get_item(CACHE_KEY)
            .unwrap_or_else(|err| {
                warn!(%err, "Failed to read the stored language");
                None
            });
        let language = match stored_code.as_deref().and_then(language_by_code) {
            Some(language) => language.clone(),
            None => {
                debug!(stored = ?stored_code, "No known stored language, using the default");
                default_language()
            }
        };
        Some(self.apply_selection(language))
    }

    pub fn selected_language(&self) -> Option<LangType> {
        self.inner
            .state
            .read()
            .selected_language
            .clone()
    }

    /// Selects `language` and persists its code.
    ///
    /// The language is not validated. Selecting the current language again fetches its
    /// translations again.
    pub fn set_selected_language(&self, language: LangType) -> JoinHandle<()> {
        if let Err(err) = self
            .inner
            .storage
            .set_item(CACHE_KEY, &language.code)
        {
            warn!(%err, code = %language.code, "Failed to persist the selected language");
        }
        self.apply_selection(language)
    }

    /// The language the current translations belong to.
    pub fn translated_language(&self) -> Option<LangType> {
        self.inner
            .state
            .read()
            .translated_language
            .clone()
    }

    pub fn set_translated_language(&self, language: LangType) {
        self.inner.state.write().translated_language = Some(language);
    }

    pub fn translations(&self) -> Translations {
        self.inner
            .state
            .read()
            .translations
            .clone()
    }

    pub fn set_translations(&self, translations: Translations) {
        self.inner.state.write().translations = translations;
    }

    /// Text for the string `string_id` in the current translations, or `fallback`.
    pub fn translate(&self, string_id: u64, fallback: &str) -> String {
        self.inner
            .state
            .read()
            .translations
            .text_for(string_id)
            .unwrap_or(fallback)
            .to_string()
    }

    fn apply_selection(&self, language: LangType) -> JoinHandle<()> {
        self.inner.state.write().selected_language = Some(language.clone());
        let inner = Arc::clone(&self.inner);
        self.runtime_handle
            .spawn(async move { refresh_translations(inner, language).await })
    }
}

async fn refresh_translations(inner: Arc<Inner>, language: LangType) {
    match inner
        .api
        .list_language_translations(&language.code)
        .await
    {
        Ok(entries) if !entries.is_empty() => {
            info!(code = %language.code, count = entries.len(), "Loaded translations");
            let mut state = inner.state.write();
            state.translations = Translations::new(entries);
            state.translated_language = Some(language);
        }
        Ok(_) => {
            warn!(code = %language.code, "Translation API returned no entries");
            inner.state.write().translations = Translations::error();
        }
        Err(err) => {
            warn!(code = %language.code, %err, "Failed to fetch translations");
            inner.state.write().translations = Translations::error();
        }
    }
}
