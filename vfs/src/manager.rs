use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Hook receiving `(url, items_loaded, items_total)`.
pub type ItemHook = Box<dyn Fn(&str, usize, usize) + Send + Sync>;
/// Rewrites a resolved URL before it is fetched.
pub type UrlModifier = Box<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Default)]
struct Counters {
    is_loading: bool,
    items_loaded: usize,
    items_total: usize,
}

/// Bookkeeping for every fetch and image decode issued while loading assets.
///
/// The resolvers call [`item_start`](Self::item_start) before an item begins
/// and [`item_end`](Self::item_end) once it settles (plus
/// [`item_error`](Self::item_error) when it failed). The manager owns the
/// counters and derives the four hook calls from them:
///
/// - `on_start`: the first item after the manager was idle
/// - `on_progress`: every time an item ends
/// - `on_load`: when every started item has ended
/// - `on_error`: when an item failed
///
/// Hooks run after the counter lock is released, so they may query the
/// manager.
///
/// # Example
///
/// ```ignore
/// let manager = LoadingManager::new()
///     .on_progress(|url, loaded, total| log::info!("{url}: {loaded}/{total}"))
///     .on_load(|| log::info!("all done"));
/// ```
#[derive(Default)]
pub struct LoadingManager {
    counters: Mutex<Counters>,
    on_start: Option<ItemHook>,
    on_progress: Option<ItemHook>,
    on_load: Option<Box<dyn Fn() + Send + Sync>>,
    on_error: Option<Box<dyn Fn(&str) + Send + Sync>>,
    url_modifier: RwLock<Option<UrlModifier>>,
}

impl LoadingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, hook: impl Fn(&str, usize, usize) + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub fn on_progress(
        mut self,
        hook: impl Fn(&str, usize, usize) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(hook));
        self
    }

    pub fn on_load(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_load = Some(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Install (or clear) the URL modifier applied by [`resolve_url`](Self::resolve_url).
    pub fn set_url_modifier(&self, modifier: Option<UrlModifier>) {
        *self.url_modifier.write() = modifier;
    }

    /// Rewrite `url` through the installed modifier, if any.
    pub fn resolve_url(&self, url: &str) -> String {
        match self.url_modifier.read().as_ref() {
            Some(modifier) => modifier(url),
            None => url.to_owned(),
        }
    }

    /// Start tracking `url`; the returned [`LoadItem`] ends it.
    pub fn begin(self: &Arc<Self>, url: &str) -> LoadItem {
        self.item_start(url);
        LoadItem {
            manager: self.clone(),
            url: url.to_owned(),
            succeeded: false,
        }
    }

    pub fn item_start(&self, url: &str) {
        let notify = {
            let mut counters = self.counters.lock();
            counters.items_total += 1;
            let first = !counters.is_loading;
            counters.is_loading = true;
            first.then_some((counters.items_loaded, counters.items_total))
        };
        log::debug!("loading {url}");
        if let (Some((loaded, total)), Some(hook)) = (notify, &self.on_start) {
            hook(url, loaded, total);
        }
    }

    pub fn item_end(&self, url: &str) {
        let (loaded, total, done) = {
            let mut counters = self.counters.lock();
            counters.items_loaded += 1;
            let done = counters.items_loaded == counters.items_total;
            if done {
                counters.is_loading = false;
            }
            (counters.items_loaded, counters.items_total, done)
        };
        if let Some(hook) = &self.on_progress {
            hook(url, loaded, total);
        }
        if done && let Some(hook) = &self.on_load {
            hook();
        }
    }

    pub fn item_error(&self, url: &str) {
        log::warn!("failed to load {url}");
        if let Some(hook) = &self.on_error {
            hook(url);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.counters.lock().is_loading
    }

    pub fn items_loaded(&self) -> usize {
        self.counters.lock().items_loaded
    }

    pub fn items_total(&self) -> usize {
        self.counters.lock().items_total
    }
}

/// One item in flight, started with [`LoadingManager::begin`].
///
/// Dropping it calls [`item_end`](LoadingManager::item_end), followed by
/// [`item_error`](LoadingManager::item_error) unless it was marked with
/// [`succeed`](Self::succeed). An abandoned load therefore still settles the
/// counters.
#[must_use = "dropping a LoadItem ends it as failed"]
pub struct LoadItem {
    manager: Arc<LoadingManager>,
    url: String,
    succeeded: bool,
}

impl LoadItem {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// End the item without reporting an error.
    pub fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for LoadItem {
    fn drop(&mut self) {
        self.manager.item_end(&self.url);
        if !self.succeeded {
            self.manager.item_error(&self.url);
        }
    }
}
