use futures::future::{self, LocalBoxFuture};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::glyph::{self, FontGlyphs};

/// How long to wait after a failed load before carrying on with the fallback face.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font \"{family}\" ({weight}) is unavailable: {reason}")]
    Unavailable {
        family: String,
        weight: u16,
        reason: String,
    },

    #[error("invalid font data")]
    InvalidFont,
}

/// Where font bytes come from (a remote catalog, a directory, embedded data).
pub trait FontSource {
    fn fetch(&self, family: &str, weight: u16) -> LocalBoxFuture<'static, Result<Vec<u8>, FontError>>;
}

/// Serves egui's embedded face for every family and weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFontSource;

impl FontSource for BuiltinFontSource {
    fn fetch(&self, family: &str, weight: u16) -> LocalBoxFuture<'static, Result<Vec<u8>, FontError>> {
        let result = glyph::builtin_font_bytes().ok_or_else(|| FontError::Unavailable {
            family: family.to_owned(),
            weight,
            reason: "no embedded fonts".to_owned(),
        });
        Box::pin(future::ready(result))
    }
}

/// Timer used for the fallback wait; supplied by the host event loop.
pub type Sleep = Box<dyn Fn(Duration) -> LocalBoxFuture<'static, ()>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    weight: u16,
}

/// Loads and caches faces per `(family, weight)`.
///
/// A failed load never fails the caller: after the fallback delay the
/// fallback face (if any) is cached in its place and returned.
pub struct FontLoader<S> {
    source: S,
    cache: Mutex<HashMap<FontKey, FontGlyphs>>,
    fallback: Option<FontGlyphs>,
    fallback_delay: Duration,
    sleep: Sleep,
}

impl<S: FontSource> FontLoader<S> {
    pub fn new(source: S, sleep: impl Fn(Duration) -> LocalBoxFuture<'static, ()> + 'static) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            fallback: None,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            sleep: Box::new(sleep),
        }
    }

    pub fn with_fallback(mut self, glyphs: FontGlyphs) -> Self {
        self.fallback = Some(glyphs);
        self
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    pub fn is_loaded(&self, family: &str, weight: u16) -> bool {
        self.cache.lock().contains_key(&FontKey {
            family: family.to_owned(),
            weight,
        })
    }

    /// Resolves the face for `(family, weight)`, fetching it at most once.
    pub async fn load(&self, family: &str, weight: u16) -> Option<FontGlyphs> {
        let key = FontKey {
            family: family.to_owned(),
            weight,
        };
        let cached = self.cache.lock().get(&key).cloned();
        if cached.is_some() {
            return cached;
        }

        let fetched = self
            .source
            .fetch(family, weight)
            .await
            .and_then(FontGlyphs::from_bytes);

        match fetched {
            Ok(glyphs) => {
                debug!("Loaded font {family} ({weight})");
                self.cache.lock().insert(key, glyphs.clone());
                Some(glyphs)
            }
            Err(err) => {
                warn!("{err}; continuing with fallback after {:?}", self.fallback_delay);
                (self.sleep)(self.fallback_delay).await;
                let fallback = self.fallback.clone();
                if let Some(glyphs) = &fallback {
                    self.cache.lock().insert(key, glyphs.clone());
                }
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingSource {
        fetches: Rc<Cell<usize>>,
        fail: bool,
    }

    impl FontSource for CountingSource {
        fn fetch(&self, family: &str, weight: u16) -> LocalBoxFuture<'static, Result<Vec<u8>, FontError>> {
            self.fetches.set(self.fetches.get() + 1);
            if self.fail {
                return Box::pin(future::ready(Err(FontError::Unavailable {
                    family: family.to_owned(),
                    weight,
                    reason: "offline".to_owned(),
                })));
            }
            BuiltinFontSource.fetch(family, weight)
        }
    }

    fn no_wait(_: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(future::ready(()))
    }

    #[test]
    fn loads_are_cached_per_family_and_weight() {
        let fetches = Rc::new(Cell::new(0));
        let loader = FontLoader::new(
            CountingSource {
                fetches: fetches.clone(),
                fail: false,
            },
            no_wait,
        );

        assert!(block_on(loader.load("Caveat", 400)).is_some());
        assert!(block_on(loader.load("Caveat", 400)).is_some());
        assert_eq!(fetches.get(), 1);
        assert!(loader.is_loaded("Caveat", 400));
        assert!(!loader.is_loaded("Caveat", 700));

        block_on(loader.load("Caveat", 700));
        assert_eq!(fetches.get(), 2);
    }

    #[test]
    fn failures_wait_then_fall_back() {
        let waited = Rc::new(Cell::new(Duration::ZERO));
        let recorded = waited.clone();
        let loader = FontLoader::new(
            CountingSource {
                fetches: Rc::new(Cell::new(0)),
                fail: true,
            },
            move |delay| {
                recorded.set(delay);
                Box::pin(future::ready(())) as LocalBoxFuture<'static, ()>
            },
        )
        .with_fallback(FontGlyphs::builtin().unwrap());

        assert!(block_on(loader.load("Missing Sans", 400)).is_some());
        assert_eq!(waited.get(), DEFAULT_FALLBACK_DELAY);
        assert!(loader.is_loaded("Missing Sans", 400));
    }

    #[test]
    fn failure_without_fallback_resolves_to_none() {
        let loader = FontLoader::new(
            CountingSource {
                fetches: Rc::new(Cell::new(0)),
                fail: true,
            },
            no_wait,
        );
        assert!(block_on(loader.load("Missing Sans", 400)).is_none());
        assert!(!loader.is_loaded("Missing Sans", 400));
    }
}
