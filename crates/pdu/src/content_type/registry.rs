//! Process-wide media type registry.
//!
//! The registry is built once from the well-known table on first use and is read lock-free
//! afterwards. [`ContentType::register`](super::ContentType::register) is the only write path:
//! it clones the current tables, inserts the new descriptor and swaps the result in, so readers
//! never block and never observe a half-written registry.

use std::collections::HashMap;
use std::sync::Arc as StdArc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use tracing::debug;
use triomphe::Arc;

/// The shared, immutable part of a content type: its media type and file extensions.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MediaDescriptor {
    pub(crate) media_type: String,
    pub(crate) file_extensions: Vec<String>,
}

impl MediaDescriptor {
    pub(crate) fn new(media_type: impl Into<String>, file_extensions: Vec<String>) -> Self {
        Self { media_type: media_type.into(), file_extensions }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    by_media_type: HashMap<String, Arc<MediaDescriptor>>,
    by_extension: HashMap<String, Vec<Arc<MediaDescriptor>>>,
}

const WELL_KNOWN: &[(&str, &[&str])] = &[
    ("*/*", &[]),
    ("application/json", &["json"]),
    ("application/octet-stream", &["bin", "exe", "dll", "so", "dmg", "iso"]),
    ("application/x-www-form-urlencoded", &[]),
    ("application/xml", &["xml", "xsd"]),
    ("application/javascript", &["js"]),
    ("application/pdf", &["pdf"]),
    ("application/zip", &["zip"]),
    ("application/gzip", &["gz", "tgz"]),
    ("application/wasm", &["wasm"]),
    ("multipart/form-data", &[]),
    ("multipart/byteranges", &[]),
    ("multipart/mixed", &[]),
    ("text/plain", &["txt", "text", "log"]),
    ("text/html", &["html", "htm"]),
    ("text/css", &["css"]),
    ("text/csv", &["csv"]),
    ("text/javascript", &["js", "mjs"]),
    ("text/xml", &["xml"]),
    ("text/event-stream", &[]),
    ("image/png", &["png"]),
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
    ("image/svg+xml", &["svg"]),
    ("image/x-icon", &["ico"]),
    ("font/woff", &["woff"]),
    ("font/woff2", &["woff2"]),
    ("audio/mpeg", &["mp3"]),
    ("video/mp4", &["mp4"]),
];

static REGISTRY: Lazy<ArcSwap<Registry>> = Lazy::new(|| ArcSwap::from_pointee(Registry::well_known()));

impl Registry {
    fn well_known() -> Self {
        let mut registry = Self::default();
        for (media_type, extensions) in WELL_KNOWN {
            let extensions = extensions.iter().map(|extension| (*extension).to_string()).collect();
            registry.insert(Arc::new(MediaDescriptor::new(*media_type, extensions)));
        }
        registry
    }

    /// Inserts or replaces the descriptor for its media type.
    fn insert(&mut self, descriptor: Arc<MediaDescriptor>) {
        if let Some(previous) = self.by_media_type.insert(descriptor.media_type.clone(), Arc::clone(&descriptor)) {
            for extension in &previous.file_extensions {
                if let Some(entries) = self.by_extension.get_mut(extension) {
                    entries.retain(|entry| !Arc::ptr_eq(entry, &previous));
                }
            }
        }
        for extension in &descriptor.file_extensions {
            self.by_extension.entry(extension.clone()).or_default().push(Arc::clone(&descriptor));
        }
    }

    pub(crate) fn load() -> StdArc<Registry> {
        REGISTRY.load_full()
    }

    pub(crate) fn by_media_type(&self, media_type: &str) -> Option<Arc<MediaDescriptor>> {
        self.by_media_type.get(media_type).cloned()
    }

    pub(crate) fn by_extension(&self, extension: &str) -> &[Arc<MediaDescriptor>] {
        self.by_extension.get(extension).map_or(&[], Vec::as_slice)
    }

    /// Registers a descriptor, merging the extensions of an existing entry for the same
    /// media type. Returns the descriptor that ended up in the registry.
    pub(crate) fn register(media_type: &str, extensions: &[&str]) -> Arc<MediaDescriptor> {
        let mut registered = None;
        REGISTRY.rcu(|current| {
            let mut next = Registry::clone(current);
            let mut file_extensions =
                current.by_media_type.get(media_type).map(|existing| existing.file_extensions.clone()).unwrap_or_default();
            for extension in extensions {
                let extension = normalize_extension(extension);
                if !extension.is_empty() && !file_extensions.contains(&extension) {
                    file_extensions.push(extension);
                }
            }
            let descriptor = Arc::new(MediaDescriptor::new(media_type, file_extensions));
            next.insert(Arc::clone(&descriptor));
            registered = Some(descriptor);
            next
        });

        debug!(media_type, "registered content type");
        registered.unwrap_or_else(|| Arc::new(MediaDescriptor::new(media_type, Vec::new())))
    }
}

pub(crate) fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}
