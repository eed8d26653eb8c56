//! Cookie material resolution for the strategy catalogue
//!
//! Cookie material comes from the environment, never from code:
//! `YTDL_COOKIES_FILE` points at an existing Netscape-format file, or
//! `YTDLP_COOKIES` carries the file content inline (useful on platforms where
//! only env vars survive deploys). Inline content is written once to a temp
//! file at first use and reused for the process lifetime.

use crate::core::config;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

static RESOLVED_COOKIES: Lazy<Option<PathBuf>> = Lazy::new(resolve);

/// Returns the cookie file to attach to cookie-enabled strategies, if any.
pub fn cookies_path() -> Option<&'static Path> {
    RESOLVED_COOKIES.as_deref()
}

fn resolve() -> Option<PathBuf> {
    // A configured file wins over inline content
    if let Some(ref file) = *config::YTDL_COOKIES_FILE {
        if !file.is_empty() {
            let expanded = PathBuf::from(config::expand_path(file));
            if expanded.exists() {
                log::info!("🍪 Using cookie file: {}", expanded.display());
                return Some(expanded);
            }
            log::warn!("🍪 YTDL_COOKIES_FILE set but missing on disk: {}", expanded.display());
        }
    }

    let content = config::YTDLP_COOKIES.as_ref()?;
    let path = std::env::temp_dir().join(format!("clipsmith_cookies_{}.txt", std::process::id()));
    match std::fs::write(&path, content) {
        Ok(()) => {
            log::info!("🍪 Materialised inline cookies to {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::error!("🍪 Failed to write inline cookies: {}", e);
            None
        }
    }
}
