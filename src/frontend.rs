//! Serves the prebuilt frontend bundle.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// Files under `dir`; any path without a matching file gets `index.html` so
/// client-side routes load the app.
pub fn serve_dir(dir: &Path) -> ServeDir<ServeFile> {
    let index = dir.join("index.html");
    if !index.is_file() {
        tracing::warn!(path = %index.display(), "Frontend index.html not found");
    }
    ServeDir::new(dir).fallback(ServeFile::new(index))
}
