use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Types known without consulting any `mime.types` file.
const BUILTIN: &[(&str, &str)] = &[
    (".avif", "image/avif"),
    (".css", "text/css; charset=utf-8"),
    (".gif", "image/gif"),
    (".htm", "text/html; charset=utf-8"),
    (".html", "text/html; charset=utf-8"),
    (".jpeg", "image/jpeg"),
    (".jpg", "image/jpeg"),
    (".js", "text/javascript; charset=utf-8"),
    (".json", "application/json"),
    (".mjs", "text/javascript; charset=utf-8"),
    (".pdf", "application/pdf"),
    (".png", "image/png"),
    (".svg", "image/svg+xml"),
    (".wasm", "application/wasm"),
    (".webp", "image/webp"),
    (".xml", "text/xml; charset=utf-8"),
];

/// Usual locations of system `mime.types` files.
pub fn system_mime_files() -> Vec<PathBuf> {
    [
        "/etc/mime.types",
        "/etc/apache2/mime.types",
        "/etc/apache/mime.types",
        "/etc/httpd/conf/mime.types",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

/// The extension of a file name: the suffix from its final `.`, or `""`.
pub fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[i..],
        None => "",
    }
}

/// Extension to content-type table.
#[derive(Clone, Debug)]
pub struct MimeTypes {
    by_ext: HashMap<String, String>,
}

impl MimeTypes {
    /// Table holding only the built-in types.
    pub fn builtin() -> Self {
        let by_ext = BUILTIN
            .iter()
            .map(|(ext, ct)| (ext.to_string(), ct.to_string()))
            .collect();
        Self { by_ext }
    }

    /// Built-in types, extended by every readable file in `files`.
    ///
    /// Files that do not exist are skipped; later files override earlier ones.
    pub fn load(files: &[PathBuf]) -> io::Result<Self> {
        let mut types = Self::builtin();
        for path in files {
            match types.load_file(path) {
                Ok(n) => debug!(path = %path.display(), types = n, "loaded mime types"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(types)
    }

    /// Merge a `mime.types`-format file: `type ext1 ext2 ...` per line, `#`
    /// starts a comment. Returns the number of extensions registered.
    pub fn load_file(&mut self, path: &Path) -> io::Result<usize> {
        let text = fs::read_to_string(path)?;
        Ok(self.merge(&text))
    }

    fn merge(&mut self, text: &str) -> usize {
        let mut added = 0;
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("");
            let mut fields = line.split_whitespace();
            let Some(mime) = fields.next() else { continue };
            let mime = with_text_charset(mime);
            for ext in fields {
                self.insert(ext, &mime);
                added += 1;
            }
        }
        added
    }

    /// Register a type for an extension (with or without the leading dot).
    pub fn insert(&mut self, ext: &str, mime: &str) {
        let ext = if ext.starts_with('.') {
            ext.to_ascii_lowercase()
        } else {
            format!(".{}", ext.to_ascii_lowercase())
        };
        self.by_ext.insert(ext, mime.to_owned());
    }

    /// Type for an extension such as `".html"`.
    ///
    /// Tries the extension as given, then lowercased.
    pub fn by_extension(&self, ext: &str) -> Option<&str> {
        if ext.is_empty() {
            return None;
        }
        self.by_ext
            .get(ext)
            .or_else(|| self.by_ext.get(&ext.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Type for a file name, derived from its extension.
    pub fn for_name(&self, name: &str) -> Option<&str> {
        self.by_extension(extension(name))
    }
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `text/*` types without an explicit charset are served as UTF-8.
fn with_text_charset(mime: &str) -> String {
    if mime.starts_with("text/") && !mime.contains("charset=") {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_owned()
    }
}
