//! Bundled test form page.
//!
//! The check flow starts from a local HTML page carrying the form the
//! CheckiO service accepts. The page is written to a private temporary
//! directory and loaded from a `file://` URL whose file name doubles as the
//! form-page location marker.
//!
//! # Page Contract
//!
//! 1. The surface loads the page
//! 2. The watcher fills `access-token`, `task-id`, `interpreter`, `code`
//! 3. The watcher points `test-form` at the target URL and submits it
//! 4. The service answers with the result page

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

use super::options::FORM_PAGE_MARKER;

// ============================================================================
// FormPage
// ============================================================================

/// The bundled test form, written to disk.
///
/// The file is removed when this value is dropped.
pub struct FormPage {
    dir: TempDir,
    url: String,
}

impl fmt::Debug for FormPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormPage")
            .field("dir", &self.dir.path())
            .field("url", &self.url)
            .finish()
    }
}

impl FormPage {
    /// Writes the bundled form into a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the directory or file cannot be written
    /// - [`Error::Config`] if the path cannot be expressed as a URL
    pub fn materialize() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("checkio-form-")
            .tempdir()?;

        let path = dir.path().join(FORM_PAGE_MARKER);
        fs::write(&path, TEST_FORM_HTML)?;

        let url = Url::from_file_path(&path)
            .map_err(|()| Error::config(format!("Not an absolute path: {}", path.display())))?
            .to_string();

        debug!(url = %url, "Test form written");
        Ok(Self { dir, url })
    }

    /// Returns the `file://` URL of the page.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the path of the page on disk.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.path().join(FORM_PAGE_MARKER)
    }

    /// Returns the directory holding the page.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

// ============================================================================
// Constants
// ============================================================================

/// HTML of the test form.
///
/// Element ids must match the contract in [`crate::protocol::payload`].
pub const TEST_FORM_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>CheckiO Test Form</title>
    <style>
        body {
            background: #DEE7F6;
            font-family: sans-serif;
            padding: 40px;
        }
        form { display: none; }
    </style>
</head>
<body>
    <div>Sending solution to CheckiO...</div>
    <form id="test-form" method="post">
        <input type="hidden" id="access-token" name="token">
        <input type="hidden" id="task-id" name="task_num">
        <input type="hidden" id="interpreter" name="interpreter">
        <textarea id="code" name="code"></textarea>
    </form>
</body>
</html>"##;

// ============================================================================
// Tests
// ============================================================================
