//! Check configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use checkio_bridge::check::{CheckOptions, CheckioLanguage};
//!
//! let options = CheckOptions::for_language(CheckioLanguage::JavaScript)
//!     .with_timeout(Duration::from_secs(10));
//!
//! assert_eq!(options.interpreter, "js-node");
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for one check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// File name of the bundled test form, also its location marker.
pub const FORM_PAGE_MARKER: &str = "checkioTestForm.html";

/// Marker of the CheckiO service address.
pub const RESULT_HOST_MARKER: &str = "checkio.org";

/// Marker of the result page path.
pub const RESULT_PAGE_MARKER: &str = "check-html-output";

// ============================================================================
// CheckioLanguage
// ============================================================================

/// CheckiO course language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CheckioLanguage {
    /// py.checkio.org
    #[default]
    Python,
    /// js.checkio.org
    JavaScript,
}

impl CheckioLanguage {
    /// Interpreter name the service expects.
    #[inline]
    #[must_use]
    pub const fn interpreter(&self) -> &'static str {
        match self {
            Self::Python => "python-3",
            Self::JavaScript => "js-node",
        }
    }

    /// URL the test form is submitted to.
    #[inline]
    #[must_use]
    pub const fn test_form_target_url(&self) -> &'static str {
        match self {
            Self::Python => "https://py.checkio.org/mission/check-html-output/",
            Self::JavaScript => "https://js.checkio.org/mission/check-html-output/",
        }
    }
}

impl fmt::Display for CheckioLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => f.write_str("Python"),
            Self::JavaScript => f.write_str("JavaScript"),
        }
    }
}

// ============================================================================
// PageMarkers
// ============================================================================

/// Substrings used to recognise the pages of the flow.
///
/// Matching is by containment so query strings and redirects still match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMarkers {
    /// Marker of the test form page.
    pub form_page: String,
    /// Marker of the service address; arms the result bridge.
    pub result_host: String,
    /// Marker of the result page path; gets the CheckiO background.
    pub result_page: String,
}

impl Default for PageMarkers {
    fn default() -> Self {
        Self {
            form_page: FORM_PAGE_MARKER.to_string(),
            result_host: RESULT_HOST_MARKER.to_string(),
            result_page: RESULT_PAGE_MARKER.to_string(),
        }
    }
}

impl PageMarkers {
    /// Returns `true` if `location` is the test form.
    #[inline]
    #[must_use]
    pub fn is_form_page(&self, location: &str) -> bool {
        location.contains(&self.form_page)
    }

    /// Returns `true` if `location` is on the service host.
    #[inline]
    #[must_use]
    pub fn is_result_host(&self, location: &str) -> bool {
        location.contains(&self.result_host)
    }

    /// Returns `true` if `location` is the result page.
    #[inline]
    #[must_use]
    pub fn is_result_page(&self, location: &str) -> bool {
        location.contains(&self.result_page)
    }
}

// ============================================================================
// CheckOptions
// ============================================================================

/// Configuration of a [`CheckOrchestrator`](super::CheckOrchestrator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Deadline for the page to report, measured from the start of the wait.
    pub timeout: Duration,

    /// Interpreter name put into the form.
    pub interpreter: String,

    /// URL the form is submitted to.
    pub target_url: String,

    /// Test form location; `None` uses the bundled page.
    pub form_page_url: Option<String>,

    /// Page recognition markers.
    pub markers: PageMarkers,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl CheckOptions {
    /// Creates options for the Python course.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::for_language(CheckioLanguage::Python)
    }

    /// Creates options for `language`.
    #[must_use]
    pub fn for_language(language: CheckioLanguage) -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interpreter: language.interpreter().to_string(),
            target_url: language.test_form_target_url().to_string(),
            form_page_url: None,
            markers: PageMarkers::default(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl CheckOptions {
    /// Sets the deadline.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the interpreter name.
    #[inline]
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Sets the form target URL.
    #[inline]
    #[must_use]
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    /// Loads the test form from `url` instead of the bundled page.
    #[inline]
    #[must_use]
    pub fn with_form_page_url(mut self, url: impl Into<String>) -> Self {
        self.form_page_url = Some(url.into());
        self
    }

    /// Sets the service host marker.
    #[inline]
    #[must_use]
    pub fn with_result_host_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.result_host = marker.into();
        self
    }

    /// Replaces all page markers.
    #[inline]
    #[must_use]
    pub fn with_markers(mut self, markers: PageMarkers) -> Self {
        self.markers = markers;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl CheckOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::config("Timeout must be greater than zero"));
        }

        if self.interpreter.trim().is_empty() {
            return Err(Error::config("Interpreter name must not be empty"));
        }

        Url::parse(&self.target_url)
            .map_err(|e| Error::config(format!("Invalid target URL {}: {e}", self.target_url)))?;

        if let Some(form_page_url) = &self.form_page_url {
            Url::parse(form_page_url).map_err(|e| {
                Error::config(format!("Invalid form page URL {form_page_url}: {e}"))
            })?;
        }

        let markers = &self.markers;
        if markers.form_page.is_empty()
            || markers.result_host.is_empty()
            || markers.result_page.is_empty()
        {
            return Err(Error::config("Page markers must not be empty"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_python_defaults() {
        let options = CheckOptions::new();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.interpreter, "python-3");
        assert_eq!(
            options.target_url,
            "https://py.checkio.org/mission/check-html-output/"
        );
        assert!(options.form_page_url.is_none());
        assert_eq!(options.markers, PageMarkers::default());
    }

    #[test]
    fn test_javascript_defaults() {
        let options = CheckOptions::for_language(CheckioLanguage::JavaScript);
        assert_eq!(options.interpreter, "js-node");
        assert!(options.target_url.starts_with("https://js.checkio.org/"));
    }

    #[test]
    fn test_builder_chain() {
        let options = CheckOptions::new()
            .with_timeout(Duration::from_secs(5))
            .with_interpreter("python-2")
            .with_target_url("https://checkio.example/submit")
            .with_form_page_url("file:///tmp/checkioTestForm.html")
            .with_result_host_marker("checkio.example");

        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.interpreter, "python-2");
        assert_eq!(options.markers.result_host, "checkio.example");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let options = CheckOptions::new().with_timeout(Duration::ZERO);
        assert!(matches!(options.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_validate_bad_target_url() {
        let options = CheckOptions::new().with_target_url("not a url");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_empty_marker() {
        let options = CheckOptions::new().with_result_host_marker("");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_markers_match_by_containment() {
        let markers = PageMarkers::default();
        assert!(markers.is_form_page("file:///tmp/x/checkioTestForm.html?x=1"));
        assert!(markers.is_result_host("https://py.checkio.org/mission/check-html-output/"));
        assert!(markers.is_result_page("https://py.checkio.org/mission/check-html-output/"));
        assert!(!markers.is_result_host("https://example.com/"));
    }
}
