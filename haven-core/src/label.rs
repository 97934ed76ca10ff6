use std::fmt;

use smol_str::SmolStr;

/// Name of a storage backend as it appears in logs, e.g. `moka` or `feoxdb`.
///
/// ```
/// use haven_core::BackendLabel;
///
/// assert_eq!(BackendLabel::new_static("moka").as_str(), "moka");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// Creates a label.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Creates a label from a literal without allocating.
    pub const fn new_static(name: &'static str) -> Self {
        Self(SmolStr::new_static(name))
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BackendLabel {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
