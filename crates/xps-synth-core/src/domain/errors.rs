use std::error::Error;
use std::fmt::{Display, Formatter};

pub type XpsResult<T> = Result<T, XpsError>;
pub type SynthesisResult<T> = XpsResult<T>;
pub type ExportResult<T> = XpsResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum XpsErrorCategory {
    ConfigurationError,
    MissingReferenceError,
    IrregularGridError,
    GridMismatchError,
    SamplingExhaustionError,
    ExportError,
    InternalError,
}

impl XpsErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ConfigurationError => 2,
            Self::MissingReferenceError => 3,
            Self::IrregularGridError => 4,
            Self::GridMismatchError => 5,
            Self::SamplingExhaustionError => 6,
            Self::ExportError => 7,
            Self::InternalError => 8,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationError => "ConfigurationError",
            Self::MissingReferenceError => "MissingReferenceError",
            Self::IrregularGridError => "IrregularGridError",
            Self::GridMismatchError => "GridMismatchError",
            Self::SamplingExhaustionError => "SamplingExhaustionError",
            Self::ExportError => "ExportError",
            Self::InternalError => "InternalError",
        }
    }

    /// Row-level categories skip the affected row; everything else aborts the run.
    pub const fn is_row_recoverable(self) -> bool {
        matches!(
            self,
            Self::GridMismatchError | Self::SamplingExhaustionError
        )
    }
}

impl Display for XpsErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpsError {
    category: XpsErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl XpsError {
    pub fn new(
        category: XpsErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XpsErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn missing_reference(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XpsErrorCategory::MissingReferenceError, placeholder, message)
    }

    pub fn irregular_grid(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XpsErrorCategory::IrregularGridError, placeholder, message)
    }

    pub fn grid_mismatch(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XpsErrorCategory::GridMismatchError, placeholder, message)
    }

    pub fn sampling_exhaustion(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            XpsErrorCategory::SamplingExhaustionError,
            placeholder,
            message,
        )
    }

    pub fn export(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XpsErrorCategory::ExportError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XpsErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> XpsErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for XpsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for XpsError {}

#[cfg(test)]
mod tests {
    use super::{XpsError, XpsErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (XpsErrorCategory::ConfigurationError, 2),
            (XpsErrorCategory::MissingReferenceError, 3),
            (XpsErrorCategory::IrregularGridError, 4),
            (XpsErrorCategory::GridMismatchError, 5),
            (XpsErrorCategory::SamplingExhaustionError, 6),
            (XpsErrorCategory::ExportError, 7),
            (XpsErrorCategory::InternalError, 8),
        ];

        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code);
        }
    }

    #[test]
    fn only_row_level_categories_are_recoverable() {
        assert!(XpsErrorCategory::GridMismatchError.is_row_recoverable());
        assert!(XpsErrorCategory::SamplingExhaustionError.is_row_recoverable());
        assert!(!XpsErrorCategory::ConfigurationError.is_row_recoverable());
        assert!(!XpsErrorCategory::ExportError.is_row_recoverable());
    }

    #[test]
    fn error_renders_diagnostic_lines() {
        let error = XpsError::configuration("CONFIG.COUNT", "simulation count must be positive");

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [CONFIG.COUNT] simulation count must be positive"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert_eq!(
            error.to_string(),
            "ConfigurationError [CONFIG.COUNT] simulation count must be positive"
        );
    }
}
