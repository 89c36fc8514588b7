//! Simplified → Traditional script normalization.
//!
//! The preferred path delegates to an external [`ScriptConverter`] supplied
//! when the [`ScriptNormalizer`] is built. Without one, or when it fails, the
//! built-in [`fallback`] table is applied instead.

mod command;
mod fallback;

use tracing::warn;

use crate::error::Result;

pub use command::CommandConverter;
pub use fallback::{FALLBACK_TABLE, fallback_convert};

/// Script variants of written Chinese.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Simplified,
    Traditional,
}

/// An external script-conversion capability (e.g. OpenCC).
pub trait ScriptConverter: Send + Sync {
    fn convert(&self, text: &str, from: Script, to: Script) -> Result<String>;
}

/// Converts text to the target script, preferring the external converter.
#[derive(Default)]
pub struct ScriptNormalizer {
    external: Option<Box<dyn ScriptConverter>>,
}

impl ScriptNormalizer {
    /// A normalizer that only uses the built-in table.
    pub fn fallback_only() -> Self {
        Self { external: None }
    }

    pub fn with_converter(converter: Box<dyn ScriptConverter>) -> Self {
        Self {
            external: Some(converter),
        }
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Convert Simplified text to Traditional.
    pub fn to_traditional(&self, text: &str) -> String {
        if let Some(converter) = &self.external {
            match converter.convert(text, Script::Simplified, Script::Traditional) {
                Ok(converted) => return converted,
                Err(e) => warn!(error = %e, "external script converter failed, using fallback table"),
            }
        }
        fallback_convert(text)
    }
}

impl std::fmt::Debug for ScriptNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptNormalizer")
            .field("external", &self.external.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Upper;

    impl ScriptConverter for Upper {
        fn convert(&self, text: &str, _from: Script, _to: Script) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    struct Broken;

    impl ScriptConverter for Broken {
        fn convert(&self, _text: &str, _from: Script, _to: Script) -> Result<String> {
            Err(Error::Converter("not installed".into()))
        }
    }

    #[test]
    fn test_external_converter_preferred() {
        let normalizer = ScriptNormalizer::with_converter(Box::new(Upper));
        assert!(normalizer.has_external());
        assert_eq!(normalizer.to_traditional("abc这"), "ABC这");
    }

    #[test]
    fn test_failing_converter_falls_back() {
        let normalizer = ScriptNormalizer::with_converter(Box::new(Broken));
        assert_eq!(normalizer.to_traditional("这个"), "這個");
    }

    #[test]
    fn test_fallback_only() {
        let normalizer = ScriptNormalizer::fallback_only();
        assert!(!normalizer.has_external());
        assert_eq!(normalizer.to_traditional("电脑网络"), "電腦網絡");
    }
}
