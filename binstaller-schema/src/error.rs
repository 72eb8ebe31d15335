//! Errors raised while decoding or validating a [`crate::Spec`].

/// Failure to parse a `.binstaller.yml` document.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes weren't valid YAML, or didn't match the `Spec` shape.
    #[error("failed to parse InstallSpec YAML")]
    Yaml(#[source] serde_yaml::Error),
    /// The document declared a `schema` this crate doesn't understand.
    #[error("unsupported InstallSpec schema {schema:?} (expected \"v1\")")]
    UnsupportedSchema {
        /// The schema value found in the document.
        schema: String,
    },
}

/// Failure of a defaulted [`crate::Spec`] to satisfy its invariants.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A required field was empty after defaulting.
    #[error("InstallSpec is missing required field {field:?}")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },
    /// `repo` did not match `owner/name`.
    #[error("InstallSpec repo {repo:?} is not in \"owner/name\" form")]
    InvalidRepo {
        /// The offending value.
        repo: String,
    },
}
