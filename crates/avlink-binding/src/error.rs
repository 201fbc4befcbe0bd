/// Errors produced when parsing binding settings.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// Modifier name is not one of `add`, `sub`, `mul`.
    #[error("unknown modifier: {0:?}")]
    UnknownModifier(String),

    /// Comparison name is not one of `!=`, `==`, `<`, `<=`, `>`, `>=`, `&`.
    #[error("unknown comparison: {0:?}")]
    UnknownComparison(String),
}

pub type Result<T> = std::result::Result<T, BindingError>;
