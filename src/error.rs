use std::borrow::Cow;

use thiserror::Error;

/// Errors raised while a suite declares its examples.
///
/// All of them abort the registration of the suite they occur in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("structural error: {0}")]
    Structural(Cow<'static, str>),

    #[error("shared example `{0}` is not registered")]
    UndefinedSharedExample(String),

    #[error("shared example `{0}` is already registered")]
    DuplicateSharedExample(String),
}

impl DeclarationError {
    pub(crate) fn outside_registration(operation: &'static str) -> Self {
        Self::Structural(Cow::Owned(format!(
            "`{operation}` used outside an active suite registration"
        )))
    }

    pub(crate) fn unbalanced() -> Self {
        Self::Structural(Cow::Borrowed(
            "registration ended with an example group still open",
        ))
    }
}

pub type DeclarationResult<T = ()> = Result<T, DeclarationError>;

/// What a declaration closure returned.
///
/// Lets closures either return nothing or propagate errors with `?`.
#[derive(Debug)]
pub struct Declared(pub DeclarationResult);

impl From<()> for Declared {
    fn from(_: ()) -> Self {
        Self(Ok(()))
    }
}

impl From<DeclarationResult> for Declared {
    fn from(v: DeclarationResult) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_culprit() {
        assert_eq!(
            DeclarationError::outside_registration("describe").to_string(),
            "structural error: `describe` used outside an active suite registration"
        );
        assert_eq!(
            DeclarationError::UndefinedSharedExample("a stack".into()).to_string(),
            "shared example `a stack` is not registered"
        );
    }
}
