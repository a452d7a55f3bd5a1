use std::{borrow::Cow, fmt, panic::Location};

/// Where an example or hook was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Callsite {
    file: Cow<'static, str>,
    line: u32,
}

impl Callsite {
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl From<&'static Location<'static>> for Callsite {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Callsite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Expands to the [`Callsite`] of the macro invocation.
#[macro_export]
macro_rules! callsite {
    () => {
        $crate::callsite::Callsite::new(::std::file!(), ::std::line!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn tracked() -> Callsite {
        Callsite::caller()
    }

    #[test]
    fn caller_points_at_call_expression() {
        let expected_line = line!() + 1;
        let callsite = tracked();
        assert_eq!(callsite.file(), file!());
        assert_eq!(callsite.line(), expected_line);
    }

    #[test]
    fn display_is_file_colon_line() {
        assert_eq!(Callsite::new("spec.rs", 12).to_string(), "spec.rs:12");
    }
}
