use std::fmt;

/// Machine-readable error codes surfaced by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputNotFound,
    ConfigParseError,
    InputDecodeFailed,
    OutputWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputNotFound => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InputDecodeFailed => "E2001",
            Self::OutputWriteFailed => "E3001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputNotFound => "Input CSV file not found",
            Self::ConfigParseError => "Config file error",
            Self::InputDecodeFailed => "Input CSV could not be decoded",
            Self::OutputWriteFailed => "Output write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputNotFound => Some("Pass an existing file with `--csv-file <PATH>`."),
            Self::ConfigParseError => Some("Fix syntax in condense.toml (or the --config file) and retry."),
            Self::InputDecodeFailed => {
                Some("Check that the file is UTF-8 CSV with a header row and consistent columns.")
            }
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 5] = [
        ErrorCode::InputNotFound,
        ErrorCode::ConfigParseError,
        ErrorCode::InputDecodeFailed,
        ErrorCode::OutputWriteFailed,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let code = code.code();
            assert_eq!(code.len(), 5);
            assert!(code.starts_with('E'));
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_uses_code() {
        assert_eq!(ErrorCode::OutputWriteFailed.to_string(), "E3001");
    }
}
