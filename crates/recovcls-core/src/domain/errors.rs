use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type CheckResult<T> = Result<T, CheckError>;
pub type ParserResult<T> = CheckResult<T>;
pub type PipelineResult<T> = CheckResult<T>;

pub const CONFIG_KEY_NOT_FOUND: &str = "INPUT.CONFIG_KEY_NOT_FOUND";
pub const MISSING_INPUT_FILE: &str = "IO.MISSING_INPUT_FILE";
pub const CL_TABLE_FORMAT: &str = "INPUT.CL_TABLE_FORMAT";
pub const USER_ABORTED: &str = "RUN.USER_ABORTED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    ComputationError,
    UserAbortedError,
    InternalError,
}

impl CheckErrorCategory {
    pub const fn exit_status(self) -> ExitStatusClass {
        match self {
            Self::Success => ExitStatusClass {
                exit_code: 0,
                label: "Success",
                class: "SUCCESS",
            },
            Self::InputValidationError => ExitStatusClass {
                exit_code: 2,
                label: "InputValidationError",
                class: "INPUT_FATAL",
            },
            Self::IoSystemError => ExitStatusClass {
                exit_code: 3,
                label: "IoSystemError",
                class: "IO_FATAL",
            },
            Self::ComputationError => ExitStatusClass {
                exit_code: 4,
                label: "ComputationError",
                class: "RUN_FATAL",
            },
            Self::UserAbortedError => ExitStatusClass {
                exit_code: 5,
                label: "UserAbortedError",
                class: "USER_ABORT",
            },
            Self::InternalError => ExitStatusClass {
                exit_code: 6,
                label: "InternalError",
                class: "SYS_FATAL",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_status().exit_code
    }

    pub const fn label(self) -> &'static str {
        self.exit_status().label
    }

    pub const fn class(self) -> &'static str {
        self.exit_status().class
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatusClass {
    pub exit_code: i32,
    pub label: &'static str,
    pub class: &'static str,
}

/// Fatal condition raised anywhere in the comparison run.
///
/// `code` is a stable dotted identifier (`INPUT.*`, `IO.*`, `RUN.*`, `SYS.*`)
/// that tests and log scrapers can match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckError {
    category: CheckErrorCategory,
    code: &'static str,
    message: String,
}

impl CheckError {
    pub fn new(category: CheckErrorCategory, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CheckErrorCategory::InputValidationError, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CheckErrorCategory::IoSystemError, code, message)
    }

    pub fn computation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CheckErrorCategory::ComputationError, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CheckErrorCategory::InternalError, code, message)
    }

    pub fn config_key_not_found(key: &str, config_path: &Path) -> Self {
        Self::input_validation(
            CONFIG_KEY_NOT_FOUND,
            format!(
                "required key '{}' is not set in config '{}'",
                key,
                config_path.display()
            ),
        )
    }

    pub fn missing_input_file(path: &Path, what: &str) -> Self {
        Self::io_system(
            MISSING_INPUT_FILE,
            format!("cannot find {} at '{}'", what, path.display()),
        )
    }

    pub fn table_format(origin: &str, message: impl Display) -> Self {
        Self::input_validation(CL_TABLE_FORMAT, format!("{}: {}", origin, message))
    }

    pub fn user_aborted(message: impl Into<String>) -> Self {
        Self::new(CheckErrorCategory::UserAbortedError, USER_ABORTED, message)
    }

    pub const fn category(&self) -> CheckErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.code, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for CheckError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.code,
            self.message
        )
    }
}

impl Error for CheckError {}
