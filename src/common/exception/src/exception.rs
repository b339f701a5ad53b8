// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;
use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

pub type Result<T, E = ErrorCode> = std::result::Result<T, E>;

/// The error type shared by every crate of the workspace.
///
/// An `ErrorCode` is cheap to clone: the cause and the captured backtrace are
/// reference counted, so one failure may be handed to several waiters.
#[derive(Clone)]
pub struct ErrorCode {
    code: u16,
    name: String,
    display_text: String,
    cause: Option<Arc<dyn Error + Send + Sync>>,
    backtrace: Option<Arc<Backtrace>>,
}

impl ErrorCode {
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn name(&self) -> String {
        self.name.clone()
    }

    pub fn message(&self) -> String {
        self.cause
            .as_ref()
            .map(|cause| format!("{}\n{:?}", self.display_text, cause))
            .unwrap_or_else(|| self.display_text.clone())
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    #[must_use]
    pub fn add_message(self, msg: impl AsRef<str>) -> Self {
        Self {
            display_text: format!("{}\n{}", msg.as_ref(), self.display_text),
            ..self
        }
    }

    /// Attach the originating error. The previous cause, if any, is replaced.
    #[must_use]
    pub fn set_cause(self, cause: impl Error + Send + Sync + 'static) -> Self {
        Self {
            cause: Some(Arc::new(cause)),
            ..self
        }
    }

    pub fn backtrace_str(&self) -> String {
        match self.backtrace.as_ref() {
            Some(backtrace) if backtrace.status() == BacktraceStatus::Captured => {
                backtrace.to_string()
            }
            _ => String::new(),
        }
    }

    pub fn create(
        code: u16,
        name: impl ToString,
        display_text: String,
        cause: Option<Arc<dyn Error + Send + Sync>>,
        backtrace: Option<Arc<Backtrace>>,
    ) -> ErrorCode {
        ErrorCode {
            code,
            name: name.to_string(),
            display_text,
            cause,
            backtrace,
        }
    }

    pub(crate) fn capture() -> Option<Arc<Backtrace>> {
        Some(Arc::new(Backtrace::capture()))
    }
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. Code: {}, Text = {}.",
            self.name(),
            self.code(),
            self.message(),
        )?;

        let backtrace = self.backtrace_str();
        if !backtrace.is_empty() {
            write!(f, "\n\n<Backtrace disabled by default>\n{}", backtrace)?;
        }
        Ok(())
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. Code: {}, Text = {}.",
            self.name(),
            self.code(),
            self.message(),
        )
    }
}

impl Error for ErrorCode {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

/// Provides the `map_err_to_code` method for `Result`.
///
/// ```
/// use carbonsplit_common_exception::ErrorCode;
/// use carbonsplit_common_exception::ToErrorCode;
///
/// let x: std::result::Result<(), std::fmt::Error> = Err(std::fmt::Error {});
/// let y: carbonsplit_common_exception::Result<()> =
///     x.map_err_to_code(ErrorCode::Internal, || 123);
///
/// assert_eq!(
///     "Internal. Code: 1001, Text = 123, cause: an error occurred when formatting an argument.",
///     y.unwrap_err().to_string()
/// );
/// ```
pub trait ToErrorCode<T, E, CtxFn>
where E: Display + Send + Sync + 'static
{
    /// Wrap the error value with ErrorCode. It is lazily evaluated:
    /// only when an error does occur.
    ///
    /// `err_code_fn` is one of the ErrorCode builder function such as `ErrorCode::Ok`.
    /// `context_fn` builds display_text for the ErrorCode.
    fn map_err_to_code<ErrFn, D>(self, err_code_fn: ErrFn, context_fn: CtxFn) -> Result<T>
    where
        ErrFn: FnOnce(String) -> ErrorCode,
        D: Display,
        CtxFn: FnOnce() -> D;
}

impl<T, E, CtxFn> ToErrorCode<T, E, CtxFn> for std::result::Result<T, E>
where E: Display + Send + Sync + 'static
{
    fn map_err_to_code<ErrFn, D>(self, make_exception: ErrFn, context_fn: CtxFn) -> Result<T>
    where
        ErrFn: FnOnce(String) -> ErrorCode,
        D: Display,
        CtxFn: FnOnce() -> D,
    {
        self.map_err(|error| {
            let err_text = format!("{}, cause: {}", context_fn(), error);
            make_exception(err_text)
        })
    }
}
