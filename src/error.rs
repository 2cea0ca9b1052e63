//! Error types of the binding layer.
//!
//! Every error that reaches the C ABI boundary is converted into a host status carrying an [`ErrorCode`] and a
//! message. Errors never unwind across the boundary.

use std::borrow::Cow;

use ort_lite_op_sys as sys;

use crate::util::{IntoCpp, IntoRust};

/// Host error codes, the `OrtErrorCode` enum without its success value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum ErrorCode {
    /// Generic failure.
    Fail = sys::OrtErrorCode::ORT_FAIL as u8,
    /// A caller provided an invalid argument.
    InvalidArgument = sys::OrtErrorCode::ORT_INVALID_ARGUMENT as u8,
    /// A file does not exist.
    NoSuchFile = sys::OrtErrorCode::ORT_NO_SUCHFILE as u8,
    /// No model was loaded.
    NoModel = sys::OrtErrorCode::ORT_NO_MODEL as u8,
    /// Internal engine error.
    EngineError = sys::OrtErrorCode::ORT_ENGINE_ERROR as u8,
    /// A runtime condition was violated.
    RuntimeException = sys::OrtErrorCode::ORT_RUNTIME_EXCEPTION as u8,
    /// The model protobuf is invalid.
    InvalidProtobuf = sys::OrtErrorCode::ORT_INVALID_PROTOBUF as u8,
    /// A model was already loaded.
    ModelLoaded = sys::OrtErrorCode::ORT_MODEL_LOADED as u8,
    /// Operation is not implemented.
    NotImplemented = sys::OrtErrorCode::ORT_NOT_IMPLEMENTED as u8,
    /// The graph is invalid.
    InvalidGraph = sys::OrtErrorCode::ORT_INVALID_GRAPH as u8,
    /// Execution provider failure.
    EpFail = sys::OrtErrorCode::ORT_EP_FAIL as u8,
}
impl IntoRust for sys::OrtErrorCode {
    type RsType = Option<ErrorCode>;
    fn rs(self) -> Self::RsType {
        Some(match self {
            sys::OrtErrorCode::ORT_OK => return None,
            sys::OrtErrorCode::ORT_FAIL => ErrorCode::Fail,
            sys::OrtErrorCode::ORT_INVALID_ARGUMENT => ErrorCode::InvalidArgument,
            sys::OrtErrorCode::ORT_NO_SUCHFILE => ErrorCode::NoSuchFile,
            sys::OrtErrorCode::ORT_NO_MODEL => ErrorCode::NoModel,
            sys::OrtErrorCode::ORT_ENGINE_ERROR => ErrorCode::EngineError,
            sys::OrtErrorCode::ORT_RUNTIME_EXCEPTION => ErrorCode::RuntimeException,
            sys::OrtErrorCode::ORT_INVALID_PROTOBUF => ErrorCode::InvalidProtobuf,
            sys::OrtErrorCode::ORT_MODEL_LOADED => ErrorCode::ModelLoaded,
            sys::OrtErrorCode::ORT_NOT_IMPLEMENTED => ErrorCode::NotImplemented,
            sys::OrtErrorCode::ORT_INVALID_GRAPH => ErrorCode::InvalidGraph,
            sys::OrtErrorCode::ORT_EP_FAIL => ErrorCode::EpFail,
        })
    }
}
impl IntoCpp for ErrorCode {
    type CppType = sys::OrtErrorCode;
    fn cpp(self) -> Self::CppType {
        match self {
            ErrorCode::Fail => sys::OrtErrorCode::ORT_FAIL,
            ErrorCode::InvalidArgument => sys::OrtErrorCode::ORT_INVALID_ARGUMENT,
            ErrorCode::NoSuchFile => sys::OrtErrorCode::ORT_NO_SUCHFILE,
            ErrorCode::NoModel => sys::OrtErrorCode::ORT_NO_MODEL,
            ErrorCode::EngineError => sys::OrtErrorCode::ORT_ENGINE_ERROR,
            ErrorCode::RuntimeException => sys::OrtErrorCode::ORT_RUNTIME_EXCEPTION,
            ErrorCode::InvalidProtobuf => sys::OrtErrorCode::ORT_INVALID_PROTOBUF,
            ErrorCode::ModelLoaded => sys::OrtErrorCode::ORT_MODEL_LOADED,
            ErrorCode::NotImplemented => sys::OrtErrorCode::ORT_NOT_IMPLEMENTED,
            ErrorCode::InvalidGraph => sys::OrtErrorCode::ORT_INVALID_GRAPH,
            ErrorCode::EpFail => sys::OrtErrorCode::ORT_EP_FAIL,
        }
    }
}

impl From<ErrorCode> for sys::OrtErrorCode {
    fn from(code: ErrorCode) -> Self {
        code.cpp()
    }
}

/// Binding layer error.
#[derive(Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Bad index or otherwise malformed argument, reported as [`ErrorCode::InvalidArgument`].
    InvalidArgument(Cow<'static, str>),
    /// Precondition violated at runtime, reported as [`ErrorCode::RuntimeException`].
    ///
    /// Shape not yet initialized, wrong shape for a span or scalar, span or scalar used on a non CPU execution
    /// provider.
    RuntimeException(Cow<'static, str>),
    /// An error with an explicit host code.
    ///
    /// Errors returned by the host are passed through unchanged as this variant.
    Status {
        /// The host error code.
        code: ErrorCode,
        /// The error message.
        message: String,
    },
}
impl Error {
    /// Create an error with an explicit host error code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Error::Status {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(msg: impl Into<Cow<'static, str>>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<Cow<'static, str>>) -> Self {
        Error::RuntimeException(msg.into())
    }

    /// The host error code this error is reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Error::RuntimeException(_) => ErrorCode::RuntimeException,
            Error::Status { code, .. } => *code,
        }
    }

    /// The error message, without the code.
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidArgument(msg) | Error::RuntimeException(msg) => msg,
            Error::Status { message, .. } => message,
        }
    }
}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code(), self.message())
    }
}
impl std::error::Error for Error {}

impl From<std::ffi::NulError> for Error {
    fn from(err: std::ffi::NulError) -> Self {
        Error::invalid_argument(format!(
            "string contains an interior NUL byte at position {}",
            err.nul_position()
        ))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::invalid_argument(format!("string tensor element is not valid UTF-8: {err}"))
    }
}

/// A `Result` with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
