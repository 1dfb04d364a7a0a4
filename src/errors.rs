use diesel::result::Error as DieselError;
use failure::{Context, Error as FailureError};
use hyper::StatusCode;
use validator::ValidationErrors;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    NotFound(String),
    #[fail(display = "Parse error")]
    Parse,
    #[fail(display = "Validation error: {}", _0)]
    Validate(ValidationErrors),
    #[fail(display = "{}", _0)]
    InvalidRequest(String),
    #[fail(display = "Access denied")]
    Forbidden,
    #[fail(display = "Connection error")]
    Connection,
    #[fail(display = "Internal server error")]
    Internal,
}

impl Error {
    /// Converts `Error` to HTTP Status Code
    pub fn code(&self) -> StatusCode {
        match *self {
            Error::NotFound(_) => StatusCode::NotFound,
            Error::Parse => StatusCode::UnprocessableEntity,
            Error::Validate(_) | Error::InvalidRequest(_) => StatusCode::BadRequest,
            Error::Forbidden => StatusCode::Forbidden,
            Error::Connection | Error::Internal => StatusCode::InternalServerError,
        }
    }
}

impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Error::NotFound("Entity not found".to_string()),
            _ => Error::Internal,
        }
    }
}

/// Finds the outermost `Error` in a failure chain. Errors attached
/// with `.context(...)` sit in the chain as `Context<Error>`, so both
/// shapes are looked through.
pub fn error_kind(err: &FailureError) -> Option<&Error> {
    err.iter_chain()
        .filter_map(|fail| {
            fail.downcast_ref::<Error>()
                .or_else(|| fail.downcast_ref::<Context<Error>>().map(|context| context.get_context()))
        }).next()
}
