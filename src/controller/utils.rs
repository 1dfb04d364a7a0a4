//! Utils for controller layer
use failure::Error as FailureError;
use failure::Fail;
use futures::{Future, Stream};
use hyper;
use serde::de::DeserializeOwned;
use serde_json;

use errors::Error;

/// Reads request body into a string
pub fn read_body(body: hyper::Body) -> Box<Future<Item = String, Error = hyper::Error>> {
    Box::new(body.concat2().map(|chunk| String::from_utf8_lossy(&chunk).to_string()))
}

/// Reads request body and deserializes it as JSON
pub fn parse_body<T: DeserializeOwned + 'static>(body: hyper::Body) -> Box<Future<Item = T, Error = FailureError>> {
    Box::new(
        read_body(body)
            .map_err(|e| FailureError::from(e.context(Error::Parse)))
            .and_then(|string| serde_json::from_str::<T>(&string).map_err(|e| FailureError::from(e.context(Error::Parse)))),
    )
}
