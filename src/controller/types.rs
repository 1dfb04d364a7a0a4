use failure::Error as FailureError;
use futures::future::Future;

/// Controller layer Future
pub type ControllerFuture = Box<Future<Item = String, Error = FailureError>>;

/// Error payload returned to clients
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorMessage {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<::serde_json::Value>,
}
