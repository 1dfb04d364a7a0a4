use failure::Error as FailureError;

use models::authorization::*;
use repos::acl::Acl;

/// Repos layer Result
pub type RepoResult<T> = Result<T, FailureError>;
pub type RepoAcl = Acl<Resource, Action, FailureError>;
