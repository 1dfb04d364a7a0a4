//! Repos is a module responsible for interacting with access control lists
//! Authorization module contains authorization logic for the repo layer app

pub mod roles_cache;

pub use self::roles_cache::RolesCacheImpl;

use errors::Error;
use failure::Error as FailureError;

use models::authorization::*;
use models::UserId;

/// Access control list
pub trait Acl<Resource, Action, Error> {
    /// Tells if a user can do `action` on `resource`.
    /// `Ok(false)` is as much of a denial as an error: callers must
    /// treat both as "deny".
    fn allows(&self, resource: Resource, action: Action) -> Result<bool, Error>;
}

pub fn check(acl: &Acl<Resource, Action, FailureError>, resource: Resource, action: Action) -> Result<(), FailureError> {
    acl.allows(resource, action).and_then(|allowed| {
        if allowed {
            Ok(())
        } else {
            Err(format_err!("Denied request to do {} on {}", action, resource)
                .context(Error::Forbidden)
                .into())
        }
    })
}

/// SystemACL allows all manipulation with resources in all cases.
/// Used by internal flows that enforce their own business rules.
#[derive(Clone, Debug, Default)]
pub struct SystemACL;

impl Acl<Resource, Action, FailureError> for SystemACL {
    fn allows(&self, _resource: Resource, _action: Action) -> Result<bool, FailureError> {
        Ok(true)
    }
}

/// UnauthorizedAcl covers requests that carry no identity. Every
/// administrative resource of this service is denied.
#[derive(Clone, Default)]
pub struct UnauthorizedAcl;

impl Acl<Resource, Action, FailureError> for UnauthorizedAcl {
    fn allows(&self, resource: Resource, action: Action) -> Result<bool, FailureError> {
        error!("Denied unauthorized request to do {} on {}.", action, resource);
        Ok(false)
    }
}

/// Grants resolved for an acting user. Resolution happens in the repo
/// factory; faults there are logged and collapsed to `Misconfigured`
/// so that callers only ever observe a denial.
#[derive(Clone, Debug)]
pub enum RoleGrants {
    /// The user id did not resolve to a user record
    MissingUser,
    /// `is_admin` users bypass all permission checks
    Admin,
    /// No role assigned - the built-in customer class
    Customer,
    /// Permission document of the assigned role
    Role(Vec<ModulePermissions>),
    /// Role reference did not resolve, or resolution failed
    Misconfigured,
}

/// ApplicationAcl contains main logic for manipulation with resources
#[derive(Clone)]
pub struct ApplicationAcl {
    user_id: UserId,
    grants: RoleGrants,
}

impl ApplicationAcl {
    pub fn new(user_id: UserId, grants: RoleGrants) -> Self {
        Self { user_id, grants }
    }
}

impl Acl<Resource, Action, FailureError> for ApplicationAcl {
    fn allows(&self, resource: Resource, action: Action) -> Result<bool, FailureError> {
        let user_id = self.user_id;
        match self.grants {
            RoleGrants::MissingUser => Err(format_err!("User {} not found", user_id)
                .context(Error::NotFound("User not found".to_string()))
                .into()),
            RoleGrants::Admin => Ok(true),
            RoleGrants::Customer => {
                // The single hardcoded bypass: customers may open tickets.
                let allowed = resource == Resource::Tickets && action == Action::Create;
                if !allowed {
                    error!("Denied request from user {} to do {} on {}.", user_id, action, resource);
                }
                Ok(allowed)
            }
            RoleGrants::Misconfigured => {
                error!("Invalid role configuration for user {}.", user_id);
                Ok(false)
            }
            RoleGrants::Role(ref modules) => {
                let allowed = modules
                    .iter()
                    .any(|entry| entry.module == resource.as_module() && entry.permissions.contains(&action.code()));
                if !allowed {
                    error!("Denied request from user {} to do {} on {}.", user_id, action, resource);
                }
                Ok(allowed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use errors::Error;

    fn manager_grants() -> RoleGrants {
        RoleGrants::Role(vec![
            ModulePermissions::new("coupons", vec![0, 1, 2, 3]),
            ModulePermissions::new("roles", vec![1]),
        ])
    }

    #[test]
    fn test_admin_allows_everything() {
        let acl = ApplicationAcl::new(UserId(1), RoleGrants::Admin);

        for resource in [Resource::Coupons, Resource::Roles, Resource::Users, Resource::Tickets].iter() {
            for action in [Action::Create, Action::Read, Action::Update, Action::Delete].iter() {
                assert_eq!(
                    acl.allows(*resource, *action).unwrap(),
                    true,
                    "ACL does not allow {} on {} for admin.",
                    action,
                    resource
                );
            }
        }
    }

    #[test]
    fn test_role_grants_follow_permission_document() {
        let acl = ApplicationAcl::new(UserId(2), manager_grants());

        assert_eq!(acl.allows(Resource::Coupons, Action::Create).unwrap(), true);
        assert_eq!(acl.allows(Resource::Coupons, Action::Delete).unwrap(), true);
        assert_eq!(acl.allows(Resource::Roles, Action::Read).unwrap(), true);
        assert_eq!(
            acl.allows(Resource::Roles, Action::Update).unwrap(),
            false,
            "ACL allows update on roles without the permission code."
        );
        assert_eq!(acl.allows(Resource::Users, Action::Read).unwrap(), false);
    }

    #[test]
    fn test_customer_only_creates_tickets() {
        let acl = ApplicationAcl::new(UserId(3), RoleGrants::Customer);

        assert_eq!(acl.allows(Resource::Tickets, Action::Create).unwrap(), true);
        assert_eq!(acl.allows(Resource::Tickets, Action::Read).unwrap(), false);
        assert_eq!(acl.allows(Resource::Coupons, Action::Create).unwrap(), false);
        assert_eq!(acl.allows(Resource::Coupons, Action::Read).unwrap(), false);
    }

    #[test]
    fn test_missing_user_fails_with_not_found() {
        let acl = ApplicationAcl::new(UserId(404), RoleGrants::MissingUser);

        let err = acl.allows(Resource::Coupons, Action::Read).unwrap_err();
        let not_found = match ::errors::error_kind(&err) {
            Some(&Error::NotFound(_)) => true,
            _ => false,
        };
        assert!(not_found, "Missing user must surface as NotFound.");
    }

    #[test]
    fn test_misconfigured_role_denies() {
        let acl = ApplicationAcl::new(UserId(5), RoleGrants::Misconfigured);

        assert_eq!(acl.allows(Resource::Coupons, Action::Read).unwrap(), false);
        assert_eq!(acl.allows(Resource::Tickets, Action::Create).unwrap(), false);
    }

    #[test]
    fn test_unauthorized_denies() {
        let acl = UnauthorizedAcl::default();

        assert_eq!(acl.allows(Resource::Coupons, Action::Read).unwrap(), false);
        assert_eq!(acl.allows(Resource::Coupons, Action::Create).unwrap(), false);
    }
}
