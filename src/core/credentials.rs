//! Credential sets validators run under.
//!
//! Credentials are owned by the caller and handed to validators read-only.
//! Each platform has an optional admin credential and an ordered list of
//! users; per-user validators run once per user in that order.

use crate::core::error::ClientResult;
use crate::platform::Clients;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Platform the built-in validators target unless told otherwise.
pub const DEFAULT_PLATFORM: &str = "openstack";

/// An authentication context able to produce platform clients.
pub trait Credential: Send + Sync {
    /// Name of the authenticated user.
    fn username(&self) -> &str;

    /// Create the client handle for this credential.
    fn clients(&self) -> ClientResult<Arc<dyn Clients>>;
}

/// A user credential with its tenant.
#[derive(Clone)]
pub struct UserCredential {
    /// The credential itself.
    pub credential: Arc<dyn Credential>,
    /// Tenant or project the user belongs to.
    pub tenant_id: Option<String>,
}

impl UserCredential {
    /// Wrap a credential without tenant information.
    pub fn new(credential: Arc<dyn Credential>) -> Self {
        Self {
            credential,
            tenant_id: None,
        }
    }
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.credential.username())
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Credentials for one platform.
#[derive(Clone, Default)]
pub struct PlatformCredentials {
    /// Admin credential, if the deployment has one.
    pub admin: Option<Arc<dyn Credential>>,
    /// User credentials in declaration order.
    pub users: Vec<UserCredential>,
}

impl PlatformCredentials {
    /// Empty credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the admin credential.
    pub fn with_admin(mut self, admin: Arc<dyn Credential>) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Append a user credential.
    pub fn with_user(mut self, user: Arc<dyn Credential>) -> Self {
        self.users.push(UserCredential::new(user));
        self
    }

    /// Credential to use for admin-level checks: the admin, else the first user.
    pub fn admin_or_first_user(&self) -> Option<&Arc<dyn Credential>> {
        self.admin
            .as_ref()
            .or_else(|| self.users.first().map(|user| &user.credential))
    }
}

impl fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformCredentials")
            .field("admin", &self.admin.as_ref().map(|admin| admin.username().to_string()))
            .field("users", &self.users)
            .finish()
    }
}

/// Credentials of every platform of a deployment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    platforms: IndexMap<String, PlatformCredentials>,
}

impl Credentials {
    /// No credentials at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the credentials of a platform.
    pub fn with_platform(mut self, platform: impl Into<String>, creds: PlatformCredentials) -> Self {
        self.platforms.insert(platform.into(), creds);
        self
    }

    /// Credentials of a platform.
    pub fn get(&self, platform: &str) -> Option<&PlatformCredentials> {
        self.platforms.get(platform)
    }

    /// Users of a platform; empty when the platform is unknown.
    pub fn users(&self, platform: &str) -> &[UserCredential] {
        self.platforms
            .get(platform)
            .map(|creds| creds.users.as_slice())
            .unwrap_or(&[])
    }

    /// Admin credential of a platform.
    pub fn admin(&self, platform: &str) -> Option<&Arc<dyn Credential>> {
        self.platforms.get(platform).and_then(|creds| creds.admin.as_ref())
    }
}

/// Deployment view handed to legacy validator functions.
#[derive(Debug, Clone, Copy)]
pub struct Deployment<'a> {
    credentials: &'a Credentials,
}

impl<'a> Deployment<'a> {
    /// Wrap a credential set.
    pub fn new(credentials: &'a Credentials) -> Self {
        Self { credentials }
    }

    /// Credentials for a platform.
    pub fn credentials_for(&self, platform: &str) -> Option<&'a PlatformCredentials> {
        self.credentials.get(platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fakes::{FakeCloud, FakeCredential};

    #[test]
    fn test_users_of_unknown_platform_is_empty() {
        let credentials = Credentials::new();
        assert!(credentials.users(DEFAULT_PLATFORM).is_empty());
        assert!(credentials.admin(DEFAULT_PLATFORM).is_none());
    }

    #[test]
    fn test_admin_falls_back_to_first_user() {
        let user = FakeCredential::new("alice", FakeCloud::new());
        let creds = PlatformCredentials::new().with_user(user);
        assert_eq!(creds.admin_or_first_user().unwrap().username(), "alice");

        let admin = FakeCredential::new("admin", FakeCloud::new());
        let creds = creds.with_admin(admin);
        assert_eq!(creds.admin_or_first_user().unwrap().username(), "admin");
    }

    #[test]
    fn test_deployment_exposes_platform_credentials() {
        let credentials = Credentials::new().with_platform(
            DEFAULT_PLATFORM,
            PlatformCredentials::new().with_user(FakeCredential::new("bob", FakeCloud::new())),
        );
        let deployment = Deployment::new(&credentials);
        assert_eq!(deployment.credentials_for(DEFAULT_PLATFORM).unwrap().users.len(), 1);
        assert!(deployment.credentials_for("kubernetes").is_none());
    }
}
