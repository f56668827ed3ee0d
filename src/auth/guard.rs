//! Role-based route guards
//!
//! Admin surfaces (dashboard, users, documents) require an admin profile;
//! chat requires any signed-in user.

use crate::api::types::User;
use crate::error::{DocchatError, Result};

use std::fmt;

/// A top-level surface of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Chat,
    Dashboard,
    Users,
    Documents,
}

impl Route {
    pub fn requires_admin(self) -> bool {
        !matches!(self, Route::Chat)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Route::Chat => "chat",
            Route::Dashboard => "dashboard",
            Route::Users => "users",
            Route::Documents => "documents",
        };
        f.write_str(name)
    }
}

/// Where a user lands after login.
pub fn landing(user: &User) -> Route {
    if user.is_admin {
        Route::Dashboard
    } else {
        Route::Chat
    }
}

/// Check that the caller may open `route`.
///
/// `has_token` is whether a bearer token is available; `user` is the cached
/// profile, which may be missing when only `DOCCHAT_TOKEN` is set.
///
/// # Errors
///
/// [`DocchatError::Authentication`] without a token, and
/// [`DocchatError::Forbidden`] for admin routes without an admin profile.
pub fn require(route: Route, has_token: bool, user: Option<&User>) -> Result<()> {
    if !has_token {
        return Err(DocchatError::Authentication(
            "Not logged in. Run `docchat login` first.".to_string(),
        )
        .into());
    }

    if route.requires_admin() && !user.map(|u| u.is_admin).unwrap_or(false) {
        return Err(DocchatError::Forbidden(format!("the {} area requires an admin account", route)).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> User {
        User {
            id: 1,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            is_active: true,
            is_admin,
            created_at: String::new(),
            updated_at: None,
        }
    }

    #[test]
    fn test_landing_by_role() {
        assert_eq!(landing(&user(true)), Route::Dashboard);
        assert_eq!(landing(&user(false)), Route::Chat);
    }

    #[test]
    fn test_chat_needs_token_only() {
        assert!(require(Route::Chat, true, None).is_ok());
        assert!(require(Route::Chat, false, Some(&user(true))).is_err());
    }

    #[test]
    fn test_admin_routes_need_admin() {
        for route in [Route::Dashboard, Route::Users, Route::Documents] {
            assert!(require(route, true, Some(&user(true))).is_ok());
            let err = require(route, true, Some(&user(false))).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DocchatError>(),
                Some(DocchatError::Forbidden(_))
            ));
            assert!(require(route, true, None).is_err());
        }
    }
}
