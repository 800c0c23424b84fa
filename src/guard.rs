use crate::session::Session;

/// Pages that require an authenticated session. While the startup refresh is
/// still deciding, the target is kept rather than redirecting away.
pub fn private_route<T>(session: &Session, target: T, fallback: T) -> T {
    if !session.is_logged_in && !session.is_refreshing {
        fallback
    } else {
        target
    }
}

/// Pages only anonymous users should see (login, registration).
pub fn restricted_route<T>(session: &Session, target: T, fallback: T) -> T {
    if session.is_logged_in { fallback } else { target }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Register,
    Login,
    Contacts,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Register => "/register",
            Route::Login => "/login",
            Route::Contacts => "/contacts",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Home),
            "/register" => Some(Route::Register),
            "/login" => Some(Route::Login),
            "/contacts" => Some(Route::Contacts),
            _ => None,
        }
    }
}

/// Where a navigation to `route` actually lands.
pub fn resolve(route: Route, session: &Session) -> Route {
    match route {
        Route::Home => Route::Home,
        Route::Register | Route::Login => restricted_route(session, route, Route::Contacts),
        Route::Contacts => private_route(session, route, Route::Login),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::BearerToken;

    fn session(is_logged_in: bool, is_refreshing: bool) -> Session {
        Session {
            token: is_logged_in.then(|| BearerToken::new("t")),
            is_logged_in,
            is_refreshing,
            ..Session::default()
        }
    }

    #[test]
    fn private_route_waits_out_the_refresh() {
        assert_eq!(private_route(&session(false, true), "contacts", "login"), "contacts");
        assert_eq!(private_route(&session(false, false), "contacts", "login"), "login");
        assert_eq!(private_route(&session(true, false), "contacts", "login"), "contacts");
    }

    #[test]
    fn restricted_route_ignores_refreshing() {
        assert_eq!(restricted_route(&session(false, true), "login", "contacts"), "login");
        assert_eq!(restricted_route(&session(true, false), "login", "contacts"), "contacts");
    }

    #[test]
    fn route_table() {
        let anon = session(false, false);
        let authed = session(true, false);
        assert_eq!(resolve(Route::Contacts, &anon), Route::Login);
        assert_eq!(resolve(Route::Login, &authed), Route::Contacts);
        assert_eq!(resolve(Route::Register, &anon), Route::Register);
        assert_eq!(resolve(Route::Home, &anon), Route::Home);
        assert_eq!(Route::from_path("/contacts/"), Some(Route::Contacts));
        assert_eq!(Route::from_path("/"), Some(Route::Home));
        assert_eq!(Route::from_path("/nope"), None);
    }
}
