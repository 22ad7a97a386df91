//! App routes and the bottom tab bar

use serde::Serialize;
use std::fmt;

/// Every screen the shell can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Home,
    Search,
    Social,
    Settings,
    Login,
    Swap,
}

impl Route {
    /// Tab bar entries, left to right
    pub const fn tabs() -> [Route; 4] {
        [Route::Home, Route::Search, Route::Social, Route::Settings]
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Search => "/search",
            Route::Social => "/social",
            Route::Settings => "/setting",
            Route::Login => "/login",
            Route::Swap => "/swap",
        }
    }

    /// Tab label
    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Search => "Search",
            Route::Social => "Social",
            Route::Settings => "Settings",
            Route::Login => "Login",
            Route::Swap => "Swap",
        }
    }

    /// Parse a path, ignoring a trailing slash and any query string
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        [
            Route::Home,
            Route::Search,
            Route::Social,
            Route::Settings,
            Route::Login,
            Route::Swap,
        ]
        .into_iter()
        .find(|r| r.path() == path)
    }

    pub fn is_tab(&self) -> bool {
        Route::tabs().contains(self)
    }

    /// Whether the route is only reachable when signed in
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
