use std::fmt;
use std::str::FromStr;

use crate::RouteError;

macro_rules! route_param {
    ($name:ident, $label:literal) => {
        /// Opaque, non-empty identifier carried by a detail route.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Result<Self, RouteError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(RouteError::EmptyParam($label));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

route_param!(ProId, "proId");
route_param!(PackageId, "packageId");
route_param!(BookingId, "bookingId");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainTab {
    Feed,
    Search,
    Inbox,
    Profile,
}

/// A node of the screen graph. The graph is the same for both roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Auth,
    Main(MainTab),
    CreatorProfile(ProId),
    PackageDetails(PackageId),
    Chat(BookingId),
    BookingDetails(BookingId),
}

impl Route {
    /// Landing screen of the authenticated stack.
    pub const HOME: Route = Route::Main(MainTab::Feed);

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Auth)
    }

    pub fn creator_profile(pro_id: impl Into<String>) -> Result<Self, RouteError> {
        ProId::new(pro_id).map(Route::CreatorProfile)
    }

    pub fn package_details(package_id: impl Into<String>) -> Result<Self, RouteError> {
        PackageId::new(package_id).map(Route::PackageDetails)
    }

    pub fn chat(booking_id: impl Into<String>) -> Result<Self, RouteError> {
        BookingId::new(booking_id).map(Route::Chat)
    }

    pub fn booking_details(booking_id: impl Into<String>) -> Result<Self, RouteError> {
        BookingId::new(booking_id).map(Route::BookingDetails)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Auth => f.write_str("auth"),
            Route::Main(MainTab::Feed) => f.write_str("main/feed"),
            Route::Main(MainTab::Search) => f.write_str("main/search"),
            Route::Main(MainTab::Inbox) => f.write_str("main/inbox"),
            Route::Main(MainTab::Profile) => f.write_str("main/profile"),
            Route::CreatorProfile(id) => write!(f, "creator/{id}"),
            Route::PackageDetails(id) => write!(f, "package/{id}"),
            Route::Chat(id) => write!(f, "chat/{id}"),
            Route::BookingDetails(id) => write!(f, "booking/{id}"),
        }
    }
}

/// Parses the path form produced by `Display`, e.g. `creator/pro-1`.
/// Tabs are also accepted without the `main/` prefix.
impl FromStr for Route {
    type Err = RouteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim().trim_matches('/');
        let (head, tail) = match raw.split_once('/') {
            Some((head, tail)) => (head, Some(tail)),
            None => (raw, None),
        };
        match (head, tail) {
            ("auth", None) => Ok(Route::Auth),
            ("creator", tail) => Route::creator_profile(tail.unwrap_or_default()),
            ("package", tail) => Route::package_details(tail.unwrap_or_default()),
            ("chat", tail) => Route::chat(tail.unwrap_or_default()),
            ("booking", tail) => Route::booking_details(tail.unwrap_or_default()),
            ("main", Some(tab)) | (tab, None) => {
                parse_tab(tab).ok_or_else(|| RouteError::Unknown(raw.to_string()))
            }
            _ => Err(RouteError::Unknown(raw.to_string())),
        }
    }
}

fn parse_tab(tab: &str) -> Option<Route> {
    let tab = match tab {
        "feed" => MainTab::Feed,
        "search" => MainTab::Search,
        "inbox" => MainTab::Inbox,
        "profile" => MainTab::Profile,
        _ => return None,
    };
    Some(Route::Main(tab))
}

#[cfg(test)]
mod tests {
    use super::{MainTab, ProId, Route};
    use crate::RouteError;

    #[test]
    fn empty_params_are_rejected_at_construction() {
        assert_eq!(ProId::new("  "), Err(RouteError::EmptyParam("proId")));
        assert_eq!(
            Route::chat(""),
            Err(RouteError::EmptyParam("bookingId"))
        );
        assert_eq!(
            Route::package_details(String::new()),
            Err(RouteError::EmptyParam("packageId"))
        );
    }

    #[test]
    fn parses_display_form() {
        let routes = [
            Route::Auth,
            Route::Main(MainTab::Inbox),
            Route::creator_profile("pro-1").unwrap(),
            Route::booking_details("b-9").unwrap(),
        ];
        for route in routes {
            assert_eq!(route.to_string().parse::<Route>().unwrap(), route);
        }
    }

    #[test]
    fn parses_bare_tabs_and_rejects_missing_ids() {
        assert_eq!("search".parse::<Route>().unwrap(), Route::Main(MainTab::Search));
        assert_eq!(
            "creator".parse::<Route>(),
            Err(RouteError::EmptyParam("proId"))
        );
        assert!(matches!(
            "settings".parse::<Route>(),
            Err(RouteError::Unknown(_))
        ));
    }
}
