//! Bus routes.

use super::DomainError;

/// Color used when a route has no usable `route_color`.
pub const DEFAULT_ROUTE_COLOR: &str = "0074D9";

/// Color used when a route has no usable `route_text_color`.
pub const DEFAULT_TEXT_COLOR: &str = "FFFFFF";

/// A route from the feed, with colors normalised to 6-digit uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub color: String,
    pub text_color: String,
}

impl Route {
    pub fn new(
        id: impl Into<String>,
        short_name: impl Into<String>,
        long_name: impl Into<String>,
        color: Option<&str>,
        text_color: Option<&str>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyId("route"));
        }

        Ok(Self {
            id,
            short_name: short_name.into(),
            long_name: long_name.into(),
            color: normalize_color(color, DEFAULT_ROUTE_COLOR),
            text_color: normalize_color(text_color, DEFAULT_TEXT_COLOR),
        })
    }

    /// Short name if present, else long name, else id.
    pub fn display_name(&self) -> &str {
        [&self.short_name, &self.long_name]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or(&self.id)
    }
}

/// Normalise a feed color to `RRGGBB`, falling back to `default`.
///
/// ```
/// use bus_planner::domain::normalize_color;
///
/// assert_eq!(normalize_color(Some("#e2001a"), "0074D9"), "E2001A");
/// assert_eq!(normalize_color(Some("red"), "0074D9"), "0074D9");
/// assert_eq!(normalize_color(None, "FFFFFF"), "FFFFFF");
/// ```
pub fn normalize_color(raw: Option<&str>, default: &str) -> String {
    let Some(raw) = raw else {
        return default.to_string();
    };
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        hex.to_ascii_uppercase()
    } else {
        default.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_default_when_missing_or_malformed() {
        let route = Route::new("A", "1", "Ligne 1", Some(""), Some("12345")).unwrap();
        assert_eq!(route.color, DEFAULT_ROUTE_COLOR);
        assert_eq!(route.text_color, DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn colors_normalised() {
        let route = Route::new("A", "1", "", Some("ff8800"), Some("#000000")).unwrap();
        assert_eq!(route.color, "FF8800");
        assert_eq!(route.text_color, "000000");
    }

    #[test]
    fn display_name_precedence() {
        let r = Route::new("A", "1", "Ligne 1", None, None).unwrap();
        assert_eq!(r.display_name(), "1");
        let r = Route::new("A", "", "Ligne 1", None, None).unwrap();
        assert_eq!(r.display_name(), "Ligne 1");
        let r = Route::new("A", "", "", None, None).unwrap();
        assert_eq!(r.display_name(), "A");
    }

    #[test]
    fn rejects_empty_id() {
        assert!(Route::new("", "1", "", None, None).is_err());
    }
}
