use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const SESSION_COOKIE: &str = "token";

/// Session cookie carrying the signed token. Cross-site frontends need
/// `SameSite=None`, which browsers only accept on secure cookies, so the
/// attributes switch together.
pub fn session_cookie(token: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    let builder = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .max_age(max_age);
    let builder = if secure {
        builder.secure(true).same_site(SameSite::None)
    } else {
        builder.same_site(SameSite::Strict)
    };
    builder.build()
}

pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let builder = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(Duration::ZERO);
    let builder = if secure {
        builder.secure(true).same_site(SameSite::None)
    } else {
        builder.same_site(SameSite::Strict)
    };
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_cookie_is_strict_and_not_secure() {
        let cookie = session_cookie("abc".into(), false, Duration::days(7));
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn production_cookie_is_secure_cross_site() {
        let cookie = session_cookie("abc".into(), true, Duration::days(7));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn clearing_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
