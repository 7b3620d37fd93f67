// Request-derived URLs
//
// The callback URL and the post-login redirect are always computed from the
// scheme and host the browser actually used, so one deployment can serve
// several domains without the state and session cookies landing on the wrong
// one.
use actix_web::HttpRequest;

pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// `{scheme}://{host}` of the current request, honouring forwarding headers
#[must_use]
pub fn base_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// OAuth redirect URI for this request's host
#[must_use]
pub fn callback_url(req: &HttpRequest) -> String {
    format!("{}{CALLBACK_PATH}", base_url(req))
}

/// Where the browser lands after sign-in
#[must_use]
pub fn app_root(req: &HttpRequest, frontend_origin: Option<&str>) -> String {
    match frontend_origin {
        Some(origin) if !origin.trim().is_empty() => {
            format!("{}/", origin.trim().trim_end_matches('/'))
        }
        _ => format!("{}/", base_url(req)),
    }
}
