//! HTTP module
//!
//! - `HttpSession`: request sender with its own cookie jar and manual redirects
//! - `CookieBundle`: ordered cookie pairs rendered into a `Cookie` header
//! - `PanelResponse`: fully read response with the cookies it set

mod cookies;
mod session;

pub use cookies::CookieBundle;
pub use session::{build_http_client, HttpSession, PanelResponse};
