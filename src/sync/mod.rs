//! Network side of the CLI: the HTTP history transport and the
//! load-refresh-commit-save session every command runs inside.

pub mod http;
pub mod session;

pub use http::HttpTransport;
pub use session::{Session, SessionError};
