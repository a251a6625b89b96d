mod session_manager;
mod session_worker;

pub use session_manager::{SessionHandle, SessionManager};
