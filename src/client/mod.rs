//! Terminal dashboard for the todo API.

mod api;
mod dashboard;
mod error;
pub mod repl;
mod session;

pub use api::{ApiClient, TodoPatch};
pub use dashboard::{Dashboard, TodoForm, View};
pub use error::ClientError;
pub use session::{Credential, Session, SessionFile};
