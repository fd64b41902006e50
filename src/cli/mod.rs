mod auth;
mod info;
mod run;

pub use auth::auth;
pub use info::Backlog;
pub use info::backlog;
pub use info::info;
pub use run::run;
pub use run::run_with;
