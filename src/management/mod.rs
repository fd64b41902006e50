mod credentials;
mod progress;

pub use credentials::Authorizer;
pub use credentials::CredentialManager;
pub use credentials::parse_client_secrets;
pub use progress::ProgressError;
pub use progress::ProgressLog;
