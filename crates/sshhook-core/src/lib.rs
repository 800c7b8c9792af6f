// ABOUTME: Core decision logic for the sshhook callback service.
// ABOUTME: Exports config loading, the directory, the validator and the resolver.

pub mod config;
pub mod directory;
pub mod error;
pub mod resolver;
pub mod validator;

pub use config::Config;
pub use directory::{ClusterRecord, Directory, UserRecord};
pub use error::{LoadError, ResolveError};
pub use resolver::{BackendTarget, Resolver};
pub use validator::{AuthDecision, Validator};
