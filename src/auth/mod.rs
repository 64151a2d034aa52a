//! Credential acquisition and persistence for the storage backend.
//!
//! The tool gateway never sees a credential; it is owned entirely by this
//! module and handed to the Drive client one call at a time via
//! [`CredentialProvider`].

mod credential;
mod flow;
mod provider;
mod store;

pub use credential::{StoredCredential, TokenResponse};
pub use flow::{ClientSecrets, OAuthFlow, DRIVE_READONLY_SCOPE};
pub use provider::{CredentialProvider, OAuthProvider};
pub use store::{CredentialStore, FileCredentialStore};
