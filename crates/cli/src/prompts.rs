//! Interactive credential prompting.
//!
//! Wired into the broker as the fallback resolver: it only runs when no
//! cached credential exists for the endpoint (or caching is disabled).

use dialoguer::{Input, Password};

use dirsync_core::credentials::{Credential, CredentialResolver};
use dirsync_core::errors::CredentialError;

use crate::render;

/// Resolver that asks for a username and secret on the terminal.
#[derive(Debug, Default)]
pub struct PromptResolver;

impl PromptResolver {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialResolver for PromptResolver {
    fn resolve(&self, endpoint: &str) -> Result<Credential, CredentialError> {
        eprintln!();
        eprintln!(
            "{}",
            render::header(&format!("Authentication required for {endpoint}"))
        );

        let username: String = Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|e| CredentialError::ResolverAborted(e.to_string()))?;

        let secret = Password::new()
            .with_prompt("Password or token")
            .interact()
            .map_err(|e| CredentialError::ResolverAborted(e.to_string()))?;

        Ok(Credential::new(username, secret))
    }
}
