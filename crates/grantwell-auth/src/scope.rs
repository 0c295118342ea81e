//! Scope policy evaluation.
//!
//! Requested scopes are checked against a layered policy:
//!
//! 1. An empty request falls back to the server's default scopes.
//! 2. If the application declares its own scopes, those are the whole
//!    permitted set.
//! 3. Otherwise the permitted set is the default scopes plus the optional
//!    scopes.
//!
//! Membership is by whole scope name. Order and duplicates in the request do
//! not matter for validation, but the resolved string keeps them as
//! submitted.

use std::collections::BTreeSet;
use std::fmt;

use crate::AuthResult;
use crate::config::OAuthConfig;
use crate::error::AuthError;

/// Splits a space-separated scope string into scope names.
pub fn parse(scopes: &str) -> Vec<&str> {
    scopes.split_whitespace().collect()
}

/// Returns `true` if both scope strings name the same set of scopes.
pub fn scopes_equal(a: &str, b: &str) -> bool {
    let a: BTreeSet<&str> = a.split_whitespace().collect();
    let b: BTreeSet<&str> = b.split_whitespace().collect();
    a == b
}

/// The set a request is validated against.
///
/// The two origins render differently in diagnostics: an application's own
/// scope string renders as a single quoted string (`"app:read"`), the server
/// list as a bracketed array of quoted names (`["public","read","write"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermittedScopes {
    /// Scopes declared by the application, verbatim.
    Application(String),
    /// Server default scopes followed by optional scopes.
    Server(Vec<String>),
}

impl PermittedScopes {
    /// Returns `true` if `scope` is a member of the permitted set.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        match self {
            Self::Application(declared) => declared.split_whitespace().any(|s| s == scope),
            Self::Server(list) => list.iter().any(|s| s == scope),
        }
    }
}

impl fmt::Display for PermittedScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application(declared) => write!(f, "{declared:?}"),
            Self::Server(list) => {
                write!(f, "[")?;
                for (i, scope) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{scope:?}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Validates and normalizes requested scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePolicy {
    default_scopes: Vec<String>,
    optional_scopes: Vec<String>,
}

impl ScopePolicy {
    /// Creates a policy from explicit default and optional scope lists.
    pub fn new<D, O>(default_scopes: D, optional_scopes: O) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            default_scopes: default_scopes.into_iter().map(Into::into).collect(),
            optional_scopes: optional_scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a policy from the OAuth configuration.
    #[must_use]
    pub fn from_config(config: &OAuthConfig) -> Self {
        Self::new(
            config.default_scopes.iter().cloned(),
            config.optional_scopes.iter().cloned(),
        )
    }

    /// Default scopes joined with single spaces.
    #[must_use]
    pub fn default_scopes(&self) -> String {
        self.default_scopes.join(" ")
    }

    /// Default scopes followed by optional scopes, without duplicates.
    #[must_use]
    pub fn server_scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in self.default_scopes.iter().chain(&self.optional_scopes) {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
        scopes
    }

    /// Resolves the permitted set for an application's declared scopes.
    ///
    /// Blank declarations count as undeclared.
    #[must_use]
    pub fn permitted(&self, application_scopes: Option<&str>) -> PermittedScopes {
        match application_scopes.filter(|s| !s.trim().is_empty()) {
            Some(declared) => PermittedScopes::Application(declared.to_string()),
            None => PermittedScopes::Server(self.server_scopes()),
        }
    }

    /// Validates `requested` and returns the normalized scope string.
    ///
    /// An absent or blank request resolves to the default scopes, which are
    /// then validated like any other request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidScope` if any requested scope is outside the
    /// permitted set.
    pub fn resolve(
        &self,
        requested: Option<&str>,
        application_scopes: Option<&str>,
    ) -> AuthResult<String> {
        let resolved = match requested.filter(|s| !s.trim().is_empty()) {
            Some(requested) => parse(requested).join(" "),
            None => self.default_scopes(),
        };

        let permitted = self.permitted(application_scopes);
        if let Some(rejected) = parse(&resolved).into_iter().find(|s| !permitted.contains(s)) {
            tracing::debug!(scope = rejected, "Requested scope not permitted");
            return Err(AuthError::invalid_scope(resolved, permitted.to_string()));
        }

        Ok(resolved)
    }
}
