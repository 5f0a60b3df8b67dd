use mkt_common::Secret;

/// Where the push channel manager reads the current session credential from when it re-checks it, e.g. when the host
/// window regains focus.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    fn current_credential(&self) -> Option<Secret<String>>;
}

/// A credential source that never changes. Handy for hosts that push credential changes explicitly.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<Secret<String>>);

impl StaticCredential {
    pub fn new(credential: Option<Secret<String>>) -> Self {
        Self(credential)
    }
}

impl CredentialSource for StaticCredential {
    fn current_credential(&self) -> Option<Secret<String>> {
        self.0.clone()
    }
}
