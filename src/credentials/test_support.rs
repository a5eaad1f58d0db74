//! Mock [`CredentialStore`] shared by unit tests.

use mockall::mock;

use super::{CredentialFuture, CredentialStore};

mock! {
    pub CredentialStore {}

    impl CredentialStore for CredentialStore {
        fn resolve(&self, registry: &str) -> CredentialFuture<'_>;
    }
}
