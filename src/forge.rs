use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Credential, Page, RepositorySpec};

/// One page request against the remote issue tracker.
///
/// `continuation` is the opaque next-page URL from a previous [`Page`]; when
/// present it is requested verbatim; `spec` is still checked and logged.
#[async_trait]
pub trait IssueFetcher: Send + Sync + std::fmt::Debug {
    async fn fetch_page(
        &self,
        spec: &RepositorySpec,
        credential: Option<&Credential>,
        continuation: Option<&str>,
    ) -> Result<Page>;
}
