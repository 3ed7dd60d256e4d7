use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// OAuth scope requested for all tokens. The benchmark never writes.
const READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_only";

/// Credentials attached to every request sent by a [`Storage`](crate::Storage) client.
///
/// Either anonymous, as used against a local testbench, or backed by a service account key which
/// mints bearer tokens on demand. Tokens are cached and refreshed by the provider.
#[derive(Clone)]
pub struct Credentials {
    provider: Option<Arc<dyn gcp_auth::TokenProvider>>,
}

impl Credentials {
    /// Credentials that send no `Authorization` header at all.
    pub fn anonymous() -> Self {
        Self { provider: None }
    }

    /// Loads a service account key from the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or does not contain a valid service account key.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let account = gcp_auth::CustomServiceAccount::from_file(path.as_ref())?;
        Ok(Self {
            provider: Some(Arc::new(account)),
        })
    }

    /// Returns `true` if these credentials do not authenticate requests.
    pub fn is_anonymous(&self) -> bool {
        self.provider.is_none()
    }

    /// Returns the value for the `Authorization` header, if any.
    pub(crate) async fn authorization(&self) -> crate::Result<Option<String>> {
        let Some(provider) = &self.provider else {
            return Ok(None);
        };
        let token = provider.token(&[READ_ONLY_SCOPE]).await?;
        Ok(Some(format!("Bearer {}", token.as_str())))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.provider {
            Some(_) => "[Service Account]",
            None => "[Anonymous]",
        };
        f.debug_tuple("Credentials")
            .field(&format_args!("{kind}"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_credentials() {
        let credentials = Credentials::anonymous();
        assert!(credentials.is_anonymous());
        assert_eq!(format!("{credentials:?}"), "Credentials([Anonymous])");
    }

    #[test]
    fn missing_key_file() {
        assert!(Credentials::from_file("/nonexistent/key.json").is_err());
    }
}
