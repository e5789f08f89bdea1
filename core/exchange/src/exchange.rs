//! Create, retrieve and probe flows.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ExchangeConfig;
use crate::validation::{CreateSecretRequest, TtlPolicy};
use oncelink_common::{token, Error, Result, SecretText, StorageKey, Ttl};
use oncelink_crypto::{decrypt, encrypt, SecretKey};
use oncelink_storage::SecretStore;

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSecret {
    /// Opaque retrieval token: storage key and decryption key.
    pub token: String,
    /// Lifetime the secret was stored with.
    pub ttl: Ttl,
}

/// Entry point for the one-time secret protocol.
///
/// Holds no per-secret state: everything mutable lives in the store, so one
/// exchange can serve any number of concurrent requests.
pub struct SecretExchange {
    store: Arc<dyn SecretStore>,
    config: ExchangeConfig,
}

impl SecretExchange {
    /// Create an exchange over `store`.
    ///
    /// # Errors
    /// - `InvalidInput` if the configuration is invalid
    pub fn new(store: Arc<dyn SecretStore>, config: ExchangeConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Secret exchange ready (store: {}, max ttl: {}s)",
            store.name(),
            config.max_ttl_secs
        );
        Ok(Self { store, config })
    }

    /// Validate a raw request, then create the secret.
    ///
    /// Nothing touches the store or the cipher until validation passed.
    pub async fn create_from_request(
        &self,
        request: CreateSecretRequest,
        policy: TtlPolicy,
    ) -> Result<CreatedSecret> {
        let validated = request.validate(&self.config, policy)?;
        self.create(&validated.password, validated.ttl).await
    }

    /// Encrypt and store a secret for `ttl`.
    ///
    /// # Postconditions
    /// - A fresh key and a fresh storage key were generated
    /// - Only the ciphertext reached the store; the key lives in the token
    ///
    /// # Errors
    /// - `StoreUnavailable` if the store cannot be reached
    pub async fn create(&self, password: &SecretText, ttl: Ttl) -> Result<CreatedSecret> {
        let key = SecretKey::generate();
        let ciphertext = encrypt(&key, password.expose().as_bytes())?;

        let storage_key = StorageKey::generate(&self.config.key_prefix);
        self.store
            .put(&storage_key, ciphertext, ttl.as_duration())
            .await?;

        debug!("Created secret {} (ttl {})", storage_key, ttl);

        Ok(CreatedSecret {
            token: token::encode(storage_key.as_str(), Some(&key.to_token_string())),
            ttl,
        })
    }

    /// Redeem a token, destroying the secret.
    ///
    /// Tokens without a key refer to secrets stored in plaintext; their
    /// value is returned unmodified.
    ///
    /// # Errors
    /// - `NotFound` if the secret is unknown, expired or already consumed
    /// - `Decryption` if the key does not open the ciphertext
    /// - `StoreUnavailable` if the store cannot be reached
    pub async fn retrieve(&self, token: &str) -> Result<SecretText> {
        let (storage_key, key_text) = token::decode(token);
        let storage_key = StorageKey::new(storage_key)
            .map_err(|_| Error::NotFound("Empty storage key".to_string()))?;

        // A malformed key could never open the record, so it must not consume it.
        let key = key_text.map(SecretKey::from_token_str).transpose()?;

        let stored = self
            .store
            .fetch_and_delete(&storage_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No secret stored under {}", storage_key)))?;

        let plaintext = match key {
            Some(key) => decrypt(&key, &stored)?,
            None => stored,
        };

        debug!("Secret {} retrieved and destroyed", storage_key);
        SecretText::from_utf8(plaintext).map_err(|_| Error::Decryption)
    }

    /// Check whether a token still refers to a live secret.
    pub async fn exists(&self, token: &str) -> Result<bool> {
        let (storage_key, _) = token::decode(token);
        match StorageKey::new(storage_key) {
            Ok(storage_key) => self.store.exists(&storage_key).await,
            Err(_) => Ok(false),
        }
    }

    /// Probe store reachability.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Reclaim expired records from the store.
    pub async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::future::join_all;
    use oncelink_common::TOKEN_SEPARATOR;
    use oncelink_storage::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    fn exchange() -> (SecretExchange, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let exchange = SecretExchange::new(store.clone(), ExchangeConfig::default()).unwrap();
        (exchange, store)
    }

    fn ttl(secs: u64) -> Ttl {
        Ttl::new(secs, 1_209_600).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_retrieve_once() {
        let (exchange, _) = exchange();

        let created = exchange
            .create(&SecretText::new("hunter2"), ttl(60))
            .await
            .unwrap();

        let secret = exchange.retrieve(&created.token).await.unwrap();
        assert_eq!(secret.expose(), "hunter2");

        let again = exchange.retrieve(&created.token).await;
        assert!(matches!(again, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_token_shape() {
        let (exchange, _) = exchange();

        let created = exchange.create(&SecretText::new("x"), ttl(60)).await.unwrap();
        let (storage_key, key) = token::decode(&created.token);

        assert!(storage_key.starts_with("oncelink"));
        assert!(!storage_key.contains(TOKEN_SEPARATOR));
        assert_eq!(key.map(str::len), Some(43));
    }

    #[tokio::test]
    async fn test_key_is_not_stored() {
        let (exchange, store) = exchange();

        let created = exchange.create(&SecretText::new("hunter2"), ttl(60)).await.unwrap();
        let (storage_key, key) = token::decode(&created.token);
        let key = key.unwrap();

        let raw = store
            .fetch_and_delete(&StorageKey::new(storage_key).unwrap())
            .await
            .unwrap()
            .unwrap();

        assert!(!raw.windows(key.len()).any(|w| w == key.as_bytes()));
        assert!(!raw.windows(7).any(|w| w == b"hunter2"));
    }

    #[tokio::test]
    async fn test_each_create_gets_fresh_keys() {
        let (exchange, _) = exchange();
        let secret = SecretText::new("same");

        let a = exchange.create(&secret, ttl(60)).await.unwrap();
        let b = exchange.create(&secret, ttl(60)).await.unwrap();

        let (store_a, key_a) = token::decode(&a.token);
        let (store_b, key_b) = token::decode(&b.token);
        assert_ne!(store_a, store_b);
        assert_ne!(key_a, key_b);
    }

    #[tokio::test]
    async fn test_plaintext_record_returned_unmodified() {
        let (exchange, store) = exchange();
        let storage_key = StorageKey::new("oncelinklegacy").unwrap();

        store
            .put(&storage_key, b"plain old secret".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let secret = exchange.retrieve("oncelinklegacy").await.unwrap();
        assert_eq!(secret.expose(), "plain old secret");
    }

    #[tokio::test]
    async fn test_wrong_key_is_decryption_error() {
        let (exchange, _) = exchange();

        let created = exchange.create(&SecretText::new("x"), ttl(60)).await.unwrap();
        let (storage_key, _) = token::decode(&created.token);
        let forged = token::encode(storage_key, Some(&SecretKey::generate().to_token_string()));

        let result = exchange.retrieve(&forged).await;
        assert!(matches!(result, Err(Error::Decryption)));
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_malformed_key_does_not_consume() {
        let (exchange, _) = exchange();

        let created = exchange.create(&SecretText::new("x"), ttl(60)).await.unwrap();
        let (storage_key, _) = token::decode(&created.token);
        let garbled = token::encode(storage_key, Some("!!!"));

        assert!(exchange.retrieve(&garbled).await.unwrap_err().is_not_found());
        assert_eq!(exchange.retrieve(&created.token).await.unwrap().expose(), "x");
    }

    #[tokio::test]
    async fn test_exists_does_not_consume() {
        let (exchange, _) = exchange();

        let created = exchange.create(&SecretText::new("x"), ttl(60)).await.unwrap();

        assert!(exchange.exists(&created.token).await.unwrap());
        assert!(exchange.exists(&created.token).await.unwrap());
        exchange.retrieve(&created.token).await.unwrap();
        assert!(!exchange.exists(&created.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_token() {
        let (exchange, _) = exchange();

        assert!(!exchange.exists("").await.unwrap());
        assert!(exchange.retrieve("").await.unwrap_err().is_not_found());
        assert!(exchange.retrieve("~abc").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_from_request_validates_first() {
        let (exchange, store) = exchange();
        let request: CreateSecretRequest =
            serde_json::from_value(json!({ "password": "x", "ttl": 999_999_999 })).unwrap();

        let result = exchange.create_from_request(request, TtlPolicy::Seconds).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_named_ttl() {
        let (exchange, _) = exchange();
        let request: CreateSecretRequest =
            serde_json::from_value(json!({ "password": "hunter2", "ttl": "day" })).unwrap();

        let created = exchange
            .create_from_request(request, TtlPolicy::SecondsOrNamed)
            .await
            .unwrap();

        assert_eq!(created.ttl.as_secs(), 86_400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_retrievals_single_winner() {
        let (exchange, _) = exchange();
        let exchange = Arc::new(exchange);
        let created = exchange.create(&SecretText::new("race"), ttl(60)).await.unwrap();

        let tasks = (0..16).map(|_| {
            let exchange = exchange.clone();
            let token = created.token.clone();
            tokio::spawn(async move { exchange.retrieve(&token).await })
        });

        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.is_not_found()));
    }

    struct DownStore;

    #[async_trait]
    impl SecretStore for DownStore {
        fn name(&self) -> &str {
            "down"
        }
        async fn put(&self, _: &StorageKey, _: Vec<u8>, _: Duration) -> Result<()> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn fetch_and_delete(&self, _: &StorageKey) -> Result<Option<Vec<u8>>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn exists(&self, _: &StorageKey) -> Result<bool> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn ping(&self) -> Result<()> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn purge_expired(&self) -> Result<usize> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let exchange = SecretExchange::new(Arc::new(DownStore), ExchangeConfig::default()).unwrap();

        let created = exchange.create(&SecretText::new("x"), ttl(60)).await;
        assert!(matches!(created, Err(Error::StoreUnavailable(_))));

        let retrieved = exchange.retrieve("oncelinkabc").await;
        assert!(matches!(retrieved, Err(Error::StoreUnavailable(_))));
    }
}
