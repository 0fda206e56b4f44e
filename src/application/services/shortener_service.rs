//! Short link orchestration.
//!
//! Ties code derivation, the repository and the delete queue together and turns
//! repository results into the outcomes the transport layer renders.

use std::net::IpAddr;
use std::sync::Arc;

use ipnetwork::IpNetwork;
use serde_json::json;

use crate::domain::delete_worker::{DeleteQueue, DeleteRequest};
use crate::domain::entities::{NewLink, OwnerId, SaveOutcome, Statistics};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::compute_code;

/// Whether a create stored a new link or found the URL already shortened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Result of shortening one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub short_url: String,
    pub outcome: CreateOutcome,
}

/// One URL of a batch request, tagged by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// One entry of a batch response, in the same order as the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_url: String,
}

/// A live link as listed for its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedLink {
    pub short_url: String,
    pub original_url: String,
}

/// Service for creating, resolving, listing and deleting short links.
///
/// Generic over the repository so tests can use a mock; the server stores it behind
/// `dyn LinkRepository` since the backend is chosen at startup.
pub struct ShortenerService<R: LinkRepository + ?Sized = dyn LinkRepository> {
    repository: Arc<R>,
    base_url: String,
    delete_queue: DeleteQueue,
    trusted_subnet: Option<IpNetwork>,
}

impl<R: LinkRepository + ?Sized> ShortenerService<R> {
    /// Creates a new shortener service.
    ///
    /// # Arguments
    ///
    /// - `repository` - link storage backend
    /// - `base_url` - prefix of every short URL; a trailing `/` is ignored
    /// - `delete_queue` - queue feeding the background delete worker
    /// - `trusted_subnet` - callers allowed to read statistics; `None` denies everyone
    pub fn new(
        repository: Arc<R>,
        base_url: impl Into<String>,
        delete_queue: DeleteQueue,
        trusted_subnet: Option<IpNetwork>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            repository,
            base_url,
            delete_queue,
            trusted_subnet,
        }
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// Shortens a URL on behalf of an owner.
    ///
    /// An already shortened URL is not an error: the canonical short URL is returned
    /// with [`CreateOutcome::AlreadyExists`] and the stored owner is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL lacks a scheme or host.
    /// Returns [`AppError::Conflict`] if the code is held by a different URL.
    /// Returns [`AppError::Internal`] on storage failures.
    pub async fn create(
        &self,
        original_url: &str,
        owner_id: &OwnerId,
    ) -> Result<Shortened, AppError> {
        let code = compute_code(original_url)?;

        let outcome = match self.repository.save(&code, original_url, owner_id).await? {
            SaveOutcome::Created => {
                tracing::info!(code = %code, owner_id = %owner_id, "Short link created");
                CreateOutcome::Created
            }
            SaveOutcome::Duplicate => CreateOutcome::AlreadyExists,
        };

        Ok(Shortened {
            short_url: self.short_url(&code),
            outcome,
        })
    }

    /// Resolves a code to its original URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown code.
    /// Returns [`AppError::Gone`] if the link was deleted.
    /// Returns [`AppError::Internal`] on storage failures.
    pub async fn find_by_code(&self, code: &str) -> Result<String, AppError> {
        let link = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        if link.is_deleted {
            return Err(AppError::gone(
                "Short link was deleted",
                json!({ "code": code }),
            ));
        }

        Ok(link.original_url)
    }

    /// Lists the live links an owner created.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failures.
    pub async fn find_all_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<OwnedLink>, AppError> {
        let links = self.repository.find_all_by_owner(owner_id).await?;

        Ok(links
            .into_iter()
            .map(|link| OwnedLink {
                short_url: self.short_url(&link.code),
                original_url: link.original_url,
            })
            .collect())
    }

    /// Shortens several URLs as one all-or-nothing unit.
    ///
    /// Every URL is validated before anything is stored. Results keep the request
    /// order and correlation ids.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty batch or any invalid URL.
    /// Returns [`AppError::Conflict`] if any URL is already shortened or repeated.
    /// Returns [`AppError::Internal`] on storage failures.
    pub async fn create_batch(
        &self,
        items: &[BatchItem],
        owner_id: &OwnerId,
    ) -> Result<Vec<BatchResult>, AppError> {
        if items.is_empty() {
            return Err(AppError::bad_request("Batch is empty", json!({})));
        }

        let mut links = Vec::with_capacity(items.len());
        for item in items {
            let code = compute_code(&item.original_url).map_err(|_| {
                AppError::bad_request(
                    "Invalid URL in batch",
                    json!({
                        "correlation_id": item.correlation_id,
                        "url": item.original_url,
                    }),
                )
            })?;
            links.push(NewLink {
                code,
                original_url: item.original_url.clone(),
            });
        }

        self.repository.save_batch(&links, owner_id).await?;
        tracing::info!(owner_id = %owner_id, count = links.len(), "Batch of short links created");

        Ok(items
            .iter()
            .zip(&links)
            .map(|(item, link)| BatchResult {
                correlation_id: item.correlation_id.clone(),
                short_url: self.short_url(&link.code),
            })
            .collect())
    }

    /// Accepts a delete request for background execution.
    ///
    /// Returns once the request is queued; codes owned by someone else are ignored
    /// when the worker applies it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the delete worker has stopped.
    pub fn delete_async(&self, codes: Vec<String>, owner_id: OwnerId) -> Result<(), AppError> {
        if codes.is_empty() {
            return Ok(());
        }

        self.delete_queue.submit(DeleteRequest { codes, owner_id })
    }

    /// Returns service-wide counters to callers inside the trusted subnet.
    ///
    /// The repository is not consulted unless the caller is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] if no subnet is configured, the caller address
    /// is unknown, or it lies outside the subnet.
    /// Returns [`AppError::Internal`] on storage failures.
    pub async fn collect_stats(&self, caller_ip: Option<IpAddr>) -> Result<Statistics, AppError> {
        let Some(subnet) = self.trusted_subnet else {
            return Err(AppError::forbidden(
                "Statistics are disabled",
                json!({ "reason": "trusted subnet is not configured" }),
            ));
        };

        let Some(ip) = caller_ip else {
            return Err(AppError::forbidden(
                "Caller address is unknown",
                json!({ "reason": "X-Real-IP header is missing or invalid" }),
            ));
        };

        if !subnet.contains(ip) {
            return Err(AppError::forbidden(
                "Caller is outside the trusted subnet",
                json!({ "ip": ip.to_string() }),
            ));
        }

        self.repository.collect_stats().await
    }

    /// Checks that the storage backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if it is not.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delete_worker::DeleteWorker;
    use crate::domain::entities::Link;
    use crate::domain::repositories::MockLinkRepository;

    const BASE: &str = "http://localhost:8080";

    fn owner() -> OwnerId {
        OwnerId::from("owner-1")
    }

    fn service_with(
        mock_repo: MockLinkRepository,
        trusted_subnet: Option<&str>,
    ) -> (ShortenerService<MockLinkRepository>, DeleteWorker) {
        let repo = Arc::new(mock_repo);
        let (queue, worker) = DeleteWorker::spawn(repo.clone());
        let subnet = trusted_subnet.map(|s| s.parse().unwrap());
        (ShortenerService::new(repo, BASE, queue, subnet), worker)
    }

    #[tokio::test]
    async fn test_create_returns_short_url() {
        let code = compute_code("https://example.com").unwrap();
        let expected_code = code.clone();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_save()
            .withf(move |c, url, o| {
                c == expected_code && url == "https://example.com" && o.as_str() == "owner-1"
            })
            .times(1)
            .returning(|_, _, _| Ok(SaveOutcome::Created));

        let (service, _worker) = service_with(mock_repo, None);

        let result = service.create("https://example.com", &owner()).await.unwrap();

        assert_eq!(result.outcome, CreateOutcome::Created);
        assert_eq!(result.short_url, format!("{BASE}/{code}"));
    }

    #[tokio::test]
    async fn test_create_duplicate_returns_same_short_url() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_save()
            .times(2)
            .returning(|_, _, _| Ok(SaveOutcome::Duplicate));

        let (service, _worker) = service_with(mock_repo, None);

        let first = service.create("https://example.com", &owner()).await.unwrap();
        let second = service
            .create("https://example.com", &OwnerId::from("owner-2"))
            .await
            .unwrap();

        assert_eq!(first.outcome, CreateOutcome::AlreadyExists);
        assert_eq!(first.short_url, second.short_url);
    }

    #[tokio::test]
    async fn test_create_invalid_url_skips_repository() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_save().times(0);

        let (service, _worker) = service_with(mock_repo, None);

        let result = service.create("not a url", &owner()).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_is_ignored() {
        let repo = Arc::new(MockLinkRepository::new());
        let (queue, _worker) = DeleteWorker::spawn(repo.clone());
        let service = ShortenerService::new(repo, "http://s.test/", queue, None);

        assert_eq!(service.short_url("abc"), "http://s.test/abc");
    }

    #[tokio::test]
    async fn test_find_by_code_found() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .withf(|c| c == "abc")
            .times(1)
            .returning(|_| {
                Ok(Some(Link::new(
                    "abc".into(),
                    "https://example.com".into(),
                    OwnerId::from("owner-1"),
                )))
            });

        let (service, _worker) = service_with(mock_repo, None);

        assert_eq!(
            service.find_by_code("abc").await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn test_find_by_code_not_found() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(None));

        let (service, _worker) = service_with(mock_repo, None);

        assert!(matches!(
            service.find_by_code("zzz").await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_by_code_deleted_is_gone() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(1).returning(|_| {
            let mut link = Link::new(
                "abc".into(),
                "https://example.com".into(),
                OwnerId::from("owner-1"),
            );
            link.is_deleted = true;
            Ok(Some(link))
        });

        let (service, _worker) = service_with(mock_repo, None);

        assert!(matches!(
            service.find_by_code("abc").await,
            Err(AppError::Gone { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_all_by_owner_builds_short_urls() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_all_by_owner()
            .times(1)
            .returning(|o| {
                Ok(vec![Link::new(
                    "abc".into(),
                    "https://example.com".into(),
                    o.clone(),
                )])
            });

        let (service, _worker) = service_with(mock_repo, None);

        let links = service.find_all_by_owner(&owner()).await.unwrap();

        assert_eq!(
            links,
            vec![OwnedLink {
                short_url: format!("{BASE}/abc"),
                original_url: "https://example.com".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_create_batch_preserves_order() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_save_batch()
            .withf(|links, o| links.len() == 2 && o.as_str() == "owner-1")
            .times(1)
            .returning(|_, _| Ok(()));

        let (service, _worker) = service_with(mock_repo, None);

        let items = vec![
            BatchItem {
                correlation_id: "second".into(),
                original_url: "https://b.com".into(),
            },
            BatchItem {
                correlation_id: "first".into(),
                original_url: "https://a.com".into(),
            },
        ];

        let results = service.create_batch(&items, &owner()).await.unwrap();

        assert_eq!(results[0].correlation_id, "second");
        assert_eq!(
            results[0].short_url,
            service.short_url(&compute_code("https://b.com").unwrap())
        );
        assert_eq!(results[1].correlation_id, "first");
    }

    #[tokio::test]
    async fn test_create_batch_invalid_url_persists_nothing() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_save_batch().times(0);

        let (service, _worker) = service_with(mock_repo, None);

        let items = vec![
            BatchItem {
                correlation_id: "ok".into(),
                original_url: "https://a.com".into(),
            },
            BatchItem {
                correlation_id: "bad".into(),
                original_url: "nope".into(),
            },
        ];

        let err = service.create_batch(&items, &owner()).await.unwrap_err();

        assert_eq!(err.to_error_info().details["correlation_id"], "bad");
    }

    #[tokio::test]
    async fn test_create_batch_empty_is_rejected() {
        let (service, _worker) = service_with(MockLinkRepository::new(), None);

        assert!(matches!(
            service.create_batch(&[], &owner()).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_async_reaches_repository() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_soft_delete()
            .withf(|codes, o| codes.len() == 2 && o.as_str() == "owner-1")
            .times(1)
            .returning(|_, _| Ok(2));

        let (service, worker) = service_with(mock_repo, None);

        service
            .delete_async(vec!["a".into(), "b".into()], owner())
            .unwrap();

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_stats_forbidden_without_subnet() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_collect_stats().times(0);

        let (service, _worker) = service_with(mock_repo, None);

        let result = service
            .collect_stats(Some("10.0.0.1".parse().unwrap()))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_stats_forbidden_outside_subnet_or_unknown_ip() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_collect_stats().times(0);

        let (service, _worker) = service_with(mock_repo, Some("10.0.0.0/24"));

        assert!(
            service
                .collect_stats(Some("10.0.1.1".parse().unwrap()))
                .await
                .is_err()
        );
        assert!(service.collect_stats(None).await.is_err());
    }

    #[tokio::test]
    async fn test_stats_allowed_inside_subnet() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_collect_stats()
            .times(1)
            .returning(|| Ok(Statistics { urls: 5, users: 2 }));

        let (service, _worker) = service_with(mock_repo, Some("10.0.0.0/24"));

        let stats = service
            .collect_stats(Some("10.0.0.42".parse().unwrap()))
            .await
            .unwrap();

        assert_eq!(stats.urls, 5);
        assert_eq!(stats.users, 2);
    }
}
