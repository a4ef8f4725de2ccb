//! End-to-end client resolution through `SessionContext` and `ClientCache`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api_session::{
    AuthenticationData, ClientCache, ClientCacheConfig, ClientStore, ClientStoreRegistry,
    FetchOptions, SessionAware, SessionContext, SessionError, SessionManager, SessionRef,
    StoreLocation, StringList, TenantRecord,
};
use async_trait::async_trait;
use proptest::prelude::*;

/// Store answering every lookup with a fixed list of records.
struct FixedStore {
    records: Vec<TenantRecord>,
    calls: AtomicUsize,
}

impl FixedStore {
    fn new(records: Vec<TenantRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientStore for FixedStore {
    async fn fetch_by(
        &self,
        field: &str,
        value: &str,
        options: FetchOptions,
    ) -> anyhow::Result<Vec<TenantRecord>> {
        assert_eq!(field, "code");
        assert_eq!(options, FetchOptions::SINGLE);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .iter()
            .filter(|r| r.matches(field, value))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct OrderModel {
    session: Option<SessionRef>,
}

impl SessionAware for OrderModel {
    fn set_session(&mut self, session: SessionRef) {
        self.session = Some(session);
    }
}

fn acme_auth() -> AuthenticationData {
    AuthenticationData {
        client_code: Some("acme".to_string()),
        ..AuthenticationData::default()
    }
}

fn acme_session(store: &Arc<FixedStore>) -> (Arc<ClientCache>, Arc<SessionContext>) {
    let cache = Arc::new(ClientCache::new(
        Arc::clone(store) as Arc<dyn ClientStore>,
        ClientCacheConfig::default(),
    ));
    let session = SessionContext::with_cache(acme_auth(), Arc::clone(&cache));
    (cache, session)
}

#[tokio::test(start_paused = true)]
async fn scenario_a_resolves_client_with_factory() {
    let store = FixedStore::new(vec![TenantRecord::new("c1", "acme")]);
    let (_cache, session) = acme_session(&store);

    let client = session.client().await.unwrap().unwrap();

    assert_eq!(**client.record(), TenantRecord::new("c1", "acme"));
    let order: OrderModel = client.create_instance();
    assert!(order.session.unwrap().is(&session));
    assert_eq!(store.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn scenario_b_second_call_within_ttl_hits_cache() {
    let store = FixedStore::new(vec![TenantRecord::new("c1", "acme")]);
    let (_cache, session) = acme_session(&store);

    session.client().await.unwrap();
    tokio::time::advance(Duration::from_secs(5 * 60)).await;
    session.client().await.unwrap();

    assert_eq!(store.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn scenario_c_second_call_after_ttl_refetches() {
    let store = FixedStore::new(vec![TenantRecord::new("c1", "acme")]);
    let (_cache, session) = acme_session(&store);

    session.client().await.unwrap();
    tokio::time::advance(Duration::from_secs(10 * 60 + 1)).await;
    session.client().await.unwrap();

    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn scenario_d_empty_result_is_not_found() {
    let store = FixedStore::new(Vec::new());
    let (cache, session) = acme_session(&store);

    let err = session.client().await.unwrap_err();

    assert!(matches!(err, SessionError::ClientNotFound { ref code } if code == "acme"));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn scenario_e_preloaded_client_skips_store() {
    let store = FixedStore::new(vec![TenantRecord::new("c1", "acme")]);
    let registry = ClientStoreRegistry::new();
    let location = StoreLocation::new("/srv/app");
    registry.register_store(&location, Arc::clone(&store) as Arc<dyn ClientStore>);
    let manager = SessionManager::from_registry(&registry, &location, ClientCacheConfig::default());

    let session = manager.session_with_client(acme_auth(), TenantRecord::new("c1", "acme"));
    let client = session.client().await.unwrap().unwrap();

    assert_eq!(client.id(), Some("c1"));
    assert_eq!(store.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn sessions_of_concurrent_requests_share_one_lookup() {
    struct SlowStore(AtomicUsize);

    #[async_trait]
    impl ClientStore for SlowStore {
        async fn fetch_by(
            &self,
            _field: &str,
            value: &str,
            _options: FetchOptions,
        ) -> anyhow::Result<Vec<TenantRecord>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(250)).await;
            Ok(vec![TenantRecord::new("c1", value)])
        }
    }

    let store = Arc::new(SlowStore(AtomicUsize::new(0)));
    let manager = Arc::new(SessionManager::new(Arc::new(ClientCache::new(
        Arc::clone(&store) as Arc<dyn ClientStore>,
        ClientCacheConfig::default(),
    ))));

    let requests: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let session = manager.session(acme_auth());
                session.client().await.map(|c| c.map(|c| Arc::clone(c.record())))
            })
        })
        .collect();

    let mut records = Vec::new();
    for request in requests {
        records.push(request.await.unwrap().unwrap().unwrap());
    }

    assert_eq!(store.0.load(Ordering::SeqCst), 1);
    assert!(records.iter().all(|r| Arc::ptr_eq(r, &records[0])));
}

#[tokio::test]
async fn payload_from_json_drives_session() {
    let store = FixedStore::new(vec![TenantRecord::new("c1", "acme")]);
    let cache = Arc::new(ClientCache::new(
        Arc::clone(&store) as Arc<dyn ClientStore>,
        ClientCacheConfig::default(),
    ));
    let auth = AuthenticationData::from_json(
        r#"{"userId":"u1","clientCode":"acme","locations":"not-a-list","permissions":["orders:read"]}"#,
    )
    .unwrap();
    let session = SessionContext::with_cache(auth, cache);

    assert_eq!(session.user_id(), Some("u1"));
    assert!(!session.validate_location_access("not-a-list"));
    assert!(session.has_permission("orders:read"));
    assert_eq!(session.client().await.unwrap().unwrap().code(), Some("acme"));
}

fn session_with(locations: Option<StringList>, all: Option<bool>) -> Arc<SessionContext> {
    SessionContext::with_client(
        AuthenticationData {
            locations,
            has_access_to_all_locations: all,
            ..AuthenticationData::default()
        },
        TenantRecord::new("c1", "acme"),
    )
}

proptest! {
    #[test]
    fn unrestricted_access_grants_any_location(id in ".*", locations in proptest::collection::vec("[a-z0-9-]{1,8}", 0..5)) {
        let session = session_with(Some(StringList::from(locations)), Some(true));
        prop_assert!(session.validate_location_access(&id));
    }

    #[test]
    fn listed_location_is_granted_iff_member(id in "[a-z0-9-]{1,8}", locations in proptest::collection::vec("[a-z0-9-]{1,8}", 1..5)) {
        let expected = locations.contains(&id);
        let session = session_with(Some(StringList::from(locations)), None);
        prop_assert_eq!(session.validate_location_access(&id), expected);
    }

    #[test]
    fn absent_or_malformed_locations_grant_nothing(id in ".*", malformed in any::<bool>()) {
        let locations = malformed.then_some(StringList::Malformed);
        let session = session_with(locations, Some(false));
        prop_assert!(!session.validate_location_access(&id));
    }
}
