//! The peer node and its request/reply protocols.
//!
//! Requester side: ask one peer for its dataset refs or its profile,
//! waiting on a single-use reply channel. Server side: answer such
//! requests from the local repo. Handlers for different inbound peers run
//! concurrently; they only read local state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use strata_repo::Repo;
use strata_types::DatasetRef;

use crate::error::{P2pError, P2pResult};
use crate::message::{headers, DatasetsListParams, Envelope, PeerProfile, MT_DATASETS, MT_PROFILE};
use crate::transport::{PeerId, PeerTransport, ReplySink};

/// The most entries a single list response may carry. Requests asking for
/// zero or more than this are served exactly this many, never unbounded.
pub const LIST_MAX: usize = 30;

/// A peer participating in the overlay network.
pub struct Node<R, T> {
    peer_id: PeerId,
    online: AtomicBool,
    repo: Arc<R>,
    transport: Arc<T>,
}

impl<R: Repo, T: PeerTransport> Node<R, T> {
    /// A new node, initially offline.
    pub fn new(peer_id: PeerId, repo: Arc<R>, transport: Arc<T>) -> Self {
        Self {
            peer_id,
            online: AtomicBool::new(false),
            repo,
            transport,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Ask `pid` for its dataset list.
    ///
    /// Requests addressed to this node itself are answered straight from
    /// the local ref store, never a network operation. Otherwise the node
    /// must be online; the call then blocks until the single reply arrives
    /// on its own freshly allocated channel.
    pub async fn request_datasets_list(
        &self,
        pid: &PeerId,
        params: DatasetsListParams,
    ) -> P2pResult<Vec<DatasetRef>> {
        debug!(node = %self.peer_id, peer = %pid, "requesting dataset list");

        if pid == &self.peer_id {
            return Ok(self.repo.refs().references(params.limit, params.offset)?);
        }

        if !self.is_online() {
            return Err(P2pError::NotConnected);
        }

        let req = Envelope::request(MT_DATASETS, &params)?
            .with_header(headers::LEGACY_RPC, params.legacy_rpc.to_string());

        let (tx, rx) = oneshot::channel();
        self.transport.send(pid, req, tx).await?;

        let reply = rx.await.map_err(|_| P2pError::ChannelClosed)?;
        Ok(reply.decode_body()?)
    }

    /// Ask `pid` for its profile.
    ///
    /// Follows the same shape as the dataset list request: a self-request
    /// is answered from the local repo without a network hop, and an
    /// offline node fails before anything is sent.
    pub async fn request_profile(&self, pid: &PeerId) -> P2pResult<PeerProfile> {
        debug!(node = %self.peer_id, peer = %pid, "requesting profile");

        if pid == &self.peer_id {
            return Ok(PeerProfile::of(&self.repo.profile()?));
        }

        if !self.is_online() {
            return Err(P2pError::NotConnected);
        }

        let req = Envelope::request(MT_PROFILE, &())?;
        let (tx, rx) = oneshot::channel();
        self.transport.send(pid, req, tx).await?;

        let reply = rx.await.map_err(|_| P2pError::ChannelClosed)?;
        Ok(reply.decode_body()?)
    }

    /// Answer one inbound `profile` exchange.
    ///
    /// Only request-phase envelopes are acted on. A node without an active
    /// profile has nothing to share and stays silent.
    pub async fn handle_profile(&self, sink: &dyn ReplySink, msg: &Envelope) {
        if !msg.is_request() {
            return;
        }

        let profile = match self.repo.profile() {
            Ok(profile) => profile,
            Err(e) => {
                debug!(node = %self.peer_id, error = %e, "no profile to share");
                return;
            }
        };

        let reply = match msg.response(&PeerProfile::of(&profile)) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(node = %self.peer_id, error = %e, "encoding profile response");
                return;
            }
        };
        if let Err(e) = sink.send(reply).await {
            debug!(node = %self.peer_id, error = %e, "sending profile response");
        }
    }

    /// Answer one inbound `list_datasets` exchange.
    ///
    /// Only request-phase envelopes are acted on. Any failure to produce a
    /// complete response aborts the exchange: no partial lists, no
    /// placeholder entries, no retry.
    pub async fn handle_datasets_list(&self, sink: &dyn ReplySink, msg: &Envelope) {
        if !msg.is_request() {
            return;
        }

        let mut params: DatasetsListParams = match msg.decode_body() {
            Ok(p) => p,
            Err(e) => {
                debug!(node = %self.peer_id, error = %e, "bad list_datasets body");
                return;
            }
        };
        if params.limit == 0 || params.limit > LIST_MAX {
            params.limit = LIST_MAX;
        }

        let mut refs = match self.repo.refs().references(params.limit, params.offset) {
            Ok(refs) => refs,
            Err(e) => {
                debug!(node = %self.peer_id, error = %e, "listing refs");
                return;
            }
        };
        // Cap defensively even if the store returned more.
        refs.truncate(params.limit);

        let Some(store) = self.repo.store() else {
            debug!(node = %self.peer_id, "no content store configured");
            return;
        };
        let legacy = msg.header(headers::LEGACY_RPC) == Some("true");

        for r in refs.iter_mut() {
            let Some(path) = r.path.clone() else {
                warn!(node = %self.peer_id, r#ref = %r, "ref has no path");
                return;
            };
            let mut ds = match store.get(&path) {
                Ok(ds) => ds,
                Err(e) => {
                    warn!(node = %self.peer_id, path = %path, error = %e, "loading dataset");
                    return;
                }
            };
            if legacy {
                if let Some(structure) = &mut ds.structure {
                    structure.clear_schema();
                }
            }
            r.dataset = Some(ds);
        }

        let reply = match msg.response(&refs) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(node = %self.peer_id, error = %e, "encoding list response");
                return;
            }
        };
        if let Err(e) = sink.send(reply).await {
            debug!(node = %self.peer_id, error = %e, "sending list response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use strata_repo::{ContentStore, MemRepo};
    use strata_types::{Dataset, Meta, Profile, ProfileId, Structure};

    /// Transport that counts sends and never delivers a reply.
    #[derive(Default)]
    struct CountingTransport {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl PeerTransport for CountingTransport {
        async fn send(
            &self,
            _to: &PeerId,
            _envelope: Envelope,
            _reply: oneshot::Sender<Envelope>,
        ) -> P2pResult<()> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Sink that forwards the response into the requester's reply channel.
    struct ChannelSink {
        tx: Mutex<Option<oneshot::Sender<Envelope>>>,
    }

    #[async_trait]
    impl ReplySink for ChannelSink {
        async fn send(&self, envelope: Envelope) -> P2pResult<()> {
            let tx = self
                .tx
                .lock()
                .map_err(|e| P2pError::Send(e.to_string()))?
                .take()
                .ok_or_else(|| P2pError::Send("reply already sent".into()))?;
            tx.send(envelope)
                .map_err(|_| P2pError::Send("reply channel dropped".into()))
        }
    }

    /// Sink that records what was sent, for server-side assertions.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Envelope>>,
    }

    impl RecordingSink {
        fn sent_count(&self) -> usize {
            self.sent.lock().map(|s| s.len()).unwrap_or(0)
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send(&self, envelope: Envelope) -> P2pResult<()> {
            self.sent
                .lock()
                .map_err(|e| P2pError::Send(e.to_string()))?
                .push(envelope);
            Ok(())
        }
    }

    /// Transport that routes every request straight into a remote node's
    /// handler, in-process.
    struct LoopbackTransport {
        remote: Arc<Node<MemRepo, CountingTransport>>,
    }

    #[async_trait]
    impl PeerTransport for LoopbackTransport {
        async fn send(
            &self,
            _to: &PeerId,
            envelope: Envelope,
            reply: oneshot::Sender<Envelope>,
        ) -> P2pResult<()> {
            let sink = ChannelSink {
                tx: Mutex::new(Some(reply)),
            };
            match envelope.mtype.as_str() {
                MT_PROFILE => self.remote.handle_profile(&sink, &envelope).await,
                _ => self.remote.handle_datasets_list(&sink, &envelope).await,
            }
            Ok(())
        }
    }

    fn dataset_with_schema(title: &str) -> Dataset {
        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("array".into()));
        Dataset {
            meta: Some(Meta {
                title: title.into(),
                ..Meta::default()
            }),
            structure: Some(Structure {
                format: "csv".into(),
                schema: Some(schema),
            }),
            ..Dataset::default()
        }
    }

    fn seed_refs(repo: &MemRepo, count: usize) {
        let store = repo.content_store().unwrap();
        for i in 0..count {
            let name = format!("ds-{i:03}");
            let ds = dataset_with_schema(&name);
            let path = store.put(&ds, name.as_bytes()).unwrap();
            let r = DatasetRef::new(ProfileId::from_raw([1u8; 32]), "remote", &name, path);
            repo.refs().put_ref(&r).unwrap();
        }
    }

    fn remote_node(refs: usize) -> Arc<Node<MemRepo, CountingTransport>> {
        let repo = MemRepo::new(Profile::generate("remote"));
        seed_refs(&repo, refs);
        Arc::new(Node::new(
            PeerId::new("remote"),
            Arc::new(repo),
            Arc::new(CountingTransport::default()),
        ))
    }

    fn local_node(
        remote: Arc<Node<MemRepo, CountingTransport>>,
    ) -> Node<MemRepo, LoopbackTransport> {
        let node = Node::new(
            PeerId::new("local"),
            Arc::new(MemRepo::new(Profile::generate("local"))),
            Arc::new(LoopbackTransport { remote }),
        );
        node.set_online(true);
        node
    }

    // ---- Requester side ----

    #[tokio::test]
    async fn self_request_never_touches_the_network() {
        let transport = Arc::new(CountingTransport::default());
        let repo = MemRepo::new(Profile::generate("me"));
        seed_refs(&repo, 3);
        let node = Node::new(PeerId::new("me"), Arc::new(repo), Arc::clone(&transport));
        // Deliberately offline: the local path comes before the check.

        let refs = node
            .request_datasets_list(
                &PeerId::new("me"),
                DatasetsListParams {
                    limit: 10,
                    ..DatasetsListParams::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(refs.len(), 3);
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_request_fails_without_sending() {
        let transport = Arc::new(CountingTransport::default());
        let node = Node::new(
            PeerId::new("me"),
            Arc::new(MemRepo::new(Profile::generate("me"))),
            Arc::clone(&transport),
        );

        let err = node
            .request_datasets_list(&PeerId::new("other"), DatasetsListParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, P2pError::NotConnected));
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    // ---- Full exchanges over loopback ----

    #[tokio::test]
    async fn list_attaches_inline_datasets() {
        let remote = remote_node(4);
        let local = local_node(remote);

        let refs = local
            .request_datasets_list(
                &PeerId::new("remote"),
                DatasetsListParams {
                    limit: 10,
                    ..DatasetsListParams::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(refs.len(), 4);
        for r in &refs {
            let ds = r.dataset.as_ref().expect("inline dataset attached");
            assert_eq!(ds.meta.as_ref().unwrap().title, r.name);
        }
    }

    #[tokio::test]
    async fn limit_above_max_is_clamped() {
        let remote = remote_node(40);
        let local = local_node(remote);

        let refs = local
            .request_datasets_list(
                &PeerId::new("remote"),
                DatasetsListParams {
                    limit: 100,
                    ..DatasetsListParams::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(refs.len(), LIST_MAX);
    }

    #[tokio::test]
    async fn zero_limit_behaves_as_max() {
        let remote = remote_node(40);
        let local = local_node(remote);

        let refs = local
            .request_datasets_list(&PeerId::new("remote"), DatasetsListParams::default())
            .await
            .unwrap();

        assert_eq!(refs.len(), LIST_MAX);
    }

    #[tokio::test]
    async fn legacy_rpc_clears_schemas() {
        let remote = remote_node(2);
        let local = local_node(remote);

        let refs = local
            .request_datasets_list(
                &PeerId::new("remote"),
                DatasetsListParams {
                    limit: 10,
                    legacy_rpc: true,
                    ..DatasetsListParams::default()
                },
            )
            .await
            .unwrap();

        for r in &refs {
            let structure = r.dataset.as_ref().unwrap().structure.as_ref().unwrap();
            assert_eq!(structure.schema, Some(Map::new()));
            // Everything but the schema survives.
            assert_eq!(structure.format, "csv");
        }
    }

    #[tokio::test]
    async fn load_failure_aborts_whole_response() {
        let remote = remote_node(2);
        // One ref pointing at content the store has never seen.
        remote
            .repo()
            .refs()
            .put_ref(&DatasetRef::new(
                ProfileId::from_raw([1u8; 32]),
                "remote",
                "broken",
                strata_types::ContentPath::new("/mem/missing/dataset.json"),
            ))
            .unwrap();
        let local = local_node(remote);

        let err = local
            .request_datasets_list(
                &PeerId::new("remote"),
                DatasetsListParams {
                    limit: 10,
                    ..DatasetsListParams::default()
                },
            )
            .await
            .unwrap_err();

        // No reply was ever sent: the exchange just ends.
        assert!(matches!(err, P2pError::ChannelClosed));
    }

    // ---- Profile exchange ----

    #[tokio::test]
    async fn profile_request_returns_remote_identity() {
        let remote = remote_node(0);
        let expected = remote.repo().profile().unwrap();
        let local = local_node(Arc::clone(&remote));

        let pro = local.request_profile(&PeerId::new("remote")).await.unwrap();

        assert_eq!(pro.peername, "remote");
        assert_eq!(pro.id, expected.id);
        assert_eq!(pro.pubkey, expected.public_key().to_hex());
    }

    #[tokio::test]
    async fn self_profile_request_never_touches_the_network() {
        let transport = Arc::new(CountingTransport::default());
        let node = Node::new(
            PeerId::new("me"),
            Arc::new(MemRepo::new(Profile::generate("me"))),
            Arc::clone(&transport),
        );
        // Deliberately offline: the local path comes before the check.

        let pro = node.request_profile(&PeerId::new("me")).await.unwrap();
        assert_eq!(pro.peername, "me");
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_profile_request_fails_without_sending() {
        let transport = Arc::new(CountingTransport::default());
        let node = Node::new(
            PeerId::new("me"),
            Arc::new(MemRepo::new(Profile::generate("me"))),
            Arc::clone(&transport),
        );

        let err = node.request_profile(&PeerId::new("other")).await.unwrap_err();
        assert!(matches!(err, P2pError::NotConnected));
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn profile_handler_without_profile_stays_silent() {
        let node = Node::new(
            PeerId::new("remote"),
            Arc::new(MemRepo::new(Profile::generate("remote")).without_profile()),
            Arc::new(CountingTransport::default()),
        );
        let sink = RecordingSink::default();

        let req = Envelope::request(MT_PROFILE, &()).unwrap();
        node.handle_profile(&sink, &req).await;

        assert_eq!(sink.sent_count(), 0);
    }

    #[tokio::test]
    async fn profile_handler_ignores_non_request_phase() {
        let remote = remote_node(0);
        let sink = RecordingSink::default();

        let req = Envelope::request(MT_PROFILE, &()).unwrap();
        let res = req
            .response(&PeerProfile::of(&remote.repo().profile().unwrap()))
            .unwrap();
        remote.handle_profile(&sink, &res).await;

        assert_eq!(sink.sent_count(), 0);
    }

    // ---- Server side ----

    #[tokio::test]
    async fn non_request_phase_is_ignored() {
        let remote = remote_node(2);
        let sink = RecordingSink::default();

        let req = Envelope::request(MT_DATASETS, &DatasetsListParams::default()).unwrap();
        let res = req.response(&Vec::<DatasetRef>::new()).unwrap();
        remote.handle_datasets_list(&sink, &res).await;

        assert_eq!(sink.sent_count(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_ignored() {
        let remote = remote_node(1);
        let sink = RecordingSink::default();

        let mut req = Envelope::request(MT_DATASETS, &()).unwrap();
        req.body = b"not json".to_vec();
        remote.handle_datasets_list(&sink, &req).await;

        assert_eq!(sink.sent_count(), 0);
    }

    #[tokio::test]
    async fn handler_replies_with_response_phase() {
        let remote = remote_node(1);
        let sink = RecordingSink::default();

        let req = Envelope::request(
            MT_DATASETS,
            &DatasetsListParams {
                limit: 10,
                ..DatasetsListParams::default()
            },
        )
        .unwrap();
        remote.handle_datasets_list(&sink, &req).await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].phase(), Some(headers::PHASE_RESPONSE));
        assert_eq!(sent[0].mtype, MT_DATASETS);
    }
}
