//! Batch loading against the shared asset cache
//!
//! [`LoaderManager::submit`] splits a batch into cached and uncached requests,
//! dispatches one backend load per uncached `(name, kind)` and resolves once
//! they have all landed. Loads run as tasks on a local executor, so they keep
//! going even when the batch future is dropped or has already failed.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use futures::{
    future::{self, LocalBoxFuture, Shared},
    stream::FuturesUnordered,
    task::{LocalSpawn, LocalSpawnExt},
    FutureExt, StreamExt,
};
use log::{debug, error, info, warn};

use super::{
    backend::AssetBackend,
    cache::{AssetCache, AssetEntry},
    error::{AssetError, LoadFailure},
    request::{AssetKey, AssetKind, AssetRequest},
};

type SharedLoad = Shared<LocalBoxFuture<'static, Result<(), AssetError>>>;

/// Completion state of a batch, reported once per finished load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
    /// `loaded / total`, exactly `1.0` on the last event
    pub fraction: f32,
}

pub struct LoaderManager {
    backend: Rc<dyn AssetBackend>,
    spawner: Rc<dyn LocalSpawn>,
    cache: Rc<RefCell<AssetCache>>,
    in_flight: Rc<RefCell<HashMap<AssetKey, SharedLoad>>>,
}

impl LoaderManager {
    pub fn new(backend: Rc<dyn AssetBackend>, spawner: impl LocalSpawn + 'static) -> Self {
        Self {
            backend,
            spawner: Rc::new(spawner),
            cache: Rc::new(RefCell::new(AssetCache::new())),
            in_flight: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Loads every request not already cached
    pub fn submit(&self, requests: &[AssetRequest]) -> LocalBoxFuture<'static, Result<(), AssetError>> {
        self.submit_with_progress(requests, |_| {})
    }

    /// Like [`submit`](Self::submit), calling `on_progress` after each completed load
    ///
    /// Dispatch happens here, before the returned future is polled. The future
    /// fails with the first error in completion order; loads still running at
    /// that point are not cancelled and will write into the cache when done.
    pub fn submit_with_progress<F>(
        &self,
        requests: &[AssetRequest],
        mut on_progress: F,
    ) -> LocalBoxFuture<'static, Result<(), AssetError>>
    where
        F: FnMut(LoadProgress) + 'static,
    {
        let mut seen = HashSet::new();
        let pending: Vec<SharedLoad> = requests
            .iter()
            .filter(|request| {
                if self.is_loaded(&request.name, request.kind) {
                    debug!("Cache hit for {} '{}'", request.kind, request.name);
                    return false;
                }
                seen.insert(request.key())
            })
            .map(|request| self.dispatch(request))
            .collect();

        if pending.is_empty() {
            return future::ready(Ok(())).boxed_local();
        }

        let total = pending.len();
        async move {
            let mut loads: FuturesUnordered<SharedLoad> = pending.into_iter().collect();
            let mut loaded = 0;
            while let Some(result) = loads.next().await {
                result?;
                loaded += 1;
                on_progress(LoadProgress {
                    loaded,
                    total,
                    fraction: loaded as f32 / total as f32,
                });
            }
            info!("Loaded batch of {} asset(s)", total);
            Ok(())
        }
        .boxed_local()
    }

    /// Starts the load for `request`, or joins the one already running
    fn dispatch(&self, request: &AssetRequest) -> SharedLoad {
        let key = request.key();
        if let Some(existing) = self.in_flight.borrow().get(&key) {
            debug!("Joining in-flight load of {}", request);
            return existing.clone();
        }

        debug!("Dispatching load of {}", request);
        self.cache.borrow_mut().entry_mut(&request.name);

        let load = self.backend.load(request.kind, &request.source);
        let cache = Rc::clone(&self.cache);
        let in_flight = Rc::clone(&self.in_flight);
        let request = request.clone();
        let shared = async move {
            let result = load.await;
            in_flight.borrow_mut().remove(&request.key());
            let result = result.and_then(|handle| {
                if handle.kind() == request.kind {
                    Ok(handle)
                } else {
                    Err(LoadFailure::decode(format!(
                        "backend returned a {} for a {} request",
                        handle.kind(),
                        request.kind
                    )))
                }
            });
            match result {
                Ok(handle) => {
                    cache.borrow_mut().insert(&request.name, handle);
                    debug!("Cached {}", request);
                    Ok(())
                }
                Err(failure) => {
                    let err = AssetError::new(request, failure);
                    error!("{}", err);
                    Err(err)
                }
            }
        }
        .boxed_local()
        .shared();

        self.in_flight.borrow_mut().insert(key, shared.clone());
        if let Err(e) = self.spawner.spawn_local(shared.clone().map(|_| ())) {
            // The batch future still drives the load when it is polled
            warn!("Could not spawn load task: {}", e);
        }
        shared
    }

    /// Snapshot of everything loaded under `name`; never triggers a load
    pub fn get(&self, name: &str) -> Option<AssetEntry> {
        self.cache.borrow().get(name).cloned()
    }

    pub fn is_loaded(&self, name: &str, kind: AssetKind) -> bool {
        self.cache.borrow().is_loaded(name, kind)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Number of backend loads that have been dispatched but not finished
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use futures::{channel::oneshot, executor::LocalPool};
    use rand::seq::SliceRandom;

    use super::*;
    use crate::{
        assets::{
            backend::LoadFuture,
            error::{AssetErrorKind, LoadFailure},
            handle::{AssetHandle, FontData, FontFormat, ImageData, TextureData},
        },
        gfx::scene::SceneGraph,
    };

    type Gate = oneshot::Sender<Result<AssetHandle, LoadFailure>>;

    /// Backend that records calls and completes gated sources on demand
    #[derive(Default)]
    struct ScriptedBackend {
        calls: RefCell<Vec<(AssetKind, String)>>,
        gates: RefCell<HashMap<String, oneshot::Receiver<Result<AssetHandle, LoadFailure>>>>,
    }

    impl ScriptedBackend {
        fn gate(&self, source: &str) -> Gate {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().insert(source.to_string(), rx);
            tx
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn scripted(&self, kind: AssetKind, source: &str) -> LoadFuture {
            self.calls.borrow_mut().push((kind, source.to_string()));
            match self.gates.borrow_mut().remove(source) {
                Some(rx) => async move {
                    rx.await
                        .unwrap_or_else(|_| Err(LoadFailure::transport("gate dropped")))
                }
                .boxed_local(),
                None => future::ready(Ok(handle_for(kind))).boxed_local(),
            }
        }
    }

    impl AssetBackend for ScriptedBackend {
        fn load_texture(&self, source: &str) -> LoadFuture {
            self.scripted(AssetKind::Texture, source)
        }
        fn load_model(&self, source: &str) -> LoadFuture {
            self.scripted(AssetKind::Model, source)
        }
        fn load_image(&self, source: &str) -> LoadFuture {
            self.scripted(AssetKind::Image, source)
        }
        fn load_font(&self, source: &str) -> LoadFuture {
            self.scripted(AssetKind::Font, source)
        }
        fn load_object(&self, source: &str) -> LoadFuture {
            self.scripted(AssetKind::Object, source)
        }
    }

    fn handle_for(kind: AssetKind) -> AssetHandle {
        let image = ImageData::solid([255, 255, 255, 255]);
        match kind {
            AssetKind::Texture => AssetHandle::Texture(Rc::new(TextureData {
                label: "test".into(),
                image,
                flip_y: true,
            })),
            AssetKind::Model => AssetHandle::Model(Rc::new(SceneGraph::new())),
            AssetKind::Image => AssetHandle::Image(Rc::new(image)),
            AssetKind::Font => AssetHandle::Font(Rc::new(FontData {
                format: FontFormat::TrueType,
                bytes: Vec::new(),
            })),
            AssetKind::Object => AssetHandle::Object(Rc::new(SceneGraph::new())),
        }
    }

    fn setup() -> (LocalPool, Rc<ScriptedBackend>, LoaderManager) {
        let pool = LocalPool::new();
        let backend = Rc::new(ScriptedBackend::default());
        let loader = LoaderManager::new(backend.clone(), pool.spawner());
        (pool, backend, loader)
    }

    /// Spawns a batch and returns the slot its result lands in
    fn spawn_batch(
        pool: &LocalPool,
        batch: LocalBoxFuture<'static, Result<(), AssetError>>,
    ) -> Rc<RefCell<Option<Result<(), AssetError>>>> {
        let outcome = Rc::new(RefCell::new(None));
        let slot = outcome.clone();
        pool.spawner()
            .spawn_local(async move {
                *slot.borrow_mut() = Some(batch.await);
            })
            .unwrap();
        outcome
    }

    #[test]
    fn cached_batch_makes_no_backend_calls() {
        let (mut pool, backend, loader) = setup();
        let requests = [
            AssetRequest::texture("water", "/textures/water.jpg"),
            AssetRequest::model("shoe", "/models/air_jordan_1.glb"),
        ];

        pool.run_until(loader.submit(&requests)).unwrap();
        assert_eq!(backend.call_count(), 2);

        let again = loader.submit(&requests);
        assert_eq!(again.now_or_never(), Some(Ok(())));
        assert_eq!(backend.call_count(), 2);
    }

    #[test]
    fn duplicate_requests_load_once() {
        let (mut pool, backend, loader) = setup();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();

        let batch = loader.submit_with_progress(
            &[
                AssetRequest::model("shoe", "/models/air_jordan_1.glb"),
                AssetRequest::model("shoe", "/models/air_jordan_1.glb"),
                AssetRequest::texture("shoe", "/textures/leather.jpg"),
            ],
            move |progress| sink.borrow_mut().push(progress),
        );
        pool.run_until(batch).unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(events.borrow().len(), 2);
        assert!(events.borrow().iter().all(|p| p.total == 2));
        assert!(loader.is_loaded("shoe", AssetKind::Model));
        assert!(loader.is_loaded("shoe", AssetKind::Texture));
        assert_eq!(loader.cache_len(), 1);
    }

    #[test]
    fn progress_is_monotonic_in_any_completion_order() {
        let (mut pool, backend, loader) = setup();
        let names = ["a", "b", "c", "d", "e"];
        let mut gates: Vec<(&str, Gate)> = names.iter().map(|n| (*n, backend.gate(n))).collect();
        let requests: Vec<_> = names.iter().map(|n| AssetRequest::image(*n, *n)).collect();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let batch = loader.submit_with_progress(&requests, move |p| sink.borrow_mut().push(p));
        let outcome = spawn_batch(&pool, batch);

        gates.shuffle(&mut rand::rng());
        for (name, gate) in gates {
            gate.send(Ok(handle_for(AssetKind::Image))).unwrap();
            pool.run_until_stalled();
            assert!(loader.is_loaded(name, AssetKind::Image));
        }

        let events = events.borrow();
        assert_eq!(events.len(), 5);
        for (i, pair) in events.windows(2).enumerate() {
            assert!(pair[1].fraction > pair[0].fraction, "event {i} did not increase");
        }
        assert_eq!(events.last().map(|p| p.fraction), Some(1.0));
        assert_eq!(events.last().map(|p| p.loaded), Some(5));
        assert!(matches!(*outcome.borrow(), Some(Ok(()))));
    }

    #[test]
    fn batch_fails_fast_and_siblings_still_land() {
        let (mut pool, backend, loader) = setup();
        let first = backend.gate("/one.png");
        let second = backend.gate("/two.png");
        let third = backend.gate("/three.png");

        let batch = loader.submit(&[
            AssetRequest::texture("one", "/one.png"),
            AssetRequest::texture("two", "/two.png"),
            AssetRequest::texture("three", "/three.png"),
        ]);
        let outcome = spawn_batch(&pool, batch);
        pool.run_until_stalled();

        second
            .send(Err(LoadFailure::not_found("no /two.png")))
            .unwrap();
        pool.run_until_stalled();

        match &*outcome.borrow() {
            Some(Err(err)) => {
                assert_eq!(err.request.name, "two");
                assert_eq!(err.request.kind, AssetKind::Texture);
                assert_eq!(err.kind, AssetErrorKind::ResourceNotFound);
            }
            other => panic!("expected the batch to fail, got {other:?}"),
        }
        assert!(!loader.is_loaded("one", AssetKind::Texture));

        first.send(Ok(handle_for(AssetKind::Texture))).unwrap();
        third.send(Ok(handle_for(AssetKind::Texture))).unwrap();
        pool.run_until_stalled();

        assert!(loader.is_loaded("one", AssetKind::Texture));
        assert!(loader.is_loaded("three", AssetKind::Texture));
        assert!(!loader.is_loaded("two", AssetKind::Texture));
        assert_eq!(loader.in_flight_count(), 0);
    }

    #[test]
    fn overlapping_batches_share_one_load() {
        let (mut pool, backend, loader) = setup();
        let gate = backend.gate("/models/air_jordan_1.glb");
        let shoe = [AssetRequest::model("shoe", "/models/air_jordan_1.glb")];

        let first = spawn_batch(&pool, loader.submit(&shoe));
        let second = spawn_batch(&pool, loader.submit(&shoe));
        pool.run_until_stalled();

        assert_eq!(backend.call_count(), 1);
        assert_eq!(loader.in_flight_count(), 1);

        gate.send(Ok(handle_for(AssetKind::Model))).unwrap();
        pool.run_until_stalled();

        assert!(matches!(*first.borrow(), Some(Ok(()))));
        assert!(matches!(*second.borrow(), Some(Ok(()))));
        assert_eq!(loader.in_flight_count(), 0);
    }

    #[test]
    fn entry_exists_while_loading() {
        let (mut pool, backend, loader) = setup();
        let gate = backend.gate("/textures/water.jpg");

        assert!(loader.get("water").is_none());
        let _batch = loader.submit(&[AssetRequest::texture("water", "/textures/water.jpg")]);

        let pending = loader.get("water").unwrap();
        assert!(pending.is_empty());

        gate.send(Ok(handle_for(AssetKind::Texture))).unwrap();
        pool.run_until_stalled();
        assert!(loader.get("water").and_then(|e| e.texture()).is_some());
    }

    #[test]
    fn dispatch_does_not_wait_for_poll() {
        let (mut pool, backend, loader) = setup();

        drop(loader.submit(&[AssetRequest::font("title", "/fonts/title.ttf")]));
        assert_eq!(backend.call_count(), 1);

        pool.run_until_stalled();
        assert!(loader.is_loaded("title", AssetKind::Font));
    }

    #[test]
    fn failed_load_is_retried_by_next_batch() {
        let (mut pool, backend, loader) = setup();
        let gate = backend.gate("/objects/sole.obj");
        let sole = [AssetRequest::object("sole", "/objects/sole.obj")];

        let failed = spawn_batch(&pool, loader.submit(&sole));
        gate.send(Err(LoadFailure::decode("bad face"))).unwrap();
        pool.run_until_stalled();
        assert!(matches!(*failed.borrow(), Some(Err(_))));

        pool.run_until(loader.submit(&sole)).unwrap();
        assert_eq!(backend.call_count(), 2);
        assert!(loader.is_loaded("sole", AssetKind::Object));
    }

    #[test]
    fn handle_of_the_wrong_kind_rejects_the_batch() {
        let (mut pool, backend, loader) = setup();
        let gate = backend.gate("/objects/sole.obj");
        let sole = [AssetRequest::object("sole", "/objects/sole.obj")];

        let outcome = spawn_batch(&pool, loader.submit(&sole));
        gate.send(Ok(handle_for(AssetKind::Model))).unwrap();
        pool.run_until_stalled();

        match &*outcome.borrow() {
            Some(Err(err)) => {
                assert_eq!(err.request.kind, AssetKind::Object);
                assert_eq!(err.kind, AssetErrorKind::DecodeFailure);
            }
            other => panic!("expected the batch to fail, got {other:?}"),
        }
        assert!(!loader.is_loaded("sole", AssetKind::Model));
        assert!(!loader.is_loaded("sole", AssetKind::Object));

        pool.run_until(loader.submit(&sole)).unwrap();
        assert_eq!(backend.call_count(), 2);
        assert!(loader.is_loaded("sole", AssetKind::Object));

        let again = loader.submit(&sole);
        assert_eq!(again.now_or_never(), Some(Ok(())));
        assert_eq!(backend.call_count(), 2);
    }
}
