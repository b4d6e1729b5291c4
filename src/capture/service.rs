use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

use super::cells::CellRasterizerFactory;
use super::{CaptureError, Rasterizer, RasterizerFactory};

static GLOBAL: Lazy<RasterizerService> =
    Lazy::new(|| RasterizerService::new(Box::new(CellRasterizerFactory)));

/// Lifecycle of the shared rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

enum Slot {
    Unloaded,
    Loading,
    Ready(Arc<dyn Rasterizer>),
    Failed(String),
}

/// Process-wide owner of the rasterizer backend. The backend is loaded
/// lazily on first acquire; concurrent callers block until that load settles
/// instead of racing duplicate loads. A failed load is not terminal: the
/// next acquire drives a fresh attempt.
pub struct RasterizerService {
    slot: Mutex<Slot>,
    settled: Condvar,
    factory: Mutex<Box<dyn RasterizerFactory>>,
}

impl RasterizerService {
    pub fn new(factory: Box<dyn RasterizerFactory>) -> Self {
        Self {
            slot: Mutex::new(Slot::Unloaded),
            settled: Condvar::new(),
            factory: Mutex::new(factory),
        }
    }

    pub fn global() -> &'static RasterizerService {
        &GLOBAL
    }

    pub fn state(&self) -> ServiceState {
        match &*self.slot.lock() {
            Slot::Unloaded => ServiceState::Unloaded,
            Slot::Loading => ServiceState::Loading,
            Slot::Ready(_) => ServiceState::Ready,
            Slot::Failed(message) => ServiceState::Failed(message.clone()),
        }
    }

    /// Returns the loaded rasterizer, loading it first if needed. Attempts
    /// at most one load per call, so a persistently broken backend reports
    /// its error instead of spinning.
    pub fn acquire(&self) -> Result<Arc<dyn Rasterizer>, CaptureError> {
        let mut attempted = false;
        let mut slot = self.slot.lock();
        loop {
            match &*slot {
                Slot::Ready(rasterizer) => return Ok(Arc::clone(rasterizer)),
                Slot::Failed(message) if attempted => {
                    return Err(CaptureError::LibraryLoad(message.clone()));
                }
                Slot::Loading => self.settled.wait(&mut slot),
                Slot::Unloaded | Slot::Failed(_) => {
                    attempted = true;
                    *slot = Slot::Loading;
                    drop(slot);

                    tracing::debug!("loading rasterizer backend");
                    let loaded = self.factory.lock().load();

                    slot = self.slot.lock();
                    *slot = match &loaded {
                        Ok(rasterizer) => Slot::Ready(Arc::clone(rasterizer)),
                        Err(err) => {
                            tracing::warn!(%err, "rasterizer backend failed to load");
                            Slot::Failed(err.to_string())
                        }
                    };
                    self.settled.notify_all();
                }
            }
        }
    }

    /// Replaces the factory and drops any loaded backend. The next acquire
    /// loads through the new factory.
    pub fn swap_factory(&self, factory: Box<dyn RasterizerFactory>) {
        *self.factory.lock() = factory;
        *self.slot.lock() = Slot::Unloaded;
        self.settled.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct NullRasterizer;

    impl Rasterizer for NullRasterizer {
        fn rasterize(
            &self,
            _: &super::super::CardSurface,
            _: super::super::RasterOptions,
        ) -> Result<Vec<u8>, CaptureError> {
            Ok(Vec::new())
        }
    }

    struct OkFactory;

    impl RasterizerFactory for OkFactory {
        fn load(&self) -> Result<Arc<dyn Rasterizer>, CaptureError> {
            Ok(Arc::new(NullRasterizer))
        }
    }

    struct BrokenFactory;

    impl RasterizerFactory for BrokenFactory {
        fn load(&self) -> Result<Arc<dyn Rasterizer>, CaptureError> {
            Err(CaptureError::LibraryLoad("no backend".to_string()))
        }
    }

    #[test]
    fn acquire_loads_once_and_caches_the_backend() {
        let service = RasterizerService::new(Box::new(OkFactory));
        assert_matches!(service.state(), ServiceState::Unloaded);
        let first = service.acquire().expect("load");
        assert_matches!(service.state(), ServiceState::Ready);
        let second = service.acquire().expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_load_is_reported_and_recorded() {
        let service = RasterizerService::new(Box::new(BrokenFactory));
        let Err(err) = service.acquire() else {
            panic!("load must fail");
        };
        assert_matches!(err, CaptureError::LibraryLoad(message) if message.contains("no backend"));
        assert_matches!(service.state(), ServiceState::Failed(_));
    }

    #[test]
    fn failure_is_retried_on_the_next_acquire() {
        let service = RasterizerService::new(Box::new(BrokenFactory));
        assert!(service.acquire().is_err());
        // A working factory swapped in after the failure recovers the
        // service without a restart.
        service.swap_factory(Box::new(OkFactory));
        assert!(service.acquire().is_ok());
        assert_matches!(service.state(), ServiceState::Ready);
    }
}
