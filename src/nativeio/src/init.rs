//! The process-wide bridge the C entry points talk to.
use crate::config::{ConfigError, NativeIoConfig};
use crate::error::NativeIoError;
use crate::fs_calls::NativeIo;
use crate::storage::Storage;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::sync::Arc;

lazy_static! {
    // Held only long enough to clone the Arc, never across a suspension.
    static ref NATIVEIO: RwLock<Option<Arc<NativeIo>>> = RwLock::new(None);
}

/// Installs a bridge over the backend `config` describes.
///
/// The C entry points fail until this (or [`nativeio_start_with`]) has run.
pub fn nativeio_start(config: &NativeIoConfig) -> Result<(), NativeIoError> {
    config.validate()?;
    let storage = config.build_storage()?;
    nativeio_start_with(storage, config)?;
    Ok(())
}

/// Installs a bridge over `storage`.  `config.backend` is ignored.
///
/// A bridge that was already installed is shut down first.  A config whose
/// reserved range is rejected leaves any running bridge in place.
pub fn nativeio_start_with(
    storage: Arc<dyn Storage>,
    config: &NativeIoConfig,
) -> Result<(), ConfigError> {
    config.validate()?;
    let nativeio = Arc::new(NativeIo::with_reserved_range(
        storage,
        config.last_reserved_fd,
    ));
    let previous = NATIVEIO.write().replace(nativeio);
    if let Some(previous) = previous {
        let closed = previous.shutdown();
        log::info!("nativeio: replaced running instance, closed {} fds", closed);
    }
    log::info!(
        "nativeio: started, descriptors begin at {}",
        config.last_reserved_fd.saturating_add(1)
    );
    Ok(())
}

/// Closes every open descriptor and uninstalls the bridge.  Returns how many
/// descriptors were still open.
pub fn nativeio_shutdown() -> usize {
    let current = NATIVEIO.write().take();
    match current {
        Some(nativeio) => {
            let closed = nativeio.shutdown();
            log::info!("nativeio: shut down, closed {} fds", closed);
            closed
        }
        None => 0,
    }
}

/// Runs `f` against the installed bridge, or logs and returns `None` when
/// there isn't one.
pub fn with_nativeio<R>(op: &'static str, f: impl FnOnce(&NativeIo) -> R) -> Option<R> {
    let current = NATIVEIO.read().clone();
    match current {
        Some(nativeio) => Some(f(&nativeio)),
        None => {
            log::error!("{}: {}", op, NativeIoError::NotStarted);
            None
        }
    }
}
