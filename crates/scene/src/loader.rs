use crate::error::SceneError;
use crimescene_assets::{RoomAsset, import_room};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

/// Imports a room model on its own thread; the result is collected with
/// [`RoomLoader::poll`].
pub struct RoomLoader {
    source: PathBuf,
    rx: Receiver<Result<RoomAsset, SceneError>>,
    thread: Option<JoinHandle<()>>,
}

impl RoomLoader {
    pub fn spawn(source: impl AsRef<Path>) -> Result<Self, SceneError> {
        let source = source.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel();
        let path = source.clone();
        let thread = thread::Builder::new()
            .name("room-loader".to_string())
            .spawn(move || {
                let result = import_room(&path).map_err(SceneError::from);
                // Receiver may be gone if the scene was dropped mid-load.
                let _ = tx.send(result);
            })?;
        tracing::info!(source = %source.display(), "room import started");
        Ok(Self {
            source,
            rx,
            thread: Some(thread),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// `None` while the import is still running.
    pub fn poll(&mut self) -> Option<Result<RoomAsset, SceneError>> {
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(SceneError::LoaderDisconnected),
        };
        self.join();
        Some(result)
    }

    /// Block until the import finishes.
    pub fn wait(mut self) -> Result<RoomAsset, SceneError> {
        let result = self
            .rx
            .recv()
            .unwrap_or(Err(SceneError::LoaderDisconnected));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!(source = %self.source.display(), "room loader panicked");
            }
        }
    }
}

impl Drop for RoomLoader {
    fn drop(&mut self) {
        self.join();
    }
}
