//! Model loading.
//!
//! Loading is fire-and-forget:
//! [`SceneInstance::create`](crate::scene::SceneInstance::create) kicks the
//! load off and keeps only the receiving end of a oneshot channel. However
//! an implementation gets its bytes (HTTP fetch, embedded asset, test
//! fixture), it resolves the [`LoadSender`] with a decoded [`ModelAsset`]
//! and the engine applies the result at its next cooperative poll point.

use anyhow::Result;
use futures::channel::oneshot;

use crate::backend::SceneModel;

/// A decoded model, not yet normalized or attached to a scene.
pub struct ModelAsset {
    /// Root node of the decoded model.
    pub root: Box<dyn SceneModel>,
    /// Animation clips baked into the file.
    pub clip_count: usize,
}

/// Receiving end of one load, kept by the scene.
pub type LoadReceiver = oneshot::Receiver<Result<ModelAsset>>;

/// Resolving end of one load, held by the loader implementation.
pub type LoadSender = oneshot::Sender<Result<ModelAsset>>;

/// Starts model loads.
pub trait ModelLoader {
    /// Begin fetching and decoding `url`. Must not block; the returned
    /// channel resolves once the asset is ready or the load has failed.
    fn begin_load(&mut self, url: &str) -> LoadReceiver;
}
