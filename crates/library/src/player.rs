/// Starts playback of whatever book is current
pub trait PlayerController: Send + Sync {
    fn play(&self);
}
