/// Runtime start/stop for a streaming direction.
///
/// Implemented by [`AudioInputI2S`](crate::io::AudioInputI2S),
/// [`AudioOutputI2S`](crate::io::AudioOutputI2S) and
/// [`AudioStream`](crate::stream::AudioStream). The ring and its DMA keep
/// running while disabled; only the block exchange stops.
pub trait AudioControl {
    /// Resume the block exchange. Capture restarts DC calibration.
    fn enable(&mut self);

    /// Stop the block exchange and release every block held for the ring.
    fn disable(&mut self);

    fn is_enabled(&self) -> bool;
}
