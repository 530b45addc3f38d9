use parity_traits::Position;

/// Cooperative progress / cancellation callback (spec §5 "Cancellation &
/// timeouts"). `on_position` is polled once per actionable position,
/// between positions, never mid-position; returning `true` requests a
/// stop, which takes effect before the next position starts.
pub trait ProgressSink {
    fn begin(&mut self, _blockstart: Position, _blockmax: Position, _actionable_total: u64) {}

    fn on_position(&mut self, _position: Position, _done: u64, _total: u64) -> bool {
        false
    }

    fn autosave_begin(&mut self) {}

    fn autosave_end(&mut self) {}

    fn end(&mut self, _done: u64, _total: u64) {}
}

/// A progress sink that never reports a stop request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {}
