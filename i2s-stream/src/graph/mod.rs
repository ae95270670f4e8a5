//! Boundary with the downstream audio graph scheduler.
//!
//! The scheduler decides when a period runs and how blocks are routed. This
//! crate only needs three things from it:
//!
//! | Direction | Entry point | Called from |
//! |-----------|-------------|-------------|
//! | ISR → scheduler | [`PeriodTrigger::advance_period`] | designated DMA ISR |
//! | crate → graph | [`AudioGraph::capture_did_arrive`] | foreground input exchange |
//! | graph → crate | [`AudioGraph::playback_wants_data`] | foreground output exchange |

use crate::block::AudioBlock;

/// One channel of a stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    /// Both channels, left first.
    pub const ALL: [Channel; 2] = [Channel::Left, Channel::Right];

    /// Port index: 0 = left, 1 = right.
    pub const fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }
}

/// Consumer/producer side of the audio graph.
///
/// Blocks cross this boundary by value. A block handed to
/// [`capture_did_arrive`](Self::capture_did_arrive) belongs to the graph,
/// which releases it by dropping it.
pub trait AudioGraph<'p> {
    /// A completed, DC-corrected input pair for this period.
    fn capture_did_arrive(&mut self, left: AudioBlock<'p>, right: AudioBlock<'p>);

    /// Next block to queue for output on `channel`, if the graph has one.
    fn playback_wants_data(&mut self, channel: Channel) -> Option<AudioBlock<'p>>;
}

/// The scheduler's "run one period" entry point.
///
/// Invoked synchronously from interrupt context; implementations must be
/// bounded, typically by pending a lower-priority software interrupt.
pub trait PeriodTrigger {
    fn advance_period(&mut self);
}

impl<F: FnMut()> PeriodTrigger for F {
    fn advance_period(&mut self) {
        self()
    }
}
