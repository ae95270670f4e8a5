//! Integration tests exercising the full stream in software.
//!
//! Transmit and receive share one ring buffer, so every half the playback
//! ISR writes is read straight back by the capture ISR:
//!
//! ```text
//! TestGraph → AudioStream.update() → tx_isr() → [ring]
//!     → rx_isr() → AudioStream.update() → TestGraph
//! ```

#[cfg(test)]
mod tests {
    use crate::block::BlockPool;
    use crate::config::StreamConfig;
    use crate::constants::AUDIO_BLOCK_SAMPLES;
    use crate::control::AudioControl;
    use crate::dsp::CalibrationState;
    use crate::graph::Channel;
    use crate::hal::NoCacheMaintenance;
    use crate::io::{DmaHalf, RingBuffer};
    use crate::stream::AudioContext;
    use crate::test_utils::{exhaust, filled, ramp, FakeDma, TestGraph};

    /// One hardware period: both halves go out and come back in. Returns
    /// how many times the period trigger fired.
    fn run_period(ctx: &AudioContext<'_>, ring: &mut RingBuffer) -> u32 {
        let mut cache = NoCacheMaintenance;
        let mut periods = 0;
        for active in [DmaHalf::Second, DmaHalf::First] {
            let mut dma = FakeDma::in_half(ring, active);
            ctx.tx_isr(&mut dma, ring, &mut cache, &mut || periods += 1);
            ctx.rx_isr(&mut dma, ring, &mut cache, &mut || {});
        }
        periods
    }

    // ---------------------------------------------------------------
    // Full loopback: stereo data round-trip
    // ---------------------------------------------------------------
    #[test]
    fn full_loopback_stereo() {
        let pool = BlockPool::new();
        let ctx = AudioContext::new(&pool, StreamConfig::default()).unwrap();
        let mut stream = ctx.stream().unwrap();
        let mut ring = RingBuffer::new();
        let mut graph = TestGraph::new();

        graph.offer(Channel::Left, ramp(&pool, 0, 1));
        graph.offer(Channel::Right, ramp(&pool, 1000, -1));

        stream.update(&mut graph);
        assert_eq!(run_period(&ctx, &mut ring), 1);
        stream.update(&mut graph);

        assert_eq!(graph.captured, 1);
        for i in 0..AUDIO_BLOCK_SAMPLES {
            assert_eq!(graph.last_left[i], i as i16, "left mismatch at {i}");
            assert_eq!(
                graph.last_right[i],
                1000 - i as i16,
                "right mismatch at {i}"
            );
        }
    }

    // ---------------------------------------------------------------
    // Continuous streaming: ordering and steady-state pool usage
    // ---------------------------------------------------------------
    #[test]
    fn multi_block_streaming() {
        let pool = BlockPool::new();
        let ctx = AudioContext::new(&pool, StreamConfig::default()).unwrap();
        let mut stream = ctx.stream().unwrap();
        let mut ring = RingBuffer::new();
        let mut graph = TestGraph::new();

        for n in 1..=8i16 {
            graph.offer(Channel::Left, filled(&pool, n));
            graph.offer(Channel::Right, filled(&pool, -n));
            stream.update(&mut graph);

            if n > 1 {
                assert!(graph.last_left.iter().all(|&s| s == n - 1), "period {n}");
                assert!(graph.last_right.iter().all(|&s| s == 1 - n), "period {n}");
            }

            run_period(&ctx, &mut ring);
            // Only the capture cursor pair survives a period.
            assert_eq!(pool.allocated_count(), 2);
        }

        let stats = stream.stats();
        assert_eq!(stats.capture.periods, 7);
        assert_eq!(stats.capture.starved_halves, 0);
        assert_eq!(stats.playback.overruns, 0);
        assert_eq!(stats.playback.silent_halves, 0);
    }

    // ---------------------------------------------------------------
    // Mono output: no crosstalk into the silent channel
    // ---------------------------------------------------------------
    #[test]
    fn left_only_no_crosstalk() {
        let pool = BlockPool::new();
        let ctx = AudioContext::new(&pool, StreamConfig::default()).unwrap();
        let mut stream = ctx.stream().unwrap();
        let mut ring = RingBuffer::new();
        let mut graph = TestGraph::new();

        graph.offer(Channel::Left, ramp(&pool, -64, 1));
        stream.update(&mut graph);
        run_period(&ctx, &mut ring);
        stream.update(&mut graph);

        assert_eq!(graph.last_left[0], -64);
        assert_eq!(graph.last_left[AUDIO_BLOCK_SAMPLES - 1], 63);
        assert!(graph.last_right.iter().all(|&s| s == 0));
    }

    // ---------------------------------------------------------------
    // Underrun: empty queues keep the link silent
    // ---------------------------------------------------------------
    #[test]
    fn empty_pipeline_silence() {
        let pool = BlockPool::new();
        let ctx = AudioContext::new(&pool, StreamConfig::default()).unwrap();
        let mut stream = ctx.stream().unwrap();
        let mut ring = RingBuffer::new();
        ring.frames_mut().fill(0x1234_5678);
        let mut graph = TestGraph::new();

        stream.update(&mut graph);
        run_period(&ctx, &mut ring);
        stream.update(&mut graph);

        assert!(ring.frames().iter().all(|&f| f == 0));
        assert_eq!(graph.captured, 1);
        assert!(graph.last_left.iter().all(|&s| s == 0));
        assert!(graph.last_right.iter().all(|&s| s == 0));
        assert_eq!(stream.stats().playback.silent_halves, 2);
    }

    // ---------------------------------------------------------------
    // DC offset: a biased signal comes back centred
    // ---------------------------------------------------------------
    #[test]
    fn dc_offset_removed_through_pipeline() {
        let pool = BlockPool::new();
        // 2 × 320 / 128 = 5 periods of calibration
        let config = StreamConfig::new().with_sample_rate(320.0);
        let ctx = AudioContext::new(&pool, config).unwrap();
        let mut stream = ctx.stream().unwrap();
        let mut ring = RingBuffer::new();
        let mut graph = TestGraph::new();

        for _ in 0..10 {
            graph.offer(Channel::Left, filled(&pool, 1000));
            graph.offer(Channel::Right, filled(&pool, -250));
            stream.update(&mut graph);
            run_period(&ctx, &mut ring);
        }
        stream.update(&mut graph);

        assert_eq!(graph.captured, 10);
        assert_eq!(stream.input().calibrator().offsets(), Some((1000, -250)));
        assert!(graph.last_left.iter().all(|&s| s.abs() <= 1));
        assert!(graph.last_right.iter().all(|&s| s.abs() <= 1));
    }

    // ---------------------------------------------------------------
    // Pool accounting: disable/enable cycles leak nothing
    // ---------------------------------------------------------------
    #[test]
    fn enable_disable_round_trip_no_leak() {
        let pool = BlockPool::new();
        let config = StreamConfig::new().with_sample_rate(320.0);
        let ctx = AudioContext::new(&pool, config).unwrap();
        let mut stream = ctx.stream().unwrap();
        let mut ring = RingBuffer::new();
        let mut graph = TestGraph::new();

        for _ in 0..7 {
            graph.offer(Channel::Left, filled(&pool, 40));
            stream.update(&mut graph);
            run_period(&ctx, &mut ring);
        }
        stream.update(&mut graph);
        assert!(stream.input().calibrator().is_converged());
        let steady = pool.allocated_count();

        for _ in 0..3 {
            graph.offer(Channel::Left, filled(&pool, 40));
            graph.offer(Channel::Right, filled(&pool, 40));
            stream.update(&mut graph);
            stream.disable();
            assert_eq!(pool.allocated_count(), 0);

            // Disabled: the ring carries silence and the cursor stays empty.
            ring.frames_mut().fill(u32::MAX);
            run_period(&ctx, &mut ring);
            assert!(ring.frames().iter().all(|&f| f == 0));
            ctx.capture().with_cursor(|c| {
                assert!(!c.has_blocks());
                assert_eq!(c.offset(), 0);
            });
            for channel in Channel::ALL {
                ctx.playback().with_queue(channel, |q| assert!(q.is_empty()));
            }

            stream.enable();
            let state = *stream.input().calibrator().state();
            assert_eq!(state, CalibrationState::INITIAL);
            stream.update(&mut graph);
            run_period(&ctx, &mut ring);
            assert_eq!(pool.allocated_count(), steady);
        }

        let stats = stream.stats().pool;
        assert_eq!(stats.allocations - stats.releases, steady);
    }

    // ---------------------------------------------------------------
    // Exhaustion: no allocate/release churn and recovery afterwards
    // ---------------------------------------------------------------
    #[test]
    fn allocation_failure_skips_periods() {
        let pool = BlockPool::new();
        let ctx = AudioContext::new(&pool, StreamConfig::default()).unwrap();
        let mut stream = ctx.stream().unwrap();
        let mut ring = RingBuffer::new();
        let mut graph = TestGraph::new();

        let held = exhaust(&pool, 0);
        for _ in 0..4 {
            stream.update(&mut graph);
            run_period(&ctx, &mut ring);
        }

        let stats = stream.stats();
        assert_eq!(graph.captured, 0);
        assert_eq!(stats.capture.alloc_failures, 4);
        assert_eq!(stats.capture.starved_halves, 8);
        assert_eq!(stats.pool.releases, 0);

        drop(held);
        stream.update(&mut graph);
        run_period(&ctx, &mut ring);
        stream.update(&mut graph);
        assert_eq!(graph.captured, 1);
    }
}
