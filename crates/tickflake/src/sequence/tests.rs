use core::time::Duration;
use std::{
    collections::HashSet,
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, scope},
};

use crate::{
    AtomicGatedSequence, Draw, Error, GatedSequence, Layout, LockGatedSequence, MonotonicClock,
    PeriodGate, SequenceStatus, TimeSource, TimestampSource,
};

/// A clock that only moves when told to.
struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    fn at(millis: u64) -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicU64::new(millis),
        })
    }

    fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::Relaxed)
    }
}

/// A clock that ticks once every `reads_per_tick` reads, so periods roll
/// over quickly under load.
struct CountingClock {
    reads: AtomicU64,
    reads_per_tick: u64,
}

impl TimeSource for CountingClock {
    fn current_millis(&self) -> u64 {
        self.reads.fetch_add(1, Ordering::Relaxed) / self.reads_per_tick
    }
}

trait SequenceStatusExt {
    fn unwrap_ready(self) -> Draw;
    fn unwrap_pending(self) -> u64;
}

impl SequenceStatusExt for SequenceStatus {
    fn unwrap_ready(self) -> Draw {
        match self {
            Self::Ready(draw) => draw,
            Self::Pending { yield_until } => {
                panic!("unexpected pending (yield until: {yield_until})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready(draw) => panic!("unexpected ready ({draw:?})"),
            Self::Pending { yield_until } => yield_until,
        }
    }
}

fn build<S, C>(clock: C, layout: Layout, shift: u32, bound: u64) -> S
where
    S: GatedSequence<Clock = C>,
    C: TimeSource,
{
    let gate = PeriodGate::new(&layout, shift, bound).unwrap();
    S::new(TimestampSource::for_layout(clock, &layout), gate)
}

fn poll<S>(sequence: &S) -> SequenceStatus
where
    S: GatedSequence,
{
    sequence.try_poll().unwrap()
}

fn draw(timestamp: u64, sequence: u64) -> Draw {
    Draw {
        timestamp,
        sequence,
    }
}

fn run_sequence_increments_within_period<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
{
    let sequence: S = build(ManualClock::at(42), Layout::TWITTER, 0, 4096);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(42, 0));
    assert_eq!(poll(&sequence).unwrap_ready(), draw(42, 1));
    assert_eq!(poll(&sequence).unwrap_ready(), draw(42, 2));
}

fn run_pending_when_exhausted<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
{
    let sequence: S = build(ManualClock::at(42), Layout::TWITTER, 0, 4);
    for expected in 0..4 {
        assert_eq!(poll(&sequence).unwrap_ready(), draw(42, expected));
    }
    assert_eq!(poll(&sequence).unwrap_pending(), 43);
    assert_eq!(poll(&sequence).unwrap_pending(), 43);
}

fn run_resumes_at_zero_in_next_period<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
{
    let clock = ManualClock::at(42);
    let sequence: S = build(Arc::clone(&clock), Layout::TWITTER, 0, 4);

    for expected in 0..4 {
        assert_eq!(poll(&sequence).unwrap_ready(), draw(42, expected));
    }
    assert_eq!(poll(&sequence).unwrap_pending(), 43);

    clock.set(43);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(43, 0));
    assert_eq!(poll(&sequence).unwrap_ready(), draw(43, 1));
}

fn run_coarse_periods_span_several_timestamps<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
{
    // shift 2: timestamps 4..=7 share period 1, 8..=11 are period 2.
    let clock = ManualClock::at(4);
    let sequence: S = build(Arc::clone(&clock), Layout::TWITTER, 2, 3);

    assert_eq!(poll(&sequence).unwrap_ready(), draw(4, 0));
    clock.set(5);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(5, 1));
    clock.set(7);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(7, 2));
    assert_eq!(poll(&sequence).unwrap_pending(), 8);

    clock.set(8);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(8, 0));
    clock.set(11);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(11, 1));
    assert_eq!(poll(&sequence).unwrap_ready(), draw(11, 2));
    assert_eq!(poll(&sequence).unwrap_pending(), 12);
}

fn run_waits_while_clock_is_behind<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
{
    let clock = ManualClock::at(100);
    let sequence: S = build(Arc::clone(&clock), Layout::TWITTER, 0, 16);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(100, 0));

    clock.set(90);
    assert_eq!(poll(&sequence).unwrap_pending(), 100);

    clock.set(100);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(100, 1));
}

fn run_wrapped_timestamp_starts_fresh_period<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
{
    let layout = Layout::new(8, 4, 4).unwrap();
    let clock = ManualClock::at(255);
    let sequence: S = build(Arc::clone(&clock), layout, 0, 16);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(255, 0));
    assert_eq!(poll(&sequence).unwrap_ready(), draw(255, 1));

    // 256 wraps to 0 in an 8-bit timestamp.
    clock.set(256);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(0, 0));
}

fn run_large_forward_jump_advances<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
    S::Err: Into<Error>,
{
    let layout = Layout::new(32, 10, 12).unwrap();
    let clock = ManualClock::at(0);
    let sequence: S = build(Arc::clone(&clock), layout, 0, 4096);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(0, 0));

    // Just past half of the 32-bit circle, without wrapping.
    let ahead = (1 << 31) + 1;
    clock.set(ahead);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(ahead, 0));
    assert_eq!(
        sequence
            .try_next_timeout(Duration::from_millis(50))
            .unwrap(),
        draw(ahead, 1)
    );

    clock.set(u64::from(u32::MAX));
    assert_eq!(poll(&sequence).unwrap_ready(), draw(u64::from(u32::MAX), 0));
}

fn run_half_circle_regression_waits<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
{
    let layout = Layout::new(8, 4, 4).unwrap();
    let clock = ManualClock::at(0);
    let sequence: S = build(Arc::clone(&clock), layout, 0, 16);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(0, 0));

    clock.set(128);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(128, 0));

    // Exactly half the circle back is a regression, not a wrap.
    clock.set(0);
    assert_eq!(poll(&sequence).unwrap_pending(), 128);

    clock.set(128);
    assert_eq!(poll(&sequence).unwrap_ready(), draw(128, 1));
}

fn run_blocking_next_waits_for_clock<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>> + Sync,
    S::Err: fmt::Debug,
{
    let clock = ManualClock::at(10);
    let sequence: S = build(Arc::clone(&clock), Layout::TWITTER, 0, 2);
    assert_eq!(sequence.try_next().unwrap(), draw(10, 0));
    assert_eq!(sequence.try_next().unwrap(), draw(10, 1));

    scope(|s| {
        s.spawn(|| {
            thread::sleep(Duration::from_millis(30));
            clock.set(11);
        });
        assert_eq!(sequence.try_next().unwrap(), draw(11, 0));
    });
}

fn run_times_out_on_stalled_clock<S>()
where
    S: GatedSequence<Clock = Arc<ManualClock>>,
    S::Err: Into<Error>,
{
    let sequence: S = build(ManualClock::at(7), Layout::TWITTER, 0, 1);
    assert_eq!(
        sequence.try_next_timeout(Duration::from_secs(1)).unwrap(),
        draw(7, 0)
    );

    let timeout = Duration::from_millis(10);
    match sequence.try_next_timeout(timeout) {
        Err(Error::Stalled { waited }) => assert!(waited >= timeout),
        other => panic!("expected a stall, got {other:?}"),
    }
}

fn run_threaded_draws_are_unique<S>(sequence: S, bound: u64)
where
    S: GatedSequence + Sync,
    S::Err: fmt::Debug,
{
    const THREADS: usize = 8;
    const DRAWS_PER_THREAD: usize = 20_000;

    let seen = Mutex::new(HashSet::with_capacity(THREADS * DRAWS_PER_THREAD));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let draws: Vec<_> = (0..DRAWS_PER_THREAD)
                    .map(|_| sequence.try_next().unwrap())
                    .collect();
                let mut seen = seen.lock().unwrap();
                for draw in draws {
                    assert!(draw.sequence < bound);
                    assert!(seen.insert(draw), "duplicate {draw:?}");
                }
            });
        }
    });

    assert_eq!(seen.into_inner().unwrap().len(), THREADS * DRAWS_PER_THREAD);
}

fn counting_clock() -> Arc<CountingClock> {
    Arc::new(CountingClock {
        reads: AtomicU64::new(0),
        reads_per_tick: 64,
    })
}

#[test]
fn atomic_sequence_increments_within_period() {
    run_sequence_increments_within_period::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_increments_within_period() {
    run_sequence_increments_within_period::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_pending_when_exhausted() {
    run_pending_when_exhausted::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_pending_when_exhausted() {
    run_pending_when_exhausted::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_resumes_at_zero_in_next_period() {
    run_resumes_at_zero_in_next_period::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_resumes_at_zero_in_next_period() {
    run_resumes_at_zero_in_next_period::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_coarse_periods() {
    run_coarse_periods_span_several_timestamps::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_coarse_periods() {
    run_coarse_periods_span_several_timestamps::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_waits_while_clock_is_behind() {
    run_waits_while_clock_is_behind::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_waits_while_clock_is_behind() {
    run_waits_while_clock_is_behind::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_wrapped_timestamp() {
    run_wrapped_timestamp_starts_fresh_period::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_wrapped_timestamp() {
    run_wrapped_timestamp_starts_fresh_period::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_large_forward_jump() {
    run_large_forward_jump_advances::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_large_forward_jump() {
    run_large_forward_jump_advances::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_half_circle_regression() {
    run_half_circle_regression_waits::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_half_circle_regression() {
    run_half_circle_regression_waits::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_blocking_next() {
    run_blocking_next_waits_for_clock::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_blocking_next() {
    run_blocking_next_waits_for_clock::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_times_out() {
    run_times_out_on_stalled_clock::<AtomicGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn lock_sequence_times_out() {
    run_times_out_on_stalled_clock::<LockGatedSequence<Arc<ManualClock>>>();
}

#[test]
fn atomic_sequence_threaded_counting_clock() {
    let sequence: AtomicGatedSequence<_> = build(counting_clock(), Layout::TWITTER, 0, 32);
    run_threaded_draws_are_unique(sequence, 32);
}

#[test]
fn lock_sequence_threaded_counting_clock() {
    let sequence: LockGatedSequence<_> = build(counting_clock(), Layout::TWITTER, 0, 32);
    run_threaded_draws_are_unique(sequence, 32);
}

#[test]
fn atomic_sequence_threaded_monotonic_clock() {
    let sequence: AtomicGatedSequence<_> =
        build(MonotonicClock::default(), Layout::TWITTER, 0, 4096);
    run_threaded_draws_are_unique(sequence, 4096);
}

#[test]
fn lock_sequence_threaded_monotonic_clock() {
    let sequence: LockGatedSequence<_> =
        build(MonotonicClock::default(), Layout::TWITTER, 0, 4096);
    run_threaded_draws_are_unique(sequence, 4096);
}
