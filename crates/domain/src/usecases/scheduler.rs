//! Daily trigger schedule and the loop that dispatches ticks

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use time::{OffsetDateTime, Time, UtcOffset};

use crate::ports::Clock;

/// Fires once a day at a fixed UTC wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: Time,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid schedule time '{0}': expected HH:MM (UTC)")]
pub struct ScheduleParseError(String);

impl DailySchedule {
    pub fn at(hour: u8, minute: u8) -> Result<Self, ScheduleParseError> {
        Time::from_hms(hour, minute, 0)
            .map(|at| Self { at })
            .map_err(|_| ScheduleParseError(format!("{:02}:{:02}", hour, minute)))
    }

    pub fn time(&self) -> Time {
        self.at
    }

    /// First firing strictly after `now`
    pub fn next_after(&self, now: OffsetDateTime) -> OffsetDateTime {
        let now = now.to_offset(UtcOffset::UTC);
        let today = now.replace_time(self.at);
        if today > now {
            today
        } else {
            today + time::Duration::days(1)
        }
    }

    /// A fresh, infinite stream of ticks starting from the clock's current time
    pub fn ticks<C, S>(&self, clock: Arc<C>, sleeper: Arc<S>) -> impl Stream<Item = Tick> + Send
    where
        C: Clock + ?Sized + 'static,
        S: Sleeper + ?Sized + 'static,
    {
        let schedule = *self;
        stream::unfold((0u64, None::<OffsetDateTime>), move |(sequence, last)| {
            let clock = Arc::clone(&clock);
            let sleeper = Arc::clone(&sleeper);
            async move {
                // A wall clock that reads behind the last slot must not fire it again.
                let from = match last {
                    Some(last) => clock.now().max(last),
                    None => clock.now(),
                };
                let deadline = schedule.next_after(from);
                sleeper.sleep_until(deadline).await;
                let tick = Tick {
                    sequence,
                    scheduled_for: deadline,
                };
                Some((tick, (sequence + 1, Some(deadline))))
            }
        })
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self { at: Time::from_hms(8, 0, 0).unwrap_or(Time::MIDNIGHT) }
    }
}

impl FromStr for DailySchedule {
    type Err = ScheduleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleParseError(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::at(hour, minute).map_err(|_| invalid())
    }
}

/// One trigger event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 0-based position in the stream
    pub sequence: u64,
    /// Time the tick was due
    pub scheduled_for: OffsetDateTime,
}

/// Waits until a wall-clock deadline
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep_until(&self, deadline: OffsetDateTime);
}

/// Sleeper backed by the tokio timer
pub struct TokioSleeper<C: Clock + ?Sized> {
    clock: Arc<C>,
}

impl<C: Clock + ?Sized> TokioSleeper<C> {
    pub fn new(clock: Arc<C>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl<C: Clock + ?Sized> Sleeper for TokioSleeper<C> {
    async fn sleep_until(&self, deadline: OffsetDateTime) {
        let remaining = deadline - self.clock.now();
        let wait = std::time::Duration::try_from(remaining).unwrap_or_default();
        tracing::debug!(deadline = %deadline, wait_secs = wait.as_secs(), "Sleeping until next trigger");
        tokio::time::sleep(wait).await;
    }
}

/// Dispatches every tick to a handler until the stream ends or shutdown fires.
///
/// Returns the number of ticks handled. The handler runs to completion
/// before the next tick is awaited, so cycles never overlap.
pub async fn run_schedule<T, F, H, Fut>(ticks: T, shutdown: F, mut handler: H) -> u64
where
    T: Stream<Item = Tick>,
    F: Future<Output = ()>,
    H: FnMut(Tick) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut handled = 0;
    tokio::pin!(ticks);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            tick = ticks.next() => {
                let Some(tick) = tick else {
                    tracing::info!("Trigger stream ended");
                    break;
                };
                tracing::info!(
                    sequence = tick.sequence,
                    scheduled_for = %tick.scheduled_for,
                    "Trigger fired"
                );
                handler(tick).await;
                handled += 1;
            }
            _ = &mut shutdown => {
                tracing::info!("Scheduler shutting down");
                break;
            }
        }
    }

    handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use time::macros::datetime;

    /// Clock that jumps forward whenever the sleeper is asked to wait
    struct FakeTime {
        now: Mutex<OffsetDateTime>,
    }

    impl Clock for FakeTime {
        fn now(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }

    #[async_trait]
    impl Sleeper for FakeTime {
        async fn sleep_until(&self, deadline: OffsetDateTime) {
            let mut now = self.now.lock().unwrap();
            if deadline > *now {
                *now = deadline;
            }
        }
    }

    #[test]
    fn parses_hh_mm() {
        let schedule: DailySchedule = "08:30".parse().unwrap();
        assert_eq!(schedule.time(), Time::from_hms(8, 30, 0).unwrap());
        assert!("24:00".parse::<DailySchedule>().is_err());
        assert!("8h".parse::<DailySchedule>().is_err());
    }

    #[test]
    fn next_after_same_day_when_earlier() {
        let schedule = DailySchedule::at(8, 0).unwrap();
        let next = schedule.next_after(datetime!(2026-10-19 06:15 UTC));
        assert_eq!(next, datetime!(2026-10-19 08:00 UTC));
    }

    #[test]
    fn next_after_rolls_to_tomorrow() {
        let schedule = DailySchedule::at(8, 0).unwrap();
        assert_eq!(
            schedule.next_after(datetime!(2026-10-19 08:00 UTC)),
            datetime!(2026-10-20 08:00 UTC)
        );
        assert_eq!(
            schedule.next_after(datetime!(2026-10-19 23:59 UTC)),
            datetime!(2026-10-20 08:00 UTC)
        );
    }

    #[test]
    fn next_after_normalizes_offsets() {
        let schedule = DailySchedule::at(8, 0).unwrap();
        // 09:30 at +02:00 is 07:30 UTC
        let next = schedule.next_after(datetime!(2026-10-19 09:30 +2));
        assert_eq!(next, datetime!(2026-10-19 08:00 UTC));
    }

    #[tokio::test]
    async fn ticks_fire_once_per_day() {
        let time = Arc::new(FakeTime {
            now: Mutex::new(datetime!(2026-10-19 12:00 UTC)),
        });
        let schedule = DailySchedule::at(8, 0).unwrap();

        let ticks: Vec<_> = schedule
            .ticks(Arc::clone(&time), Arc::clone(&time))
            .take(3)
            .collect()
            .await;

        let due: Vec<_> = ticks.iter().map(|t| t.scheduled_for).collect();
        assert_eq!(
            due,
            vec![
                datetime!(2026-10-20 08:00 UTC),
                datetime!(2026-10-21 08:00 UTC),
                datetime!(2026-10-22 08:00 UTC),
            ]
        );
        assert_eq!(ticks[2].sequence, 2);
    }

    /// Wakes slightly before the deadline, as a stepped wall clock can
    struct EarlyWake {
        now: Mutex<OffsetDateTime>,
    }

    impl Clock for EarlyWake {
        fn now(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }

    #[async_trait]
    impl Sleeper for EarlyWake {
        async fn sleep_until(&self, deadline: OffsetDateTime) {
            *self.now.lock().unwrap() = deadline - time::Duration::milliseconds(50);
        }
    }

    #[tokio::test]
    async fn early_wake_never_fires_the_same_slot_twice() {
        let time = Arc::new(EarlyWake {
            now: Mutex::new(datetime!(2026-10-19 12:00 UTC)),
        });
        let schedule = DailySchedule::at(8, 0).unwrap();

        let due: Vec<_> = schedule
            .ticks(Arc::clone(&time), Arc::clone(&time))
            .take(3)
            .map(|t| t.scheduled_for)
            .collect()
            .await;

        assert_eq!(
            due,
            vec![
                datetime!(2026-10-20 08:00 UTC),
                datetime!(2026-10-21 08:00 UTC),
                datetime!(2026-10-22 08:00 UTC),
            ]
        );
    }

    #[tokio::test]
    async fn ticks_restart_from_current_time() {
        let time = Arc::new(FakeTime {
            now: Mutex::new(datetime!(2026-10-19 12:00 UTC)),
        });
        let schedule = DailySchedule::at(8, 0).unwrap();

        let first: Vec<_> = schedule
            .ticks(Arc::clone(&time), Arc::clone(&time))
            .take(2)
            .collect()
            .await;
        let restarted: Vec<_> = schedule
            .ticks(Arc::clone(&time), Arc::clone(&time))
            .take(1)
            .collect()
            .await;

        assert_eq!(first[1].scheduled_for, datetime!(2026-10-21 08:00 UTC));
        assert_eq!(restarted[0].sequence, 0);
        assert_eq!(restarted[0].scheduled_for, datetime!(2026-10-22 08:00 UTC));
    }

    #[tokio::test]
    async fn run_schedule_handles_every_tick() {
        let ticks = stream::iter((0..3).map(|sequence| Tick {
            sequence,
            scheduled_for: datetime!(2026-10-19 08:00 UTC),
        }));
        let seen = Mutex::new(Vec::new());

        let handled = run_schedule(ticks, std::future::pending(), |tick| {
            seen.lock().unwrap().push(tick.sequence);
            async {}
        })
        .await;

        assert_eq!(handled, 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn run_schedule_stops_on_shutdown() {
        let handled = run_schedule(stream::pending(), async {}, |_tick| async {}).await;
        assert_eq!(handled, 0);
    }
}
