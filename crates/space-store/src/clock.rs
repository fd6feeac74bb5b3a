use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use space_types::Timestamp;
use std::sync::Mutex;

/// Wall clock truncated to microseconds that never repeats or goes
/// backwards, so two edits in the same instant still order.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::from_datetime(self.tick(Utc::now()))
    }

    fn tick(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let wall = wall.trunc_subsecs(6);
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        let next = match *last {
            Some(prev) if wall <= prev => prev + TimeDelta::microseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}
