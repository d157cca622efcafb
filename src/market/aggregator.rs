use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::models::{Bar, Interval, Tick};

/// Builds coarser bars out of a stream of ticks or base bars
///
/// Two consumption modes share the same instance:
/// - `update_tick` turns ticks into 1-minute bars and hands back each finished one
/// - `update_bar` merges base bars into one bar per `window` base bars
///
/// Intraday windows are clock aligned: a base bar of `b` minutes starting at
/// minute-of-day `m` closes the aggregate when `(m + b) % (window * b) == 0`.
/// Daily bars are merged by count. A partially filled window is only
/// flushed when a bar from a later window shows up; until then `pending()`
/// exposes it.
#[derive(Debug, Clone)]
pub struct BarAggregator {
    window: u32,
    tick_bar: Option<Bar>,
    window_bar: Option<Bar>,
    bucket: Option<(i32, u32)>,
    merged: u32,
}

impl BarAggregator {
    /// Create an aggregator emitting one bar every `window` base bars
    ///
    /// A window of 1 passes every base bar straight through.
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            tick_bar: None,
            window_bar: None,
            bucket: None,
            merged: 0,
        }
    }

    /// Aggregate bar currently being accumulated
    pub fn pending(&self) -> Option<&Bar> {
        self.window_bar.as_ref()
    }

    /// Update with a tick, returning the previous minute's bar once a tick
    /// from a new minute arrives
    pub fn update_tick(&mut self, tick: &Tick) -> Option<Bar> {
        if tick.last_price <= 0.0 {
            return None;
        }

        let minute = truncate_to_minute(tick.instant);

        match self.tick_bar.as_mut() {
            Some(bar) if bar.instant == minute => {
                bar.high = bar.high.max(tick.last_price);
                bar.low = bar.low.min(tick.last_price);
                bar.close = tick.last_price;
                None
            }
            _ => self
                .tick_bar
                .replace(Self::bar_from_tick(minute, tick.last_price)),
        }
    }

    /// Update with a base bar, returning the aggregate when its window closes
    ///
    /// A base bar landing in a different clock window than the pending one
    /// means bars went missing: the stale partial is handed back as is and
    /// the new bar starts its own window.
    pub fn update_bar(&mut self, bar: &Bar) -> Option<Bar> {
        let (bucket, finished) = match bar.interval.minutes().filter(|span| *span > 0) {
            Some(span) => {
                let window_span = span.saturating_mul(self.window);
                let minute = bar.minute_of_day();
                let bucket = (bar.instant.num_days_from_ce(), minute / window_span);
                (Some(bucket), minute.saturating_add(span) % window_span == 0)
            }
            None => (None, self.merged + 1 >= self.window),
        };

        let mut stale = None;
        match self.window_bar.as_mut() {
            Some(window_bar) if bucket == self.bucket => {
                window_bar.high = window_bar.high.max(bar.high);
                window_bar.low = window_bar.low.min(bar.low);
                window_bar.close = bar.close;
                window_bar.volume += bar.volume;
                self.merged += 1;
            }
            _ => {
                if let Some(partial) = self.window_bar.take() {
                    tracing::warn!(
                        "Bar at {} falls outside the {}-bar window started at {}; closing it after {} bars",
                        bar.instant,
                        self.window,
                        partial.instant,
                        self.merged
                    );
                    stale = Some(partial);
                }
                self.start_window(bar, bucket);
            }
        }

        if finished {
            if let Some(partial) = stale {
                tracing::warn!(
                    "Dropping partial window started at {}, the bar at {} closes its own window",
                    partial.instant,
                    bar.instant
                );
            }
            self.bucket = None;
            self.merged = 0;
            return self.window_bar.take();
        }

        stale
    }

    fn start_window(&mut self, bar: &Bar, bucket: Option<(i32, u32)>) {
        self.window_bar = Some(Bar {
            instant: truncate_to_minute(bar.instant),
            interval: bar.interval.scaled(self.window),
            ..bar.clone()
        });
        self.bucket = bucket;
        self.merged = 1;
    }

    fn bar_from_tick(instant: DateTime<Utc>, price: f64) -> Bar {
        Bar {
            instant,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
            interval: Interval::Minutes(1),
        }
    }
}

fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}
