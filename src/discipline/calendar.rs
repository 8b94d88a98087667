//! Adaptive calendar-queue discipline.
//!
//! Time is divided into `nb` buckets of `width` seconds; bucket `i`
//! holds every key whose `floor(time / width) mod nb == i`, so one pass
//! over the buckets is one "year" of `nb * width` seconds. Extraction
//! walks forward from the bucket that produced the previous minimum,
//! taking the head of the first bucket whose head falls inside the
//! current year. When a full rotation finds nothing, the queue falls
//! back to a direct search for the global minimum.
//!
//! The bucket count doubles when the queue holds more than `2 * nb` keys
//! and halves when it drops below `nb / 2 - 2`. Every resize picks a new
//! width from the spacing of the earliest queued keys, which keeps the
//! expected number of keys per bucket small and both operations
//! amortized O(1).

use std::collections::VecDeque;

use tracing::debug;

use super::{Key, QueueDiscipline};
use crate::config::CalendarConfig;
use crate::event::EventId;

/// Year numbers from here on no longer have unit precision in an `f64`,
/// so bucket tops cannot be stepped reliably and extraction falls back to
/// a direct search.
const MAX_EXACT_YEAR: f64 = (1u64 << 52) as f64;

/// Counters describing how hard the calendar is working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarStats {
    /// Keys inserted (not counting re-insertion during a resize).
    pub inserts: u64,
    /// Keys extracted by `pop_min`.
    pub dequeues: u64,
    /// Buckets inspected across inserts and extractions.
    pub probes: u64,
    /// Extractions that fell back to a direct search.
    pub direct_searches: u64,
    /// Bucket-array rebuilds.
    pub resizes: u64,
}

impl CalendarStats {
    /// Average bucket probes per insert or extraction.
    pub fn probes_per_op(&self) -> f64 {
        let ops = self.inserts + self.dequeues;
        if ops == 0 {
            0.0
        } else {
            self.probes as f64 / ops as f64
        }
    }
}

/// Where the next minimum lives, as found by [`CalendarQueue::locate`].
struct Located {
    bucket: usize,
    bucket_top: f64,
    probes: u64,
    direct: bool,
}

/// The calendar queue.
#[derive(Debug)]
pub struct CalendarQueue {
    buckets: Vec<VecDeque<Key>>,
    width: f64,
    one_on_width: f64,
    /// Bucket the previous minimum came from.
    last_bucket: usize,
    /// Upper time bound of `last_bucket` in the current year.
    bucket_top: f64,
    /// Time of the most recently extracted key.
    last_time: f64,
    top_threshold: usize,
    bot_threshold: i64,
    len: usize,
    config: CalendarConfig,
    stats: CalendarStats,
}

impl CalendarQueue {
    /// An empty calendar tuned by `config`.
    pub fn new(config: CalendarConfig) -> Self {
        let mut q = CalendarQueue {
            buckets: Vec::new(),
            width: config.initial_width,
            one_on_width: 1.0 / config.initial_width,
            last_bucket: 0,
            bucket_top: 0.0,
            last_time: 0.0,
            top_threshold: 0,
            bot_threshold: 0,
            len: 0,
            config,
            stats: CalendarStats::default(),
        };
        let buckets = q.config.initial_buckets.max(2).next_power_of_two();
        let width = q.config.initial_width;
        q.reinit(buckets, width, 0.0);
        q
    }

    /// Current bucket count.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Current bucket width in seconds.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Work counters since construction or the last `clear`.
    pub fn stats(&self) -> CalendarStats {
        self.stats
    }

    // ── Internals ─────────────────────────────────────────────────────

    /// Index of the year-long slice of `width`-sized buckets holding
    /// `time`. Kept in `f64` so far-future times cannot overflow.
    #[inline]
    fn year_of(&self, time: f64) -> f64 {
        (time * self.one_on_width).floor()
    }

    #[inline]
    fn bucket_of(&self, time: f64) -> usize {
        // Exact for any integral year; a non-finite year maps to bucket 0.
        self.year_of(time).rem_euclid(self.buckets.len() as f64) as usize
    }

    /// Upper bound of the bucket for `year`, with half a width of slack.
    #[inline]
    fn top_of(&self, year: f64) -> f64 {
        (year + 1.5) * self.width
    }

    /// Reset to `nbuckets` empty buckets of `width`, with the cursor at
    /// the year containing `start`.
    fn reinit(&mut self, nbuckets: usize, width: f64, start: f64) {
        debug_assert!(nbuckets.is_power_of_two());
        self.buckets = (0..nbuckets).map(|_| VecDeque::new()).collect();
        self.width = width;
        self.one_on_width = 1.0 / width;
        self.len = 0;
        self.last_time = start;
        self.last_bucket = self.bucket_of(start);
        self.bucket_top = self.top_of(self.year_of(start));
        self.bot_threshold = (nbuckets / 2) as i64 - 2;
        self.top_threshold = 2 * nbuckets;
    }

    /// Put `key` in its bucket, keeping the bucket sorted.
    fn place(&mut self, key: Key) {
        let b = self.bucket_of(key.time.as_secs());
        let bucket = &mut self.buckets[b];
        let pos = bucket.partition_point(|k| *k < key);
        bucket.insert(pos, key);
        self.len += 1;
    }

    /// Find the bucket holding the minimum without moving the cursor.
    fn locate(&self) -> Option<Located> {
        if self.len == 0 {
            return None;
        }
        let nb = self.buckets.len();
        let mut i = self.last_bucket;
        let mut top = self.bucket_top;
        let mut probes = 0;
        let rotations = if self.year_of(top) < MAX_EXACT_YEAR { nb } else { 0 };
        for _ in 0..rotations {
            probes += 1;
            if let Some(head) = self.buckets[i].front() {
                if head.time.as_secs() < top {
                    return Some(Located {
                        bucket: i,
                        bucket_top: top,
                        probes,
                        direct: false,
                    });
                }
            }
            i = (i + 1) & (nb - 1);
            top += self.width;
        }

        // Nothing this year: jump straight to the global minimum.
        let (bucket, head) = self
            .buckets
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.front().map(|k| (i, *k)))
            .min_by(|a, b| a.1.cmp(&b.1))?;
        Some(Located {
            bucket,
            bucket_top: self.top_of(self.year_of(head.time.as_secs())),
            probes,
            direct: true,
        })
    }

    /// Rebuild with `nbuckets` buckets and a freshly estimated width.
    fn resize(&mut self, nbuckets: usize) {
        let nbuckets = nbuckets.max(2);
        let width = self.new_width();
        let len = self.len;
        let keys: Vec<Key> = self.buckets.iter_mut().flat_map(|b| b.drain(..)).collect();
        let old = self.buckets.len();
        self.reinit(nbuckets, width, self.last_time);
        for key in keys {
            self.place(key);
        }
        debug_assert_eq!(self.len, len);
        self.stats.resizes += 1;
        debug!(
            from = old,
            to = nbuckets,
            width,
            queued = len,
            "calendar resized"
        );
    }

    /// Estimate a bucket width from the earliest queued keys.
    ///
    /// Reads the keys in place; the cursor and bucket contents are left
    /// untouched.
    fn new_width(&self) -> f64 {
        if self.len < 2 {
            return self.config.initial_width;
        }
        let nsamples = if self.len < 5 {
            self.len
        } else {
            5 + self.len / 10
        }
        .min(self.config.max_samples);

        let mut times: Vec<f64> = self
            .buckets
            .iter()
            .flatten()
            .map(|k| k.time.as_secs())
            .collect();
        times.select_nth_unstable_by(nsamples - 1, f64::total_cmp);
        times.truncate(nsamples);
        times.sort_unstable_by(f64::total_cmp);

        let asep = (times[nsamples - 1] - times[0]) / (nsamples - 1) as f64;
        let (sum, count) = times
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|gap| *gap < 2.0 * asep)
            .fold((0.0, 0usize), |(s, c), gap| (s + gap, c + 1));

        let width = if count > 0 {
            3.0 * (sum / count as f64)
        } else {
            asep
        };
        let floor = (self.last_time + 1.0) * self.config.min_width_factor;
        width.max(floor)
    }
}

impl QueueDiscipline for CalendarQueue {
    fn insert(&mut self, key: Key) {
        self.place(key);
        self.stats.inserts += 1;
        self.stats.probes += 1;
        if self.len > self.top_threshold {
            self.resize(2 * self.buckets.len());
        }
    }

    fn pop_min(&mut self) -> Option<Key> {
        let found = self.locate()?;
        let key = self.buckets[found.bucket].pop_front()?;
        self.last_bucket = found.bucket;
        self.bucket_top = found.bucket_top;
        self.last_time = key.time.as_secs();
        self.len -= 1;

        self.stats.dequeues += 1;
        self.stats.probes += found.probes;
        if found.direct {
            self.stats.direct_searches += 1;
        }
        if (self.len as i64) < self.bot_threshold {
            self.resize(self.buckets.len() / 2);
        }
        Some(key)
    }

    fn peek_min(&self) -> Option<Key> {
        let found = self.locate()?;
        self.buckets[found.bucket].front().copied()
    }

    fn remove(&mut self, key: &Key) -> bool {
        let b = self.bucket_of(key.time.as_secs());
        let bucket = &mut self.buckets[b];
        match bucket.iter().position(|k| k.id == key.id) {
            Some(pos) => {
                bucket.remove(pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    fn find(&self, id: EventId) -> Option<Key> {
        self.buckets.iter().flatten().find(|k| k.id == id).copied()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.buckets.iter_mut().flat_map(|b| b.drain(..)).collect();
        keys.sort_unstable();
        let buckets = self.config.initial_buckets.max(2).next_power_of_two();
        let width = self.config.initial_width;
        self.reinit(buckets, width, 0.0);
        self.stats = CalendarStats::default();
        keys
    }
}
