use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// How transcription job names are generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobNameConfig {
    /// Fixed prefix (or the whole name when `append_timestamp` is false).
    pub base: String,

    /// Append a nanosecond timestamp so repeated submissions get distinct names.
    pub append_timestamp: bool,
}

impl JobNameConfig {
    pub fn new(base: impl Into<String>, append_timestamp: bool) -> Self {
        Self {
            base: base.into(),
            append_timestamp,
        }
    }

    /// Produce the job name for one submission.
    ///
    /// A non-empty base without suffixing is used verbatim; anything else gets a
    /// timestamp suffix, so an empty base yields a purely numeric name.
    pub fn resolve(&self) -> String {
        if !self.base.is_empty() && !self.append_timestamp {
            return self.base.clone();
        }
        format!("{}{}", self.base, unique_timestamp_nanos())
    }
}

/// Nanoseconds since the Unix epoch, strictly increasing across calls in this process.
///
/// Two calls within the same clock tick still get distinct values.
pub(crate) fn unique_timestamp_nanos() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();

    let mut prev = LAST.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_without_suffix_is_numeric() {
        let name = JobNameConfig::new("", false).resolve();
        assert!(!name.is_empty());
        assert!(name.chars().all(|c| c.is_ascii_digit()), "got {name}");
    }

    #[test]
    fn base_without_suffix_is_verbatim() {
        assert_eq!(JobNameConfig::new("job1", false).resolve(), "job1");
    }

    #[test]
    fn suffixed_names_strictly_increase() {
        let cfg = JobNameConfig::new("x-", true);
        let suffixes: Vec<u64> = (0..64)
            .map(|_| {
                let name = cfg.resolve();
                assert!(name.starts_with("x-"));
                name["x-".len()..].parse::<u64>().expect("numeric suffix")
            })
            .collect();

        for pair in suffixes.windows(2) {
            assert!(pair[1] > pair[0], "{} !> {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn concurrent_names_are_unique() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..250)
                        .map(|_| JobNameConfig::default().resolve())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = Vec::new();
        for h in handles {
            all.extend(h.join().expect("thread panicked"));
        }
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
