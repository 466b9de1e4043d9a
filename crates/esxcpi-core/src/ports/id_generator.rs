//! NameGenerator port - ローカル生成物の一意な名前
//!
//! VM ごとに作る ISO の作業ファイル名は、並行実行とぶつかってはいけない。
//! 名前は ULID で、乱数部分は注入した RNG から取る（シード固定でテストが再現可能）。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use ulid::Ulid;

use crate::ports::Clock;

pub trait NameGenerator: Send + Sync {
    /// `prefix` で始まる新しい名前（例: `agent-env-01HV...`）
    fn generate(&self, prefix: &str) -> String;
}

/// ULID ベースの生成器（タイムスタンプは Clock、乱数は RNG から）
pub struct UlidGenerator<C> {
    clock: C,
    rng: Mutex<StdRng>,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C, rng: StdRng) -> Self {
        Self {
            clock,
            rng: Mutex::new(rng),
        }
    }

    /// OS の乱数でシードした生成器
    pub fn from_entropy(clock: C) -> Self {
        Self::new(clock, StdRng::from_entropy())
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        let random: u128 = match self.rng.lock() {
            Ok(mut rng) => rng.r#gen(),
            Err(poisoned) => poisoned.into_inner().r#gen(),
        };
        Ulid::from_parts(timestamp_ms, random)
    }
}

impl<C: Clock> NameGenerator for UlidGenerator<C> {
    fn generate(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn generates_unique_names() {
        let names = UlidGenerator::from_entropy(SystemClock);

        let a = names.generate("agent-env");
        let b = names.generate("agent-env");

        assert_ne!(a, b);
        assert!(a.starts_with("agent-env-"));
    }

    #[test]
    fn seeded_generator_is_reproducible() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let first = UlidGenerator::new(FixedClock::new(at), StdRng::seed_from_u64(7));
        let second = UlidGenerator::new(FixedClock::new(at), StdRng::seed_from_u64(7));

        assert_eq!(first.generate("iso"), second.generate("iso"));
    }

    #[test]
    fn timestamp_part_comes_from_the_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let names = UlidGenerator::new(FixedClock::new(at), StdRng::seed_from_u64(1));

        let name = names.generate("iso");
        let ulid: Ulid = name.trim_start_matches("iso-").parse().unwrap();
        assert_eq!(ulid.timestamp_ms(), at.timestamp_millis() as u64);
    }
}
