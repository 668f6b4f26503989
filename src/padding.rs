//! Trailing-padding policy for UDP test packets (C7).
//!
//! A configured byte count is used verbatim; the default policy instead
//! draws from a fixed IMIX-like size mix, uniformly at random per datagram,
//! so a capture over many packets shows the expected size distribution
//! (small/medium/large in roughly 7:4:1 proportion).

use rand::Rng;

/// IPv4 IMIX: (pad_len, weight) entries.
const IMIX_V4: &[(usize, u32)] = &[(8, 7), (534, 4), (1458, 1)];

/// IPv6 IMIX: (pad_len, weight) entries.
const IMIX_V6: &[(usize, u32)] = &[(0, 7), (514, 4), (1438, 1)];

#[derive(Debug, Clone, Copy)]
pub enum Policy {
    /// Fixed pad length for every datagram.
    Fixed(usize),
    /// IMIX mix, chosen per address family at pick time.
    Default,
}

impl Policy {
    /// Parses a CLI `--padding` value: `-1`/absent selects the IMIX default,
    /// any other non-negative integer is a fixed pad length.
    pub fn from_cli(value: i64) -> Self {
        if value < 0 {
            Self::Default
        } else {
            Self::Fixed(value as usize)
        }
    }

    /// Choose a pad length for one datagram.
    pub fn pick(&self, is_v6: bool) -> usize {
        match self {
            Self::Fixed(n) => *n,
            Self::Default => pick_imix(if is_v6 { IMIX_V6 } else { IMIX_V4 }),
        }
    }
}

fn pick_imix(table: &[(usize, u32)]) -> usize {
    let total: u32 = table.iter().map(|(_, w)| w).sum();
    let mut roll = rand::rng().random_range(0..total);
    for (len, weight) in table {
        if roll < *weight {
            return *len;
        }
        roll -= weight;
    }
    table.last().map(|(len, _)| *len).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_is_constant() {
        let p = Policy::Fixed(100);
        assert_eq!(p.pick(false), 100);
        assert_eq!(p.pick(true), 100);
    }

    #[test]
    fn default_policy_only_returns_known_sizes() {
        let p = Policy::Default;
        for _ in 0..200 {
            assert!(IMIX_V4.iter().any(|(len, _)| *len == p.pick(false)));
            assert!(IMIX_V6.iter().any(|(len, _)| *len == p.pick(true)));
        }
    }

    #[test]
    fn from_cli_negative_is_default() {
        assert!(matches!(Policy::from_cli(-1), Policy::Default));
        assert!(matches!(Policy::from_cli(0), Policy::Fixed(0)));
    }
}
