//! Result aggregation
//!
//! Computes hit statistics over the probed set and drops structurally
//! invalid candidates. Aggregation never fails.

use crate::variant::DomainVariant;

/// Candidates with a domain string this short or shorter are discarded
pub const MIN_DOMAIN_LEN: usize = 2;

/// Cleaned candidates plus hit statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Candidates passed downstream
    pub variants: Vec<DomainVariant>,
    /// Candidates with at least one A or NS record
    pub hits: usize,
    /// Candidates the statistics were computed over
    pub total: usize,
}

impl Aggregate {
    /// `hits / total`, or 0 for an empty set
    pub fn hit_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }

    /// Hit rate as a percentage
    pub fn hit_percent(&self) -> f64 {
        self.hit_rate() * 100.0
    }
}

/// Aggregate a probed candidate set
///
/// Statistics cover every probed candidate; cleaning only affects what is
/// passed on. Hit statistics are for reporting and never influence which
/// candidates survive.
pub fn aggregate(probed: Vec<DomainVariant>) -> Aggregate {
    let total = probed.len();
    let hits = probed.iter().filter(|v| v.is_hit()).count();

    let variants: Vec<DomainVariant> = probed
        .into_iter()
        .filter(|v| v.domain_name.trim().len() > MIN_DOMAIN_LEN)
        .collect();

    let dropped = total - variants.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} malformed candidate(s)", dropped);
    }

    Aggregate {
        variants,
        hits,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::ProbeRecords;

    fn hit(name: &str) -> DomainVariant {
        let mut variant = DomainVariant::new("test", name);
        variant.apply(ProbeRecords {
            dns_a: vec!["192.0.2.1".to_string()],
            ..ProbeRecords::default()
        });
        variant
    }

    #[test]
    fn test_hit_rate_three_of_ten() {
        let mut probed: Vec<DomainVariant> = (0..7)
            .map(|i| DomainVariant::new("test", format!("miss{}.com", i)))
            .collect();
        probed.push(hit("hit1.com"));
        probed.push(hit("hit2.com"));

        let mut ns_only = DomainVariant::new("test", "hit3.com");
        ns_only.apply(ProbeRecords {
            dns_ns: vec!["ns1.example.net.".to_string()],
            ..ProbeRecords::default()
        });
        probed.push(ns_only);

        let result = aggregate(probed);
        assert_eq!(result.total, 10);
        assert_eq!(result.hits, 3);
        assert!((result.hit_percent() - 30.0).abs() < f64::EPSILON);
        assert_eq!(result.variants.len(), 10);
    }

    #[test]
    fn test_short_candidates_dropped_regardless_of_records() {
        let result = aggregate(vec![
            hit("e."),
            DomainVariant::new("test", ""),
            DomainVariant::new("test", "exampl.com"),
        ]);

        assert_eq!(result.variants.len(), 1);
        assert_eq!(result.variants[0].domain_name, "exampl.com");
        assert_eq!(result.hits, 1);
    }

    #[test]
    fn test_empty_set() {
        let result = aggregate(Vec::new());
        assert_eq!(result.hit_rate(), 0.0);
        assert!(result.variants.is_empty());
    }
}
