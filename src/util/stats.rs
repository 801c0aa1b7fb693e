use std::fmt::Display;

/// Running summary (min, max, mean) of march step counts.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub count: u64,
    pub min: u32,
    pub max: u32,
    pub avg: f64,
}

impl Stats {
    pub fn new_single(v: u32) -> Self {
        Stats {
            count: 1,
            min: v,
            max: v,
            avg: v as f64,
        }
    }

    pub fn add_sample(&mut self, value: u32) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.avg += (value as f64 - self.avg) / (self.count as f64);
    }

    pub fn merge(&self, other: &Self) -> Self {
        Stats {
            count: self.count + other.count,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            avg: if self.count > 0 || other.count > 0 {
                (self.avg * self.count as f64 + other.avg * other.count as f64)
                    / (self.count + other.count) as f64
            } else {
                0.0
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            min: u32::MAX,
            max: 0,
            avg: 0.0,
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "no rays");
        }
        write!(
            f,
            "{} - {} steps; avg {:.1}; {} rays",
            self.min, self.max, self.avg, self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn add_sample_to_empty() {
        let mut s = Stats::default();
        s.add_sample(20);
        assert!(s == Stats::new_single(20));
    }

    #[test]
    fn merge_stats() {
        let a = Stats::new_single(10);
        let mut b = Stats::new_single(30);
        b.add_sample(50);
        let m = a.merge(&b);
        assert!(m.count == 3);
        assert!(m.min == 10);
        assert!(m.max == 50);
        assert!(m.avg == 30.0);
    }

    #[test]
    fn merge_with_default() {
        let s = Stats::new_single(5);
        assert!(Stats::default().merge(&s) == s);
        assert!(Stats::default().merge(&Stats::default()) == Stats::default());
    }

    #[test]
    fn display_format() {
        assert!(format!("{}", Stats::default()) == "no rays");

        let output = format!("{}", Stats::new_single(42));
        assert!(output.contains("42 - 42 steps"));
        assert!(output.contains("avg 42.0"));
        assert!(output.contains("1 rays"));
    }
}
