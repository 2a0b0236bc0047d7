//! Running statistics over simulated rounds.

use std::fmt;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub trials: u64,
    total_net: f64,
    total_net_sq: f64,
    total_wagered: f64,
    wins: u64,
}

impl Stats {
    pub fn add(&mut self, net: i64, wagered: u64) {
        let n = net as f64;
        self.trials += 1;
        self.total_net += n;
        self.total_net_sq += n * n;
        self.total_wagered += wagered as f64;
        if net > 0 {
            self.wins += 1;
        }
    }

    pub fn merge(&mut self, other: &Stats) {
        self.trials += other.trials;
        self.total_net += other.total_net;
        self.total_net_sq += other.total_net_sq;
        self.total_wagered += other.total_wagered;
        self.wins += other.wins;
    }

    pub fn mean_net(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.total_net / self.trials as f64
        }
    }

    pub fn mean_wagered(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.total_wagered / self.trials as f64
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.wins as f64 / self.trials as f64
        }
    }

    /// Fraction of the average stake kept by the house. Zero when nothing was staked.
    pub fn house_edge(&self) -> f64 {
        let mw = self.mean_wagered();
        if mw == 0.0 {
            0.0
        } else {
            -self.mean_net() / mw
        }
    }

    /// Return to player, `1 - house_edge`. Zero when nothing was staked.
    pub fn rtp(&self) -> f64 {
        if self.mean_wagered() == 0.0 {
            0.0
        } else {
            1.0 - self.house_edge()
        }
    }

    /// Standard error of the mean net result.
    pub fn stderr(&self) -> f64 {
        if self.trials <= 1 {
            return 0.0;
        }
        let mean = self.mean_net();
        let var = (self.total_net_sq / self.trials as f64) - mean * mean;
        let var = if var < 0.0 { 0.0 } else { var };
        (var / self.trials as f64).sqrt()
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trials        {}", self.trials)?;
        writeln!(f, "mean stake    {:.4}", self.mean_wagered())?;
        writeln!(f, "mean net      {:.4} (stderr {:.4})", self.mean_net(), self.stderr())?;
        writeln!(f, "win rate      {:.2}%", self.win_rate() * 100.0)?;
        write!(
            f,
            "house edge    {:.2}% (rtp {:.2}%)",
            self.house_edge() * 100.0,
            self.rtp() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = Stats::default();
        assert_eq!(stats.mean_net(), 0.0);
        assert_eq!(stats.house_edge(), 0.0);
        assert_eq!(stats.stderr(), 0.0);
    }

    #[test]
    fn test_edge_and_merge() {
        let mut a = Stats::default();
        a.add(100, 100);
        a.add(-100, 100);
        let mut b = Stats::default();
        b.add(-100, 100);
        b.add(-100, 100);
        a.merge(&b);

        assert_eq!(a.trials, 4);
        assert_eq!(a.mean_net(), -50.0);
        assert_eq!(a.house_edge(), 0.5);
        assert_eq!(a.rtp(), 0.5);
        assert_eq!(a.win_rate(), 0.25);
        assert!(a.stderr() > 0.0);
        assert!(a.to_string().contains("house edge    50.00%"));
    }
}
