use serde::{Deserialize, Serialize};

/// Running mean and variance (Welford's algorithm).
#[derive(Default)]
pub struct OnlineStats {
    n_vals: usize,
    mean: f64,
    sq_dev_sum: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl OnlineStats {
    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;
        let dev_old = val - self.mean;
        self.mean += dev_old / self.n_vals as f64;
        self.sq_dev_sum += dev_old * (val - self.mean);
    }

    pub fn mean(&self) -> f64 {
        if self.n_vals == 0 { f64::NAN } else { self.mean }
    }

    /// Sample standard deviation; undefined below two values.
    pub fn std_dev(&self) -> f64 {
        if self.n_vals < 2 {
            return f64::NAN;
        }
        (self.sq_dev_sum / (self.n_vals - 1) as f64).sqrt()
    }

    pub fn report(&self) -> StatsReport {
        StatsReport {
            n_vals: self.n_vals,
            mean: self.mean(),
            std_dev: self.std_dev(),
        }
    }
}
