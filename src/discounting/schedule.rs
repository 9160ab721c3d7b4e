//! Per-cycle discount factors and survival fractions for the two-phase model
//!
//! Treatment-arm discounting compounds across the phase boundary: after
//! `treatment_duration` cycles the post-treatment rate continues from the
//! factor already reached instead of restarting at 1.

use super::DiscountParams;

/// Discount factors for the illness arm and the treatment arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDiscount {
    pub illness_rate: f64,
    pub treatment_rate: f64,
    pub post_treatment_rate: f64,
    pub treatment_duration: u32,
}

impl PhaseDiscount {
    pub fn from_params(params: &DiscountParams) -> Self {
        Self {
            illness_rate: params.discount_rate_illness,
            treatment_rate: params.discount_rate_treatment,
            post_treatment_rate: params.discount_rate_post_treatment,
            treatment_duration: params.treatment_duration,
        }
    }

    /// `(1 + r_illness)^-cycle`
    pub fn illness_factor(&self, cycle: u32) -> f64 {
        discount(self.illness_rate, cycle)
    }

    /// Treatment-rate discounting up to the boundary, post-treatment rate after it
    pub fn treatment_factor(&self, cycle: u32) -> f64 {
        if cycle < self.treatment_duration {
            discount(self.treatment_rate, cycle)
        } else {
            discount(self.treatment_rate, self.treatment_duration)
                * discount(self.post_treatment_rate, cycle - self.treatment_duration)
        }
    }

    pub fn illness_factors(&self, horizon: u32) -> Vec<f64> {
        (0..horizon).map(|i| self.illness_factor(i)).collect()
    }

    pub fn treatment_factors(&self, horizon: u32) -> Vec<f64> {
        (0..horizon).map(|i| self.treatment_factor(i)).collect()
    }
}

fn discount(rate: f64, cycles: u32) -> f64 {
    (1.0 + rate).powf(-f64::from(cycles))
}

/// Annual mortality by phase, turned into cumulative survival curves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivalSchedule {
    pub no_treatment: f64,
    pub during_treatment: f64,
    pub post_treatment: f64,
    pub treatment_duration: u32,
}

impl SurvivalSchedule {
    pub fn from_params(params: &DiscountParams) -> Self {
        Self {
            no_treatment: params.mortality_rate_no_treatment,
            during_treatment: params.mortality_rate_during_treatment,
            post_treatment: params.mortality_rate_post_treatment,
            treatment_duration: params.treatment_duration,
        }
    }

    /// Mortality applied when stepping into `cycle` on the treatment arm
    ///
    /// The during-treatment rate still applies at the boundary cycle itself.
    pub fn treated_rate(&self, cycle: u32) -> f64 {
        if cycle <= self.treatment_duration {
            self.during_treatment
        } else {
            self.post_treatment
        }
    }

    /// Survival fraction per cycle without treatment (starts at 1)
    pub fn untreated(&self, horizon: u32) -> Vec<f64> {
        survival(horizon, |_| self.no_treatment)
    }

    /// Survival fraction per cycle with treatment (starts at 1)
    pub fn treated(&self, horizon: u32) -> Vec<f64> {
        survival(horizon, |cycle| self.treated_rate(cycle))
    }
}

fn survival(horizon: u32, rate: impl Fn(u32) -> f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(horizon as usize);
    let mut surviving = 1.0;
    for cycle in 0..horizon {
        if cycle > 0 {
            surviving *= 1.0 - rate(cycle);
        }
        curve.push(surviving);
    }
    curve
}
