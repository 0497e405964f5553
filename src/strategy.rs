use crate::errors::{EngineError, Result};
use crate::leg::OptionLeg;
use crate::pricing::{black_scholes_price, calculate_greeks, std_normal, Greeks, DAYS_PER_YEAR};
use crate::types::{Action, OptionType};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use statrs::distribution::ContinuousCDF;

pub const DEFAULT_VOLATILITY: f64 = 0.25;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;

// Display range is +/-50% of spot; analysis ranges are deliberately wider
// so the tails of the payoff curve are visible to the extremum scan.
const DIAGRAM_SAMPLES: usize = 100;
const EXTREME_SAMPLES: usize = 500;
const BREAKEVEN_SAMPLES: usize = 1000;

/// A profit or loss bound. `Unlimited` serializes as the string
/// `"Unlimited"`, a finite bound as a plain number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayoffBound {
    Limited(f64),
    Unlimited,
}

impl PayoffBound {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, PayoffBound::Unlimited)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            PayoffBound::Limited(v) => Some(*v),
            PayoffBound::Unlimited => None,
        }
    }
}

impl Serialize for PayoffBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PayoffBound::Limited(v) => serializer.serialize_f64(*v),
            PayoffBound::Unlimited => serializer.serialize_str("Unlimited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitLoss {
    pub max_profit: PayoffBound,
    pub max_loss: PayoffBound,
}

/// Fully materialized payoff curve for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoffDiagram {
    pub prices: Vec<f64>,
    pub payoffs: Vec<f64>,
    pub spot_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegSummary {
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub action: Action,
    pub strike: f64,
    pub quantity: u32,
    pub premium: f64,
    pub days_to_expiry: u32,
}

/// Consolidated analysis of a strategy, consumed downstream for
/// persistence, charting and narrative generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub strategy_name: String,
    pub underlying: String,
    pub spot_price: f64,
    pub legs: Vec<LegSummary>,
    pub net_premium: f64,
    pub max_profit: PayoffBound,
    pub max_loss: PayoffBound,
    pub breakeven_points: Vec<f64>,
    pub greeks: Greeks,
    pub payoff_diagram: PayoffDiagram,
    pub probability_of_profit: Option<f64>,
}

/// An ordered collection of option legs on one underlying, priced off a
/// single spot/volatility/rate at insertion time.
///
/// Legs are append-only. Mutating `spot_price` after legs exist does not
/// reprice them; build a new strategy if the composition changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsStrategy {
    pub name: String,
    pub underlying_symbol: String,
    pub spot_price: f64,
    pub volatility: f64,
    pub risk_free_rate: f64,
    pub legs: Vec<OptionLeg>,
}

impl OptionsStrategy {
    pub fn new(
        name: impl Into<String>,
        underlying_symbol: impl Into<String>,
        spot_price: f64,
    ) -> Self {
        Self {
            name: name.into(),
            underlying_symbol: underlying_symbol.into(),
            spot_price,
            volatility: DEFAULT_VOLATILITY,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            legs: Vec::new(),
        }
    }

    /// Append a leg, pricing its premium with Black-Scholes off the
    /// strategy's current spot/volatility/rate.
    pub fn add_leg(
        &mut self,
        option_type: OptionType,
        action: Action,
        strike: f64,
        quantity: u32,
        days_to_expiry: u32,
    ) -> Result<()> {
        if self.spot_price <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "spot price must be positive".into(),
            ));
        }
        if strike <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "strike must be positive".into(),
            ));
        }
        if quantity == 0 {
            return Err(EngineError::InvalidParameter(
                "quantity must be positive".into(),
            ));
        }

        let time_to_expiry = days_to_expiry as f64 / DAYS_PER_YEAR;
        let premium = black_scholes_price(
            self.spot_price,
            strike,
            time_to_expiry,
            self.risk_free_rate,
            self.volatility,
            option_type,
        )?;

        tracing::debug!(
            strategy = %self.name,
            ?option_type,
            ?action,
            strike,
            quantity,
            days_to_expiry,
            premium,
            "Leg added"
        );

        self.legs.push(OptionLeg::new(
            option_type,
            action,
            strike,
            quantity,
            days_to_expiry,
            premium,
        ));
        Ok(())
    }

    /// Net cash flow to open the position: negative for a debit, positive
    /// for a credit.
    pub fn net_premium(&self) -> f64 {
        self.legs
            .iter()
            .map(|leg| -leg.action.sign() * leg.premium * leg.quantity as f64)
            .sum()
    }

    /// Total payoff of all legs if the underlying settles at `price`.
    pub fn payoff_at(&self, price: f64) -> f64 {
        self.legs.iter().map(|leg| leg.payoff(price)).sum()
    }

    /// Payoff curve over `price_range` (default +/-50% of spot), sampled at
    /// 100 evenly spaced points.
    pub fn payoff_diagram(&self, price_range: Option<(f64, f64)>) -> PayoffDiagram {
        let (min_price, max_price) =
            price_range.unwrap_or((self.spot_price * 0.5, self.spot_price * 1.5));

        let prices = linspace(min_price, max_price, DIAGRAM_SAMPLES);
        let payoffs = prices.iter().map(|&p| self.payoff_at(p)).collect();

        PayoffDiagram {
            prices,
            payoffs,
            spot_price: self.spot_price,
        }
    }

    /// Net signed quantity of call legs, which is also the slope of the
    /// payoff curve beyond the highest strike. A positive exposure means
    /// unbounded upside profit, a negative one unbounded upside loss.
    /// The downside is always bounded since the underlying floors at zero.
    fn net_call_exposure(&self) -> f64 {
        self.legs
            .iter()
            .filter(|leg| leg.option_type == OptionType::Call)
            .map(|leg| leg.signed_quantity())
            .sum()
    }

    /// Maximum profit and loss over a wide price range, with unboundedness
    /// classified analytically from the net call exposure rather than from
    /// the sampled curve's edge slope.
    pub fn max_profit_loss(&self) -> ProfitLoss {
        let prices = linspace(self.spot_price * 0.2, self.spot_price * 2.0, EXTREME_SAMPLES);
        let payoffs: Vec<f64> = prices.iter().map(|&p| self.payoff_at(p)).collect();

        let highest = payoffs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = payoffs.iter().copied().fold(f64::INFINITY, f64::min);

        let call_exposure = self.net_call_exposure();
        let max_profit = if call_exposure > 0.0 {
            PayoffBound::Unlimited
        } else {
            PayoffBound::Limited(highest)
        };
        let max_loss = if call_exposure < 0.0 {
            PayoffBound::Unlimited
        } else {
            PayoffBound::Limited(lowest)
        };

        ProfitLoss {
            max_profit,
            max_loss,
        }
    }

    /// Terminal prices where the payoff crosses zero, in ascending order,
    /// rounded to 2 decimals. Found by a sign-flip scan over 1000 samples
    /// with linear interpolation at each crossing.
    pub fn breakeven_points(&self) -> Vec<f64> {
        let prices = linspace(
            self.spot_price * 0.2,
            self.spot_price * 2.0,
            BREAKEVEN_SAMPLES,
        );
        let payoffs: Vec<f64> = prices.iter().map(|&p| self.payoff_at(p)).collect();

        let mut breakevens = Vec::new();
        for i in 0..payoffs.len() - 1 {
            if payoffs[i] * payoffs[i + 1] < 0.0 {
                let crossing = prices[i]
                    + (0.0 - payoffs[i]) * (prices[i + 1] - prices[i])
                        / (payoffs[i + 1] - payoffs[i]);
                breakevens.push(round_dp(crossing, 2));
            }
        }
        breakevens
    }

    /// Greeks of the whole position: per-leg Greeks at each leg's own
    /// expiry, scaled by signed quantity, summed, rounded to 4 decimals.
    pub fn aggregate_greeks(&self) -> Result<Greeks> {
        let mut total = Greeks::zero();
        for leg in &self.legs {
            let greeks = calculate_greeks(
                self.spot_price,
                leg.strike,
                leg.time_to_expiry(),
                self.risk_free_rate,
                self.volatility,
                leg.option_type,
            )?;
            let multiplier = leg.signed_quantity();
            total.delta += greeks.delta * multiplier;
            total.gamma += greeks.gamma * multiplier;
            total.theta += greeks.theta * multiplier;
            total.vega += greeks.vega * multiplier;
            total.rho += greeks.rho * multiplier;
        }
        Ok(Greeks {
            delta: round_dp(total.delta, 4),
            gamma: round_dp(total.gamma, 4),
            theta: round_dp(total.theta, 4),
            vega: round_dp(total.vega, 4),
            rho: round_dp(total.rho, 4),
        })
    }

    /// Probability that the strategy expires profitable, as a percentage,
    /// under the risk-neutral lognormal terminal distribution implied by
    /// the strategy's volatility and rate at the longest leg expiry.
    /// `None` for an empty strategy.
    pub fn probability_of_profit(&self) -> Result<Option<f64>> {
        if self.legs.is_empty() {
            return Ok(None);
        }

        let days = self
            .legs
            .iter()
            .map(|leg| leg.days_to_expiry)
            .max()
            .unwrap_or(0);
        let time = days as f64 / DAYS_PER_YEAR;
        if time <= 0.0 {
            // Terminal price is the spot itself
            let p = if self.payoff_at(self.spot_price) > 0.0 {
                100.0
            } else {
                0.0
            };
            return Ok(Some(p));
        }
        if self.volatility <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "volatility must be positive for an unexpired strategy".into(),
            ));
        }

        let normal = std_normal()?;
        let mu = self.spot_price.ln()
            + (self.risk_free_rate - 0.5 * self.volatility * self.volatility) * time;
        let sigma = self.volatility * time.sqrt();
        let terminal_cdf = |price: f64| -> f64 {
            if price <= 0.0 {
                0.0
            } else {
                normal.cdf((price.ln() - mu) / sigma)
            }
        };

        // Breakevens partition the price axis into intervals of constant
        // payoff sign; accumulate the mass of the profitable ones.
        let breakevens = self.breakeven_points();
        let mut probability = 0.0;
        let mut lower = 0.0_f64;
        for &breakeven in &breakevens {
            let midpoint = 0.5 * (lower + breakeven);
            if self.payoff_at(midpoint) > 0.0 {
                probability += terminal_cdf(breakeven) - terminal_cdf(lower);
            }
            lower = breakeven;
        }
        let probe = if breakevens.is_empty() {
            self.spot_price
        } else {
            lower * 1.1 + 1.0
        };
        if self.payoff_at(probe) > 0.0 {
            probability += 1.0 - terminal_cdf(lower);
        }

        Ok(Some(round_dp(probability.clamp(0.0, 1.0) * 100.0, 2)))
    }

    /// Consolidated analysis record. Read-only over the strategy, so
    /// repeated calls on an unmutated strategy yield identical output.
    pub fn summary(&self) -> Result<StrategySummary> {
        let profit_loss = self.max_profit_loss();
        let round_bound = |bound: PayoffBound| match bound {
            PayoffBound::Limited(v) => PayoffBound::Limited(round_dp(v, 2)),
            PayoffBound::Unlimited => PayoffBound::Unlimited,
        };

        Ok(StrategySummary {
            strategy_name: self.name.clone(),
            underlying: self.underlying_symbol.clone(),
            spot_price: self.spot_price,
            legs: self
                .legs
                .iter()
                .map(|leg| LegSummary {
                    option_type: leg.option_type,
                    action: leg.action,
                    strike: leg.strike,
                    quantity: leg.quantity,
                    premium: round_dp(leg.premium, 2),
                    days_to_expiry: leg.days_to_expiry,
                })
                .collect(),
            net_premium: round_dp(self.net_premium(), 2),
            max_profit: round_bound(profit_loss.max_profit),
            max_loss: round_bound(profit_loss.max_loss),
            breakeven_points: self.breakeven_points(),
            greeks: self.aggregate_greeks()?,
            payoff_diagram: self.payoff_diagram(None),
            probability_of_profit: self.probability_of_profit()?,
        })
    }
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
