use crate::errors::{EngineError, Result};
use crate::types::OptionType;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use std::f64::consts::E;

pub const DAYS_PER_YEAR: f64 = 365.0;

/// Sensitivities of an option's price to its inputs. Theta is per calendar
/// day; vega and rho are per 1 percentage point change in volatility/rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

impl Greeks {
    pub fn zero() -> Self {
        Self {
            delta: 0.0,
            gamma: 0.0,
            theta: 0.0,
            vega: 0.0,
            rho: 0.0,
        }
    }
}

/// Fair value and sensitivities for a single contract, independent of any
/// strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub price: f64,
    pub greeks: Greeks,
}

pub(crate) fn std_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0)
        .map_err(|_| EngineError::InvalidParameter("failed to create normal distribution".into()))
}

fn d1_d2(spot: f64, strike: f64, time: f64, rate: f64, volatility: f64) -> (f64, f64) {
    let d1 = ((spot / strike).ln() + (rate + 0.5 * volatility * volatility) * time)
        / (volatility * time.sqrt());
    let d2 = d1 - volatility * time.sqrt();
    (d1, d2)
}

/// Price a European option with the Black-Scholes closed form.
///
/// At or past expiry (`time_to_expiry <= 0`) the intrinsic value is
/// returned. The result is floored at zero.
pub fn black_scholes_price(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    volatility: f64,
    option_type: OptionType,
) -> Result<f64> {
    if time_to_expiry <= 0.0 {
        return Ok(option_type.intrinsic_value(spot, strike));
    }
    if volatility <= 0.0 {
        return Err(EngineError::InvalidParameter(
            "volatility must be positive for an unexpired option".into(),
        ));
    }

    let normal = std_normal()?;
    let (d1, d2) = d1_d2(spot, strike, time_to_expiry, risk_free_rate, volatility);
    let discount = E.powf(-risk_free_rate * time_to_expiry);

    let price = match option_type {
        OptionType::Call => spot * normal.cdf(d1) - strike * discount * normal.cdf(d2),
        OptionType::Put => strike * discount * normal.cdf(-d2) - spot * normal.cdf(-d1),
    };

    Ok(price.max(0.0))
}

/// Calculate all five Greeks for a European option.
///
/// At the expiry boundary delta collapses to +1 (call) or -1 (put) and the
/// remaining Greeks are zero. Values are returned unrounded; rounding is a
/// presentation concern.
pub fn calculate_greeks(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    volatility: f64,
    option_type: OptionType,
) -> Result<Greeks> {
    if time_to_expiry <= 0.0 {
        let delta = match option_type {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        };
        return Ok(Greeks {
            delta,
            ..Greeks::zero()
        });
    }
    if volatility <= 0.0 {
        return Err(EngineError::InvalidParameter(
            "volatility must be positive for an unexpired option".into(),
        ));
    }

    let normal = std_normal()?;
    let (d1, d2) = d1_d2(spot, strike, time_to_expiry, risk_free_rate, volatility);
    let sqrt_t = time_to_expiry.sqrt();
    let discount = E.powf(-risk_free_rate * time_to_expiry);
    let pdf_d1 = normal.pdf(d1);

    let delta = match option_type {
        OptionType::Call => normal.cdf(d1),
        OptionType::Put => -normal.cdf(-d1),
    };

    // Gamma is identical for calls and puts
    let gamma = pdf_d1 / (spot * volatility * sqrt_t);

    let theta_annual = match option_type {
        OptionType::Call => {
            -(spot * pdf_d1 * volatility) / (2.0 * sqrt_t)
                - risk_free_rate * strike * discount * normal.cdf(d2)
        }
        OptionType::Put => {
            -(spot * pdf_d1 * volatility) / (2.0 * sqrt_t)
                + risk_free_rate * strike * discount * normal.cdf(-d2)
        }
    };
    // Per calendar day
    let theta = theta_annual / DAYS_PER_YEAR;

    let vega = spot * pdf_d1 * sqrt_t / 100.0;

    let rho = match option_type {
        OptionType::Call => strike * time_to_expiry * discount * normal.cdf(d2) / 100.0,
        OptionType::Put => -strike * time_to_expiry * discount * normal.cdf(-d2) / 100.0,
    };

    Ok(Greeks {
        delta,
        gamma,
        theta,
        vega,
        rho,
    })
}

/// Price and Greeks in one call, for callers working outside a strategy.
pub fn quote(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    volatility: f64,
    option_type: OptionType,
) -> Result<OptionQuote> {
    let price = black_scholes_price(
        spot,
        strike,
        time_to_expiry,
        risk_free_rate,
        volatility,
        option_type,
    )?;
    let greeks = calculate_greeks(
        spot,
        strike,
        time_to_expiry,
        risk_free_rate,
        volatility,
        option_type,
    )?;
    Ok(OptionQuote { price, greeks })
}
