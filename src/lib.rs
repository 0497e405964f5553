//! Options pricing and multi-leg strategy analysis.
//!
//! Prices European options with the Black-Scholes closed form, derives
//! their Greeks, composes legs into multi-leg strategies and analyzes the
//! resulting risk/reward profile: payoff curve, breakeven points, bounded
//! or unbounded extremes, aggregate Greeks and probability of profit.
//!
//! All analysis is synchronous and side-effect free; callers supply spot,
//! volatility and rate, and consume the structured [`StrategySummary`].

pub mod errors;
pub mod leg;
pub mod pricing;
pub mod strategy;
pub mod templates;
pub mod types;

pub use errors::{EngineError, Result};
pub use leg::OptionLeg;
pub use pricing::{black_scholes_price, calculate_greeks, quote, Greeks, OptionQuote};
pub use strategy::{
    OptionsStrategy, PayoffBound, PayoffDiagram, ProfitLoss, StrategySummary,
};
pub use templates::{
    bear_put_spread, build_template, bull_call_spread, butterfly_spread, iron_condor,
    long_straddle, long_strangle, template_names,
};
pub use types::{Action, OptionType};
