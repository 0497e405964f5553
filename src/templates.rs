use crate::errors::{EngineError, Result};
use crate::strategy::OptionsStrategy;
use crate::types::{Action, OptionType};
use std::collections::HashMap;
use std::sync::LazyLock;

pub type TemplateFn = fn(f64, Option<f64>, u32) -> Result<OptionsStrategy>;

pub const DEFAULT_DAYS_TO_EXPIRY: u32 = 30;

// Default strike widths as a fraction of spot
const DEFAULT_WIDTH_PCT: f64 = 0.05;
const CONDOR_WING_PCT: f64 = 0.10;

const UNDERLYING: &str = "STOCK";

/// Moderately bullish, limited risk and reward.
pub fn bull_call_spread(
    spot_price: f64,
    strike_width: Option<f64>,
    days_to_expiry: u32,
) -> Result<OptionsStrategy> {
    let width = strike_width.unwrap_or(spot_price * DEFAULT_WIDTH_PCT);
    let mut strategy = OptionsStrategy::new("Bull Call Spread", UNDERLYING, spot_price);

    strategy.add_leg(OptionType::Call, Action::Buy, spot_price, 1, days_to_expiry)?;
    strategy.add_leg(
        OptionType::Call,
        Action::Sell,
        spot_price + width,
        1,
        days_to_expiry,
    )?;

    Ok(strategy)
}

/// Moderately bearish, limited risk and reward.
pub fn bear_put_spread(
    spot_price: f64,
    strike_width: Option<f64>,
    days_to_expiry: u32,
) -> Result<OptionsStrategy> {
    let width = strike_width.unwrap_or(spot_price * DEFAULT_WIDTH_PCT);
    let mut strategy = OptionsStrategy::new("Bear Put Spread", UNDERLYING, spot_price);

    strategy.add_leg(OptionType::Put, Action::Buy, spot_price, 1, days_to_expiry)?;
    strategy.add_leg(
        OptionType::Put,
        Action::Sell,
        spot_price - width,
        1,
        days_to_expiry,
    )?;

    Ok(strategy)
}

/// Big move expected in either direction; unlimited upside profit.
/// Both legs are at the money, so the width parameter is unused.
pub fn long_straddle(
    spot_price: f64,
    _strike_width: Option<f64>,
    days_to_expiry: u32,
) -> Result<OptionsStrategy> {
    let mut strategy = OptionsStrategy::new("Long Straddle", UNDERLYING, spot_price);

    strategy.add_leg(OptionType::Call, Action::Buy, spot_price, 1, days_to_expiry)?;
    strategy.add_leg(OptionType::Put, Action::Buy, spot_price, 1, days_to_expiry)?;

    Ok(strategy)
}

/// Big move expected, lower cost than a straddle.
pub fn long_strangle(
    spot_price: f64,
    strike_width: Option<f64>,
    days_to_expiry: u32,
) -> Result<OptionsStrategy> {
    let width = strike_width.unwrap_or(spot_price * DEFAULT_WIDTH_PCT);
    let mut strategy = OptionsStrategy::new("Long Strangle", UNDERLYING, spot_price);

    strategy.add_leg(
        OptionType::Call,
        Action::Buy,
        spot_price + width,
        1,
        days_to_expiry,
    )?;
    strategy.add_leg(
        OptionType::Put,
        Action::Buy,
        spot_price - width,
        1,
        days_to_expiry,
    )?;

    Ok(strategy)
}

/// Range-bound, limited risk and reward. The short strikes sit at half the
/// wing width on each side of spot.
pub fn iron_condor(
    spot_price: f64,
    wing_width: Option<f64>,
    days_to_expiry: u32,
) -> Result<OptionsStrategy> {
    let width = wing_width.unwrap_or(spot_price * CONDOR_WING_PCT);
    let mut strategy = OptionsStrategy::new("Iron Condor", UNDERLYING, spot_price);

    // Put spread below spot
    strategy.add_leg(
        OptionType::Put,
        Action::Buy,
        spot_price - width,
        1,
        days_to_expiry,
    )?;
    strategy.add_leg(
        OptionType::Put,
        Action::Sell,
        spot_price - width / 2.0,
        1,
        days_to_expiry,
    )?;

    // Call spread above spot
    strategy.add_leg(
        OptionType::Call,
        Action::Sell,
        spot_price + width / 2.0,
        1,
        days_to_expiry,
    )?;
    strategy.add_leg(
        OptionType::Call,
        Action::Buy,
        spot_price + width,
        1,
        days_to_expiry,
    )?;

    Ok(strategy)
}

/// Neutral, low risk and reward; 2x short at the body.
pub fn butterfly_spread(
    spot_price: f64,
    wing_width: Option<f64>,
    days_to_expiry: u32,
) -> Result<OptionsStrategy> {
    let width = wing_width.unwrap_or(spot_price * DEFAULT_WIDTH_PCT);
    let mut strategy = OptionsStrategy::new("Butterfly Spread", UNDERLYING, spot_price);

    strategy.add_leg(
        OptionType::Call,
        Action::Buy,
        spot_price - width,
        1,
        days_to_expiry,
    )?;
    strategy.add_leg(OptionType::Call, Action::Sell, spot_price, 2, days_to_expiry)?;
    strategy.add_leg(
        OptionType::Call,
        Action::Buy,
        spot_price + width,
        1,
        days_to_expiry,
    )?;

    Ok(strategy)
}

// Read-only name -> builder registry, constructed once at first use.
static TEMPLATES: LazyLock<HashMap<&'static str, TemplateFn>> = LazyLock::new(|| {
    HashMap::from([
        ("bull_call_spread", bull_call_spread as TemplateFn),
        ("bear_put_spread", bear_put_spread as TemplateFn),
        ("long_straddle", long_straddle as TemplateFn),
        ("long_strangle", long_strangle as TemplateFn),
        ("iron_condor", iron_condor as TemplateFn),
        ("butterfly_spread", butterfly_spread as TemplateFn),
    ])
});

/// Valid template identifiers, sorted.
pub fn template_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TEMPLATES.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Build a canonical strategy by its registry name.
pub fn build_template(
    name: &str,
    spot_price: f64,
    width: Option<f64>,
    days_to_expiry: u32,
) -> Result<OptionsStrategy> {
    let builder = TEMPLATES
        .get(name)
        .ok_or_else(|| EngineError::UnknownTemplate {
            name: name.to_string(),
            valid: template_names(),
        })?;

    let strategy = builder(spot_price, width, days_to_expiry)?;
    tracing::debug!(template = name, spot_price, days_to_expiry, "Template built");
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::PayoffBound;

    #[test]
    fn test_bull_call_spread_shape() {
        let strategy = bull_call_spread(100.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
        assert_eq!(strategy.legs.len(), 2);
        // Default width is 5% of spot
        assert_eq!(strategy.legs[0].strike, 100.0);
        assert_eq!(strategy.legs[1].strike, 105.0);
        assert_eq!(strategy.legs[0].action, Action::Buy);
        assert_eq!(strategy.legs[1].action, Action::Sell);
    }

    #[test]
    fn test_bear_put_spread_shape() {
        let strategy = bear_put_spread(200.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
        assert_eq!(strategy.legs.len(), 2);
        assert_eq!(strategy.legs[0].strike, 200.0);
        assert_eq!(strategy.legs[1].strike, 190.0);
        assert!(strategy
            .legs
            .iter()
            .all(|leg| leg.option_type == OptionType::Put));
    }

    #[test]
    fn test_long_strangle_shape() {
        let strategy = long_strangle(100.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
        assert_eq!(strategy.legs.len(), 2);
        assert_eq!(strategy.legs[0].strike, 105.0);
        assert_eq!(strategy.legs[1].strike, 95.0);
        assert!(strategy.legs.iter().all(|leg| leg.action == Action::Buy));
    }

    #[test]
    fn test_iron_condor_shape() {
        let strategy = iron_condor(100.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
        assert_eq!(strategy.legs.len(), 4);
        // Default wing width is 10% of spot, shorts at half width
        let strikes: Vec<f64> = strategy.legs.iter().map(|leg| leg.strike).collect();
        assert_eq!(strikes, vec![90.0, 95.0, 105.0, 110.0]);
    }

    #[test]
    fn test_butterfly_spread_shape() {
        let strategy = butterfly_spread(100.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
        assert_eq!(strategy.legs.len(), 3);
        assert_eq!(strategy.legs[1].quantity, 2);
        assert_eq!(strategy.legs[1].action, Action::Sell);
        let strikes: Vec<f64> = strategy.legs.iter().map(|leg| leg.strike).collect();
        assert_eq!(strikes, vec![95.0, 100.0, 105.0]);
    }

    #[test]
    fn test_long_straddle_analysis() {
        let strategy = long_straddle(100.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
        assert_eq!(strategy.legs.len(), 2);

        // Net debit
        let net_premium = strategy.net_premium();
        assert!(net_premium < 0.0);

        let pl = strategy.max_profit_loss();
        assert!(pl.max_profit.is_unlimited());
        // Worst case loses the total premium paid (to sampling resolution)
        let max_loss = pl.max_loss.value().unwrap();
        assert!((max_loss - net_premium).abs() < 0.25);
    }

    #[test]
    fn test_iron_condor_bounded() {
        let strategy = iron_condor(100.0, Some(10.0), DEFAULT_DAYS_TO_EXPIRY).unwrap();
        assert_eq!(strategy.legs.len(), 4);
        let pl = strategy.max_profit_loss();
        assert!(matches!(pl.max_profit, PayoffBound::Limited(_)));
        assert!(matches!(pl.max_loss, PayoffBound::Limited(_)));
    }

    #[test]
    fn test_bull_call_spread_breakeven() {
        let strategy = bull_call_spread(150.0, Some(10.0), DEFAULT_DAYS_TO_EXPIRY).unwrap();
        let breakevens = strategy.breakeven_points();
        assert_eq!(breakevens.len(), 1);
        assert!(breakevens[0] > 150.0 && breakevens[0] < 160.0);
    }

    #[test]
    fn test_bull_call_spread_breakeven_residual() {
        let strategy = bull_call_spread(100.0, Some(10.0), DEFAULT_DAYS_TO_EXPIRY).unwrap();
        for breakeven in strategy.breakeven_points() {
            assert!(strategy.payoff_at(breakeven).abs() < 0.01);
        }
    }

    #[test]
    fn test_registry_builds_all() {
        for name in template_names() {
            let strategy = build_template(name, 100.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
            assert!(!strategy.legs.is_empty(), "{name} built no legs");
            assert!(strategy.summary().is_ok(), "{name} summary failed");
        }
    }

    #[test]
    fn test_unknown_template() {
        let result = build_template("iron_butterfly", 100.0, None, DEFAULT_DAYS_TO_EXPIRY);
        match result {
            Err(EngineError::UnknownTemplate { name, valid }) => {
                assert_eq!(name, "iron_butterfly");
                assert_eq!(valid.len(), 6);
                assert!(valid.contains(&"iron_condor"));
            }
            other => panic!("expected UnknownTemplate, got {other:?}"),
        }
    }

    #[test]
    fn test_straddle_summary_scenario() {
        let strategy = long_straddle(100.0, None, DEFAULT_DAYS_TO_EXPIRY).unwrap();
        let summary = strategy.summary().unwrap();
        assert_eq!(summary.legs.len(), 2);
        assert!(summary.net_premium < 0.0);
        assert!(summary.max_profit.is_unlimited());
        assert!(!summary.max_loss.is_unlimited());
        assert_eq!(summary.breakeven_points.len(), 2);
    }
}
