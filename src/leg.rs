use crate::pricing::DAYS_PER_YEAR;
use crate::types::{Action, OptionType};
use serde::{Deserialize, Serialize};

/// A single contract position inside a strategy.
///
/// The premium is fixed at construction time, priced off the owning
/// strategy's spot/volatility/rate; re-pricing means building a new leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub option_type: OptionType,
    pub action: Action,
    pub strike: f64,
    pub quantity: u32,
    pub days_to_expiry: u32,
    pub premium: f64,
}

impl OptionLeg {
    pub fn new(
        option_type: OptionType,
        action: Action,
        strike: f64,
        quantity: u32,
        days_to_expiry: u32,
        premium: f64,
    ) -> Self {
        Self {
            option_type,
            action,
            strike,
            quantity,
            days_to_expiry,
            premium,
        }
    }

    pub fn time_to_expiry(&self) -> f64 {
        self.days_to_expiry as f64 / DAYS_PER_YEAR
    }

    /// Contract count signed by direction: buy = +quantity, sell = -quantity.
    pub fn signed_quantity(&self) -> f64 {
        self.action.sign() * self.quantity as f64
    }

    /// Profit or loss of this leg if the underlying settles at
    /// `spot_at_expiry`. Buy pays the premium up front and receives the
    /// intrinsic value; sell receives the premium and owes the intrinsic
    /// value.
    pub fn payoff(&self, spot_at_expiry: f64) -> f64 {
        let intrinsic = self.option_type.intrinsic_value(spot_at_expiry, self.strike);
        let per_contract = match self.action {
            Action::Buy => intrinsic - self.premium,
            Action::Sell => self.premium - intrinsic,
        };
        per_contract * self.quantity as f64
    }
}
