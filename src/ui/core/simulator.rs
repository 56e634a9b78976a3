//! "Dream machine": what an investment would be worth if the coin moved by
//! a given percentage, and what the profit could buy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// The amount is a dollar investment.
    #[default]
    Usd,
    /// The amount is a number of coins already held.
    Coin,
}

impl InputMode {
    pub fn toggled(self) -> Self {
        match self {
            InputMode::Usd => InputMode::Coin,
            InputMode::Coin => InputMode::Usd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DreamResult {
    pub target_price: f64,
    pub investment_usd: f64,
    pub coins_bought: f64,
    pub future_value: f64,
    pub profit: f64,
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Returns `None` when any input is missing its meaning: a non-positive
/// price, amount or target move.
pub fn simulate(
    current_price: f64,
    amount: f64,
    mode: InputMode,
    target_pct_increase: f64,
) -> Option<DreamResult> {
    if !positive(current_price) || !positive(amount) || !positive(target_pct_increase) {
        return None;
    }

    let (coins_bought, investment_usd) = match mode {
        InputMode::Usd => (amount / current_price, amount),
        InputMode::Coin => (amount, amount * current_price),
    };
    let target_price = current_price * (1.0 + target_pct_increase / 100.0);
    let future_value = coins_bought * target_price;

    Some(DreamResult {
        target_price,
        investment_usd,
        coins_bought,
        future_value,
        profit: future_value - investment_usd,
    })
}

/// Target move that lands exactly on the all-time high, or `None` when the
/// coin already trades at or above it.
pub fn ath_target_pct(current_price: f64, ath_price: f64) -> Option<f64> {
    if !positive(current_price) || !ath_price.is_finite() || ath_price <= current_price {
        return None;
    }
    Some((ath_price / current_price - 1.0) * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceItem {
    pub name: String,
    pub price_usd: f64,
}

impl ReferenceItem {
    pub fn new(name: &str, price_usd: f64) -> Self {
        Self {
            name: name.to_string(),
            price_usd,
        }
    }
}

/// The fixed shopping list the profit is measured against, cheapest first.
pub fn default_reference_items() -> Vec<ReferenceItem> {
    vec![
        ReferenceItem::new("Coffee", 5.0),
        ReferenceItem::new("Pizza night", 40.0),
        ReferenceItem::new("Sneakers", 180.0),
        ReferenceItem::new("iPhone", 1_199.0),
        ReferenceItem::new("Gaming PC", 2_500.0),
        ReferenceItem::new("Rolex Submariner", 10_000.0),
        ReferenceItem::new("Tesla Model 3", 40_000.0),
        ReferenceItem::new("Porsche 911", 120_000.0),
        ReferenceItem::new("Lamborghini Huracan", 250_000.0),
        ReferenceItem::new("House", 500_000.0),
        ReferenceItem::new("Private jet", 3_000_000.0),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Affordability {
    pub name: String,
    pub price_usd: f64,
    pub count: i64,
    pub affordable: bool,
}

/// Ranks `items` against `profit`, keeping the list's own order.
pub fn affordability(profit: f64, items: &[ReferenceItem]) -> Vec<Affordability> {
    items
        .iter()
        .map(|item| Affordability {
            name: item.name.clone(),
            price_usd: item.price_usd,
            count: (profit / item.price_usd).floor() as i64,
            affordable: profit >= item.price_usd,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_investment_with_fifty_percent_move() {
        let r = simulate(100.0, 1000.0, InputMode::Usd, 50.0).unwrap();
        assert_eq!(r.coins_bought, 10.0);
        assert_eq!(r.target_price, 150.0);
        assert_eq!(r.future_value, 1500.0);
        assert_eq!(r.profit, 500.0);
        assert_eq!(r.investment_usd, 1000.0);
    }

    #[test]
    fn coin_mode_values_the_holding() {
        let r = simulate(200.0, 2.0, InputMode::Coin, 100.0).unwrap();
        assert_eq!(r.coins_bought, 2.0);
        assert_eq!(r.investment_usd, 400.0);
        assert_eq!(r.target_price, 400.0);
        assert_eq!(r.profit, 400.0);
    }

    #[test]
    fn invalid_inputs_give_no_result() {
        assert!(simulate(0.0, 100.0, InputMode::Usd, 10.0).is_none());
        assert!(simulate(100.0, -1.0, InputMode::Usd, 10.0).is_none());
        assert!(simulate(100.0, 100.0, InputMode::Usd, 0.0).is_none());
        assert!(simulate(100.0, f64::NAN, InputMode::Coin, 10.0).is_none());
    }

    #[test]
    fn ath_shortcut() {
        let pct = ath_target_pct(50.0, 75.0).unwrap();
        assert!((pct - 50.0).abs() < 1e-12);
        assert_eq!(ath_target_pct(100.0, 100.0), None);
        assert_eq!(ath_target_pct(100.0, 80.0), None);
    }

    #[test]
    fn affordability_keeps_list_order() {
        let items = vec![
            ReferenceItem::new("Car", 30_000.0),
            ReferenceItem::new("Coffee", 5.0),
            ReferenceItem::new("Phone", 1_000.0),
        ];
        let ranked = affordability(1_250.0, &items);
        let names: Vec<&str> = ranked.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Car", "Coffee", "Phone"]);
        assert_eq!(ranked[0].count, 0);
        assert!(!ranked[0].affordable);
        assert_eq!(ranked[1].count, 250);
        assert!(ranked[2].affordable);
        assert_eq!(ranked[2].count, 1);
    }

    #[test]
    fn default_list_is_ascending_by_price() {
        let items = default_reference_items();
        assert!(items.windows(2).all(|w| w[0].price_usd < w[1].price_usd));
    }
}
