use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn symbol(&self) -> &'static str {
        match self {
            Direction::Above => ">=",
            Direction::Below => "<=",
        }
    }
}

/// A user-defined price threshold. Once `triggered` it never fires again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: u64,
    pub coin_id: String,
    pub target_price: f64,
    pub direction: Direction,
    #[serde(default)]
    pub triggered: bool,
    #[serde(default)]
    pub triggered_at: Option<i64>,
}

impl PriceAlert {
    pub fn condition_met(&self, price: f64) -> bool {
        match self.direction {
            Direction::Above => price >= self.target_price,
            Direction::Below => price <= self.target_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiredAlert {
    pub alert_id: u64,
    pub coin_id: String,
    pub target_price: f64,
    pub direction: Direction,
    pub price: f64,
}

impl FiredAlert {
    pub fn message(&self) -> String {
        format!(
            "ALERT: {} reached {} (threshold: {} {})",
            self.coin_id,
            self.price,
            self.direction.symbol(),
            self.target_price
        )
    }
}

/// Fires every untriggered alert whose condition holds for the price in
/// `prices`, flipping it to triggered. Alerts for coins missing from the
/// snapshot are left alone.
pub fn evaluate(alerts: &mut [PriceAlert], prices: &HashMap<String, f64>) -> Vec<FiredAlert> {
    let now = Utc::now().timestamp();
    let mut fired = Vec::new();

    for alert in alerts.iter_mut().filter(|a| !a.triggered) {
        let price = match prices.get(&alert.coin_id) {
            Some(p) if p.is_finite() => *p,
            _ => continue,
        };

        if alert.condition_met(price) {
            alert.triggered = true;
            alert.triggered_at = Some(now);
            fired.push(FiredAlert {
                alert_id: alert.id,
                coin_id: alert.coin_id.clone(),
                target_price: alert.target_price,
                direction: alert.direction,
                price,
            });
        }
    }
    fired
}

/// What happens to an alert after it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertRetention {
    /// Keep it in the list, flagged as triggered.
    #[default]
    RetainAndFlag,
    /// Remove it from the list as soon as it fires.
    DeleteOnFire,
}

impl FromStr for AlertRetention {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "retain" | "flag" | "retain-and-flag" => Ok(AlertRetention::RetainAndFlag),
            "delete" | "delete-on-fire" => Ok(AlertRetention::DeleteOnFire),
            other => Err(DashboardError::Config(format!(
                "unknown alert retention '{}'",
                other
            ))),
        }
    }
}

/// Parses a threshold typed by the user. Rejects anything that is not a
/// finite, positive number.
pub fn parse_target(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .map_err(|_| DashboardError::InvalidInput(format!("'{}' is not a number", raw.trim())))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(DashboardError::InvalidInput(format!(
            "target must be a positive price, got {}",
            raw.trim()
        )));
    }
    Ok(value)
}

pub struct AlertEngine {
    alerts: Vec<PriceAlert>,
    retention: AlertRetention,
    next_id: u64,
}

impl AlertEngine {
    pub fn new(retention: AlertRetention) -> Self {
        Self::with_alerts(Vec::new(), retention)
    }

    /// Restores previously persisted alerts.
    pub fn with_alerts(mut alerts: Vec<PriceAlert>, retention: AlertRetention) -> Self {
        alerts.retain(|a| a.target_price.is_finite() && a.target_price > 0.0);
        if retention == AlertRetention::DeleteOnFire {
            alerts.retain(|a| !a.triggered);
        }
        let next_id = alerts.iter().map(|a| a.id).max().map_or(1, |max| max + 1);
        Self {
            alerts,
            retention,
            next_id,
        }
    }

    pub fn alerts(&self) -> &[PriceAlert] {
        &self.alerts
    }

    pub fn add(&mut self, coin_id: &str, target_price: f64, direction: Direction) -> Result<u64> {
        let coin_id = coin_id.trim();
        if coin_id.is_empty() {
            return Err(DashboardError::InvalidInput(
                "an alert needs a coin".to_string(),
            ));
        }
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(DashboardError::InvalidInput(format!(
                "target must be a positive price, got {}",
                target_price
            )));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.alerts.push(PriceAlert {
            id,
            coin_id: coin_id.to_string(),
            target_price,
            direction,
            triggered: false,
            triggered_at: None,
        });
        debug!(
            "Alert {} added: {} {} {}",
            id,
            coin_id,
            direction.symbol(),
            target_price
        );
        Ok(id)
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        before != self.alerts.len()
    }

    pub fn evaluate(&mut self, prices: &HashMap<String, f64>) -> Vec<FiredAlert> {
        let fired = evaluate(&mut self.alerts, prices);
        for alert in &fired {
            info!("{}", alert.message());
        }
        if self.retention == AlertRetention::DeleteOnFire && !fired.is_empty() {
            self.alerts.retain(|a| !a.triggered);
        }
        fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

/// Where fired alerts are surfaced to the user.
pub trait Notifier: Send {
    /// Asks the user whether notifications may be shown.
    fn request_permission(&mut self) -> Permission;
    fn notify(&mut self, alert: &FiredAlert);
}

/// Asks for notification permission the first time an alert fires and
/// never again; afterwards delivers only when permission was granted.
pub struct NotificationGate {
    permission: Permission,
}

impl NotificationGate {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Returns `true` when the permission changed and should be persisted.
    pub fn dispatch(&mut self, fired: &[FiredAlert], notifier: &mut dyn Notifier) -> bool {
        if fired.is_empty() {
            return false;
        }

        let mut changed = false;
        if self.permission == Permission::Default {
            self.permission = notifier.request_permission();
            changed = self.permission != Permission::Default;
            info!("Notification permission: {:?}", self.permission);
        }

        if self.permission == Permission::Granted {
            for alert in fired {
                notifier.notify(alert);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn fires_once_on_price_sequence() {
        let mut engine = AlertEngine::new(AlertRetention::RetainAndFlag);
        engine.add("bitcoin", 100.0, Direction::Above).unwrap();

        let mut firings = Vec::new();
        for (i, price) in [90.0, 95.0, 100.0].iter().enumerate() {
            let fired = engine.evaluate(&prices(&[("bitcoin", *price)]));
            if !fired.is_empty() {
                firings.push((i, fired));
            }
        }
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].0, 2);
        assert_eq!(firings[0].1[0].price, 100.0);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let mut engine = AlertEngine::new(AlertRetention::RetainAndFlag);
        engine.add("eth", 2000.0, Direction::Below).unwrap();
        engine.add("eth", 1000.0, Direction::Below).unwrap();
        let snapshot = prices(&[("eth", 1500.0)]);

        let first = engine.evaluate(&snapshot);
        let second = engine.evaluate(&snapshot);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(engine.alerts().iter().filter(|a| !a.triggered).count(), 1);
        assert!(engine.alerts()[0].triggered);
        assert!(engine.alerts()[0].triggered_at.is_some());
    }

    #[test]
    fn missing_price_does_not_fire() {
        let mut alerts = vec![PriceAlert {
            id: 1,
            coin_id: "doge".into(),
            target_price: 0.1,
            direction: Direction::Below,
            triggered: false,
            triggered_at: None,
        }];
        assert!(evaluate(&mut alerts, &prices(&[("bitcoin", 1.0)])).is_empty());
        assert!(evaluate(&mut alerts, &prices(&[("doge", f64::NAN)])).is_empty());
        assert!(!alerts[0].triggered);
    }

    #[test]
    fn delete_on_fire_removes_triggered_alerts() {
        let mut engine = AlertEngine::new(AlertRetention::DeleteOnFire);
        engine.add("sol", 150.0, Direction::Above).unwrap();
        engine.add("sol", 300.0, Direction::Above).unwrap();

        let fired = engine.evaluate(&prices(&[("sol", 200.0)]));
        assert_eq!(fired.len(), 1);
        assert_eq!(engine.alerts().len(), 1);
        assert_eq!(engine.alerts()[0].target_price, 300.0);
    }

    #[test]
    fn add_rejects_bad_targets() {
        let mut engine = AlertEngine::new(AlertRetention::default());
        assert!(engine.add("btc", 0.0, Direction::Above).is_err());
        assert!(engine.add("btc", f64::INFINITY, Direction::Above).is_err());
        assert!(engine.add("  ", 10.0, Direction::Above).is_err());
        assert!(engine.alerts().is_empty());
    }

    #[test]
    fn ids_continue_after_restore() {
        let restored = vec![PriceAlert {
            id: 7,
            coin_id: "btc".into(),
            target_price: 10.0,
            direction: Direction::Above,
            triggered: true,
            triggered_at: Some(1),
        }];
        let mut engine = AlertEngine::with_alerts(restored.clone(), AlertRetention::RetainAndFlag);
        assert_eq!(engine.add("btc", 20.0, Direction::Below).unwrap(), 8);
        assert!(engine.remove(7));
        assert!(!engine.remove(7));

        let pruned = AlertEngine::with_alerts(restored, AlertRetention::DeleteOnFire);
        assert!(pruned.alerts().is_empty());
    }

    #[test]
    fn parse_target_validates_user_input() {
        assert_eq!(parse_target(" 64,000.5 ").unwrap(), 64000.5);
        assert_eq!(parse_target("$12").unwrap(), 12.0);
        assert!(matches!(
            parse_target("abc"),
            Err(DashboardError::InvalidInput(_))
        ));
        assert!(parse_target("-5").is_err());
        assert!(parse_target("NaN").is_err());
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let alert = PriceAlert {
            id: 1,
            coin_id: "bitcoin".into(),
            target_price: 100.0,
            direction: Direction::Above,
            triggered: false,
            triggered_at: None,
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["coinId"], "bitcoin");
        assert_eq!(json["targetPrice"], 100.0);
        assert_eq!(json["direction"], "above");
    }

    struct RecordingNotifier {
        answer: Permission,
        prompts: usize,
        delivered: Vec<u64>,
    }

    impl Notifier for RecordingNotifier {
        fn request_permission(&mut self) -> Permission {
            self.prompts += 1;
            self.answer
        }

        fn notify(&mut self, alert: &FiredAlert) {
            self.delivered.push(alert.alert_id);
        }
    }

    fn fired(id: u64) -> FiredAlert {
        FiredAlert {
            alert_id: id,
            coin_id: "btc".into(),
            target_price: 1.0,
            direction: Direction::Above,
            price: 2.0,
        }
    }

    #[test]
    fn permission_is_requested_once() {
        let mut notifier = RecordingNotifier {
            answer: Permission::Granted,
            prompts: 0,
            delivered: Vec::new(),
        };
        let mut gate = NotificationGate::new(Permission::Default);

        assert!(!gate.dispatch(&[], &mut notifier));
        assert_eq!(notifier.prompts, 0);

        assert!(gate.dispatch(&[fired(1)], &mut notifier));
        assert!(!gate.dispatch(&[fired(2)], &mut notifier));
        assert_eq!(notifier.prompts, 1);
        assert_eq!(notifier.delivered, vec![1, 2]);
    }

    #[test]
    fn denied_permission_suppresses_delivery() {
        let mut notifier = RecordingNotifier {
            answer: Permission::Denied,
            prompts: 0,
            delivered: Vec::new(),
        };
        let mut gate = NotificationGate::new(Permission::Default);
        gate.dispatch(&[fired(1)], &mut notifier);
        gate.dispatch(&[fired(2)], &mut notifier);
        assert_eq!(notifier.prompts, 1);
        assert!(notifier.delivered.is_empty());
        assert_eq!(gate.permission(), Permission::Denied);
    }
}
