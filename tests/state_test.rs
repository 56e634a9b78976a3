/**
 * Dashboard State Persistence Tests
 *
 * Round-trips user data through a real state file:
 * - Watchlist, preferences and alerts survive a restart
 * - Alert ids keep counting after a restore
 * - Corrupt files and delete-on-fire retention
 */

use std::fs;
use std::path::PathBuf;

use coinboard::api::models::Coin;
use coinboard::api::FeedPayload;
use coinboard::ui::core::alerts::{AlertRetention, Direction, Permission};
use coinboard::ui::core::indicators::IndicatorConfig;
use coinboard::ui::core::state::{Command, DashboardState, Language, Theme};
use coinboard::ui::core::storage::FileStorage;

struct TempState {
    path: PathBuf,
}

impl TempState {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("coinboard-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        Self {
            path: dir.join("state.json"),
        }
    }

    fn open(&self, retention: AlertRetention) -> DashboardState {
        DashboardState::new(
            Box::new(FileStorage::open(&self.path)),
            retention,
            IndicatorConfig::default(),
        )
    }
}

impl Drop for TempState {
    fn drop(&mut self) {
        if let Some(dir) = self.path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}

fn coin(id: &str, price: f64) -> Coin {
    Coin {
        id: id.to_string(),
        symbol: id[..3].to_string(),
        name: id.to_string(),
        current_price: Some(price),
        ..Default::default()
    }
}

#[test]
fn user_data_survives_a_restart() {
    let tmp = TempState::new("restart");
    {
        let mut state = tmp.open(AlertRetention::RetainAndFlag);
        state
            .handle(Command::ToggleWatchlist("bitcoin".into()))
            .unwrap();
        state
            .handle(Command::ToggleWatchlist("solana".into()))
            .unwrap();
        state.handle(Command::ToggleTheme).unwrap();
        state.handle(Command::ToggleLanguage).unwrap();
        state.handle(Command::SetConsent(true)).unwrap();
        state
            .handle(Command::AddAlert {
                coin_id: "bitcoin".into(),
                target: "$70,000".into(),
                direction: Direction::Above,
            })
            .unwrap();
    }
    assert!(tmp.path.exists());

    let state = tmp.open(AlertRetention::RetainAndFlag);
    assert!(state.is_watched("bitcoin"));
    assert!(state.is_watched("solana"));
    assert_eq!(state.watchlist().len(), 2);
    assert_eq!(state.prefs().theme, Theme::Light);
    assert_eq!(state.prefs().language, Language::Tr);
    assert_eq!(state.prefs().consent, Some(true));
    assert_eq!(state.alerts().len(), 1);
    assert_eq!(state.alerts()[0].target_price, 70_000.0);
}

#[test]
fn fired_alerts_keep_their_flag_and_ids_keep_counting() {
    let tmp = TempState::new("alerts");
    {
        let mut state = tmp.open(AlertRetention::RetainAndFlag);
        state.add_alert("bitcoin", "100", Direction::Below).unwrap();
        state.add_alert("ethereum", "5000", Direction::Above).unwrap();
        state.set_feed(FeedPayload::Coins(vec![coin("bitcoin", 90.0), coin("ethereum", 3000.0)]));
        assert_eq!(state.evaluate_alerts().len(), 1);
    }

    let mut state = tmp.open(AlertRetention::RetainAndFlag);
    assert_eq!(state.alerts().len(), 2);
    assert!(state.alerts()[0].triggered);
    assert!(!state.alerts()[1].triggered);

    let id = state.add_alert("solana", "10", Direction::Below).unwrap();
    assert_eq!(id, 3);
}

#[test]
fn delete_on_fire_drops_triggered_alerts() {
    let tmp = TempState::new("delete-on-fire");
    {
        let mut state = tmp.open(AlertRetention::DeleteOnFire);
        state.add_alert("bitcoin", "100", Direction::Below).unwrap();
        state.add_alert("bitcoin", "50", Direction::Below).unwrap();
        state.set_feed(FeedPayload::Coins(vec![coin("bitcoin", 80.0)]));
        assert_eq!(state.evaluate_alerts().len(), 1);
        assert_eq!(state.alerts().len(), 1);
    }

    let state = tmp.open(AlertRetention::DeleteOnFire);
    assert_eq!(state.alerts().len(), 1);
    assert_eq!(state.alerts()[0].target_price, 50.0);
}

#[test]
fn corrupt_state_file_starts_fresh() {
    let tmp = TempState::new("corrupt");
    if let Some(dir) = tmp.path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    fs::write(&tmp.path, "{ not json").unwrap();

    let mut state = tmp.open(AlertRetention::RetainAndFlag);
    assert!(state.watchlist().is_empty());
    assert_eq!(state.prefs().theme, Theme::Dark);
    assert_eq!(state.prefs().notification_permission, Permission::Default);

    assert!(state.toggle_watchlist("bitcoin"));
    let restored = tmp.open(AlertRetention::RetainAndFlag);
    assert!(restored.is_watched("bitcoin"));
}

#[test]
fn malformed_values_fall_back_per_key() {
    let tmp = TempState::new("malformed");
    if let Some(dir) = tmp.path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    fs::write(
        &tmp.path,
        r#"{"theme": "light", "watchlist": 42, "alerts": "nope", "notification_permission": "denied"}"#,
    )
    .unwrap();

    let state = tmp.open(AlertRetention::RetainAndFlag);
    assert_eq!(state.prefs().theme, Theme::Light);
    assert!(state.watchlist().is_empty());
    assert!(state.alerts().is_empty());
    assert_eq!(state.prefs().notification_permission, Permission::Denied);
}
