//! Async station runtime: shared engine, event fan-out and the tick task

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use voltbay_api::{
    Authenticated, ChargeDurations, DurationSlot, Event, SessionInfo, StationEvent,
    StationSnapshot,
};
use voltbay_config::{CountdownPolicy, DEFAULT_TICK_INTERVAL, StationConfig};
use voltbay_store::Store;
use voltbay_util::{Identity, MonotonicInstant, Result, StationError};

use crate::{CoreEvent, StationEngine, StopResult};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Monotonic now, taken from tokio's clock so paused test time applies
fn mono_now() -> MonotonicInstant {
    tokio::time::Instant::now().into_std().into()
}

/// The running station.
///
/// Every operation locks the engine for its whole duration, so ticks and
/// commands never interleave. The tick task runs only while a countdown is
/// active.
pub struct Station {
    engine: Arc<Mutex<StationEngine>>,
    events: broadcast::Sender<Event>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
}

impl Station {
    /// Build the runtime. A `per_tick` countdown removes one second per
    /// tick, so it only runs with a one-second tick interval.
    pub fn new(config: &StationConfig, store: Arc<dyn Store>) -> Result<Self> {
        let tick_interval = config.station.tick_interval;
        if tick_interval.is_zero() {
            return Err(StationError::config("tick interval must be greater than zero"));
        }
        if config.station.countdown == CountdownPolicy::PerTick
            && tick_interval != DEFAULT_TICK_INTERVAL
        {
            return Err(StationError::config(format!(
                "per_tick countdown needs a {} ms tick interval, got {} ms",
                DEFAULT_TICK_INTERVAL.as_millis(),
                tick_interval.as_millis()
            )));
        }

        let engine = StationEngine::new(config, store)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            events,
            ticker: Mutex::new(None),
            tick_interval,
        })
    }

    /// Subscribe to station events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    fn publish(&self, event: CoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(Event::new(event.into()));
    }

    fn publish_state(&self, snapshot: StationSnapshot) {
        let _ = self.events.send(Event::new(StationEvent::StateChanged(snapshot)));
    }

    // Login state

    pub async fn login(&self, code: &str) -> Result<Authenticated> {
        let auth = self.engine.lock().await.login(code)?;
        self.publish(CoreEvent::LoggedIn {
            identity: auth.identity.clone(),
            role: auth.role,
        });
        Ok(auth)
    }

    pub async fn logout(&self) -> Option<Authenticated> {
        let previous = self.engine.lock().await.logout();
        if previous.is_some() {
            self.publish(CoreEvent::LoggedOut);
        }
        previous
    }

    pub async fn current_user(&self) -> Option<Authenticated> {
        self.engine.lock().await.current_user().cloned()
    }

    // Sessions

    /// Start a session for `owner` and (re)start the tick task
    pub async fn start_charging(&self, duration_minutes: u32, owner: &Identity) -> Result<SessionInfo> {
        self.start_with(|engine| {
            engine.start_charging(duration_minutes, owner, voltbay_util::now(), mono_now())
        })
        .await
    }

    /// Start a session for the logged-in user using one of the configured
    /// duration slots. The kiosk asks for a code again to confirm.
    pub async fn start_for_current_user(
        &self,
        slot: DurationSlot,
        confirm_code: &str,
    ) -> Result<SessionInfo> {
        self.start_with(|engine| {
            engine.start_for_current_user(slot, confirm_code, voltbay_util::now(), mono_now())
        })
        .await
    }

    /// Run a start under one engine lock, then restart the tick task
    async fn start_with<F>(&self, start: F) -> Result<SessionInfo>
    where
        F: FnOnce(&mut StationEngine) -> Result<SessionInfo>,
    {
        let mut ticker = self.ticker.lock().await;

        let (info, snapshot) = {
            let mut engine = self.engine.lock().await;
            let info = start(&mut *engine)?;
            (info, engine.snapshot())
        };

        if let Some(old) = ticker.take() {
            old.abort();
        }
        *ticker = Some(self.spawn_ticker());

        self.publish(CoreEvent::SessionStarted(info.clone()));
        self.publish_state(snapshot);
        Ok(info)
    }

    pub async fn stop_charging(&self, code: &str) -> Result<StopResult> {
        let mut ticker = self.ticker.lock().await;

        let (result, needs_tick, snapshot) = {
            let mut engine = self.engine.lock().await;
            let result = engine.stop_charging(code, mono_now())?;
            (result, engine.needs_tick(), engine.snapshot())
        };

        // Other roster entries may still be counting down
        if !needs_tick && let Some(handle) = ticker.take() {
            handle.abort();
        }

        self.publish(CoreEvent::SessionStopped {
            session_id: result.session_id.clone(),
            owner: result.owner.clone(),
            remaining_seconds: result.remaining_seconds,
        });
        self.publish_state(snapshot);
        Ok(result)
    }

    pub async fn acknowledge_completion(&self) -> Result<()> {
        let snapshot = {
            let mut engine = self.engine.lock().await;
            engine.acknowledge_completion()?;
            engine.snapshot()
        };
        self.publish_state(snapshot);
        Ok(())
    }

    pub async fn dismiss(&self, owner: &Identity) -> Result<bool> {
        let (removed, snapshot) = {
            let mut engine = self.engine.lock().await;
            (engine.dismiss(owner)?, engine.snapshot())
        };
        if removed {
            self.publish_state(snapshot);
        }
        Ok(removed)
    }

    pub async fn current_session(&self) -> Option<SessionInfo> {
        self.engine.lock().await.current_session()
    }

    pub async fn roster(&self) -> Vec<SessionInfo> {
        self.engine.lock().await.roster()
    }

    // Emergency latch

    /// Trip the emergency latch. Returns true if it was not already tripped.
    pub async fn trigger_emergency_stop(&self) -> bool {
        let mut ticker = self.ticker.lock().await;

        let (event, snapshot) = {
            let mut engine = self.engine.lock().await;
            let event = engine.trigger_emergency_stop(voltbay_util::now());
            (event, engine.snapshot())
        };

        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let Some(event) = event else {
            return false;
        };
        self.publish(event);
        self.publish_state(snapshot);
        true
    }

    /// Clear the emergency latch. Returns true if it was tripped.
    pub async fn reset_emergency_stop(&self) -> bool {
        let (event, snapshot) = {
            let mut engine = self.engine.lock().await;
            let event = engine.reset_emergency_stop();
            (event, engine.snapshot())
        };

        let Some(event) = event else {
            return false;
        };
        self.publish(event);
        self.publish_state(snapshot);
        true
    }

    pub async fn is_emergency_stop(&self) -> bool {
        self.engine.lock().await.is_emergency_stop()
    }

    // Durations and codes

    pub async fn durations(&self) -> ChargeDurations {
        self.engine.lock().await.durations()
    }

    pub async fn set_durations(&self, durations: ChargeDurations) -> Result<()> {
        self.engine.lock().await.set_durations(durations)?;
        self.publish(CoreEvent::DurationsChanged(durations));
        Ok(())
    }

    pub async fn add_user_code(&self, code: &str) -> Result<usize> {
        let (position, count) = {
            let mut engine = self.engine.lock().await;
            let position = engine.add_user_code(code)?;
            (position, engine.user_code_count())
        };
        self.publish(CoreEvent::UserCodesChanged { count });
        Ok(position)
    }

    pub async fn remove_user_code(&self, code: &str) -> Result<bool> {
        let (removed, count) = {
            let mut engine = self.engine.lock().await;
            let removed = engine.remove_user_code(code)?;
            (removed, engine.user_code_count())
        };
        if removed {
            self.publish(CoreEvent::UserCodesChanged { count });
        }
        Ok(removed)
    }

    pub async fn user_codes(&self) -> Vec<String> {
        self.engine.lock().await.user_codes()
    }

    pub async fn snapshot(&self) -> StationSnapshot {
        self.engine.lock().await.snapshot()
    }

    // Tick task

    /// Whether the tick task is currently running
    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the tick task. Session state is left as it is.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
            info!("Tick task stopped");
        }
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let events = self.events.clone();
        let period = self.tick_interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            debug!(period_ms = period.as_millis() as u64, "Tick task started");

            loop {
                timer.tick().await;

                let (tick_events, keep_going) = {
                    let mut engine = engine.lock().await;
                    let tick_events = engine.tick(mono_now());
                    (tick_events, engine.needs_tick())
                };

                for event in tick_events {
                    let _ = events.send(Event::new(event.into()));
                }

                if !keep_going {
                    debug!("No active countdown, tick task exiting");
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltbay_api::SessionPhase;
    use voltbay_store::SqliteStore;

    fn make_station() -> Station {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        Station::new(&StationConfig::default(), store).unwrap()
    }

    fn config_with(tick_interval: Duration, countdown: CountdownPolicy) -> StationConfig {
        let mut config = StationConfig::default();
        config.station.tick_interval = tick_interval;
        config.station.countdown = countdown;
        config
    }

    #[test]
    fn test_per_tick_rejects_sub_second_interval() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let config = config_with(Duration::from_millis(500), CountdownPolicy::PerTick);
        assert!(matches!(
            Station::new(&config, store.clone()),
            Err(StationError::InvalidConfig(_))
        ));

        let config = config_with(Duration::ZERO, CountdownPolicy::WallClock);
        assert!(matches!(
            Station::new(&config, store),
            Err(StationError::InvalidConfig(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wall_clock_counts_seconds_with_fast_ticks() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let config = config_with(Duration::from_millis(500), CountdownPolicy::WallClock);
        let station = Station::new(&config, store).unwrap();

        station.start_charging(30, &Identity::user(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10_250)).await;

        let current = station.current_session().await.unwrap();
        assert_eq!(current.remaining_seconds, 1790);
        assert!(current.is_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_to_completion() {
        let station = make_station();
        station.start_charging(30, &Identity::user(1)).await.unwrap();
        assert!(station.is_ticking().await);

        tokio::time::sleep(Duration::from_millis(1_800_500)).await;

        let current = station.current_session().await.unwrap();
        assert_eq!(current.remaining_seconds, 0);
        assert_eq!(current.phase, SessionPhase::Completed);
        assert_eq!(station.roster().await.len(), 1);
        assert!(!station.is_ticking().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_after_ten_seconds() {
        let station = make_station();
        station.start_charging(60, &Identity::user(2)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;

        let result = station.stop_charging("9999").await.unwrap();
        assert_eq!(result.remaining_seconds, 3590);
        assert!(station.roster().await.is_empty());
        assert!(!station.is_ticking().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_stop_halts_ticking() {
        let station = make_station();
        station.start_charging(90, &Identity::user(3)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        assert!(station.trigger_emergency_stop().await);
        assert!(!station.trigger_emergency_stop().await);
        assert!(!station.is_ticking().await);
        assert!(station.roster().await.is_empty());

        let frozen = station.current_session().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(station.current_session().await.unwrap(), frozen);

        assert_eq!(
            station.start_charging(30, &Identity::user(3)).await.unwrap_err(),
            StationError::EmergencyActive
        );

        assert!(station.reset_emergency_stop().await);
        assert!(station.current_session().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_double_tick() {
        let station = make_station();
        station.start_charging(30, &Identity::user(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        station.start_charging(30, &Identity::user(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let current = station.current_session().await.unwrap();
        assert_eq!(current.remaining_seconds, 1797);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_broadcast() {
        let station = make_station();
        let mut rx = station.subscribe();

        station.login("1001").await.unwrap();
        assert_eq!(
            station
                .start_for_current_user(DurationSlot::Short, "1234")
                .await
                .unwrap_err(),
            StationError::InvalidCode
        );
        let info = station
            .start_for_current_user(DurationSlot::Short, "1001")
            .await
            .unwrap();
        assert_eq!(info.duration_minutes, 30);
        assert_eq!(info.owner, Identity::user(1));

        assert!(matches!(rx.recv().await.unwrap().payload, StationEvent::LoggedIn { .. }));
        assert!(matches!(
            rx.recv().await.unwrap().payload,
            StationEvent::SessionStarted(_)
        ));
        assert!(matches!(
            rx.recv().await.unwrap().payload,
            StationEvent::StateChanged(_)
        ));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        match rx.recv().await.unwrap().payload {
            StationEvent::SessionTick(info) => assert_eq!(info.remaining_seconds, 1799),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_for_current_user_requires_login() {
        let station = make_station();
        assert!(matches!(
            station.start_for_current_user(DurationSlot::Long, "9999").await,
            Err(StationError::InvalidRequest(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticker() {
        let station = make_station();
        station.start_charging(30, &Identity::user(1)).await.unwrap();
        station.shutdown().await;
        assert!(!station.is_ticking().await);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(station.current_session().await.unwrap().remaining_seconds, 1800);
    }
}
