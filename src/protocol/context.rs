//! Context handed to translation handlers.
//!
//! [`BridgeContext`] is built once per process and shared by `Arc`;
//! [`SessionState`] belongs to exactly one connection.

use super::generation::Generation;
use crate::config::{BridgeConfig, LayoutSet, MAX_FRAME_BODY};
use crate::error::{BridgeError, Result};
use crate::identity::{RealmId, WideGuid};
use crate::time::{LoopTime, ServerTime, Timezone};
use crate::utils::Metrics;

/// Process-wide, read-mostly settings and counters.
#[derive(Debug)]
pub struct BridgeContext {
    legacy: Generation,
    modern: Generation,
    realm_address: u32,
    timezone: Timezone,
    layouts: LayoutSet,
    max_frame_body: usize,
    metrics: Metrics,
    started: ServerTime,
}

impl BridgeContext {
    /// Context with built-in frame layouts for the two generations.
    pub fn new(
        legacy: Generation,
        modern: Generation,
        realm_address: u32,
        timezone: Timezone,
    ) -> Result<Self> {
        if !legacy.is_legacy() {
            return Err(BridgeError::UnsupportedGeneration(legacy));
        }
        if modern.is_legacy() {
            return Err(BridgeError::UnsupportedGeneration(modern));
        }
        Ok(Self {
            legacy,
            modern,
            realm_address,
            timezone,
            layouts: LayoutSet::for_generations(legacy, modern),
            max_frame_body: MAX_FRAME_BODY,
            metrics: Metrics::new(),
            started: ServerTime::now(),
        })
    }

    /// Validate `config` and build the context it describes.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        config.validate_strict()?;
        let bridge = &config.bridge;
        Ok(Self::new(
            bridge.legacy_generation,
            bridge.modern_generation,
            bridge.virtual_realm_address,
            config.timezone.timezone()?,
        )?
        .with_layouts(config.frames.resolve(bridge))
        .with_max_frame_body(bridge.max_frame_body))
    }

    pub fn with_layouts(mut self, layouts: LayoutSet) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn with_max_frame_body(mut self, max: usize) -> Self {
        self.max_frame_body = max;
        self
    }

    /// Override the process start used for uptime.
    pub fn with_started(mut self, started: ServerTime) -> Self {
        self.started = started;
        self
    }

    pub fn legacy(&self) -> Generation {
        self.legacy
    }

    pub fn modern(&self) -> Generation {
        self.modern
    }

    pub fn realm_address(&self) -> u32 {
        self.realm_address
    }

    pub fn realm_id(&self) -> RealmId {
        RealmId::from_address(self.realm_address)
    }

    pub fn timezone(&self) -> &Timezone {
        &self.timezone
    }

    pub fn layouts(&self) -> &LayoutSet {
        &self.layouts
    }

    pub fn max_frame_body(&self) -> usize {
        self.max_frame_body
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn started(&self) -> ServerTime {
        self.started
    }

    /// Snapshot of the clocks at `now`.
    pub fn loop_time(&self, now: ServerTime) -> Result<LoopTime> {
        LoopTime::capture(self.started, now, &self.timezone)
    }
}

/// Per-connection values learnt from earlier messages.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Player chosen at login, once known
    pub current_player: Option<WideGuid>,
    /// Clocks as of the current pump; unset before the first one
    pub clock: Option<LoopTime>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current player, or the empty identifier before login.
    pub fn player_or_empty(&self) -> WideGuid {
        self.current_player.unwrap_or(WideGuid::EMPTY)
    }
}

/// Everything a handler may consult or update.
pub struct HandlerContext<'a> {
    pub bridge: &'a BridgeContext,
    pub session: &'a mut SessionState,
    /// Generation the message being handled was written in
    pub source: Generation,
}

impl<'a> HandlerContext<'a> {
    pub fn new(bridge: &'a BridgeContext, session: &'a mut SessionState, source: Generation) -> Self {
        Self {
            bridge,
            session,
            source,
        }
    }
}
