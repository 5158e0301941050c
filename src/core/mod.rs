//! The departure watch loop.
//!
//! [`Controller`] owns one watch: it turns the light on, syncs the departure
//! board on the configured interval, drives the light through the matching
//! zone and watches for the three ways a cycle ends (a shutdown signal, a
//! kill-switch press, a fatal feed mismatch). With a start switch configured
//! it additionally runs an outer idle loop, arming a fresh watch on every
//! activation.
//!
//! Everything advances on a one-second tick. Signals and the kill switch are
//! checked every tick; the schedule only when its countdown expires. The
//! first sync happens immediately so the light never shows a stale zone at
//! the start of a watch.

use std::collections::HashSet;
use std::thread;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::constants::{DEFAULT_IGNORE_BUTTONS, DEFAULT_NO_RESET_BUTTONS, TICK};
use crate::hue::{KillSwitch, LightControl, StartSwitch};
use crate::schedule::{FetchError, ScheduleSource, ScheduleUpdate};
use crate::signals::SignalState;
use crate::zone::Zone;

/// How a watch cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleEnd {
    /// SIGINT or SIGTERM; the program exits after this cycle.
    Signal,
    /// A kill-switch press with the offending button code. With a start
    /// switch configured the program returns to idle instead of exiting.
    Button(u32),
}

pub struct Controller {
    schedule: Box<dyn ScheduleSource>,
    lights: Box<dyn LightControl>,
    kill_switch: Option<KillSwitch>,
    start_switch: Option<StartSwitch>,
    signals: SignalState,
    interval: u64,
    ignore_buttons: HashSet<u32>,
    no_reset_buttons: HashSet<u32>,
    last_zone: Option<Zone>,
    ticks_since_sync: u64,
}

impl Controller {
    pub fn new(
        schedule: Box<dyn ScheduleSource>,
        lights: Box<dyn LightControl>,
        kill_switch: Option<KillSwitch>,
        start_switch: Option<StartSwitch>,
        signals: SignalState,
        config: &Config,
    ) -> Self {
        let buttons = |override_set: Option<&Vec<u32>>, defaults: &[u32]| {
            override_set
                .map(|set| set.iter().copied().collect())
                .unwrap_or_else(|| defaults.iter().copied().collect())
        };
        let kill_config = config.kill_switch();
        Self {
            schedule,
            lights,
            kill_switch,
            start_switch,
            signals,
            interval: config.transit.interval,
            ignore_buttons: buttons(
                kill_config.and_then(|k| k.ignore_buttons.as_ref()),
                DEFAULT_IGNORE_BUTTONS,
            ),
            no_reset_buttons: buttons(
                kill_config.and_then(|k| k.no_reset_buttons.as_ref()),
                DEFAULT_NO_RESET_BUTTONS,
            ),
            last_zone: None,
            ticks_since_sync: 0,
        }
    }

    /// Run until a shutdown signal (or, without a start switch, until the
    /// first cycle ends for any reason).
    pub fn run(&mut self) -> Result<()> {
        if self.start_switch.is_none() {
            self.run_cycle()?;
            return Ok(());
        }
        loop {
            log_block_start!("Waiting for the start switch");
            if !self.wait_for_start()? {
                log_decorated!("Shutdown requested while idle");
                return Ok(());
            }
            if self.run_cycle()? == CycleEnd::Signal {
                return Ok(());
            }
        }
    }

    /// Idle until the start switch fires. `false` means a shutdown signal
    /// arrived first.
    fn wait_for_start(&mut self) -> Result<bool> {
        loop {
            if self.signals.terminate_requested() || self.signals.interrupt_caught() {
                return Ok(false);
            }
            if let Some(switch) = self.start_switch.as_mut()
                && switch.poll().context("failed to poll the start switch")?
            {
                return Ok(true);
            }
            thread::sleep(TICK);
        }
    }

    /// One complete watch: light on, immediate sync, then the tick loop.
    fn run_cycle(&mut self) -> Result<CycleEnd> {
        log_block_start!("Starting departure watch");
        self.last_zone = None;
        self.ticks_since_sync = 0;
        if let Some(kill) = self.kill_switch.as_mut() {
            kill.rearm();
        }
        self.lights
            .turn_on()
            .context("failed to turn the light on")?;
        self.sync_lights()?;

        let end = loop {
            if let Some(end) = self.check_for_end()? {
                break end;
            }
            thread::sleep(TICK);
            self.ticks_since_sync += 1;
            if self.ticks_since_sync >= self.interval {
                self.ticks_since_sync = 0;
                self.sync_lights()?;
            }
        };

        self.finish_cycle(&end);
        Ok(end)
    }

    /// Fetch the board and move the light to the matching zone.
    ///
    /// A transport failure only skips this sync; the light keeps its last
    /// zone and the next interval tries again. An undecodable payload is
    /// fatal. The light is rewritten on a zone change, and every sync for
    /// zones that re-trigger their effect.
    fn sync_lights(&mut self) -> Result<()> {
        let zone = match self.schedule.fetch() {
            Ok(update) => {
                log_update(&update);
                zone_for_update(&update)
            }
            Err(FetchError::Transport(err)) => {
                log_warning!("Skipping this sync: {}", err);
                return Ok(());
            }
            Err(err @ FetchError::Decode(_)) => {
                return Err(err).context("transit feed is not usable");
            }
        };

        if self.last_zone != Some(zone) || self.lights.zone_forces_reapply(zone) {
            self.lights
                .apply_zone(zone)
                .context("failed to update the light")?;
            self.last_zone = Some(zone);
        }
        Ok(())
    }

    /// Per-tick end conditions, signals first so a shutdown never loses to a
    /// sensor read.
    fn check_for_end(&mut self) -> Result<Option<CycleEnd>> {
        if self.signals.terminate_requested() {
            log_decorated!("Termination requested, ending watch");
            return Ok(Some(CycleEnd::Signal));
        }
        if self.signals.interrupt_caught() {
            log_decorated!("Interrupted, ending watch");
            return Ok(Some(CycleEnd::Signal));
        }
        let Some(kill) = self.kill_switch.as_mut() else {
            return Ok(None);
        };
        kill.poll().context("failed to poll the kill switch")?;
        let Some(action) = kill.last_action()? else {
            return Ok(None);
        };
        if !action.actioned || self.ignore_buttons.contains(&action.button) {
            return Ok(None);
        }
        log_decorated!("Kill switch pressed (button {}), ending watch", action.button);
        Ok(Some(CycleEnd::Button(action.button)))
    }

    /// Restore the light unless the ending says not to. Restoration is best
    /// effort; a failing bridge must not block shutdown.
    fn finish_cycle(&mut self, end: &CycleEnd) {
        if reset_warranted(end, &self.no_reset_buttons, self.lights.initially_on()) {
            if let Err(err) = self.lights.reset() {
                log_warning!("Could not restore the light: {}", err);
            }
        } else {
            log_decorated!("Leaving the light as it is");
        }
    }
}

/// The zone a fresh update puts the light into. A feed without data, and a
/// board where every departure was filtered out, both mean the warning zone.
fn zone_for_update(update: &ScheduleUpdate) -> Zone {
    match update {
        ScheduleUpdate::Departures(departures) => departures
            .first()
            .map(|departure| departure.zone)
            .unwrap_or(Zone::Warning),
        ScheduleUpdate::NoData => Zone::Warning,
    }
}

/// Signals always restore. A kill-button press restores only when the button
/// is outside the no-reset group and the light was on to begin with.
fn reset_warranted(end: &CycleEnd, no_reset_buttons: &HashSet<u32>, initially_on: bool) -> bool {
    match end {
        CycleEnd::Signal => true,
        CycleEnd::Button(button) => !no_reset_buttons.contains(button) && initially_on,
    }
}

fn log_update(update: &ScheduleUpdate) {
    match update {
        ScheduleUpdate::NoData => log_warning!("No departure data for the stop"),
        ScheduleUpdate::Departures(departures) if departures.is_empty() => {
            log_warning!("No departures left for the watched lines")
        }
        ScheduleUpdate::Departures(departures) => {
            log_block_start!("Upcoming departures");
            for departure in departures.iter().take(3) {
                log_indented!("{}", departure);
            }
        }
    }
}
