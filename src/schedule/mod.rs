//! Departure board fetching and parsing.
//!
//! Talks to the Mobiliteit.lu (HAFAS) departure board API and turns the raw
//! response into zone-tagged [`Departure`] records, filtered to the
//! configured lines and sorted soonest-first.
//!
//! Error taxonomy matters here: transient transport failures are retried a
//! fixed number of times and then abort only the current sync cycle, while
//! an undecodable payload is treated as an environment mismatch and is fatal
//! to the whole program. A response without a `Departure` array is neither:
//! it is a valid degenerate state surfaced as [`ScheduleUpdate::NoData`].

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use reqwest::header;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{TransitConfig, TransitLine};
use crate::constants::{
    HAFAS_DATETIME_FORMAT, SCHEDULE_MAX_ATTEMPTS, SCHEDULE_RETRY_DELAY, TRANSIT_HOST_HEADER,
};
use crate::retry::RetryPolicy;
use crate::zone::{Zone, ZoneThresholds, classify};

/// Failure modes of one fetch cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure after exhausting the retry budget. Aborts the
    /// current sync cycle only; the loop tries again next interval.
    #[error("transit API request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The response body could not be decoded. Signals an API version or
    /// environment mismatch, not a network blip; fatal to the program.
    #[error("transit API payload could not be decoded: {0}")]
    Decode(String),
}

/// Outcome of a successful fetch.
#[derive(Debug)]
pub enum ScheduleUpdate {
    /// Parsed, filtered, zone-tagged departures, soonest first.
    Departures(Vec<Departure>),
    /// The feed carried no `Departure` array at all.
    NoData,
}

/// One upcoming journey at the watched stop. Rebuilt fresh on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub line: String,
    pub direction: String,
    /// Scheduled departure time, as published.
    pub time: NaiveDateTime,
    /// Real-time corrected departure time, when the feed provides one.
    pub rt_time: Option<NaiveDateTime>,
    /// Time to arrival relative to the fetch anchor, floored at zero.
    pub eta: Duration,
    /// Positive lateness relative to schedule, when real-time data exists.
    pub delay: Option<Duration>,
    pub zone: Zone,
}

impl std::fmt::Display for Departure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {} towards {} in {} min",
            self.line,
            self.direction,
            self.eta.num_minutes()
        )?;
        if let Some(delay) = self.delay {
            write!(f, " (+{} min delay)", delay.num_minutes())?;
        }
        Ok(())
    }
}

// Raw feed shapes, deserialized as-is.

#[derive(Debug, Deserialize)]
struct DepartureBoard {
    #[serde(rename = "Departure")]
    departures: Option<Vec<RawJourney>>,
}

#[derive(Debug, Deserialize)]
struct RawJourney {
    #[serde(rename = "Product")]
    product: Product,
    direction: String,
    date: String,
    time: String,
    #[serde(rename = "rtDate")]
    rt_date: Option<String>,
    #[serde(rename = "rtTime")]
    rt_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Product {
    line: String,
}

/// Seam between the controller and the departure feed.
pub trait ScheduleSource {
    fn fetch(&self) -> Result<ScheduleUpdate, FetchError>;
}

/// Connects to the departure board API and produces parsed schedules.
pub struct Schedule {
    client: reqwest::blocking::Client,
    url: String,
    lines: Vec<TransitLine>,
    thresholds: ZoneThresholds,
    retry: RetryPolicy,
}

impl Schedule {
    pub fn new(transit: &TransitConfig, thresholds: ZoneThresholds) -> anyhow::Result<Self> {
        // No request timeout on purpose: the feed can be slow and the retry
        // predicate already covers hung connections reported by the stack.
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            client,
            url: format!("{}{}", transit.api_base_url, transit.stop_id),
            lines: transit.lines.clone(),
            thresholds,
            retry: RetryPolicy::flat(SCHEDULE_MAX_ATTEMPTS, SCHEDULE_RETRY_DELAY),
        })
    }

    /// Fetch and parse the current departure board.
    pub fn fetch(&self) -> Result<ScheduleUpdate, FetchError> {
        let body = self
            .retry
            .run(
                || self.request_body(),
                |err| err.is_connect() || err.is_timeout() || err.is_redirect() || err.is_status(),
                |attempt, _| {
                    log_warning!(
                        "Transit API request failed, try {} of {} ...",
                        attempt,
                        SCHEDULE_MAX_ATTEMPTS
                    );
                },
            )
            .map_err(FetchError::Transport)?;

        self.departures_from_json(&body, minute_anchor(Local::now().naive_local()))
    }

    fn request_body(&self) -> Result<String, reqwest::Error> {
        self.client
            .get(&self.url)
            .header(header::HOST, TRANSIT_HOST_HEADER)
            .send()?
            .error_for_status()?
            .text()
    }

    /// Parse a departure board response body against a fixed "now" anchor.
    ///
    /// Split out from [`fetch`](Self::fetch) so the parsing pipeline can be
    /// exercised without a network.
    pub fn departures_from_json(
        &self,
        body: &str,
        anchor: NaiveDateTime,
    ) -> Result<ScheduleUpdate, FetchError> {
        let board: DepartureBoard =
            serde_json::from_str(body).map_err(|err| FetchError::Decode(err.to_string()))?;

        let Some(raw) = board.departures else {
            return Ok(ScheduleUpdate::NoData);
        };

        let mut departures = Vec::new();
        for journey in &raw {
            if !self.matches_allow_list(journey) {
                continue;
            }
            departures.push(self.parse_journey(journey, anchor)?);
        }
        // Stable sort: equal-ETA entries keep feed order.
        departures.sort_by_key(|departure| departure.eta);

        Ok(ScheduleUpdate::Departures(departures))
    }

    /// A journey is kept when its line number is on the allow-list and its
    /// direction contains the configured substring. A line that does not
    /// parse as a number can never match and is dropped.
    fn matches_allow_list(&self, journey: &RawJourney) -> bool {
        let Ok(number) = journey.product.line.trim().parse::<u32>() else {
            return false;
        };
        self.lines
            .iter()
            .any(|line| line.number == number && journey.direction.contains(&line.direction))
    }

    fn parse_journey(
        &self,
        journey: &RawJourney,
        anchor: NaiveDateTime,
    ) -> Result<Departure, FetchError> {
        let scheduled = parse_feed_datetime(&journey.date, &journey.time)?;
        let rt_time = match (&journey.rt_date, &journey.rt_time) {
            (Some(date), Some(time)) => Some(parse_feed_datetime(date, time)?),
            _ => None,
        };

        let basis = rt_time.unwrap_or(scheduled);
        let eta = (basis - anchor).max(Duration::zero());
        let delay = rt_time.and_then(|rt| {
            let lateness = rt - scheduled;
            (lateness > Duration::zero()).then_some(lateness)
        });

        Ok(Departure {
            line: journey.product.line.clone(),
            direction: journey.direction.clone(),
            time: scheduled,
            rt_time,
            eta,
            delay,
            zone: classify(eta.num_minutes(), &self.thresholds),
        })
    }
}

impl ScheduleSource for Schedule {
    fn fetch(&self) -> Result<ScheduleUpdate, FetchError> {
        Schedule::fetch(self)
    }
}

/// Truncate an instant to the whole minute. One anchor is captured per fetch
/// so every departure in a batch shares the same ETA basis.
fn minute_anchor(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

fn parse_feed_datetime(date: &str, time: &str) -> Result<NaiveDateTime, FetchError> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), HAFAS_DATETIME_FORMAT).map_err(|err| {
        FetchError::Decode(format!("bad journey timestamp '{date} {time}': {err}"))
    })
}
