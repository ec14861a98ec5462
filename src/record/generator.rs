//! Synthetic call generator
//!
//! Produces plausible call-detail records for a subscriber over the last
//! `offset_days` days. The handset is picked once per generator, the way a
//! single subscriber keeps the same phone for a whole billing run.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::call::{Batch, CallRecord, CallType, Device};
use super::partition::PartitionKeyError;

const DOMESTIC_NUMBER_FORMAT: &str = "091-###-###-####";
const INTERNATIONAL_NUMBER_FORMAT: &str = "0##-###-###-####";

/// Largest look-back window accepted for generated start times (about 100 years)
pub const MAX_OFFSET_DAYS: u32 = 36_500;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("offset of {offset_days} days puts the call start outside the calendar")]
    StartOutOfRange { offset_days: u32 },

    #[error(transparent)]
    PartitionKey(#[from] PartitionKeyError),
}

/// Knobs for a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Calls are spread over `[today - offset_days, today]`
    pub offset_days: u32,
    /// Fixed subscriber; a fresh random number is drawn per call when `None`
    pub subscriber: Option<String>,
    pub base_location_id: u32,
    pub location_count: u32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            offset_days: 90,
            subscriber: None,
            base_location_id: 5,
            location_count: 5,
        }
    }
}

pub struct CallGenerator {
    rng: StdRng,
    options: GeneratorOptions,
    device: Device,
    today: NaiveDate,
}

impl CallGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self::from_rng(StdRng::from_os_rng(), options, Local::now().date_naive())
    }

    /// Reproducible generator anchored at a fixed "today"
    pub fn with_seed(seed: u64, options: GeneratorOptions, today: NaiveDate) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), options, today)
    }

    fn from_rng(mut rng: StdRng, options: GeneratorOptions, today: NaiveDate) -> Self {
        let device = if rng.random_bool(0.5) {
            Device::new("Android 10", "OnePlus 7")
        } else {
            Device::new("iOS 15", "iPhone 12")
        };

        Self {
            rng,
            options,
            device,
            today,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn next_call(&mut self) -> Result<CallRecord, GenerateError> {
        let id = uuid::Builder::from_random_bytes(self.rng.random()).into_uuid();
        let subscriber_id = match self.options.subscriber.as_deref() {
            Some(subscriber) if !subscriber.is_empty() => subscriber.to_string(),
            _ => self.phone_number(DOMESTIC_NUMBER_FORMAT),
        };

        let duration_secs = self.rng.random_range(5..=500);
        let start = self.random_start()?;
        let call_location_id = self.rng.random_range(1..=self.options.location_count.max(1));

        let (counterparty, call_type) = if self.rng.random_bool(0.5) {
            (
                self.phone_number(INTERNATIONAL_NUMBER_FORMAT),
                CallType::International,
            )
        } else {
            let call_type = if self.rng.random_bool(0.5) {
                CallType::Local
            } else {
                CallType::National
            };
            (self.phone_number(DOMESTIC_NUMBER_FORMAT), call_type)
        };

        let is_incoming = self.rng.random_bool(0.5);

        let record = CallRecord::builder()
            .id(id.to_string())
            .subscriber_id(subscriber_id)
            .start(start)
            .duration_secs(duration_secs)
            .counterparty(counterparty)
            .call_type(call_type)
            .call_location_id(call_location_id)
            .base_location_id(self.options.base_location_id)
            .is_incoming(is_incoming)
            .device(self.device.clone())
            .build()?;

        Ok(record)
    }

    /// Generate `count` calls in order
    pub fn generate(&mut self, count: usize) -> Result<Batch, GenerateError> {
        let mut records = Vec::with_capacity(count);
        for i in 1..=count {
            let record = self.next_call()?;
            tracing::debug!(n = i, id = record.id(), pk = %record.partition_key(), "Generated fake call");
            records.push(record);
        }
        Ok(Batch::new(records))
    }

    fn random_start(&mut self) -> Result<NaiveDateTime, GenerateError> {
        let offset_days = self.options.offset_days;
        let days = if offset_days > 0 {
            self.rng.random_range(-i64::from(offset_days)..=0)
        } else {
            0
        };
        let hours = self.rng.random_range(0..=23);
        let minutes = self.rng.random_range(0..=59);
        let seconds = self.rng.random_range(0..=59);
        let time_of_day =
            Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds);

        self.today
            .and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::days(days))
            .and_then(|day| day.checked_add_signed(time_of_day))
            .ok_or(GenerateError::StartOutOfRange { offset_days })
    }

    /// Replace each `#` in `format` with a random digit
    fn phone_number(&mut self, format: &str) -> String {
        format
            .chars()
            .map(|c| {
                if c == '#' {
                    char::from(b'0' + self.rng.random_range(0..10u8))
                } else {
                    c
                }
            })
            .collect()
    }
}
