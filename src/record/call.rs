use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::partition::{PartitionKey, PartitionKeyError, bill_cycle_label};

/// Handset the subscriber placed the call from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "Make")]
    pub make: String,
}

impl Device {
    pub fn new(os: impl Into<String>, make: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            make: make.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Local,
    National,
    International,
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallType::Local => "local",
            CallType::National => "national",
            CallType::International => "international",
        };
        f.write_str(name)
    }
}

/// One call-detail record as persisted in the container
///
/// Values are immutable once built: the bill cycle and partition key are
/// derived from the subscriber and start time inside the builder, so they can
/// never drift from the fields they summarize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallRecord {
    #[serde(rename = "id")]
    id: String,
    #[serde(rename = "StartDateTime")]
    start: NaiveDateTime,
    #[serde(rename = "EndDateTime")]
    end: NaiveDateTime,
    #[serde(rename = "DurationSec")]
    duration_secs: u32,
    call_from: String,
    call_to: String,
    call_type: CallType,
    call_location_id: u32,
    base_location_id: u32,
    is_roaming: bool,
    is_incoming: bool,
    subscriber_id: String,
    bill_cycle: String,
    #[serde(rename = "pk")]
    pk: PartitionKey,
    #[serde(rename = "device")]
    device: Device,
}

#[bon::bon]
impl CallRecord {
    #[builder]
    pub fn new(
        #[builder(into, default = Uuid::new_v4().to_string())] id: String,
        #[builder(into)] subscriber_id: String,
        start: NaiveDateTime,
        duration_secs: u32,
        #[builder(into)] counterparty: String,
        call_type: CallType,
        call_location_id: u32,
        base_location_id: u32,
        #[builder(default)] is_incoming: bool,
        device: Device,
    ) -> Result<Self, PartitionKeyError> {
        let pk = PartitionKey::derive(&subscriber_id, start)?;
        let end = start + Duration::seconds(i64::from(duration_secs));

        let (call_from, call_to) = if is_incoming {
            (counterparty, subscriber_id.clone())
        } else {
            (subscriber_id.clone(), counterparty)
        };

        Ok(Self {
            id,
            start,
            end,
            duration_secs,
            call_from,
            call_to,
            call_type,
            call_location_id,
            base_location_id,
            is_roaming: call_location_id != base_location_id,
            is_incoming,
            bill_cycle: bill_cycle_label(start),
            subscriber_id,
            pk,
            device,
        })
    }
}

impl CallRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn partition_key(&self) -> &PartitionKey {
        &self.pk
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    pub fn bill_cycle(&self) -> &str {
        &self.bill_cycle
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn call_from(&self) -> &str {
        &self.call_from
    }

    pub fn call_to(&self) -> &str {
        &self.call_to
    }

    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    pub fn call_location_id(&self) -> u32 {
        self.call_location_id
    }

    pub fn base_location_id(&self) -> u32 {
        self.base_location_id
    }

    pub fn is_roaming(&self) -> bool {
        self.is_roaming
    }

    pub fn is_incoming(&self) -> bool {
        self.is_incoming
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

/// Ordered, read-only sequence of records handed to the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    records: Vec<CallRecord>,
}

impl Batch {
    pub fn new(records: Vec<CallRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CallRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }
}

impl From<Vec<CallRecord>> for Batch {
    fn from(records: Vec<CallRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<CallRecord> for Batch {
    fn from_iter<I: IntoIterator<Item = CallRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a CallRecord;
    type IntoIter = std::slice::Iter<'a, CallRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample(is_incoming: bool) -> CallRecord {
        CallRecord::builder()
            .id("call-1")
            .subscriber_id("091-123-456-7890")
            .start(
                NaiveDateTime::parse_from_str("2023-07-15T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap(),
            )
            .duration_secs(90)
            .counterparty("044-555-000-1111")
            .call_type(CallType::International)
            .call_location_id(3)
            .base_location_id(5)
            .is_incoming(is_incoming)
            .device(Device::new("iOS 15", "iPhone 12"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_derives_fields() {
        let record = sample(false);

        assert_eq!(record.partition_key().as_str(), "091-123-456-7890.JUL2023");
        assert_eq!(record.bill_cycle(), "JUL2023");
        assert_eq!(record.end().to_string(), "2023-07-15 10:01:30");
        assert!(record.is_roaming());
        assert_eq!(record.call_from(), "091-123-456-7890");
        assert_eq!(record.call_to(), "044-555-000-1111");
    }

    #[test]
    fn test_incoming_swaps_direction() {
        let record = sample(true);
        assert_eq!(record.call_from(), "044-555-000-1111");
        assert_eq!(record.call_to(), "091-123-456-7890");
    }

    #[test]
    fn test_serialized_document_shape() {
        let value = serde_json::to_value(sample(false)).unwrap();

        assert_eq!(value["id"], "call-1");
        assert_eq!(value["pk"], "091-123-456-7890.JUL2023");
        assert_eq!(value["StartDateTime"], "2023-07-15T10:00:00");
        assert_eq!(value["DurationSec"], 90);
        assert_eq!(value["CallType"], "international");
        assert_eq!(value["IsRoaming"], true);
        assert_eq!(value["BillCycle"], "JUL2023");
        assert_eq!(value["device"]["OS"], "iOS 15");
        assert!(matches!(value.get("Pk"), None | Some(Value::Null)));
    }

    #[test]
    fn test_generated_id_is_uuid() {
        let record = CallRecord::builder()
            .subscriber_id("s")
            .start(chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
            .duration_secs(5)
            .counterparty("c")
            .call_type(CallType::Local)
            .call_location_id(5)
            .base_location_id(5)
            .device(Device::new("Android 10", "OnePlus 7"))
            .build()
            .unwrap();

        assert!(Uuid::parse_str(record.id()).is_ok());
        assert!(!record.is_roaming());
    }

    #[test]
    fn test_records_are_write_only() {
        use serde::de::DeserializeOwned;
        use std::marker::PhantomData;

        struct Check<T>(PhantomData<T>);

        trait Fallback {
            fn deserializable(&self) -> bool {
                false
            }
        }
        impl<T> Fallback for Check<T> {}

        impl<T: DeserializeOwned> Check<T> {
            fn deserializable(&self) -> bool {
                true
            }
        }

        // Derived fields (pk, BillCycle) can only come from the builder
        assert!(!Check::<CallRecord>(PhantomData).deserializable());
        assert!(Check::<PartitionKey>(PhantomData).deserializable());
    }
}
