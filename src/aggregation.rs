//! Folds raw transaction records into one profile per client.
//!
//! Aggregation is lenient: a record without a client id cannot be attributed
//! to anyone and is skipped, a record without a phone still counts as an
//! order. Both cases are counted in the outcome so they stay visible.
//!
//! The first record seen for a client is canonical for name and address;
//! later records never overwrite them, even when they differ.
use crate::contact::ContactRecord;
use crate::models::{ClientProfile, OrderHistoryEntry, TransactionRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Profiles plus the bookkeeping of what was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationOutcome {
    pub profiles: Vec<ClientProfile>,
    pub records_seen: usize,
    pub skipped_without_client_id: usize,
    pub records_without_phone: usize,
}

impl AggregationOutcome {
    pub fn records_folded(&self) -> usize {
        self.records_seen - self.skipped_without_client_id
    }
}

/// Profile under construction; phones are tracked through a `ContactRecord`.
struct ProfileBuilder {
    profile: ClientProfile,
    contact: ContactRecord,
}

impl ProfileBuilder {
    fn seed(client_id: String, record: &TransactionRecord) -> Self {
        Self {
            profile: ClientProfile {
                client_id,
                name: non_blank(&record.name).unwrap_or_default(),
                email: non_blank(&record.email),
                primary_phone: None,
                alternate_phones: Vec::new(),
                address: compose_address(record),
                street: non_blank(&record.street),
                postal_code: non_blank(&record.postal_code),
                city: non_blank(&record.city),
                order_count: 0,
                last_order_date: None,
                order_history: Vec::new(),
            },
            contact: ContactRecord::default(),
        }
    }

    fn fold(&mut self, record: &TransactionRecord) {
        self.profile.order_count += 1;
        self.profile.order_history.push(history_entry(record));
        self.profile.last_order_date = latest(self.profile.last_order_date, record.order_date);

        if self.profile.email.is_none() {
            self.profile.email = non_blank(&record.email);
        }
        if let Some(phone) = non_blank(&record.phone) {
            self.contact.add(&phone);
        }
    }

    fn build(self) -> ClientProfile {
        let (primary_phone, alternate_phones) = self.contact.into_parts();
        ClientProfile {
            primary_phone,
            alternate_phones,
            ..self.profile
        }
    }
}

/// Builds one profile per distinct client id, in first-seen order.
pub fn aggregate_clients(records: &[TransactionRecord]) -> AggregationOutcome {
    let mut builders: Vec<ProfileBuilder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped_without_client_id = 0;
    let mut records_without_phone = 0;

    for record in records {
        let Some(client_id) = non_blank(&record.client_id) else {
            skipped_without_client_id += 1;
            continue;
        };
        if non_blank(&record.phone).is_none() {
            records_without_phone += 1;
        }

        let position = *index.entry(client_id.clone()).or_insert_with(|| {
            builders.push(ProfileBuilder::seed(client_id.clone(), record));
            builders.len() - 1
        });
        builders[position].fold(record);
    }

    let outcome = AggregationOutcome {
        profiles: builders.into_iter().map(ProfileBuilder::build).collect(),
        records_seen: records.len(),
        skipped_without_client_id,
        records_without_phone,
    };

    if skipped_without_client_id > 0 {
        tracing::warn!(
            "Aggregation skipped {} of {} record(s) without client id",
            skipped_without_client_id,
            records.len()
        );
    }
    tracing::info!(
        "Aggregated {} record(s) into {} client profile(s) ({} without phone)",
        outcome.records_folded(),
        outcome.profiles.len(),
        records_without_phone
    );

    outcome
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Full address if recorded, otherwise `street, postal city` from the parts.
fn compose_address(record: &TransactionRecord) -> String {
    if let Some(address) = non_blank(&record.address) {
        return address;
    }

    let locality = [non_blank(&record.postal_code), non_blank(&record.city)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    [non_blank(&record.street), Some(locality).filter(|l| !l.is_empty())]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
}

fn history_entry(record: &TransactionRecord) -> OrderHistoryEntry {
    let device_info = [non_blank(&record.device_type), non_blank(&record.brand)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    OrderHistoryEntry {
        order_ref: non_blank(&record.order_ref),
        date: record.order_date,
        device_info,
        status: non_blank(&record.status),
        problem: non_blank(&record.problem),
    }
}

fn latest(current: Option<DateTime<Utc>>, candidate: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
