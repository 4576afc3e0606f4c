use std::collections::HashMap;

use super::domain::{AccessLogEntry, AccessStatus, Token};

/// Where a visitor is assumed to be before their first allowed scan.
pub const RECEPTION: &str = "Reception";

/// Location of the latest allowed scan for `token`, or [`RECEPTION`].
///
/// Equal timestamps resolve to the entry appearing later in `log`.
pub fn current_location<'a>(token: &Token, log: &'a [AccessLogEntry]) -> &'a str {
    log.iter()
        .filter(|entry| &entry.token == token && entry.status == AccessStatus::Allowed)
        .fold(None::<&AccessLogEntry>, |latest, entry| match latest {
            Some(best) if best.timestamp > entry.timestamp => Some(best),
            _ => Some(entry),
        })
        .map_or(RECEPTION, |entry| entry.location.as_str())
}

/// Latest allowed scan per token, built in one pass over a log snapshot.
#[derive(Debug, Default)]
pub struct LocationIndex<'a> {
    latest: HashMap<&'a Token, &'a AccessLogEntry>,
}

impl<'a> LocationIndex<'a> {
    pub fn build(log: &'a [AccessLogEntry]) -> Self {
        let mut latest: HashMap<&'a Token, &'a AccessLogEntry> = HashMap::new();
        for entry in log
            .iter()
            .filter(|entry| entry.status == AccessStatus::Allowed)
        {
            latest
                .entry(&entry.token)
                .and_modify(|best| {
                    if entry.timestamp >= best.timestamp {
                        *best = entry;
                    }
                })
                .or_insert(entry);
        }
        Self { latest }
    }

    pub fn location_of(&self, token: &Token) -> &'a str {
        self.latest
            .get(token)
            .map_or(RECEPTION, |entry| entry.location.as_str())
    }
}
