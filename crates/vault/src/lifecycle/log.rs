use super::events::{VaultEvent, VaultEventKind};
use crate::error::Result;
use tick_vault_domain::PoolId;
use tracing::info;

/// Append-only, in-memory history of vault events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<VaultEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event and emits it as a tracing line.
    pub fn record(&mut self, pool: &PoolId, kind: VaultEventKind) -> &VaultEvent {
        let event = VaultEvent::new(pool.clone(), kind);
        info!(
            id = %event.id,
            pool = %event.pool,
            event = event.kind.label(),
            "Vault event"
        );
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn all(&self) -> &[VaultEvent] {
        &self.events
    }

    pub fn for_pool<'a>(&'a self, pool: &'a PoolId) -> impl Iterator<Item = &'a VaultEvent> + 'a {
        self.events.iter().filter(move |e| &e.pool == pool)
    }

    pub fn last(&self) -> Option<&VaultEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events with the given label.
    pub fn count(&self, label: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind.label() == label)
            .count()
    }

    /// Pretty-printed JSON of the whole history.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.events)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick_vault_domain::{Address, TickRange, TokenAmounts};

    #[test]
    fn test_record_and_filter() {
        let mut log = EventLog::new();
        let a = PoolId::new("a");
        let b = PoolId::new("b");

        log.record(
            &a,
            VaultEventKind::Registered {
                tick: 0,
                range: TickRange::new(-6000, 6000),
            },
        );
        log.record(
            &b,
            VaultEventKind::TickWidthUpdated {
                previous: 100,
                width: 10,
            },
        );
        log.record(
            &a,
            VaultEventKind::Deposited {
                actor: Address::from_low_u64_be(1),
                liquidity: 1000,
                shares: 1000,
                amounts: TokenAmounts::new(10, 20),
            },
        );

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_pool(&a).count(), 2);
        assert_eq!(log.count("deposited"), 1);
        assert_eq!(log.last().unwrap().kind.label(), "deposited");
        assert_ne!(log.all()[0].id, log.all()[2].id);
        assert!(log.all()[0].timestamp <= log.all()[2].timestamp);
    }

    #[test]
    fn test_history_serializes() {
        let mut log = EventLog::new();
        log.record(
            &PoolId::new("a"),
            VaultEventKind::Rebalanced {
                tick: 7000,
                old_range: TickRange::new(-6000, 6000),
                new_range: TickRange::new(960, 12960),
                liquidity: 1000,
            },
        );
        let json = log.to_json().unwrap();
        assert!(json.contains("rebalanced"));
        assert!(json.contains("12960"));

        let back: Vec<VaultEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log.all());
    }
}
