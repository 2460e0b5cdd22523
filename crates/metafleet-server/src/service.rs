use std::sync::Arc;

use tracing::error;

use metafleet_cache::{MetadataDispatcher, MetadataSource, SourceError, TenantCacheStore};
use metafleet_core::event::{MetadataChangeEvent, WireMetadataChange};

use crate::audit;
use crate::broadcast::InvalidationBroadcaster;
use crate::metrics::Metrics;

/// Ties the dispatcher and the broadcaster together: local changes are
/// applied here first, then pushed to the fleet; remote changes are only
/// applied.
pub struct MetadataService<S> {
    dispatcher: Arc<MetadataDispatcher<S>>,
    broadcaster: Arc<InvalidationBroadcaster>,
    metrics: Arc<Metrics>,
}

impl<S: MetadataSource + 'static> MetadataService<S> {
    pub fn new(
        dispatcher: Arc<MetadataDispatcher<S>>,
        broadcaster: Arc<InvalidationBroadcaster>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            dispatcher,
            broadcaster,
            metrics,
        }
    }

    pub fn store(&self) -> &Arc<TenantCacheStore<S>> {
        self.dispatcher.store()
    }

    /// Apply a locally originated change and fan it out to the fleet.
    /// Peer delivery failures do not fail the call: the local apply is the
    /// authoritative part, the fleet converges on later events.
    pub async fn update_metadata(&self, event: MetadataChangeEvent) -> Result<(), SourceError> {
        self.dispatcher.apply(&event, true).await?;
        self.metrics.record_event_applied();
        audit::audit_cache_reset(&event, true);

        let broadcaster = Arc::clone(&self.broadcaster);
        let metrics = Arc::clone(&self.metrics);
        let handle = tokio::spawn(async move {
            let report = broadcaster.broadcast(&event).await;
            metrics.record_broadcasts(report.attempted, report.failed);
        });
        if let Err(err) = handle.await {
            error!(%err, "broadcast task panicked");
        }
        Ok(())
    }

    /// Apply a change received from a peer. Returns whether the event was
    /// recognized; unknown entity/operation strings are acknowledged and
    /// dropped so mixed-version fleets keep working.
    pub async fn apply_remote(&self, wire: WireMetadataChange) -> Result<bool, SourceError> {
        let Some(event) = wire.into_event() else {
            self.metrics.record_event_ignored();
            return Ok(false);
        };
        self.dispatcher.apply(&event, false).await?;
        self.metrics.record_event_applied();
        audit::audit_cache_reset(&event, false);
        Ok(true)
    }
}
