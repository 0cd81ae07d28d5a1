//! Read models folded straight from the event store on every read. Nothing is projected ahead
//! of time, so a read always reflects every decision made so far.

use disintegrate::{Event, EventStore as _, StreamQuery};
use futures::stream::StreamExt;

use crate::{
    domain::{DomainEvent, EventStore},
    infra::ClientError,
};

/// Folds every event matching `query` into a read model, oldest first.
pub async fn read_from_events<RM, QE, AE>(
    event_store: &EventStore,
    query: &StreamQuery<i64, QE>,
    initial_read_model: RM,
    apply_event: AE,
) -> Result<RM, EventReadingError>
where
    QE: TryFrom<DomainEvent> + Event + Clone + Send + Sync + 'static,
    <QE as TryFrom<DomainEvent>>::Error: std::error::Error + Send + Sync + 'static,
    AE: Fn(RM, QE) -> RM,
{
    let mut events = event_store.stream(query);
    let mut read_model = initial_read_model;
    let mut last_event_id = None;

    while let Some(event) = events.next().await {
        let event = event.map_err(|source| EventReadingError {
            last_event_id,
            source,
        })?;
        last_event_id = Some(event.id());
        read_model = apply_event(read_model, event.into_inner());
    }

    Ok(read_model)
}

#[derive(Debug, thiserror::Error)]
#[error("Reading events failed after event {last_event_id:?}.")]
pub struct EventReadingError {
    pub last_event_id: Option<i64>,
    #[source]
    pub source: disintegrate_postgres::Error,
}

impl From<EventReadingError> for ClientError {
    fn from(value: EventReadingError) -> Self {
        ClientError::Internal(anyhow::Error::new(value))
    }
}
