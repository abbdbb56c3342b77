//! # Mock Framework
//!
//! Utilities for testing code that talks to a live collection without
//! running a [`CollectionActor`](crate::live_collection::CollectionActor).
//!
//! [`create_mock_collection`] returns a client and the receiver its requests
//! land on; the `expect_*` helpers pull the next request and hand back its
//! reply channel so the test decides what the "backend" answers.

use tokio::sync::mpsc;

use crate::live_collection::{
    CollectionClient, CollectionRequest, Outbox, Record, Response, Sink, Snapshot, Subscription,
};

pub fn create_mock_collection<T: Record>(
    buffer_size: usize,
) -> (CollectionClient<T>, mpsc::Receiver<CollectionRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (CollectionClient::new(sender), receiver)
}

/// Next message must be a Subscribe request.
pub async fn expect_subscribe<T: Record>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
) -> Option<(Sink<T>, Response<Subscription>)> {
    match receiver.recv().await {
        Some(CollectionRequest::Subscribe { sink, respond_to }) => Some((sink, respond_to)),
        _ => None,
    }
}

/// Accepts the next Subscribe request and returns the outbox that feeds the
/// subscriber, as the real collection would hold it.
pub async fn accept_subscription<T: Record>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
    id: u64,
) -> Option<Outbox<T>> {
    let (sink, respond_to) = expect_subscribe(receiver).await?;
    let (subscription, outbox) = Subscription::spawn(id, sink);
    respond_to.send(Ok(subscription)).ok()?;
    Some(outbox)
}

/// Next message must be a Snapshot request.
pub async fn expect_snapshot<T: Record>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
) -> Option<Response<Snapshot<T>>> {
    match receiver.recv().await {
        Some(CollectionRequest::Snapshot { respond_to }) => Some(respond_to),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_collection() {
        let (client, mut receiver) = create_mock_collection::<Product>(10);

        let snapshot_task = tokio::spawn(async move { client.snapshot().await });

        let responder = expect_snapshot(&mut receiver)
            .await
            .expect("Expected Snapshot request");
        let products = vec![Product::new("p1", "Turmeric", dec!(150), dec!(12))];
        responder.send(Ok(Snapshot::new(7, products))).unwrap();

        let snapshot = snapshot_task.await.unwrap().unwrap();
        assert_eq!(snapshot.revision(), 7);
        assert_eq!(snapshot.records()[0].name, "Turmeric");
    }
}
