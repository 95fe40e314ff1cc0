use crate::domain::{Location, LocationId};
use crate::location_collection::{CoordinatesUpdate, LocationCollection};
use crate::repository::{LocationRepository, RepositoryError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::watch::{Receiver as WatchReceiver, Sender as WatchSender};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task;
use tracing::{debug, info, instrument, warn};

pub type StoreSnapshot = Arc<Vec<Location>>;

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum StoreCommand {
    Add {
        name: String,
        address: String,
        reply: Reply<Location>,
    },
    Edit {
        id: LocationId,
        name: String,
        address: String,
        reply: Reply<Location>,
    },
    Delete {
        id: LocationId,
        reply: Reply<Location>,
    },
    ResolveCoordinates {
        updates: Vec<CoordinatesUpdate>,
        reply: Reply<usize>,
    },
}

/// Sole owner and writer of the location collection.
///
/// Every mutation is applied to a copy which is persisted before it replaces the current collection, so a
/// failed save leaves the published state untouched.
pub struct Store {
    collection: LocationCollection,
    repository: Arc<dyn LocationRepository>,
    rx: Receiver<StoreCommand>,
    notifier_tx: WatchSender<StoreSnapshot>,
    notifier_rx: WatchReceiver<StoreSnapshot>,
}

impl Store {
    pub fn new(collection: LocationCollection, repository: Arc<dyn LocationRepository>, rx: Receiver<StoreCommand>) -> Self {
        let (notifier_tx, notifier_rx) = watch::channel::<StoreSnapshot>(Arc::new(collection.all().to_vec()));

        Store {
            collection,
            repository,
            rx,
            notifier_tx,
            notifier_rx,
        }
    }

    pub fn notifier(&self) -> WatchReceiver<StoreSnapshot> {
        self.notifier_rx.clone()
    }

    #[instrument(skip(self))]
    pub async fn listen(&mut self) {
        while let Some(command) = self.rx.recv().await {
            debug!("🔵 Received command: {:?}", command);
            match command {
                StoreCommand::Add { name, address, reply } => {
                    let result = self.commit(|collection| collection.add(&name, &address).cloned()).await;
                    match &result {
                        Ok(location) => info!(location_id = location.id(), "🟢 Added location '{}'", location.name()),
                        Err(e) => warn!("⚠️ Could not add location '{}': {}", name, e),
                    }
                    reply.send(result).unwrap_or_default();
                }
                StoreCommand::Edit { id, name, address, reply } => {
                    let result = self.commit(|collection| collection.edit(id, &name, &address).cloned()).await;
                    match &result {
                        Ok(location) => info!(location_id = id, "🟢 Updated location '{}'", location.name()),
                        Err(e) => warn!(location_id = id, "⚠️ Could not update location: {}", e),
                    }
                    reply.send(result).unwrap_or_default();
                }
                StoreCommand::Delete { id, reply } => {
                    let result = self.commit(|collection| collection.delete(id)).await;
                    match &result {
                        Ok(location) => info!(location_id = id, "🟢 Deleted location '{}'", location.name()),
                        Err(e) => warn!(location_id = id, "⚠️ Could not delete location: {}", e),
                    }
                    reply.send(result).unwrap_or_default();
                }
                StoreCommand::ResolveCoordinates { updates, reply } => {
                    let requested = updates.len();
                    let result = self.commit(|collection| Ok(collection.resolve_coordinates(&updates))).await;
                    match &result {
                        Ok(applied) => debug!("🔵 Cached coordinates of {} location(s), {} stale", applied, requested - applied),
                        Err(e) => warn!("⚠️ Could not cache coordinates: {}", e),
                    }
                    reply.send(result).unwrap_or_default();
                }
            }
        }
    }

    async fn commit<T>(&mut self, mutation: impl FnOnce(&mut LocationCollection) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut next = self.collection.clone();
        let value = mutation(&mut next)?;

        self.repository.save(next.all()).await?;
        self.collection = next;
        self.notifier_tx.send_replace(Arc::new(self.collection.all().to_vec()));

        Ok(value)
    }
}

/// Cloneable access to a running [`Store`].
#[derive(Clone, Debug)]
pub struct StoreHandle {
    tx: Sender<StoreCommand>,
    notifier_rx: WatchReceiver<StoreSnapshot>,
}

impl StoreHandle {
    pub fn new(tx: Sender<StoreCommand>, notifier_rx: WatchReceiver<StoreSnapshot>) -> Self {
        StoreHandle { tx, notifier_rx }
    }

    /// The most recently committed collection.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.notifier_rx.borrow().clone()
    }

    pub async fn add(&self, name: &str, address: &str) -> Result<Location, StoreError> {
        self.request(|reply| StoreCommand::Add {
            name: name.to_string(),
            address: address.to_string(),
            reply,
        })
        .await
    }

    pub async fn edit(&self, id: LocationId, name: &str, address: &str) -> Result<Location, StoreError> {
        self.request(|reply| StoreCommand::Edit {
            id,
            name: name.to_string(),
            address: address.to_string(),
            reply,
        })
        .await
    }

    pub async fn delete(&self, id: LocationId) -> Result<Location, StoreError> {
        self.request(|reply| StoreCommand::Delete { id, reply }).await
    }

    pub async fn resolve_coordinates(&self, updates: Vec<CoordinatesUpdate>) -> Result<usize, StoreError> {
        self.request(|reply| StoreCommand::ResolveCoordinates { updates, reply }).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> StoreCommand) -> Result<T, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(command(reply_tx)).await.map_err(|_| StoreError::Closed)?;
        reply_rx.await.map_err(|_| StoreError::Closed)?
    }
}

/// Starts the store on its own task.
pub fn spawn_store(collection: LocationCollection, repository: Arc<dyn LocationRepository>, buffer_size: usize) -> StoreHandle {
    let (tx, rx) = mpsc::channel::<StoreCommand>(buffer_size);
    let mut store = Store::new(collection, repository, rx);
    let handle = StoreHandle::new(tx, store.notifier());

    task::spawn(async move {
        store.listen().await;
    });

    handle
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("address must not be empty")]
    EmptyAddress,
    #[error("unknown location '{0}'")]
    UnknownLocation(LocationId),
    #[error("no location ids left")]
    IdsExhausted,
    #[error("could not persist locations: {0}")]
    Repository(#[from] RepositoryError),
    #[error("the location store is not running")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;
    use crate::repository::memory::InMemoryRepository;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn start(locations: Vec<Location>) -> (StoreHandle, Arc<InMemoryRepository>) {
        let repository = Arc::new(InMemoryRepository::new());
        let handle = spawn_store(LocationCollection::new(locations), repository.clone(), 1);
        (handle, repository)
    }

    #[test(tokio::test)]
    async fn add_persists_and_publishes_the_collection() -> Result<(), StoreError> {
        let (store, repository) = start(vec![Location::new(1, "Hoàn Kiếm", "1 P. Hàng Trống")]);

        let added = store.add("Long Biên", "1 Nguyễn Văn Cừ").await?;

        let expected = vec![Location::new(1, "Hoàn Kiếm", "1 P. Hàng Trống"), Location::new(2, "Long Biên", "1 Nguyễn Văn Cừ")];
        assert_eq!(added.id(), 2);
        assert_eq!(repository.stored(), Some(expected.clone()));
        assert_eq!(*store.snapshot(), expected);
        Ok(())
    }

    #[test(tokio::test)]
    async fn every_mutation_is_persisted() -> Result<(), StoreError> {
        let (store, repository) = start(vec![]);

        let added = store.add("a", "b").await?;
        store.edit(added.id(), "c", "d").await?;
        store.delete(added.id()).await?;

        assert_eq!(repository.saves(), 3);
        assert_eq!(repository.stored(), Some(vec![]));
        Ok(())
    }

    #[test(tokio::test)]
    async fn rejected_mutations_are_not_persisted() {
        let (store, repository) = start(vec![]);

        let result = store.add(" ", "address").await;

        assert!(matches!(result, Err(StoreError::EmptyName)));
        assert!(matches!(store.delete(5).await, Err(StoreError::UnknownLocation(5))));
        assert_eq!(repository.saves(), 0);
    }

    #[test(tokio::test)]
    async fn a_failed_save_leaves_the_collection_unchanged() {
        let (store, repository) = start(vec![Location::new(1, "Hoàn Kiếm", "1 P. Hàng Trống")]);
        repository.set_failing(true);

        let result = store.edit(1, "Renamed", "elsewhere").await;

        assert!(matches!(result, Err(StoreError::Repository(_))));
        assert_eq!(*store.snapshot(), vec![Location::new(1, "Hoàn Kiếm", "1 P. Hàng Trống")]);
    }

    #[test(tokio::test)]
    async fn resolve_coordinates_caches_coordinates_in_the_snapshot() -> Result<(), StoreError> {
        let (store, _) = start(vec![Location::new(3, "Ba Đình", "28A Điện Biên Phủ")]);
        let coordinates = Coordinates::new(21.0325, 105.8412).expect("valid coordinates");

        let applied = store
            .resolve_coordinates(vec![CoordinatesUpdate {
                id: 3,
                address: "28A Điện Biên Phủ".to_string(),
                coordinates,
            }])
            .await?;

        assert_eq!(applied, 1);
        assert_eq!(store.snapshot()[0].coordinates(), Some(coordinates));
        Ok(())
    }

    #[test(tokio::test)]
    async fn requests_fail_once_the_store_is_gone() {
        let (tx, rx) = mpsc::channel::<StoreCommand>(1);
        let (_notifier_tx, notifier_rx) = watch::channel::<StoreSnapshot>(Arc::new(vec![]));
        let handle = StoreHandle::new(tx, notifier_rx);
        drop(rx);

        assert!(matches!(handle.add("a", "b").await, Err(StoreError::Closed)));
    }
}
