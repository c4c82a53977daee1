//! Observable queries: async streams that emit a fresh snapshot whenever
//! the change generation bumps. The consumer drops the stream to stop
//! observing.

use std::sync::Arc;

use anyhow::Result;
use artelab_types::models::{ArtworkRecord, UserRecord};
use futures_util::Stream;

use crate::Database;

impl Database {
    pub fn observe_all_users(
        self: &Arc<Self>,
    ) -> impl Stream<Item = Result<Vec<UserRecord>>> + Send + 'static {
        self.observe(|db| db.all_users())
    }

    pub fn observe_all_artworks(
        self: &Arc<Self>,
    ) -> impl Stream<Item = Result<Vec<ArtworkRecord>>> + Send + 'static {
        self.observe(|db| db.all_artworks())
    }

    pub fn observe_artworks_by_owner(
        self: &Arc<Self>,
        owner_user_id: i64,
    ) -> impl Stream<Item = Result<Vec<ArtworkRecord>>> + Send + 'static {
        self.observe(move |db| db.artworks_by_owner(owner_user_id))
    }

    pub fn observe_artworks_matching(
        self: &Arc<Self>,
        query: String,
    ) -> impl Stream<Item = Result<Vec<ArtworkRecord>>> + Send + 'static {
        self.observe(move |db| db.search_artworks_by_title(&query))
    }

    /// Emits the query result now, then re-runs it after every write.
    /// Coalesces bursts: a batch of writes between polls yields one
    /// re-emission.
    fn observe<T, F>(self: &Arc<Self>, query: F) -> impl Stream<Item = Result<T>> + Send + 'static
    where
        T: Send + 'static,
        F: Fn(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(self);
        let mut rx = self.changed.subscribe();
        async_stream::stream! {
            loop {
                rx.borrow_and_update();
                yield query(&db);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}
