use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::dataset::Dataset;
use crate::errors::Result;
use crate::query::{self, ResultSet};
use crate::sources::{TextSource, load_dataset};

/// Owner of the current dataset snapshot.
///
/// This is the library entry point for embedding the search in another
/// application. The snapshot starts empty, is replaced wholesale once a load
/// completes, and every search runs against whichever snapshot is current
/// at that moment. Readers never observe a partially parsed dataset.
///
/// Design goals:
/// - No ambient state: the application creates and owns the catalog.
/// - Searches are synchronous and never fail.
/// - Load failures degrade to "empty" instead of propagating upward.
#[derive(Debug)]
pub struct Catalog {
    current: watch::Sender<Arc<Dataset>>,
}

impl Catalog {
    /// Catalog holding an empty dataset.
    pub fn new() -> Self {
        Self::with_dataset(Dataset::new())
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        let (current, _) = watch::channel(Arc::new(dataset));
        Self { current }
    }

    /// The snapshot current right now.
    pub fn snapshot(&self) -> Arc<Dataset> {
        self.current.borrow().clone()
    }

    /// Swap in a fully parsed dataset.
    pub fn replace(&self, dataset: Dataset) {
        self.current.send_replace(Arc::new(dataset));
    }

    /// Receiver notified each time the dataset is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Dataset>> {
        self.current.subscribe()
    }

    /// Run a query against the current snapshot.
    pub fn search(&self, raw_query: &str) -> ResultSet {
        query::search(&self.snapshot(), raw_query)
    }

    /// Load and install a dataset, returning its record count.
    ///
    /// On error the current snapshot is left untouched.
    pub async fn load(&self, source: &dyn TextSource, resource: &str) -> Result<usize> {
        let dataset = load_dataset(source, resource).await?;
        let count = dataset.len();
        self.replace(dataset);
        Ok(count)
    }

    /// Like [`Catalog::load`], but a failure is logged and leaves the catalog
    /// with an empty dataset. Returns whether the load succeeded.
    pub async fn load_or_empty(&self, source: &dyn TextSource, resource: &str) -> bool {
        match self.load(source, resource).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    source = source.name(),
                    resource,
                    category = %e.category(),
                    "dataset load failed, continuing with an empty dataset: {e}"
                );
                self.replace(Dataset::new());
                false
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::dataset::parse;
    use crate::sources::testing::MemorySource;

    const DATA: &str = "Domain\tCode\n\
                        www.google.com\t<script src=\"https://www.google.com/complete/search?client=chrome&jsonp=alert(1);\"></script>\n\
                        cdnjs.cloudflare.com\t<script src=\"https://cdnjs.cloudflare.com/ajax/libs/angular.js/1.6.0/angular.min.js\"></script>\n";

    #[test]
    fn starts_empty() {
        let catalog = Catalog::new();
        assert!(catalog.snapshot().is_empty());
        assert!(catalog.search("google").is_empty());
    }

    #[test]
    fn replacement_is_visible_to_later_searches() {
        let catalog = Catalog::new();
        let before = catalog.snapshot();
        catalog.replace(parse(DATA));
        assert_eq!(catalog.search("google").len(), 1);
        // snapshots taken earlier stay as they were
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_reloads() {
        let catalog = Catalog::new();
        let mut rx = catalog.subscribe();
        catalog.replace(parse(DATA));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 2);
    }

    #[tokio::test]
    async fn load_installs_dataset() {
        let source = MemorySource::default().with("data.tsv", DATA);
        let catalog = Catalog::new();
        assert_eq!(catalog.load(&source, "data.tsv").await.unwrap(), 2);
        let rs = catalog.search("script-src *.cloudflare.com");
        assert_eq!(rs.len(), 1);
        assert_eq!(rs.records[0].domain, "cdnjs.cloudflare.com");
    }

    #[tokio::test]
    async fn failed_load_degrades_to_empty() {
        let source = MemorySource::default();
        let catalog = Catalog::with_dataset(parse(DATA));
        assert!(!catalog.load_or_empty(&source, "data.tsv").await);
        assert!(catalog.snapshot().is_empty());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1, "no retry");
    }
}
