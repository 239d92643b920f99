use crate::domain::ports::ContentStore;
use crate::utils::error::Result;
use std::time::Instant;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Commits staged changes every `threshold` records and once more at the end of a run.
#[derive(Debug, Clone)]
pub struct BatchCommitter {
    threshold: usize,
    pending: usize,
    commits: usize,
}

impl BatchCommitter {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            pending: 0,
            commits: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Number of commits that actually reached the store.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Counts one staged record and commits when the threshold is reached.
    pub async fn record_change<S: ContentStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.pending += 1;
        if self.pending >= self.threshold {
            self.save(store).await?;
        }
        Ok(())
    }

    /// Final flush; a no-op when nothing is staged.
    pub async fn finish<S: ContentStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.save(store).await
    }

    async fn save<S: ContentStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        let size = self.pending;
        self.pending = 0;

        if !store.has_changes() {
            tracing::debug!("Nothing to save");
            return Ok(());
        }

        let start = Instant::now();
        store.commit().await?;
        self.commits += 1;
        tracing::info!(
            "Committed a BATCH of [ {} ] records in {} ms",
            size,
            start.elapsed().as_millis()
        );
        Ok(())
    }
}

impl Default for BatchCommitter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
