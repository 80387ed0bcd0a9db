use std::path::{Path, PathBuf};

type JobError = Box<dyn std::error::Error + Send + Sync>;

/// Temporal position encoded in a frame file's zero-padded name; falls
/// back to 0 for files named some other way.
pub fn frame_index(path: &Path) -> usize {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse().ok())
        .unwrap_or(0)
}

/// Streams frame files through a fixed set of worker threads.
///
/// Processors own their concurrency; the surrounding orchestrator stays
/// strictly sequential. Thread and queue counts come from the run
/// configuration's execution hints. Frames are mutated in place on disk,
/// so workers never need to hand results back — the pool only coalesces
/// the first error.
pub struct FrameWorkerPool {
    threads: usize,
    queue_capacity: usize,
}

impl FrameWorkerPool {
    pub fn new(threads: usize, queue_capacity: usize) -> Self {
        Self {
            threads: threads.max(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn run(
        &self,
        frame_paths: &[PathBuf],
        job: &(dyn Fn(&Path) -> Result<(), JobError> + Sync),
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (tx, rx) = crossbeam_channel::bounded::<&Path>(self.queue_capacity);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.threads)
                .map(|_| {
                    let rx = rx.clone();
                    scope.spawn(move || -> Result<(), JobError> {
                        for path in rx {
                            job(path)?;
                        }
                        Ok(())
                    })
                })
                .collect();
            drop(rx);

            let mut first_error: Option<JobError> = None;
            for path in frame_paths {
                // Send fails only when every worker has already exited
                if tx.send(path.as_path()).is_err() {
                    break;
                }
            }
            drop(tx);

            for handle in handles {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                    Err(_) => {
                        if first_error.is_none() {
                            first_error = Some("frame worker panicked".into());
                        }
                    }
                }
            }

            match first_error {
                Some(e) => Err(e.to_string().into()),
                None => Ok(()),
            }
        })
    }
}
