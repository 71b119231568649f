//! Parallel scan of the resolved jar set for classes defined in more than
//! one archive.
//!
//! Archives are distributed over the rayon pool; each worker owns one
//! archive exclusively and the only shared state is the class -> jar-set
//! index, updated through the map's atomic entry operation. Reporting
//! happens strictly after every archive task finished; a scan that blows
//! the deadline cancels the remaining workers and fails the build with no
//! partial result.

use crate::error::{BuildError, Result};
use dashmap::DashMap;
use loadout_api::{Coordinate, Pattern};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;
use tracing::debug;
use zip::ZipArchive;

const CLASS_SUFFIX: &str = ".class";
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(60);

/// One archive on the component classpath, with the coordinates it came
/// from for diagnostics.
#[derive(Debug, Clone)]
pub struct JarRef {
    pub coordinate: Coordinate,
    /// The direct item a transitive jar arrived through.
    pub parent: Option<Coordinate>,
    pub path: PathBuf,
}

impl JarRef {
    pub fn label(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{} (via {})", self.coordinate, parent),
            None => self.coordinate.to_string(),
        }
    }
}

/// Scan result: which classes appear in which jars, restricted to classes
/// claimed by at least two archives.
#[derive(Debug)]
pub struct ClassIndex {
    jars: Vec<JarRef>,
    collisions: BTreeMap<String, BTreeSet<usize>>,
}

impl ClassIndex {
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }

    pub fn collision_count(&self) -> usize {
        self.collisions.len()
    }

    pub fn jars(&self) -> &[JarRef] {
        &self.jars
    }

    /// Colliding classes in name order, each with the jars defining it.
    pub fn collisions(&self) -> impl Iterator<Item = (&str, Vec<&JarRef>)> {
        self.collisions.iter().map(|(class, indices)| {
            (
                class.as_str(),
                indices.iter().map(|&i| &self.jars[i]).collect(),
            )
        })
    }

    pub(crate) fn collision_indices(&self) -> &BTreeMap<String, BTreeSet<usize>> {
        &self.collisions
    }

    pub(crate) fn jar(&self, index: usize) -> &JarRef {
        &self.jars[index]
    }
}

enum ScanInterrupt {
    Cancelled,
    Io(std::io::Error),
}

pub struct ClasspathScanner {
    timeout: Duration,
}

impl Default for ClasspathScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ClasspathScanner {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Scans every archive and returns the collision index. The calling
    /// thread blocks until all archive tasks completed or the deadline
    /// passed, whichever comes first.
    pub fn scan(&self, jars: Vec<JarRef>, excluded_patterns: &[Pattern]) -> Result<ClassIndex> {
        let index: Arc<DashMap<String, BTreeSet<usize>>> = Arc::new(DashMap::new());
        let cancelled = Arc::new(AtomicBool::new(false));
        let paths: Vec<PathBuf> = jars.iter().map(|jar| jar.path.clone()).collect();
        let patterns: Vec<Pattern> = excluded_patterns.to_vec();

        debug!(archives = paths.len(), "starting classpath scan");
        let (done_tx, done_rx) = mpsc::channel();
        {
            let index = Arc::clone(&index);
            let cancelled = Arc::clone(&cancelled);
            std::thread::spawn(move || {
                let outcome = paths
                    .par_iter()
                    .enumerate()
                    .try_for_each(|(jar_index, path)| {
                        scan_archive(jar_index, path, &patterns, &index, &cancelled)
                    });
                let _ = done_tx.send(outcome);
            });
        }

        match done_rx.recv_timeout(self.timeout) {
            Ok(Ok(())) => {}
            Ok(Err(ScanInterrupt::Io(err))) => return Err(BuildError::Io(err)),
            Ok(Err(ScanInterrupt::Cancelled)) | Err(mpsc::RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::Relaxed);
                return Err(BuildError::ScanTimeout {
                    timeout: self.timeout,
                });
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(BuildError::Io(std::io::Error::other(
                    "classpath scan worker terminated unexpectedly",
                )));
            }
        }

        let mut collisions = BTreeMap::new();
        for entry in index.iter() {
            if entry.value().len() >= 2 {
                collisions.insert(entry.key().clone(), entry.value().clone());
            }
        }
        debug!(collisions = collisions.len(), "classpath scan finished");
        Ok(ClassIndex { jars, collisions })
    }
}

fn scan_archive(
    jar_index: usize,
    path: &Path,
    excluded: &[Pattern],
    index: &DashMap<String, BTreeSet<usize>>,
    cancelled: &AtomicBool,
) -> std::result::Result<(), ScanInterrupt> {
    if cancelled.load(Ordering::Relaxed) {
        return Err(ScanInterrupt::Cancelled);
    }
    let file = File::open(path).map_err(|err| io_interrupt(path, &err.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|err| io_interrupt(path, &err.to_string()))?;

    for i in 0..archive.len() {
        if cancelled.load(Ordering::Relaxed) {
            return Err(ScanInterrupt::Cancelled);
        }
        let entry = archive
            .by_index(i)
            .map_err(|err| io_interrupt(path, &err.to_string()))?;
        let name = entry.name();
        if !name.ends_with(CLASS_SUFFIX) {
            continue;
        }
        // Exclusion patterns are written against dotted names.
        let dotted = name.replace('/', ".");
        if excluded.iter().any(|pattern| pattern.matches(&dotted)) {
            continue;
        }
        index.entry(name.to_string()).or_default().insert(jar_index);
    }
    Ok(())
}

fn io_interrupt(path: &Path, reason: &str) -> ScanInterrupt {
    ScanInterrupt::Io(std::io::Error::other(format!(
        "{}: {reason}",
        path.display()
    )))
}
