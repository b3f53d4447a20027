//! Batch stream description
//!
//! Finds `.wem` files under a directory and describes them in parallel.
//! Every file gets its own [`StreamSource`], so one failing container never
//! affects the others.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::codebook::CodebookRegistry;
use crate::codec::{LewtonBackend, VorbisBackend, init_with};
use crate::describe::{Description, describe};
use crate::error::Result;
use crate::source::StreamSource;
use crate::wwise::{ParseOptions, parse_with};

/// Progress of a batch run
#[derive(Debug, Clone)]
pub struct ProbeProgress<'a> {
    /// 1-based index of the file being processed
    pub current: usize,
    pub total: usize,
    pub path: &'a Path,
}

/// Outcome for one file
#[derive(Debug)]
pub struct ProbeResult {
    pub path: PathBuf,
    pub outcome: Result<Description>,
}

/// Result of a batch describe
#[derive(Debug)]
pub struct BatchProbeResult {
    /// Number of files described
    pub success_count: usize,
    /// Number of files that failed
    pub fail_count: usize,
    /// One entry per input path, in input order
    pub results: Vec<ProbeResult>,
}

/// Find all .wem files in a directory recursively
///
/// # Returns
/// A sorted list of paths to .wem files found in the directory tree.
pub fn find_wem_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut wem_files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("wem"))
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    wem_files.sort();
    wem_files
}

/// Open, parse, initialize and describe a single container.
///
/// The source is closed before returning, whatever the outcome.
pub fn probe_file(
    path: &Path,
    registry: &CodebookRegistry,
    options: &ParseOptions,
    max_length: usize,
) -> Result<Description> {
    probe_file_with(path, registry, options, max_length, &LewtonBackend)
}

/// [`probe_file`] with an explicit Vorbis backend.
pub fn probe_file_with(
    path: &Path,
    registry: &CodebookRegistry,
    options: &ParseOptions,
    max_length: usize,
    backend: &dyn VorbisBackend,
) -> Result<Description> {
    let mut source = StreamSource::open(path)?;
    let outcome = parse_with(&mut source, registry, options)
        .and_then(|header| init_with(&mut source, header, backend).map(|state| describe(&state, max_length)));
    source.close();
    outcome
}

/// Describe many containers in parallel
///
/// # Arguments
/// * `paths` - Containers to describe
/// * `registry` - Codebook libraries shared by every file
/// * `options` - Parse options applied to every file
/// * `max_length` - Byte bound stored in each description
/// * `progress` - Callback for progress updates
pub fn describe_files<F>(
    paths: &[PathBuf],
    registry: &CodebookRegistry,
    options: &ParseOptions,
    max_length: usize,
    progress: F,
) -> BatchProbeResult
where
    F: Fn(&ProbeProgress<'_>) + Send + Sync,
{
    describe_files_with(paths, registry, options, max_length, &LewtonBackend, progress)
}

/// [`describe_files`] with an explicit Vorbis backend.
pub fn describe_files_with<F>(
    paths: &[PathBuf],
    registry: &CodebookRegistry,
    options: &ParseOptions,
    max_length: usize,
    backend: &(dyn VorbisBackend + Sync),
    progress: F,
) -> BatchProbeResult
where
    F: Fn(&ProbeProgress<'_>) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = paths.len();

    let results: Vec<ProbeResult> = paths
        .par_iter()
        .map(|path| {
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&ProbeProgress {
                current,
                total,
                path: path.as_path(),
            });

            let outcome = probe_file_with(path, registry, options, max_length, backend);
            match &outcome {
                Ok(_) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    tracing::debug!("Failed to describe {}: {e}", path.display());
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                }
            }
            ProbeResult {
                path: path.clone(),
                outcome,
            }
        })
        .collect();

    BatchProbeResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    }
}
