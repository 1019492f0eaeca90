use std::fs;
use std::path::Path;
use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
///
/// Wrapped in a `Once` so the global subscriber is set a single time even when
/// tests run in parallel. Honors `RUST_LOG`.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok(); // Another harness may already have installed one.
    });
}

/// Creates each relative path below `root` as a small file, making parent
/// directories as needed. The file content is its relative path.
pub fn create_files(root: &Path, relative_paths: &[&str]) -> std::io::Result<()> {
    for relative in relative_paths {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, relative)?;
    }
    Ok(())
}

/// Returns true when the current process runs as root (UID 0).
/// Permission-based tests are skipped then, since root reads everything.
#[cfg(test)]
#[inline]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and no side effects.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
