//! Best-effort diagnostic artifact capture.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

/// System log files copied to durable storage when a run fails.
pub fn default_diagnostic_logs() -> Vec<Utf8PathBuf> {
    vec![
        Utf8PathBuf::from("/var/log/cloud-init-output.log"),
        Utf8PathBuf::from("/var/log/cloud-init.log"),
    ]
}

/// Copy diagnostic logs into the per-run directory on shared storage.
///
/// Best-effort by contract: a missing source or failed copy is logged and
/// skipped, never fatal. Returns how many files were copied.
pub fn copy_diagnostics(sources: &[Utf8PathBuf], dest: &Utf8Path) -> usize {
    if let Err(err) = fs::create_dir_all(dest) {
        warn!(dest = %dest, error = %err, "cannot create diagnostics directory");
        return 0;
    }
    let mut copied = 0;
    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        match fs::copy(source, dest.join(name)) {
            Ok(_) => copied += 1,
            Err(err) => {
                warn!(source = %source, error = %err, "diagnostic log copy failed");
            }
        }
    }
    info!(dest = %dest, copied, "captured diagnostic logs");
    copied
}
