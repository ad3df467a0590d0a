//! Archive/restore of the incremental build-state directory.
//!
//! One gzip tar per build configuration, stored in the shared cache area and
//! overwritten after every build attempt. Writes go to a temporary file in
//! the same directory and are renamed into place, so readers never observe a
//! partial archive and a failed save leaves the previous good one intact.

use std::fs;
use std::io::Write as _;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use yottaci_config::BuildConfig;

/// Errors from state archive handling.
#[derive(Debug, Error)]
pub enum StateCacheError {
    #[error("state archive io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("build state directory {0} does not exist")]
    MissingStateDir(Utf8PathBuf),
}

/// The shared state-archive cache.
pub struct StateCache {
    cache_dir: Utf8PathBuf,
}

impl StateCache {
    pub fn new(cache_dir: Utf8PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Archive location for a configuration; deterministic from its identity.
    pub fn archive_path(&self, config: &BuildConfig) -> Utf8PathBuf {
        self.cache_dir.join(format!("sstate-{}.tar.gz", config.name))
    }

    /// Extract the configuration's archive into `dest` when one exists.
    ///
    /// Returns whether an archive was restored; the first build of a
    /// configuration has none and this is a no-op. Entries that would escape
    /// `dest` are rejected by the unpacker.
    pub fn restore(&self, config: &BuildConfig, dest: &Utf8Path) -> Result<bool, StateCacheError> {
        let path = self.archive_path(config);
        if !path.exists() {
            debug!(archive = %path, "no state archive yet, starting cold");
            return Ok(false);
        }
        info!(archive = %path, "restoring build state");
        let file = fs::File::open(&path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive.unpack(dest)?;
        Ok(true)
    }

    /// Pack `state_dir` into a fresh archive for the configuration.
    ///
    /// The archive is assembled in a temporary file inside the cache area
    /// (same filesystem as the target) and renamed into place once fully
    /// written.
    pub fn save(&self, config: &BuildConfig, state_dir: &Utf8Path) -> Result<(), StateCacheError> {
        if !state_dir.is_dir() {
            return Err(StateCacheError::MissingStateDir(state_dir.to_owned()));
        }
        fs::create_dir_all(&self.cache_dir)?;
        let arc_name = state_dir.file_name().unwrap_or("sstate");

        let mut tmp = NamedTempFile::with_prefix_in("sstatearch", &self.cache_dir)?;
        {
            let encoder = GzEncoder::new(tmp.as_file_mut(), Compression::default());
            let mut builder = tar::Builder::new(encoder);
            builder.append_dir_all(arc_name, state_dir)?;
            let mut encoder = builder.into_inner()?;
            encoder.try_finish()?;
        }
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        let target = self.archive_path(config);
        tmp.persist(&target).map_err(|err| err.error)?;
        info!(archive = %target, "saved build state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn config(name: &str) -> BuildConfig {
        BuildConfig {
            name: name.to_string(),
            localconf: String::new(),
            target: "core-image-minimal".to_string(),
            oecore_url: yottaci_config::OECORE_URL.to_string(),
            bitbake_url: yottaci_config::BITBAKE_URL.to_string(),
            oecore_ref: "master".to_string(),
            bitbake_ref: "master".to_string(),
        }
    }

    fn populate_state(dir: &Utf8Path) {
        fs::create_dir_all(dir.join("cache/objects")).unwrap();
        fs::write(dir.join("manifest"), "top-level\n").unwrap();
        fs::write(dir.join("cache/objects/ab.done"), "artifact").unwrap();
    }

    #[test]
    fn archive_path_is_keyed_by_configuration_name() {
        let cache = StateCache::new(Utf8PathBuf::from("/share/bb-cache"));
        assert_eq!(
            cache.archive_path(&config("qemu-x86")),
            "/share/bb-cache/sstate-qemu-x86.tar.gz"
        );
        assert_eq!(
            cache.archive_path(&config("configuration2")),
            "/share/bb-cache/sstate-configuration2.tar.gz"
        );
    }

    #[test]
    fn save_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        let state = root.join("workspace/sstate");
        populate_state(&state);

        let cache = StateCache::new(root.join("bb-cache"));
        let cfg = config("roundtrip");
        cache.save(&cfg, &state).unwrap();

        let dest = root.join("fresh");
        fs::create_dir_all(&dest).unwrap();
        assert!(cache.restore(&cfg, &dest).unwrap());

        assert_eq!(
            fs::read_to_string(dest.join("sstate/manifest")).unwrap(),
            "top-level\n"
        );
        assert_eq!(
            fs::read_to_string(dest.join("sstate/cache/objects/ab.done")).unwrap(),
            "artifact"
        );
    }

    #[test]
    fn restore_without_archive_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        let cache = StateCache::new(root.join("bb-cache"));
        let dest = root.join("dest");
        fs::create_dir_all(&dest).unwrap();

        assert!(!cache.restore(&config("cold"), &dest).unwrap());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn save_overwrites_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        let state = root.join("sstate");
        fs::create_dir_all(&state).unwrap();
        fs::write(state.join("gen"), "one").unwrap();

        let cache = StateCache::new(root.join("bb-cache"));
        let cfg = config("overwrite");
        cache.save(&cfg, &state).unwrap();

        fs::write(state.join("gen"), "two").unwrap();
        cache.save(&cfg, &state).unwrap();

        let dest = root.join("dest");
        fs::create_dir_all(&dest).unwrap();
        cache.restore(&cfg, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("sstate/gen")).unwrap(), "two");
    }

    #[test]
    fn save_requires_an_existing_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        let cache = StateCache::new(root.join("bb-cache"));

        let err = cache
            .save(&config("missing"), &root.join("never-created"))
            .unwrap_err();
        assert!(matches!(err, StateCacheError::MissingStateDir(_)));
        assert!(!cache.archive_path(&config("missing")).exists());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        let state = root.join("sstate");
        fs::create_dir_all(&state).unwrap();
        fs::write(state.join("gen"), "x").unwrap();

        let cache = StateCache::new(root.join("bb-cache"));
        cache.save(&config("tidy"), &state).unwrap();

        let leftovers: Vec<_> = fs::read_dir(root.join("bb-cache"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("sstatearch")
            })
            .collect();
        assert!(leftovers.is_empty());
    }
}
