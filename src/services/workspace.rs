//! Per-request scratch directories.
//!
//! Every upload and every intermediate or final output of a request lives
//! in one `Workspace`, split into `uploads/` and `output/`. The directory
//! disappears when the workspace is closed or dropped, so failed requests
//! clean up after themselves too.

use std::{
    io,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use tracing::debug;

const UPLOADS: &str = "uploads";
const OUTPUT: &str = "output";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a uniquely named directory beneath `root`, creating `root`
    /// first if needed.
    pub fn create(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("convert-").tempdir_in(root)?;
        std::fs::create_dir(dir.path().join(UPLOADS))?;
        std::fs::create_dir(dir.path().join(OUTPUT))?;
        debug!("created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where an uploaded file called `name` is stored. `name` must already
    /// be sanitized.
    pub fn upload_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(UPLOADS).join(name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join(OUTPUT)
    }

    /// Remove the directory and everything in it.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("removed workspace {}", path.display());
        Ok(())
    }
}
