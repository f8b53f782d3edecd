//! ZIP packaging for rendered pages.

use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, ZipWriter, result::ZipResult, write::SimpleFileOptions};

/// Write `entries` into a new ZIP at `dest`, in order.
///
/// Each entry is `(archive_name, source_path)`. PNG data is already
/// compressed, but deflate still trims the odd header and keeps tools happy.
pub fn zip_files(entries: &[(String, PathBuf)], dest: &Path) -> ZipResult<()> {
    let out = BufWriter::new(File::create(dest)?);
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (name, source) in entries {
        zip.start_file(name.as_str(), options)?;
        let mut reader = File::open(source)?;
        io::copy(&mut reader, &mut zip)?;
    }

    let mut out = zip.finish()?;
    io::Write::flush(&mut out)?;
    Ok(())
}
