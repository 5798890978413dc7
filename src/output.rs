use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::envelope::ReleaseStream;

/// Drain `stream` into `path`, closing the stream afterwards.
///
/// Bytes land in `<path>.part` and are renamed into place only once the
/// stream is fully read, so a failed run never leaves a truncated document.
pub fn write_release(mut stream: Box<dyn ReleaseStream>, path: &Path) -> Result<u64> {
    let part = part_path(path);
    let copied = copy_to(&mut stream, &part);
    let closed = stream.close().context("close release stream");

    match copied.and_then(|n| closed.map(|()| n)) {
        Ok(n) => {
            fs::rename(&part, path)
                .with_context(|| format!("rename {:?} -> {:?}", part, path))?;
            Ok(n)
        }
        Err(e) => {
            if let Err(rm) = fs::remove_file(&part) {
                if rm.kind() != io::ErrorKind::NotFound {
                    warn!("could not remove {:?}: {}", part, rm);
                }
            }
            Err(e)
        }
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn copy_to(stream: &mut dyn Read, part: &Path) -> Result<u64> {
    let file = File::create(part).with_context(|| format!("create {:?}", part))?;
    let mut out = BufWriter::new(file);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec})")?,
    );

    let n = io::copy(&mut pb.wrap_read(stream), &mut out).context("copy release stream")?;
    out.flush()?;
    pb.finish_and_clear();
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn tmp(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("nix_search_collector_{}_{}", std::process::id(), name));
        p
    }

    struct Broken {
        sent: bool,
        closes: Rc<Cell<usize>>,
    }

    impl Read for Broken {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            buf[..3].copy_from_slice(b"{\"a");
            Ok(3)
        }
    }

    impl ReleaseStream for Broken {
        fn close(self: Box<Self>) -> io::Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn writes_complete_document() {
        let path = tmp("complete.json");
        let n = write_release(Box::new(Cursor::new(b"{\"packages\":{}}".to_vec())), &path).unwrap();
        assert_eq!(n, 15);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"packages\":{}}");
        assert!(!part_path(&path).exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_stream_leaves_no_file() {
        let path = tmp("broken.json");
        let closes = Rc::new(Cell::new(0));
        let stream = Box::new(Broken {
            sent: false,
            closes: Rc::clone(&closes),
        });

        assert!(write_release(stream, &path).is_err());
        assert!(!path.exists());
        assert!(!part_path(&path).exists());
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn part_suffix() {
        assert_eq!(part_path(Path::new("out/nur.json")), PathBuf::from("out/nur.json.part"));
    }
}
