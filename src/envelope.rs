use std::io::{self, Chain, Cursor, Read};

const PREFIX: &[u8] = br#"{"packages":"#;
const SUFFIX: &[u8] = b"}";

/// A release payload that can be drained and then released exactly once.
///
/// `close` takes the box by value, so a stream cannot be closed twice.
pub trait ReleaseStream: Read {
    fn close(self: Box<Self>) -> io::Result<()>;
}

impl ReleaseStream for reqwest::blocking::Response {
    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

impl<R: Read> ReleaseStream for brotli::Decompressor<R> {
    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

impl ReleaseStream for Cursor<Vec<u8>> {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

/// Wraps a `name -> record` JSON object into the indexer's shape.
///
/// The source is a JSON object keyed by package name:
///
/// ```text
/// { "pkg1": { ... }, "pkg2": { ... } }
/// ```
///
/// The indexer expects that object nested under `packages`:
///
/// ```text
/// { "packages": { "pkg1": { ... }, "pkg2": { ... } } }
/// ```
///
/// The source bytes pass through untouched; nothing is parsed or buffered.
pub struct PackagesEnvelope {
    inner: Chain<Chain<&'static [u8], Box<dyn ReleaseStream>>, &'static [u8]>,
}

impl PackagesEnvelope {
    pub fn new(packages: Box<dyn ReleaseStream>) -> Self {
        Self {
            inner: PREFIX.chain(packages).chain(SUFFIX),
        }
    }
}

impl Read for PackagesEnvelope {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl ReleaseStream for PackagesEnvelope {
    fn close(self: Box<Self>) -> io::Result<()> {
        let (front, _) = self.inner.into_inner();
        let (_, packages) = front.into_inner();
        packages.close()
    }
}
