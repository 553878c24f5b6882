use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Decode `bytes` as UTF-8, dropping any malformed sequences.
pub fn decode_lenient(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Read a whole file and decode it leniently. The handle is closed before returning.
pub fn read_lenient(path: &Path) -> io::Result<String> {
    let mut buf = Vec::new();
    {
        let mut f = File::open(path)?;
        f.read_to_end(&mut buf)?;
    }
    Ok(decode_lenient(&buf))
}
