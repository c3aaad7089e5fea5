use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 digest of a file's bytes, hex encoded.
pub fn hash_file(file: &Path) -> io::Result<String> {
    let f = File::open(file)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, f);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
