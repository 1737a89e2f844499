use md5::Md5;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Tier-1 screen reads only the head of the file.
pub const QUICK_HASH_LENGTH: usize = 64 * 1024;

/// Tier-2 streams the whole file in fixed chunks.
const SECURE_CHUNK_LENGTH: usize = 1024 * 1024;

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Tier-1 partial hash: MD5 over the first 64 KiB. Purely a screening
/// optimization; groups are only ever finalized from tier-2 digests.
pub fn quick_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; QUICK_HASH_LENGTH];
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buffer.truncate(filled);

    let mut hasher = Md5::new();
    hasher.update(&buffer);
    Ok(to_hex(&hasher.finalize()))
}

/// Tier-2 full-content hash: streaming SHA-256 in 1 MiB chunks. Equal
/// digests are the engine's authoritative test for byte identity.
pub fn secure_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; SECURE_CHUNK_LENGTH];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_secure_hash_known_vector() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            secure_hash(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_quick_hash_ignores_tail_beyond_window() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.bin");
        let b = tmp.path().join("b.bin");

        let head = vec![0x42u8; QUICK_HASH_LENGTH];
        let mut fa = std::fs::File::create(&a).unwrap();
        fa.write_all(&head).unwrap();
        fa.write_all(b"tail-one").unwrap();
        let mut fb = std::fs::File::create(&b).unwrap();
        fb.write_all(&head).unwrap();
        fb.write_all(b"tail-two").unwrap();

        // Same first 64 KiB, different tails: tier 1 cannot tell them apart,
        // tier 2 must.
        assert_eq!(quick_hash(&a).unwrap(), quick_hash(&b).unwrap());
        assert_ne!(secure_hash(&a).unwrap(), secure_hash(&b).unwrap());
    }

    #[test]
    fn test_quick_hash_short_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("short.txt");
        std::fs::write(&path, "hello").unwrap();
        // md5("hello")
        assert_eq!(quick_hash(&path).unwrap(), "5d41402abc4b2a76b9719d911017c592");
    }
}
