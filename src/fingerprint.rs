use crate::foundation::math::Fnv1a64;

/// 128-bit identity of a bundle's logical content, independent of archive
/// timestamps. Equal projects exported for the same network fingerprint
/// identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BundleFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for BundleFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

const SEED_HI: u64 = Fnv1a64::OFFSET_BASIS;
const SEED_LO: u64 = 0x9ae1_6a3b_2f90_404f;

/// Fingerprint a bundle's file list, in archive order.
pub fn fingerprint_files<'a, I>(files: I) -> BundleFingerprint
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut a = Fnv1a64::new(SEED_HI);
    let mut b = Fnv1a64::new(SEED_LO);
    for (path, bytes) in files {
        a.write_str(path);
        b.write_str(path);
        a.write_u64(bytes.len() as u64);
        b.write_u64(bytes.len() as u64);
        a.write_bytes(bytes);
        b.write_bytes(bytes);
    }
    BundleFingerprint {
        hi: a.finish(),
        lo: b.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_fingerprint_identically() {
        let files = [
            ("index.html", b"<html>".as_slice()),
            ("manifest.json", b"{}".as_slice()),
        ];
        assert_eq!(fingerprint_files(files), fingerprint_files(files));
    }

    #[test]
    fn content_and_path_changes_are_visible() {
        let base = fingerprint_files([("index.html", b"<html>".as_slice())]);
        assert_ne!(
            base,
            fingerprint_files([("index.html", b"<HTML>".as_slice())])
        );
        assert_ne!(
            base,
            fingerprint_files([("index.htm", b"<html>".as_slice())])
        );
    }

    #[test]
    fn display_is_32_hex_chars() {
        let fp = fingerprint_files([("a", b"b".as_slice())]);
        let s = fp.to_string();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
