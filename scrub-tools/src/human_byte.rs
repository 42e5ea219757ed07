//! Re-exports the teacher's own `proxmox-human-byte` crate so progress
//! lines get the same binary-unit byte formatting PBS uses, rather than
//! hand-rolling it.

pub use proxmox_human_byte::HumanByte;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_small_and_large() {
        assert_eq!(HumanByte::from(512u64).to_string(), "512 B");
        assert_eq!(HumanByte::from(1024u64 * 1024 * 3).to_string(), "3.00 MiB");
    }
}
