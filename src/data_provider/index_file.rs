//! Reader for machine index files: a plain sequence of 4-byte big-endian
//! machine indices into the DB. The file length must be a multiple of 4.

use std::{fs::File, io::Read};

use crate::error::FileFormatError;

pub fn read_index_file(file_path: &str) -> Result<Vec<u64>, FileFormatError> {
    let mut file = File::open(file_path)?;
    let file_len = file.metadata()?.len();
    if file_len % 4 != 0 {
        return Err(FileFormatError::malformed(
            file_len - file_len % 4,
            format!("index file length {file_len} is not a multiple of 4"),
        ));
    }

    let mut bytes = Vec::with_capacity(file_len as usize);
    file.read_to_end(&mut bytes)?;

    let indices = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes(chunk.try_into().unwrap()) as u64)
        .collect();

    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn index_file_reads_big_endian_indices() {
        let path = std::env::temp_dir().join("bb_nonhalt_test_index");
        let path = path.to_str().unwrap();
        let mut file = File::create(path).unwrap();
        for id in [4u32, 9, 207, 1_000_000] {
            file.write_all(&id.to_be_bytes()).unwrap();
        }
        drop(file);

        let indices = read_index_file(path).unwrap();
        assert_eq!(vec![4, 9, 207, 1_000_000], indices);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn index_file_rejects_odd_length() {
        let path = std::env::temp_dir().join("bb_nonhalt_test_index_bad");
        let path = path.to_str().unwrap();
        std::fs::write(path, [0u8; 7]).unwrap();

        match read_index_file(path) {
            Err(FileFormatError::Malformed { offset, .. }) => assert_eq!(4, offset),
            other => panic!("expected malformed error, got {other:?}"),
        }
        std::fs::remove_file(path).ok();
    }
}
