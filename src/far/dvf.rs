//! Codec for the decider verification file (DVF): a big-endian entry count
//! followed by entries of (machine_id, decider_type, info_length, payload).
//! Payloads of type DFA_NFA decode to a [FarProof]; DFA_ONLY entries are
//! recognised and skipped. \
//! Reading supports two modes: *scan* streams the entries in order, the
//! *pre-indexed* mode takes one pass over the headers to build a byte-offset
//! table, enabling random access to the i-th entry. \
//! Entries whose declared payload length does not match the bytes their
//! decoding consumes are rejected, as are unknown decider-type tags.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
};

use crate::{
    config::CONFIG_TOML,
    error::FileFormatError,
    far::{
        bit_matrix::{packed_row_len, BitMatrix, BitRow},
        nfa_state_count, Dfa, FarProof, ScanDirection,
    },
};

pub const DECIDER_TYPE_DFA_ONLY: u32 = 10;
pub const DECIDER_TYPE_DFA_NFA: u32 = 11;

const ENTRY_HEADER_SIZE: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DvfEntryHeader {
    pub machine_id: u32,
    pub decider_type: u32,
    pub info_length: u32,
}

#[derive(Debug, Clone)]
pub struct DvfEntry {
    pub header: DvfEntryHeader,
    /// Decoded proof for DFA_NFA entries, None for DFA_ONLY.
    pub proof: Option<FarProof>,
}

/// Number of payload bytes of an encoded DFA_NFA proof.
fn dfa_nfa_payload_len(dfa_states: usize) -> usize {
    let n = nfa_state_count(dfa_states);
    let row_len = packed_row_len(n);
    1 + 2 + 2 + 2 * dfa_states + 2 * n * row_len + row_len
}

/// Decodes a DFA_NFA payload. `base_offset` is the file offset of the payload,
/// used in error reports.
fn decode_dfa_nfa_payload(bytes: &[u8], base_offset: u64) -> Result<FarProof, FileFormatError> {
    let err = |at: usize, msg: &str| FileFormatError::malformed(base_offset + at as u64, msg);

    if bytes.len() < 5 {
        return Err(err(0, "payload too short for direction and state counts"));
    }
    let direction = ScanDirection::from_flag(bytes[0] == 1);
    let nb_dfa_states = u16::from_be_bytes(bytes[1..3].try_into().unwrap()) as usize;
    let nb_nfa_states = u16::from_be_bytes(bytes[3..5].try_into().unwrap()) as usize;
    if nb_dfa_states == 0 {
        return Err(err(1, "DFA with zero states"));
    }
    if nb_nfa_states != nfa_state_count(nb_dfa_states) {
        return Err(err(3, "NFA state count does not match 5 * DFA states + 1"));
    }
    let expected = dfa_nfa_payload_len(nb_dfa_states);
    if bytes.len() != expected {
        return Err(err(
            0,
            &format!(
                "payload length {} does not match the {} bytes a {}-state proof decodes to",
                bytes.len(),
                expected,
                nb_dfa_states
            ),
        ));
    }

    let mut pos = 5;
    let mut transitions = Vec::with_capacity(nb_dfa_states);
    for _ in 0..nb_dfa_states {
        let on_zero = bytes[pos];
        let on_one = bytes[pos + 1];
        if on_zero as usize >= nb_dfa_states || on_one as usize >= nb_dfa_states {
            return Err(err(pos, "DFA transition target out of range"));
        }
        transitions.push([on_zero, on_one]);
        pos += 2;
    }

    let row_len = packed_row_len(nb_nfa_states);
    let mut nfa = [BitMatrix::new(nb_nfa_states), BitMatrix::new(nb_nfa_states)];
    for matrix in nfa.iter_mut() {
        for row in 0..nb_nfa_states {
            matrix.set_row_packed(row, &bytes[pos..pos + row_len]);
            pos += row_len;
        }
    }
    let accept = BitRow::from_packed(nb_nfa_states, &bytes[pos..pos + row_len]);

    Ok(FarProof {
        direction,
        dfa: Dfa::new(transitions),
        nfa,
        accept,
    })
}

fn encode_dfa_nfa_payload(proof: &FarProof) -> Vec<u8> {
    let d = proof.dfa.n_states();
    let n = nfa_state_count(d);
    let mut bytes = Vec::with_capacity(dfa_nfa_payload_len(d));
    bytes.push(proof.direction.is_right_to_left() as u8);
    bytes.extend_from_slice(&(d as u16).to_be_bytes());
    bytes.extend_from_slice(&(n as u16).to_be_bytes());
    for row in proof.dfa.transitions() {
        bytes.extend_from_slice(row);
    }
    for matrix in proof.nfa.iter() {
        for row in 0..n {
            bytes.extend_from_slice(matrix.row(row));
        }
    }
    bytes.extend_from_slice(proof.accept.as_packed());
    bytes
}

/// Reader over a DVF file. Scan mode walks the entries in order; build the
/// pre-index for random access.
#[derive(Debug)]
pub struct DvfReader {
    reader: BufReader<File>,
    n_entries: u32,
    entries_read: u32,
    /// Byte offset of each entry header, only in pre-indexed mode.
    offsets: Option<Vec<u64>>,
}

impl DvfReader {
    /// Opens the DVF file configured in config.toml, scan mode.
    pub fn try_new_toml_path() -> Result<Self, FileFormatError> {
        Self::try_new(CONFIG_TOML.dvf_filename_path())
    }

    /// Opens the file in scan mode.
    pub fn try_new(file_path: &str) -> Result<Self, FileFormatError> {
        let file = File::open(file_path)?;
        let mut reader = BufReader::new(file);
        let mut count_bytes = [0u8; 4];
        reader
            .read_exact(&mut count_bytes)
            .map_err(|_| FileFormatError::malformed(0, "DVF header truncated"))?;
        Ok(Self {
            reader,
            n_entries: u32::from_be_bytes(count_bytes),
            entries_read: 0,
            offsets: None,
        })
    }

    /// Opens the file and takes one pass over the entry headers to build the
    /// offset table for [Self::read_entry].
    pub fn try_new_pre_indexed(file_path: &str) -> Result<Self, FileFormatError> {
        let mut dvf = Self::try_new(file_path)?;
        let mut offsets = Vec::with_capacity(dvf.n_entries as usize);
        let mut offset = 4u64;
        for _ in 0..dvf.n_entries {
            offsets.push(offset);
            let header = dvf.read_entry_header(offset)?;
            dvf.reader
                .seek(SeekFrom::Start(offset + ENTRY_HEADER_SIZE + header.info_length as u64))?;
            offset += ENTRY_HEADER_SIZE + header.info_length as u64;
        }
        dvf.reader.seek(SeekFrom::Start(4))?;
        dvf.offsets = Some(offsets);
        Ok(dvf)
    }

    pub fn n_entries(&self) -> u32 {
        self.n_entries
    }

    fn read_entry_header(&mut self, offset: u64) -> Result<DvfEntryHeader, FileFormatError> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut bytes = [0u8; ENTRY_HEADER_SIZE as usize];
        self.reader
            .read_exact(&mut bytes)
            .map_err(|_| FileFormatError::malformed(offset, "DVF entry header truncated"))?;
        let header = DvfEntryHeader {
            machine_id: u32::from_be_bytes(bytes[0..4].try_into().unwrap()),
            decider_type: u32::from_be_bytes(bytes[4..8].try_into().unwrap()),
            info_length: u32::from_be_bytes(bytes[8..12].try_into().unwrap()),
        };
        if header.decider_type != DECIDER_TYPE_DFA_ONLY && header.decider_type != DECIDER_TYPE_DFA_NFA
        {
            return Err(FileFormatError::UnknownDeciderType {
                offset: offset + 4,
                tag: header.decider_type,
            });
        }
        Ok(header)
    }

    fn read_entry_at(&mut self, offset: u64) -> Result<DvfEntry, FileFormatError> {
        let header = self.read_entry_header(offset)?;
        let payload_offset = offset + ENTRY_HEADER_SIZE;
        let mut payload = vec![0u8; header.info_length as usize];
        self.reader
            .read_exact(&mut payload)
            .map_err(|_| FileFormatError::malformed(payload_offset, "DVF entry payload truncated"))?;

        let proof = match header.decider_type {
            DECIDER_TYPE_DFA_NFA => Some(decode_dfa_nfa_payload(&payload, payload_offset)?),
            _ => None,
        };
        Ok(DvfEntry { header, proof })
    }

    /// Next entry in scan mode; None once all declared entries are read.
    pub fn read_entry_next(&mut self) -> Result<Option<DvfEntry>, FileFormatError> {
        if self.entries_read >= self.n_entries {
            return Ok(None);
        }
        let offset = self.reader.stream_position()?;
        let entry = self.read_entry_at(offset)?;
        self.entries_read += 1;
        Ok(Some(entry))
    }

    /// Random access to the i-th entry; requires the pre-indexed mode.
    pub fn read_entry(&mut self, i: usize) -> Result<DvfEntry, FileFormatError> {
        let offsets = self
            .offsets
            .as_ref()
            .expect("read_entry requires the pre-indexed reader");
        if i >= offsets.len() {
            return Err(FileFormatError::malformed(
                0,
                format!("entry {i} does not exist, the file has {} entries", offsets.len()),
            ));
        }
        let offset = offsets[i];
        self.read_entry_at(offset)
    }
}

/// Writer producing a DVF file of DFA_NFA entries. The entry count at the
/// start of the file is patched in by [Self::finish].
#[derive(Debug)]
pub struct DvfWriter {
    writer: BufWriter<File>,
    n_entries: u32,
}

impl DvfWriter {
    pub fn create(file_path: &str) -> Result<Self, FileFormatError> {
        let file = File::create(file_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&0u32.to_be_bytes())?;
        Ok(Self {
            writer,
            n_entries: 0,
        })
    }

    pub fn write_proof(&mut self, machine_id: u32, proof: &FarProof) -> Result<(), FileFormatError> {
        let payload = encode_dfa_nfa_payload(proof);
        self.writer.write_all(&machine_id.to_be_bytes())?;
        self.writer.write_all(&DECIDER_TYPE_DFA_NFA.to_be_bytes())?;
        self.writer
            .write_all(&(payload.len() as u32).to_be_bytes())?;
        self.writer.write_all(&payload)?;
        self.n_entries += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), FileFormatError> {
        self.writer.flush()?;
        let mut file = self.writer.into_inner().map_err(|e| {
            FileFormatError::Io(std::io::Error::other(e.to_string()))
        })?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&self.n_entries.to_be_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{far::solver::solve_machine, machine_binary::MachineBinary};

    fn test_proof() -> FarProof {
        let machine = MachineBinary::try_from("1RB1LB_1LA1RA").unwrap();
        solve_machine(&machine, 1).unwrap()
    }

    #[test]
    fn dvf_payload_round_trip() {
        let proof = test_proof();
        let payload = encode_dfa_nfa_payload(&proof);
        assert_eq!(dfa_nfa_payload_len(proof.dfa.n_states()), payload.len());
        let decoded = decode_dfa_nfa_payload(&payload, 0).unwrap();
        assert_eq!(proof, decoded);
    }

    #[test]
    fn dvf_file_round_trip_scan_and_indexed() {
        let proof = test_proof();
        let path = std::env::temp_dir().join("bb_nonhalt_test_roundtrip.dvf");
        let path = path.to_str().unwrap();

        let mut writer = DvfWriter::create(path).unwrap();
        writer.write_proof(7, &proof).unwrap();
        writer.write_proof(42, &proof).unwrap();
        writer.finish().unwrap();

        // scan mode
        let mut reader = DvfReader::try_new(path).unwrap();
        assert_eq!(2, reader.n_entries());
        let first = reader.read_entry_next().unwrap().unwrap();
        assert_eq!(7, first.header.machine_id);
        assert_eq!(DECIDER_TYPE_DFA_NFA, first.header.decider_type);
        assert_eq!(proof, first.proof.unwrap());
        let second = reader.read_entry_next().unwrap().unwrap();
        assert_eq!(42, second.header.machine_id);
        assert!(reader.read_entry_next().unwrap().is_none());

        // pre-indexed random access, out of order
        let mut reader = DvfReader::try_new_pre_indexed(path).unwrap();
        let second = reader.read_entry(1).unwrap();
        assert_eq!(42, second.header.machine_id);
        let first = reader.read_entry(0).unwrap();
        assert_eq!(7, first.header.machine_id);
        assert_eq!(proof, first.proof.unwrap());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn dvf_rejects_unknown_decider_type() {
        let path = std::env::temp_dir().join("bb_nonhalt_test_unknown_tag.dvf");
        let path = path.to_str().unwrap();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&5u32.to_be_bytes()); // machine id
        bytes.extend_from_slice(&99u32.to_be_bytes()); // unknown tag
        bytes.extend_from_slice(&0u32.to_be_bytes());
        std::fs::write(path, &bytes).unwrap();

        let mut reader = DvfReader::try_new(path).unwrap();
        match reader.read_entry_next() {
            Err(FileFormatError::UnknownDeciderType { tag: 99, offset }) => assert_eq!(8, offset),
            other => panic!("expected unknown decider type, got {other:?}"),
        }
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn dvf_rejects_wrong_payload_length() {
        let proof = test_proof();
        let mut payload = encode_dfa_nfa_payload(&proof);
        payload.push(0); // declared length now disagrees with the decoded size
        let r = decode_dfa_nfa_payload(&payload, 0);
        assert!(matches!(r, Err(FileFormatError::Malformed { .. })));
    }

    #[test]
    fn dvf_rejects_mismatched_nfa_state_count() {
        let proof = test_proof();
        let mut payload = encode_dfa_nfa_payload(&proof);
        // claim 7 NFA states for a 1-state DFA
        payload[3..5].copy_from_slice(&7u16.to_be_bytes());
        let r = decode_dfa_nfa_payload(&payload, 0);
        assert!(matches!(r, Err(FileFormatError::Malformed { offset: 3, .. })));
    }

    #[test]
    fn dvf_skips_dfa_only_entries() {
        let path = std::env::temp_dir().join("bb_nonhalt_test_dfa_only.dvf");
        let path = path.to_str().unwrap();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&DECIDER_TYPE_DFA_ONLY.to_be_bytes());
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]); // opaque DFA_ONLY payload
        std::fs::write(path, &bytes).unwrap();

        let mut reader = DvfReader::try_new(path).unwrap();
        let entry = reader.read_entry_next().unwrap().unwrap();
        assert_eq!(3, entry.header.machine_id);
        assert!(entry.proof.is_none());
        assert!(reader.read_entry_next().unwrap().is_none());
        std::fs::remove_file(path).ok();
    }
}
