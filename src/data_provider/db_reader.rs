//! Random-access reader for the machine DB file
//! (<https://bbchallenge.org/method#format>): fixed 30-byte records, optionally
//! preceded by one 30-byte global header record. The machine with index i
//! starts at byte offset 30 * (i + h) with h = 1 if the header is present.

use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    ops::Range,
};

use crate::{
    config::CONFIG_TOML,
    data_provider::{
        DataProvider, DataProviderBatch, DataProviderError, EndReason, ResultDataProvider,
    },
    error::FileFormatError,
    machine_binary::{MachineBinary, MachineId, BYTES_MACHINE},
};

const BATCH_SIZE: usize = 100_000;

/// Global header record of the bbchallenge DB (first 30 bytes, big-endian counts).
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub num_undecided_machines_exceed_47m_steps: u64,
    pub num_undecided_machines_exceed_12k_cells: u64,
    pub num_undecided_machines: u64,
    pub is_sorted: bool,
}

#[derive(Debug)]
pub struct DbReader {
    reader: BufReader<File>,
    header: Option<Header>,
    /// Number of machine records in the file (from the header if present, else from the file size).
    num_machines: u64,
}

impl DbReader {
    pub fn try_new_toml_path() -> Result<Self, FileFormatError> {
        Self::try_new(
            CONFIG_TOML.machine_db_filename_path(),
            CONFIG_TOML.machine_db_has_header(),
        )
    }

    pub fn try_new(file_path: &str, has_header: bool) -> Result<Self, FileFormatError> {
        let file = File::open(file_path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = if has_header {
            Some(Self::read_header(&mut reader)?)
        } else {
            None
        };
        let header_records = has_header as u64;
        if file_len % BYTES_MACHINE as u64 != 0 {
            return Err(FileFormatError::malformed(
                file_len - file_len % BYTES_MACHINE as u64,
                format!("DB file length {file_len} is not a multiple of {BYTES_MACHINE}"),
            ));
        }
        let records_in_file = file_len / BYTES_MACHINE as u64 - header_records;
        let num_machines = match &header {
            Some(h) => h.num_undecided_machines.min(records_in_file),
            None => records_in_file,
        };

        Ok(Self {
            reader,
            header,
            num_machines,
        })
    }

    fn read_header(reader: &mut BufReader<File>) -> Result<Header, FileFormatError> {
        let mut buffer: [u8; BYTES_MACHINE] = [0; BYTES_MACHINE];
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read < 13 {
            return Err(FileFormatError::malformed(
                bytes_read as u64,
                "not enough bytes in DB header",
            ));
        };

        Ok(Header {
            num_undecided_machines_exceed_47m_steps: u32::from_be_bytes(
                buffer[0..4].try_into().unwrap(),
            ) as u64,
            num_undecided_machines_exceed_12k_cells: u32::from_be_bytes(
                buffer[4..8].try_into().unwrap(),
            ) as u64,
            num_undecided_machines: u32::from_be_bytes(buffer[8..12].try_into().unwrap()) as u64,
            is_sorted: buffer[12] == 1,
        })
    }

    /// get single machine \
    /// Slow, do not use in loops.
    pub fn read_machine_single(
        machine_id: u64,
        file_path: &str,
        has_header: bool,
    ) -> Result<MachineId, FileFormatError> {
        let mut db = Self::try_new(file_path, has_header)?;
        db.read_machine(machine_id)
    }

    /// Reads the machine with the given DB index.
    pub fn read_machine(&mut self, machine_id: u64) -> Result<MachineId, FileFormatError> {
        let offset = self.file_pos(machine_id);
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buffer: [u8; BYTES_MACHINE] = [0; BYTES_MACHINE];

        if self.reader.read(&mut buffer)? != BYTES_MACHINE {
            return Err(FileFormatError::malformed(
                offset,
                format!("machine record {machine_id} is truncated"),
            ));
        }
        let machine = MachineBinary::from_db_bytes(&buffer)
            .map_err(|e| FileFormatError::malformed(offset, e))?;
        Ok(MachineId::new(machine_id, machine))
    }

    // id starts with 0
    // returns machines up to count
    pub fn read_machine_range(
        &mut self,
        first_id: u64,
        count: usize,
    ) -> Result<Vec<MachineId>, FileFormatError> {
        let mut machines: Vec<MachineId> = Vec::with_capacity(count);
        self.reader.seek(SeekFrom::Start(self.file_pos(first_id)))?;
        let mut buffer: [u8; BYTES_MACHINE] = [0; BYTES_MACHINE];

        for i in 0..count as u64 {
            if self.reader.read(&mut buffer)? < BYTES_MACHINE {
                // buffered data ended, seek again to update cache
                self.reader
                    .seek(SeekFrom::Start(self.file_pos(first_id + i)))?;
                if self.reader.read(&mut buffer)? < BYTES_MACHINE {
                    return Err(FileFormatError::malformed(
                        self.file_pos(first_id + i),
                        "not enough machine records",
                    ));
                }
            }
            let machine = MachineBinary::from_db_bytes(&buffer)
                .map_err(|e| FileFormatError::malformed(self.file_pos(first_id + i), e))?;
            machines.push(MachineId::new(first_id + i, machine));
        }
        Ok(machines)
    }

    fn file_pos(&self, id: u64) -> u64 {
        (id + self.header.is_some() as u64) * BYTES_MACHINE as u64
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn num_machines(&self) -> u64 {
        self.num_machines
    }
}

/// Batched [DataProvider] over the machine DB, optionally limited to an id range.
#[derive(Debug)]
pub struct DbDataProvider {
    batch_no: usize,
    batch_size: usize,
    db_reader: DbReader,
    id_start: u64,
    id_end: u64,
    id_next: u64,
}

impl DataProvider for DbDataProvider {
    fn name(&self) -> &str {
        "Machine DB File Reader"
    }

    fn machine_batch_next(&mut self) -> ResultDataProvider {
        let mut batch = DataProviderBatch::new(self.batch_no);

        if self.id_next >= self.id_end {
            batch.end_reason = EndReason::NoMoreData;
            return Ok(batch);
        }

        let mut end = self.id_next + self.batch_size as u64;
        if end >= self.id_end {
            end = self.id_end;
            batch.end_reason = EndReason::IsLastBatch;
        };
        let count = (end - self.id_next) as usize;

        let machines = match self.db_reader.read_machine_range(self.id_next, count) {
            Ok(m) => m,
            Err(e) => {
                batch.end_reason = EndReason::Error(e.to_string());
                let dpe = DataProviderError {
                    name: self.name().to_string(),
                    batch: Some(batch),
                    msg: e.to_string(),
                };
                return Err(Box::new(dpe));
            }
        };
        self.id_next += machines.len() as u64;
        self.batch_no += 1;
        batch.machines = machines;

        Ok(batch)
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn num_machines_to_process(&self) -> u64 {
        self.id_end - self.id_start
    }
}

#[derive(Default)]
pub struct DbDataProviderBuilder {
    batch_size: usize,
    file_path: String,
    has_header: bool,
    id_range: Option<Range<u64>>,
}

impl DbDataProviderBuilder {
    pub fn builder() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            file_path: CONFIG_TOML.machine_db_filename_path().to_string(),
            has_header: CONFIG_TOML.machine_db_has_header(),
            id_range: None,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn file_path(mut self, path: String, has_header: bool) -> Self {
        self.file_path = path;
        self.has_header = has_header;
        self
    }

    /// Sets the ID range for the data provider. None will use full range.
    pub fn id_range(mut self, id_range: Option<Range<u64>>) -> Self {
        self.id_range = id_range;
        self
    }

    pub fn build(self) -> Result<DbDataProvider, FileFormatError> {
        let db_reader = DbReader::try_new(&self.file_path, self.has_header)?;
        let num_machines = db_reader.num_machines();
        let id_range = match self.id_range {
            Some(r) => r,
            None => 0..num_machines,
        };
        let id_start = id_range.start;
        let id_end = id_range.end.min(num_machines);
        // reduce batch size to actually available machines
        let batch_size = (id_end.saturating_sub(id_start)).min(self.batch_size as u64) as usize;

        Ok(DbDataProvider {
            batch_no: 0,
            batch_size: batch_size.max(1),
            db_reader,
            id_start,
            id_end,
            id_next: id_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Writes a small DB file: header record (3 machines) plus the same
    /// machine three times.
    fn write_test_db(path: &str, with_header: bool) {
        let mut file = std::fs::File::create(path).unwrap();
        if with_header {
            let mut header = [0u8; BYTES_MACHINE];
            header[8..12].copy_from_slice(&3u32.to_be_bytes());
            file.write_all(&header).unwrap();
        }
        // 1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA
        let record: [u8; BYTES_MACHINE] = [
            1, 0, 2, 1, 1, 3, 1, 0, 3, 1, 0, 2, 1, 0, 4, 0, 1, 5, 1, 1, 1, 1, 1, 4, 0, 0, 0, 0, 1,
            1,
        ];
        for _ in 0..3 {
            file.write_all(&record).unwrap();
        }
    }

    #[test]
    fn db_reader_reads_records_behind_global_header() {
        let path = std::env::temp_dir().join("bb_nonhalt_test_db_header");
        let path = path.to_str().unwrap();
        write_test_db(path, true);

        let mut db = DbReader::try_new(path, true).unwrap();
        assert_eq!(3, db.num_machines());
        let machine = db.read_machine(1).unwrap();
        assert_eq!(1, machine.id());
        assert_eq!(
            "1RB1LC_1RC1RB_1RD0LE_1LA1LD_---0LA",
            machine.to_standard_tm_text_format()
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn db_reader_headerless_file_counts_records() {
        let path = std::env::temp_dir().join("bb_nonhalt_test_db_plain");
        let path = path.to_str().unwrap();
        write_test_db(path, false);

        let mut db = DbReader::try_new(path, false).unwrap();
        assert!(db.header().is_none());
        assert_eq!(3, db.num_machines());
        let machines = db.read_machine_range(0, 3).unwrap();
        assert_eq!(3, machines.len());
        assert_eq!(2, machines[2].id());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn db_reader_rejects_truncated_file() {
        let path = std::env::temp_dir().join("bb_nonhalt_test_db_truncated");
        let path = path.to_str().unwrap();
        std::fs::write(path, [0u8; 40]).unwrap();

        let r = DbReader::try_new(path, false);
        assert!(matches!(r, Err(FileFormatError::Malformed { .. })));
        std::fs::remove_file(path).ok();
    }
}
