//! Dense boolean matrices and vectors over the semiring ({0,1}, or, and),
//! bit-packed 8 columns per byte with bit 0 = column 0. \
//! This packing is exactly the row layout of the DVF wire format, so matrix
//! rows serialize as plain byte copies. All entries beyond the logical width
//! are kept at 0, which makes whole-row comparisons and byte-wise operations
//! valid without re-masking.

/// Bytes needed for one packed row of `n` columns.
#[inline]
pub fn packed_row_len(n: usize) -> usize {
    n.div_ceil(8)
}

/// Boolean (row) vector of fixed length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitRow {
    len: usize,
    data: Vec<u8>,
}

impl BitRow {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            data: vec![0; packed_row_len(len)],
        }
    }

    /// From packed bytes; bits beyond `len` are cleared.
    pub fn from_packed(len: usize, bytes: &[u8]) -> Self {
        debug_assert_eq!(packed_row_len(len), bytes.len());
        let mut row = Self {
            len,
            data: bytes.to_vec(),
        };
        row.mask_tail();
        row
    }

    fn mask_tail(&mut self) {
        let used = self.len % 8;
        if used != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= (1u8 << used) - 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        self.data[i / 8] & (1 << (i % 8)) != 0
    }

    #[inline]
    pub fn set(&mut self, i: usize) {
        debug_assert!(i < self.len);
        self.data[i / 8] |= 1 << (i % 8);
    }

    pub fn as_packed(&self) -> &[u8] {
        &self.data
    }

    /// Indices of the set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.data.iter().enumerate().flat_map(|(byte_no, &byte)| {
            (0..8usize)
                .filter(move |&bit| byte & (1u8 << bit) != 0)
                .map(move |bit| byte_no * 8 + bit)
        })
    }
}

/// Square boolean matrix, rows packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    n: usize,
    row_len: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    pub fn new(n: usize) -> Self {
        let row_len = packed_row_len(n);
        Self {
            n,
            row_len,
            data: vec![0; n * row_len],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.n && j < self.n);
        self.data[i * self.row_len + j / 8] & (1 << (j % 8)) != 0
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize) {
        debug_assert!(i < self.n && j < self.n);
        self.data[i * self.row_len + j / 8] |= 1 << (j % 8);
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.data[i * self.row_len..(i + 1) * self.row_len]
    }

    /// Replaces row i with the given packed bytes; bits beyond n are cleared.
    pub fn set_row_packed(&mut self, i: usize, bytes: &[u8]) {
        debug_assert_eq!(self.row_len, bytes.len());
        self.data[i * self.row_len..(i + 1) * self.row_len].copy_from_slice(bytes);
        let used = self.n % 8;
        if used != 0 {
            self.data[(i + 1) * self.row_len - 1] &= (1u8 << used) - 1;
        }
    }

    /// row(i) |= other; returns true if row(i) changed.
    pub fn or_row(&mut self, i: usize, other: &[u8]) -> bool {
        debug_assert_eq!(self.row_len, other.len());
        let row = &mut self.data[i * self.row_len..(i + 1) * self.row_len];
        let mut changed = false;
        for (dst, src) in row.iter_mut().zip(other.iter()) {
            let merged = *dst | *src;
            changed |= merged != *dst;
            *dst = merged;
        }
        changed
    }

    /// true if row(i) has every bit of `other` set.
    pub fn row_is_superset(&self, i: usize, other: &[u8]) -> bool {
        debug_assert_eq!(self.row_len, other.len());
        self.row(i)
            .iter()
            .zip(other.iter())
            .all(|(row, other)| other & !row == 0)
    }

    /// Boolean matrix product: P\[i,j\] = or_k (self\[i,k\] and rhs\[k,j\]).
    pub fn product(&self, rhs: &BitMatrix) -> BitMatrix {
        debug_assert_eq!(self.n, rhs.n);
        let mut result = BitMatrix::new(self.n);
        for i in 0..self.n {
            let row = self.row(i);
            for (byte_no, &byte) in row.iter().enumerate() {
                if byte == 0 {
                    continue;
                }
                for bit in 0..8 {
                    if byte & (1 << bit) != 0 {
                        let k = byte_no * 8 + bit;
                        result.or_row(i, rhs.row(k));
                    }
                }
            }
        }
        result
    }

    /// Boolean matrix-vector product: r\[i\] = or_j (self\[i,j\] and v\[j\]).
    pub fn product_vec(&self, v: &BitRow) -> BitRow {
        debug_assert_eq!(self.n, v.len());
        let mut result = BitRow::new(self.n);
        for i in 0..self.n {
            let any = self
                .row(i)
                .iter()
                .zip(v.as_packed().iter())
                .any(|(row, vec)| row & vec != 0);
            if any {
                result.set(i);
            }
        }
        result
    }
}
