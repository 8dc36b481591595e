//! Record Codec Module
//!
//! The fixed 24-byte header stored inline ahead of every key/value payload
//! in a shard's log, packed explicitly as little-endian fields.

// == Record Header ==
/// Metadata block preceding every record.
///
/// On-log layout, little-endian:
///
/// | bytes  | field          |
/// |--------|----------------|
/// | 0..4   | access_time    |
/// | 4..8   | expire_at      |
/// | 8..10  | key_len        |
/// | 10..12 | hash_fragment  |
/// | 12..16 | value_len      |
/// | 16..20 | value_capacity |
/// | 20     | deleted flag   |
/// | 21     | slot id        |
/// | 22..24 | reserved       |
///
/// The key bytes follow the header, then the value bytes padded out to
/// `value_capacity` so the record can absorb modest overwrites in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Unix seconds of the last store or retrieval
    pub access_time: u32,
    /// Unix seconds after which the record is dead, 0 for never
    pub expire_at: u32,
    /// Length of the key bytes
    pub key_len: u16,
    /// Hash bits carried for index reconstruction and diagnostics
    pub hash_fragment: u16,
    /// Length of the live value bytes
    pub value_len: u32,
    /// Reserved value region, always at least `value_len`
    pub value_capacity: u32,
    /// Tombstone flag, set when the record is superseded or removed
    pub deleted: bool,
    /// Index bucket the record belongs to
    pub slot_id: u8,
}

impl RecordHeader {
    /// The packed length of the record header
    pub const SIZE: usize = 24;

    // == Decode ==
    /// Unpacks a header from its on-log form.
    pub fn decode(buf: &[u8; Self::SIZE]) -> Self {
        Self {
            access_time: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            expire_at: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            key_len: u16::from_le_bytes([buf[8], buf[9]]),
            hash_fragment: u16::from_le_bytes([buf[10], buf[11]]),
            value_len: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            value_capacity: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
            deleted: buf[20] != 0,
            slot_id: buf[21],
        }
    }

    // == Encode ==
    /// Packs the header into its on-log form.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.access_time.to_le_bytes());
        buf[4..8].copy_from_slice(&self.expire_at.to_le_bytes());
        buf[8..10].copy_from_slice(&self.key_len.to_le_bytes());
        buf[10..12].copy_from_slice(&self.hash_fragment.to_le_bytes());
        buf[12..16].copy_from_slice(&self.value_len.to_le_bytes());
        buf[16..20].copy_from_slice(&self.value_capacity.to_le_bytes());
        buf[20] = self.deleted as u8;
        buf[21] = self.slot_id;
        buf
    }

    // == Layout ==
    /// Offset of the value bytes relative to the record start.
    pub fn value_offset(&self) -> usize {
        Self::SIZE + self.key_len as usize
    }

    /// Whether the record's deadline has passed at `now`.
    pub fn is_expired(&self, now: u32) -> bool {
        self.expire_at != 0 && self.expire_at <= now
    }
}
