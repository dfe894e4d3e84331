use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::{read_string, string_encode_size, write_string, MAX_NAME_LENGTH, XP_PER_LEVEL};
use crate::Timestamp;

/// Per-account state. The balance is a cache over the account's ledger
/// entries and is only ever written in the same commit as a ledger insert;
/// `ledger_entries` is the sequence number the next entry will take.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Account {
    pub name: String,
    pub is_active: bool,
    pub balance: u64,
    pub ledger_entries: u64,
    pub xp: u64,
    pub level: u32,
    pub created_at: Timestamp,
}

impl Account {
    pub fn open(name: String, created_at: Timestamp) -> Self {
        Self {
            name,
            is_active: true,
            balance: 0,
            ledger_entries: 0,
            xp: 0,
            level: 1,
            created_at,
        }
    }

    /// Credit xp and re-derive the level.
    pub fn grant_xp(&mut self, xp: u64) {
        self.xp = self.xp.saturating_add(xp);
        self.level = level_for_xp(self.xp);
    }
}

/// Level curve: level 1 at 0 xp, one level per [`XP_PER_LEVEL`] thereafter.
pub fn level_for_xp(xp: u64) -> u32 {
    let level = 1 + xp / XP_PER_LEVEL;
    u32::try_from(level).unwrap_or(u32::MAX)
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.name, writer);
        self.is_active.write(writer);
        self.balance.write(writer);
        self.ledger_entries.write(writer);
        self.xp.write(writer);
        self.level.write(writer);
        self.created_at.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            name: read_string(reader, MAX_NAME_LENGTH)?,
            is_active: bool::read(reader)?,
            balance: u64::read(reader)?,
            ledger_entries: u64::read(reader)?,
            xp: u64::read(reader)?,
            level: u32::read(reader)?,
            created_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.name)
            + self.is_active.encode_size()
            + self.balance.encode_size()
            + self.ledger_entries.encode_size()
            + self.xp.encode_size()
            + self.level.encode_size()
            + self.created_at.encode_size()
    }
}
