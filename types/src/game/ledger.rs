use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::{read_string, string_encode_size, write_string, MAX_DESCRIPTION_LENGTH};
use crate::{AccountId, AircraftId, MissionId, Timestamp};

/// Category tag of a balance-affecting event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerCategory {
    InitialGrant,
    MissionActivate,
    MissionReward,
    AircraftPurchase,
    AircraftSale,
}

impl Write for LedgerCategory {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::InitialGrant => 0u8.write(writer),
            Self::MissionActivate => 1u8.write(writer),
            Self::MissionReward => 2u8.write(writer),
            Self::AircraftPurchase => 3u8.write(writer),
            Self::AircraftSale => 4u8.write(writer),
        }
    }
}

impl Read for LedgerCategory {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::InitialGrant),
            1 => Ok(Self::MissionActivate),
            2 => Ok(Self::MissionReward),
            3 => Ok(Self::AircraftPurchase),
            4 => Ok(Self::AircraftSale),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for LedgerCategory {
    fn encode_size(&self) -> usize {
        1
    }
}

/// Append-only record of one balance change. Entries are keyed by
/// `(account, seq)` with `seq` dense from zero, so the full history of an
/// account can be walked without a scan; they are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub account: AccountId,
    pub seq: u64,
    /// Positive = credit, negative = debit.
    pub amount: i64,
    pub category: LedgerCategory,
    pub description: String,
    pub aircraft: Option<AircraftId>,
    pub mission: Option<MissionId>,
    pub created_at: Timestamp,
}

impl Write for LedgerEntry {
    fn write(&self, writer: &mut impl BufMut) {
        self.account.write(writer);
        self.seq.write(writer);
        self.amount.write(writer);
        self.category.write(writer);
        write_string(&self.description, writer);
        self.aircraft.write(writer);
        self.mission.write(writer);
        self.created_at.write(writer);
    }
}

impl Read for LedgerEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            account: u64::read(reader)?,
            seq: u64::read(reader)?,
            amount: i64::read(reader)?,
            category: LedgerCategory::read(reader)?,
            description: read_string(reader, MAX_DESCRIPTION_LENGTH)?,
            aircraft: Option::<u64>::read(reader)?,
            mission: Option::<u64>::read(reader)?,
            created_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LedgerEntry {
    fn encode_size(&self) -> usize {
        self.account.encode_size()
            + self.seq.encode_size()
            + self.amount.encode_size()
            + self.category.encode_size()
            + string_encode_size(&self.description)
            + self.aircraft.encode_size()
            + self.mission.encode_size()
            + self.created_at.encode_size()
    }
}
