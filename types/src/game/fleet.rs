use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::{
    opt_string_encode_size, read_opt_string, read_string, string_encode_size, write_opt_string,
    write_string, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use crate::{AccountId, AircraftId, AircraftTypeId, Timestamp};

/// Operational role of an aircraft type; missions require a matching role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AircraftRole {
    MilitaryTransport,
    MilitaryAttack,
    MilitaryRecon,
}

impl Write for AircraftRole {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::MilitaryTransport => 0u8.write(writer),
            Self::MilitaryAttack => 1u8.write(writer),
            Self::MilitaryRecon => 2u8.write(writer),
        }
    }
}

impl Read for AircraftRole {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::MilitaryTransport),
            1 => Ok(Self::MilitaryAttack),
            2 => Ok(Self::MilitaryRecon),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for AircraftRole {
    fn encode_size(&self) -> usize {
        1
    }
}

/// Lifecycle of an owned aircraft. Transitions happen only through workflow
/// calls: activation takes Idle to Committed, resolution and abort take
/// Committed back to Idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AircraftStatus {
    Idle,
    Committed,
    Maintenance,
}

impl Write for AircraftStatus {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Idle => 0u8.write(writer),
            Self::Committed => 1u8.write(writer),
            Self::Maintenance => 2u8.write(writer),
        }
    }
}

impl Read for AircraftStatus {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Committed),
            2 => Ok(Self::Maintenance),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for AircraftStatus {
    fn encode_size(&self) -> usize {
        1
    }
}

/// Catalog aircraft type (admin-managed, read-only for the engine).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AircraftType {
    pub model: String,
    pub role: AircraftRole,
    pub base_price: u64,
    pub description: String,
    pub is_active: bool,
}

impl Write for AircraftType {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.model, writer);
        self.role.write(writer);
        self.base_price.write(writer);
        write_string(&self.description, writer);
        self.is_active.write(writer);
    }
}

impl Read for AircraftType {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            model: read_string(reader, MAX_NAME_LENGTH)?,
            role: AircraftRole::read(reader)?,
            base_price: u64::read(reader)?,
            description: read_string(reader, MAX_DESCRIPTION_LENGTH)?,
            is_active: bool::read(reader)?,
        })
    }
}

impl EncodeSize for AircraftType {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.model)
            + self.role.encode_size()
            + self.base_price.encode_size()
            + string_encode_size(&self.description)
            + self.is_active.encode_size()
    }
}

/// An owned aircraft (unit), exclusively owned by one account. The role is
/// snapshotted from the catalog at purchase so allocation does not depend on
/// later catalog edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aircraft {
    pub id: AircraftId,
    pub owner: AccountId,
    pub aircraft_type: AircraftTypeId,
    pub role: AircraftRole,
    pub status: AircraftStatus,
    pub purchased_price: u64,
    pub purchased_at: Timestamp,
    pub nickname: Option<String>,
}

impl Write for Aircraft {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.owner.write(writer);
        self.aircraft_type.write(writer);
        self.role.write(writer);
        self.status.write(writer);
        self.purchased_price.write(writer);
        self.purchased_at.write(writer);
        write_opt_string(&self.nickname, writer);
    }
}

impl Read for Aircraft {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            owner: u64::read(reader)?,
            aircraft_type: u64::read(reader)?,
            role: AircraftRole::read(reader)?,
            status: AircraftStatus::read(reader)?,
            purchased_price: u64::read(reader)?,
            purchased_at: u64::read(reader)?,
            nickname: read_opt_string(reader, MAX_NAME_LENGTH)?,
        })
    }
}

impl EncodeSize for Aircraft {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.owner.encode_size()
            + self.aircraft_type.encode_size()
            + self.role.encode_size()
            + self.status.encode_size()
            + self.purchased_price.encode_size()
            + self.purchased_at.encode_size()
            + opt_string_encode_size(&self.nickname)
    }
}
