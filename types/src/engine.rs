//! Storage schema and call surface of the mission engine.
//!
//! `Key`/`Value` describe the keyed store layout (four logical tables plus
//! their per-account indexes and id sequences). `Operation` is the engine's
//! inbound surface: account identity is attached by the trusted auth layer,
//! so there is no signature envelope around it. `Event` is the outbound
//! audit feed consumed by indexing layers and the simulator.

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};

use crate::game::{
    read_string, string_encode_size, write_string, Account, Aircraft, AircraftType, LedgerEntry,
    MissionInstance, MissionTemplate, MAX_INDEX_ENTRIES, MAX_NAME_LENGTH,
};
use crate::{AccountId, AircraftId, AircraftTypeId, MissionId, TemplateId, Timestamp};

/// Storage key. Ledger entries are keyed by `(account, seq)`; the index
/// variants hold id lists that are maintained in the same atomic commit as
/// the records they point at.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Account(AccountId),
    /// Ids of all aircraft owned by the account.
    Fleet(AccountId),
    Aircraft(AircraftId),
    AircraftType(AircraftTypeId),
    Template(TemplateId),
    Mission(MissionId),
    /// Ids of the account's missions still in the Running state.
    RunningMissions(AccountId),
    Ledger(AccountId, u64),
    AircraftSeq,
    MissionSeq,
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(id) => {
                0u8.write(writer);
                id.write(writer);
            }
            Self::Fleet(id) => {
                1u8.write(writer);
                id.write(writer);
            }
            Self::Aircraft(id) => {
                2u8.write(writer);
                id.write(writer);
            }
            Self::AircraftType(id) => {
                3u8.write(writer);
                id.write(writer);
            }
            Self::Template(id) => {
                4u8.write(writer);
                id.write(writer);
            }
            Self::Mission(id) => {
                5u8.write(writer);
                id.write(writer);
            }
            Self::RunningMissions(id) => {
                6u8.write(writer);
                id.write(writer);
            }
            Self::Ledger(account, seq) => {
                7u8.write(writer);
                account.write(writer);
                seq.write(writer);
            }
            Self::AircraftSeq => 8u8.write(writer),
            Self::MissionSeq => 9u8.write(writer),
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(u64::read(reader)?),
            1 => Self::Fleet(u64::read(reader)?),
            2 => Self::Aircraft(u64::read(reader)?),
            3 => Self::AircraftType(u64::read(reader)?),
            4 => Self::Template(u64::read(reader)?),
            5 => Self::Mission(u64::read(reader)?),
            6 => Self::RunningMissions(u64::read(reader)?),
            7 => Self::Ledger(u64::read(reader)?, u64::read(reader)?),
            8 => Self::AircraftSeq,
            9 => Self::MissionSeq,
            i => return Err(Error::InvalidEnum(i)),
        };
        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Account(id)
            | Self::Fleet(id)
            | Self::Aircraft(id)
            | Self::AircraftType(id)
            | Self::Template(id)
            | Self::Mission(id)
            | Self::RunningMissions(id) => id.encode_size(),
            Self::Ledger(account, seq) => account.encode_size() + seq.encode_size(),
            Self::AircraftSeq | Self::MissionSeq => 0,
        }
    }
}

/// Storage value; variants correspond one-to-one with [`Key`] families.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    Account(Account),
    Aircraft(Aircraft),
    AircraftType(AircraftType),
    Template(MissionTemplate),
    Mission(MissionInstance),
    Ledger(LedgerEntry),
    Ids(Vec<u64>),
    Seq(u64),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(v) => {
                0u8.write(writer);
                v.write(writer);
            }
            Self::Aircraft(v) => {
                1u8.write(writer);
                v.write(writer);
            }
            Self::AircraftType(v) => {
                2u8.write(writer);
                v.write(writer);
            }
            Self::Template(v) => {
                3u8.write(writer);
                v.write(writer);
            }
            Self::Mission(v) => {
                4u8.write(writer);
                v.write(writer);
            }
            Self::Ledger(v) => {
                5u8.write(writer);
                v.write(writer);
            }
            Self::Ids(v) => {
                6u8.write(writer);
                v.write(writer);
            }
            Self::Seq(v) => {
                7u8.write(writer);
                v.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Aircraft(Aircraft::read(reader)?),
            2 => Self::AircraftType(AircraftType::read(reader)?),
            3 => Self::Template(MissionTemplate::read(reader)?),
            4 => Self::Mission(MissionInstance::read(reader)?),
            5 => Self::Ledger(LedgerEntry::read(reader)?),
            6 => Self::Ids(Vec::<u64>::read_range(reader, 0..=MAX_INDEX_ENTRIES)?),
            7 => Self::Seq(u64::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };
        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Account(v) => v.encode_size(),
            Self::Aircraft(v) => v.encode_size(),
            Self::AircraftType(v) => v.encode_size(),
            Self::Template(v) => v.encode_size(),
            Self::Mission(v) => v.encode_size(),
            Self::Ledger(v) => v.encode_size(),
            Self::Ids(v) => v.encode_size(),
            Self::Seq(v) => v.encode_size(),
        }
    }
}

/// One engine call. Binary layout: a one-byte tag followed by the fields in
/// declaration order (u64s big-endian, strings length-prefixed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Open an account with the starting balance.
    OpenAccount { account: AccountId, name: String },
    /// Buy a catalog aircraft for the account's fleet.
    PurchaseAircraft {
        account: AccountId,
        aircraft_type: AircraftTypeId,
    },
    /// Sell an owned aircraft at the resale rate.
    SellAircraft {
        account: AccountId,
        aircraft: AircraftId,
    },
    /// Commit an idle aircraft to a catalog mission.
    ActivateMission {
        account: AccountId,
        template: TemplateId,
    },
    /// Settle every running mission of the account whose plan has elapsed.
    ResolveDueMissions { account: AccountId },
    /// Cancel a running mission without settling its reward.
    AbortMission {
        account: AccountId,
        mission: MissionId,
    },
}

impl Operation {
    pub fn account(&self) -> AccountId {
        match self {
            Self::OpenAccount { account, .. }
            | Self::PurchaseAircraft { account, .. }
            | Self::SellAircraft { account, .. }
            | Self::ActivateMission { account, .. }
            | Self::ResolveDueMissions { account }
            | Self::AbortMission { account, .. } => *account,
        }
    }
}

impl Write for Operation {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::OpenAccount { account, name } => {
                0u8.write(writer);
                account.write(writer);
                write_string(name, writer);
            }
            Self::PurchaseAircraft {
                account,
                aircraft_type,
            } => {
                1u8.write(writer);
                account.write(writer);
                aircraft_type.write(writer);
            }
            Self::SellAircraft { account, aircraft } => {
                2u8.write(writer);
                account.write(writer);
                aircraft.write(writer);
            }
            Self::ActivateMission { account, template } => {
                3u8.write(writer);
                account.write(writer);
                template.write(writer);
            }
            Self::ResolveDueMissions { account } => {
                4u8.write(writer);
                account.write(writer);
            }
            Self::AbortMission { account, mission } => {
                5u8.write(writer);
                account.write(writer);
                mission.write(writer);
            }
        }
    }
}

impl Read for Operation {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let operation = match u8::read(reader)? {
            0 => Self::OpenAccount {
                account: u64::read(reader)?,
                name: read_string(reader, MAX_NAME_LENGTH)?,
            },
            1 => Self::PurchaseAircraft {
                account: u64::read(reader)?,
                aircraft_type: u64::read(reader)?,
            },
            2 => Self::SellAircraft {
                account: u64::read(reader)?,
                aircraft: u64::read(reader)?,
            },
            3 => Self::ActivateMission {
                account: u64::read(reader)?,
                template: u64::read(reader)?,
            },
            4 => Self::ResolveDueMissions {
                account: u64::read(reader)?,
            },
            5 => Self::AbortMission {
                account: u64::read(reader)?,
                mission: u64::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };
        Ok(operation)
    }
}

impl EncodeSize for Operation {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::OpenAccount { account, name } => {
                account.encode_size() + string_encode_size(name)
            }
            Self::PurchaseAircraft { .. } => 8 + 8,
            Self::SellAircraft { .. } => 8 + 8,
            Self::ActivateMission { .. } => 8 + 8,
            Self::ResolveDueMissions { .. } => 8,
            Self::AbortMission { .. } => 8 + 8,
        }
    }
}

/// Audit feed entry emitted by a committed workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    AccountOpened {
        account: AccountId,
        starting_balance: u64,
    },
    AircraftPurchased {
        account: AccountId,
        aircraft: AircraftId,
        aircraft_type: AircraftTypeId,
        price: u64,
        new_balance: u64,
    },
    AircraftSold {
        account: AccountId,
        aircraft: AircraftId,
        sale_price: u64,
        new_balance: u64,
    },
    MissionActivated {
        account: AccountId,
        mission: MissionId,
        template: TemplateId,
        aircraft: AircraftId,
        cost: u64,
        planned_finish: Timestamp,
        new_balance: u64,
    },
    MissionSettled {
        account: AccountId,
        mission: MissionId,
        aircraft: AircraftId,
        success: bool,
        reward_applied: u64,
        new_balance: u64,
    },
    MissionAborted {
        account: AccountId,
        mission: MissionId,
        aircraft: AircraftId,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::AccountOpened {
                account,
                starting_balance,
            } => {
                0u8.write(writer);
                account.write(writer);
                starting_balance.write(writer);
            }
            Self::AircraftPurchased {
                account,
                aircraft,
                aircraft_type,
                price,
                new_balance,
            } => {
                1u8.write(writer);
                account.write(writer);
                aircraft.write(writer);
                aircraft_type.write(writer);
                price.write(writer);
                new_balance.write(writer);
            }
            Self::AircraftSold {
                account,
                aircraft,
                sale_price,
                new_balance,
            } => {
                2u8.write(writer);
                account.write(writer);
                aircraft.write(writer);
                sale_price.write(writer);
                new_balance.write(writer);
            }
            Self::MissionActivated {
                account,
                mission,
                template,
                aircraft,
                cost,
                planned_finish,
                new_balance,
            } => {
                3u8.write(writer);
                account.write(writer);
                mission.write(writer);
                template.write(writer);
                aircraft.write(writer);
                cost.write(writer);
                planned_finish.write(writer);
                new_balance.write(writer);
            }
            Self::MissionSettled {
                account,
                mission,
                aircraft,
                success,
                reward_applied,
                new_balance,
            } => {
                4u8.write(writer);
                account.write(writer);
                mission.write(writer);
                aircraft.write(writer);
                success.write(writer);
                reward_applied.write(writer);
                new_balance.write(writer);
            }
            Self::MissionAborted {
                account,
                mission,
                aircraft,
            } => {
                5u8.write(writer);
                account.write(writer);
                mission.write(writer);
                aircraft.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::AccountOpened {
                account: u64::read(reader)?,
                starting_balance: u64::read(reader)?,
            },
            1 => Self::AircraftPurchased {
                account: u64::read(reader)?,
                aircraft: u64::read(reader)?,
                aircraft_type: u64::read(reader)?,
                price: u64::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            2 => Self::AircraftSold {
                account: u64::read(reader)?,
                aircraft: u64::read(reader)?,
                sale_price: u64::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            3 => Self::MissionActivated {
                account: u64::read(reader)?,
                mission: u64::read(reader)?,
                template: u64::read(reader)?,
                aircraft: u64::read(reader)?,
                cost: u64::read(reader)?,
                planned_finish: u64::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            4 => Self::MissionSettled {
                account: u64::read(reader)?,
                mission: u64::read(reader)?,
                aircraft: u64::read(reader)?,
                success: bool::read(reader)?,
                reward_applied: u64::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            5 => Self::MissionAborted {
                account: u64::read(reader)?,
                mission: u64::read(reader)?,
                aircraft: u64::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };
        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::AccountOpened { .. } => 8 + 8,
            Self::AircraftPurchased { .. } => 8 * 5,
            Self::AircraftSold { .. } => 8 * 4,
            Self::MissionActivated { .. } => 8 * 7,
            Self::MissionSettled { .. } => 8 * 5 + 1,
            Self::MissionAborted { .. } => 8 * 3,
        }
    }
}
