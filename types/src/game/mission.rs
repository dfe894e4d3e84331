use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::{
    opt_string_encode_size, read_opt_string, read_string, string_encode_size, write_opt_string,
    write_string, AircraftRole, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use crate::{AccountId, AircraftId, MissionId, TemplateId, Timestamp};

/// Catalog mission template. Immutable from the engine's point of view:
/// activation snapshots cost, reward, xp and duration into the instance, so
/// later catalog edits never affect already-running missions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissionTemplate {
    pub name: String,
    pub required_role: AircraftRole,
    pub cost: u64,
    pub reward: u64,
    pub duration_seconds: u64,
    pub xp_reward: u64,
    pub description: String,
    pub level_required: u32,
    pub is_active: bool,
}

impl Write for MissionTemplate {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.name, writer);
        self.required_role.write(writer);
        self.cost.write(writer);
        self.reward.write(writer);
        self.duration_seconds.write(writer);
        self.xp_reward.write(writer);
        write_string(&self.description, writer);
        self.level_required.write(writer);
        self.is_active.write(writer);
    }
}

impl Read for MissionTemplate {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            name: read_string(reader, MAX_NAME_LENGTH)?,
            required_role: AircraftRole::read(reader)?,
            cost: u64::read(reader)?,
            reward: u64::read(reader)?,
            duration_seconds: u64::read(reader)?,
            xp_reward: u64::read(reader)?,
            description: read_string(reader, MAX_DESCRIPTION_LENGTH)?,
            level_required: u32::read(reader)?,
            is_active: bool::read(reader)?,
        })
    }
}

impl EncodeSize for MissionTemplate {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.name)
            + self.required_role.encode_size()
            + self.cost.encode_size()
            + self.reward.encode_size()
            + self.duration_seconds.encode_size()
            + self.xp_reward.encode_size()
            + string_encode_size(&self.description)
            + self.level_required.encode_size()
            + self.is_active.encode_size()
    }
}

/// Terminal-state machine for an activated mission. Write-once after
/// creation: Running transitions to exactly one of the other states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionStatus {
    Running,
    Success,
    Failed,
    Aborted,
}

impl MissionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl Write for MissionStatus {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Running => 0u8.write(writer),
            Self::Success => 1u8.write(writer),
            Self::Failed => 2u8.write(writer),
            Self::Aborted => 3u8.write(writer),
        }
    }
}

impl Read for MissionStatus {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Running),
            1 => Ok(Self::Success),
            2 => Ok(Self::Failed),
            3 => Ok(Self::Aborted),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for MissionStatus {
    fn encode_size(&self) -> usize {
        1
    }
}

/// One activation of a template by an account. The outcome is fixed at
/// activation: a populated `failure_reason` means the settlement will mark
/// the instance Failed without paying the reward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissionInstance {
    pub id: MissionId,
    pub account: AccountId,
    pub template: TemplateId,
    pub aircraft: AircraftId,
    pub status: MissionStatus,
    pub started_at: Timestamp,
    pub planned_finish: Timestamp,
    pub cost_at_start: u64,
    pub reward_on_success: u64,
    pub xp_on_success: u64,
    pub cost_applied: bool,
    pub reward_applied: bool,
    pub xp_applied: bool,
    pub failure_reason: Option<String>,
}

impl MissionInstance {
    /// Due for settlement: still running, reward unapplied, past the plan.
    pub fn is_due(&self, now: Timestamp) -> bool {
        matches!(self.status, MissionStatus::Running)
            && !self.reward_applied
            && self.planned_finish <= now
    }
}

impl Write for MissionInstance {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.account.write(writer);
        self.template.write(writer);
        self.aircraft.write(writer);
        self.status.write(writer);
        self.started_at.write(writer);
        self.planned_finish.write(writer);
        self.cost_at_start.write(writer);
        self.reward_on_success.write(writer);
        self.xp_on_success.write(writer);
        self.cost_applied.write(writer);
        self.reward_applied.write(writer);
        self.xp_applied.write(writer);
        write_opt_string(&self.failure_reason, writer);
    }
}

impl Read for MissionInstance {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            account: u64::read(reader)?,
            template: u64::read(reader)?,
            aircraft: u64::read(reader)?,
            status: MissionStatus::read(reader)?,
            started_at: u64::read(reader)?,
            planned_finish: u64::read(reader)?,
            cost_at_start: u64::read(reader)?,
            reward_on_success: u64::read(reader)?,
            xp_on_success: u64::read(reader)?,
            cost_applied: bool::read(reader)?,
            reward_applied: bool::read(reader)?,
            xp_applied: bool::read(reader)?,
            failure_reason: read_opt_string(reader, MAX_DESCRIPTION_LENGTH)?,
        })
    }
}

impl EncodeSize for MissionInstance {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.account.encode_size()
            + self.template.encode_size()
            + self.aircraft.encode_size()
            + self.status.encode_size()
            + self.started_at.encode_size()
            + self.planned_finish.encode_size()
            + self.cost_at_start.encode_size()
            + self.reward_on_success.encode_size()
            + self.xp_on_success.encode_size()
            + self.cost_applied.encode_size()
            + self.reward_applied.encode_size()
            + self.xp_applied.encode_size()
            + opt_string_encode_size(&self.failure_reason)
    }
}
