use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Hasher,
};
use commonware_runtime::{Clock, Metrics, Spawner, Storage};
use commonware_storage::{adb::any::variable::Any, translator::Translator};
use skyport_types::{
    engine::{Key, Value},
    game::Account,
    AccountId,
};
use std::{collections::HashMap, future::Future};
use tracing::warn;

/// Durable store: a merkleized key-value database addressed by the SHA-256
/// digest of the encoded [`Key`].
pub type Adb<E, T> = Any<E, Digest, Value, Sha256, T>;

/// Keyed store the engine runs against. Implementations must apply a change
/// set in order; the engine relies on [`State::apply`] being the only point
/// where buffered workflow writes become visible.
pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Option<Value>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = ()>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = ()>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = ()> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await,
                    Status::Delete => self.delete(&key).await,
                }
            }
        }
    }
}

impl<E: Spawner + Metrics + Clock + Storage, T: Translator> State for Adb<E, T> {
    async fn get(&self, key: &Key) -> Option<Value> {
        let key = Sha256::hash(&key.encode());
        match self.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("database error during get operation: {:?}", e);
                None
            }
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        let key = Sha256::hash(&key.encode());
        if let Err(e) = self.update(key, value).await {
            warn!("database error during insert operation: {:?}", e);
        }
    }

    async fn delete(&mut self, key: &Key) {
        let key = Sha256::hash(&key.encode());
        if let Err(e) = self.delete(key).await {
            warn!("database error during delete operation: {:?}", e);
        }
    }
}

/// In-memory store for tests and the simulator.
#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

impl State for Memory {
    async fn get(&self, key: &Key) -> Option<Value> {
        self.state.get(key).cloned()
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.state.insert(key, value);
    }

    async fn delete(&mut self, key: &Key) {
        self.state.remove(key);
    }
}

/// A buffered write: either an updated value or a deletion.
#[derive(Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

impl Write for Status {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Status::Update(value) => {
                0u8.write(writer);
                value.write(writer);
            }
            Status::Delete => 1u8.write(writer),
        }
    }
}

impl Read for Status {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Status::Update(Value::read(reader)?)),
            1 => Ok(Status::Delete),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Status {
    fn encode_size(&self) -> usize {
        1 + match self {
            Status::Update(value) => value.encode_size(),
            Status::Delete => 0,
        }
    }
}

/// Load an account record, if one exists.
pub async fn load_account<S: State>(state: &S, account: AccountId) -> Option<Account> {
    match state.get(&Key::Account(account)).await {
        Some(Value::Account(record)) => Some(record),
        _ => None,
    }
}
