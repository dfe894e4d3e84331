mod account;
mod codec;
mod constants;
mod fleet;
mod ledger;
mod mission;

pub use account::*;
pub use codec::{
    opt_string_encode_size, read_opt_string, read_string, string_encode_size, write_opt_string,
    write_string,
};
pub use constants::*;
pub use fleet::*;
pub use ledger::*;
pub use mission::*;
