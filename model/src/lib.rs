mod address;
mod form;

pub use address::{Address, AddressPatch, RawAddressRecord, State};
pub use form::{FieldError, FieldStore, FormEntry, InputAttrs, InputMode, InputType};
