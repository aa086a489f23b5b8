use std::sync::{Mutex, PoisonError};

use _model::{Address, AddressPatch};
use nanoid::nanoid;
use tracing::info;

const ID_ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b',
    'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z',
];

fn id() -> String {
    nanoid!(7, &ID_ALPHABET)
}

/// Where adopted addresses end up. The search flow only ever adds.
pub trait AddressBook: Send + Sync {
    fn add(&self, address: Address);
}

#[derive(Debug, Default)]
pub struct InMemoryAddressBook {
    entries: Mutex<Vec<Address>>,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Address> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AddressBook for InMemoryAddressBook {
    fn add(&self, address: Address) {
        // ids are only handed out once
        let address = if address.id.is_empty() {
            address.patched(AddressPatch {
                id: Some(id()),
                ..AddressPatch::default()
            })
        } else {
            address
        };

        info!(id = %address.id, "added {address}");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(address);
    }
}
