use ::bincode::config::standard;
use ::bincode::serde::{decode_from_slice, encode_to_vec};
use haven_core::{CacheEntry, Raw};

use super::{Format, FormatError, FormatTypeId};

/// Bincode format
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn encode(&self, entry: &CacheEntry) -> Result<Raw, FormatError> {
        encode_to_vec(entry, standard())
            .map(Raw::from)
            .map_err(|e| FormatError::Serialize(Box::new(e)))
    }

    fn decode(&self, data: &[u8]) -> Result<CacheEntry, FormatError> {
        decode_from_slice(data, standard())
            .map(|(entry, _)| entry)
            .map_err(|e| FormatError::Deserialize(Box::new(e)))
    }

    fn clone_box(&self) -> Box<dyn Format> {
        Box::new(*self)
    }

    fn format_type_id(&self) -> FormatTypeId {
        FormatTypeId::Bincode
    }
}
