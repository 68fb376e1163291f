use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;
use crate::SerializationError;

/// Encodes entities into node payloads and back
pub trait Serializer<T>: Send + Sync {
    fn serialize(
        &self,
        entity: &T,
    ) -> Result<Vec<u8>>;

    fn deserialize(
        &self,
        bytes: &[u8],
    ) -> Result<T>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl<T> Serializer<T> for BincodeSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(
        &self,
        entity: &T,
    ) -> Result<Vec<u8>> {
        bincode::serialize(entity).map_err(|e| SerializationError::Bincode(e).into())
    }

    fn deserialize(
        &self,
        bytes: &[u8],
    ) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| SerializationError::Bincode(e).into())
    }
}
