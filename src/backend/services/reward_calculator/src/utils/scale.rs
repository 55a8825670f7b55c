use codec::Decode;

use crate::models::chain::Balance;
use crate::utils::errors::DecodeError;

pub struct StorageDecoder;

impl StorageDecoder {
    /// Decodes the `Balances::TotalIssuance` storage value (a SCALE `u128`).
    pub fn decode_total_issuance(raw: &[u8]) -> Result<Balance, DecodeError> {
        Self::decode_exact::<Balance>(raw)
    }

    /// Decodes a value and rejects input that is not fully consumed.
    pub fn decode_exact<T: Decode>(raw: &[u8]) -> Result<T, DecodeError> {
        let mut input = raw;
        let value = T::decode(&mut input)?;

        if !input.is_empty() {
            return Err(DecodeError::TrailingBytes(input.len()));
        }

        Ok(value)
    }
}
