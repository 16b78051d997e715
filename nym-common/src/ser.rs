//! Byte cursor for the attestation wire format and hex serde adapters for
//! field elements.

use crate::error::{NymError, Result};

/// Cursor over a byte slice; every read is bounds-checked.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub(crate) fn read_exact(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(NymError::MalformedAttestation(format!(
                "unexpected end of input reading {field}: need {len} bytes at offset {}, {} left",
                self.offset,
                self.remaining()
            )));
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.bytes[start..start + len])
    }

    pub(crate) fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let bytes = self.read_exact(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn read_u32_be(&mut self, field: &'static str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    /// `u32` big-endian length followed by that many bytes.
    pub(crate) fn read_prefixed(&mut self, field: &'static str) -> Result<&'a [u8]> {
        let len = self.read_u32_be(field)? as usize;
        self.read_exact(len, field)
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(NymError::MalformedAttestation(format!(
                "{extra} trailing bytes after attestation"
            ))),
        }
    }
}

pub(crate) fn write_prefixed(out: &mut Vec<u8>, bytes: &[u8], field: &'static str) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        NymError::MalformedAttestation(format!(
            "{field} of {} bytes exceeds the u32 length prefix",
            bytes.len()
        ))
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

pub(crate) mod fp_hex {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use crate::{fp_from_hex, fp_to_hex, Fp};

    pub(crate) fn serialize<S: Serializer>(value: &Fp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&fp_to_hex(value))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        fp_from_hex(&raw).ok_or_else(|| D::Error::custom(format!("invalid field element {raw}")))
    }
}

pub(crate) mod fp_hex_vec {
    use serde::{de::Error as _, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    use crate::{fp_from_hex, fp_to_hex, Fp};

    pub(crate) fn serialize<S: Serializer>(values: &[Fp], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&fp_to_hex(value))?;
        }
        seq.end()
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Fp>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|raw| {
                fp_from_hex(raw)
                    .ok_or_else(|| D::Error::custom(format!("invalid field element {raw}")))
            })
            .collect()
    }
}

pub(crate) mod hex_bytes {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        hex::decode(raw.strip_prefix("0x").unwrap_or(&raw)).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_reports_truncation() {
        let bytes = [0u8, 0, 0, 4, 1, 2];
        let mut reader = ByteReader::new(&bytes);
        let err = reader.read_prefixed("proof").unwrap_err();
        assert!(matches!(err, NymError::MalformedAttestation(msg) if msg.contains("proof")));
    }

    #[test]
    fn reader_rejects_trailing_bytes() {
        let mut out = Vec::new();
        write_prefixed(&mut out, b"abc", "name").unwrap();
        out.push(9);
        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_prefixed("name").unwrap(), b"abc");
        assert!(reader.finish().is_err());
    }
}
