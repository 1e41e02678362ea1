use crate::error::MokuError;
use crate::types::MokuValue;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::io::Read;

// Protocol constants
pub const COMMAND_SIZE: usize = 32;
pub const HEADER_SIZE: usize = 40;
pub const ERROR_INFO_SIZE: usize = 8;
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024; // 16MB
pub const RESPONSE_FLAG: u16 = 1;

/// Fixed-size frame header: 32-byte zero-padded command name, big-endian
/// body size, response-requested flag, padding.
#[derive(Debug, Clone)]
struct FrameHeader {
    command: [u8; COMMAND_SIZE],
    body_size: u32,
    send_response: u16,
    _padding: u16,
}

impl FrameHeader {
    fn new(command: &str, body_size: u32) -> Self {
        let mut cmd_bytes = [0u8; COMMAND_SIZE];
        let cmd_str = command.as_bytes();
        let len = cmd_str.len().min(COMMAND_SIZE);
        cmd_bytes[..len].copy_from_slice(&cmd_str[..len]);

        Self {
            command: cmd_bytes,
            body_size,
            // Always request a response so the error block comes back
            send_response: RESPONSE_FLAG,
            _padding: 0,
        }
    }

    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..32].copy_from_slice(&self.command);
        buf[32..36].copy_from_slice(&self.body_size.to_be_bytes());
        buf[36..38].copy_from_slice(&self.send_response.to_be_bytes());
        buf[38..40].copy_from_slice(&self._padding.to_be_bytes());
        buf
    }
}

/// Low-level framing and typed serialization for the Moku command service.
///
/// Argument and response layouts are driven by short format strings:
/// `"i"`/`"I"` 32-bit ints, `"f"`/`"d"` floats, `"+*c"` length-prefixed
/// string, `"*f"` f32 array whose length comes from the preceding value.
pub struct Protocol;

impl Protocol {
    /// Build a command frame header with proper padding
    pub fn command_header(command: &str, body_size: u32) -> Vec<u8> {
        FrameHeader::new(command, body_size).to_bytes().to_vec()
    }

    /// Serialize one value according to its format specifier
    pub fn serialize_value(
        value: &MokuValue,
        format: &str,
        buffer: &mut Vec<u8>,
    ) -> Result<(), MokuError> {
        match (value, format) {
            (MokuValue::I32(v), "i") => buffer.write_i32::<BigEndian>(*v)?,
            (MokuValue::U32(v), "I") => buffer.write_u32::<BigEndian>(*v)?,
            (MokuValue::F32(v), "f") => buffer.write_f32::<BigEndian>(*v)?,
            (MokuValue::F64(v), "d") => buffer.write_f64::<BigEndian>(*v)?,
            (MokuValue::String(s), "+*c") => {
                let bytes = s.as_bytes();
                buffer.write_u32::<BigEndian>(bytes.len() as u32)?;
                buffer.extend_from_slice(bytes);
            }
            (MokuValue::ArrayF32(arr), "+*f") => {
                buffer.write_u32::<BigEndian>(arr.len() as u32)?;
                for &val in arr {
                    buffer.write_f32::<BigEndian>(val)?;
                }
            }
            _ => {
                return Err(MokuError::Type(format!(
                    "Unsupported type combination: {value:?} with {format}"
                )))
            }
        }
        Ok(())
    }

    /// Parse response values according to the format specifiers, then check
    /// the trailing error block.
    pub fn parse_response_with_error_check(
        response: &[u8],
        formats: &[&str],
    ) -> Result<Vec<MokuValue>, MokuError> {
        let (values, cursor) = Self::parse_response(response, formats)?;
        Self::parse_error_info(response, cursor)?;
        Ok(values)
    }

    /// Parse response payload values; returns the values and the cursor
    /// position where the payload ended.
    pub fn parse_response(
        response: &[u8],
        formats: &[&str],
    ) -> Result<(Vec<MokuValue>, usize), MokuError> {
        let mut cursor = std::io::Cursor::new(response);
        let mut result: Vec<MokuValue> = Vec::with_capacity(formats.len());

        for &format in formats {
            let value = match format {
                "i" => MokuValue::I32(cursor.read_i32::<BigEndian>()?),
                "I" => MokuValue::U32(cursor.read_u32::<BigEndian>()?),
                "f" => MokuValue::F32(cursor.read_f32::<BigEndian>()?),
                "d" => MokuValue::F64(cursor.read_f64::<BigEndian>()?),
                "*f" => {
                    // Array length travels in the preceding integer value
                    let len = match result.last() {
                        Some(MokuValue::I32(len)) => *len as usize,
                        Some(MokuValue::U32(len)) => *len as usize,
                        _ => {
                            return Err(MokuError::Protocol(
                                "Array length not specified".to_string(),
                            ))
                        }
                    };
                    let mut arr = Vec::with_capacity(len);
                    for _ in 0..len {
                        arr.push(cursor.read_f32::<BigEndian>()?);
                    }
                    MokuValue::ArrayF32(arr)
                }
                "+*c" => {
                    let len = cursor.read_u32::<BigEndian>()? as usize;
                    let mut bytes = vec![0u8; len];
                    cursor.read_exact(&mut bytes)?;
                    MokuValue::String(String::from_utf8_lossy(&bytes).to_string())
                }
                _ => {
                    return Err(MokuError::Type(format!(
                        "Unsupported response format: {format}"
                    )))
                }
            };
            result.push(value);
        }

        Ok((result, cursor.position() as usize))
    }

    /// Parse the error block appended after the response payload.
    ///
    /// Layout: i32 status, i32 description size, description bytes. A
    /// non-empty description means the instrument rejected the command.
    pub fn parse_error_info(body: &[u8], payload_end: usize) -> Result<(), MokuError> {
        let error_section = match body.get(payload_end..) {
            Some(section) if section.len() >= ERROR_INFO_SIZE => section,
            _ => return Ok(()), // No error info available
        };

        let (status_bytes, rest) = error_section.split_at(4);
        let (size_bytes, message_bytes) = rest.split_at(4);

        let status = i32::from_be_bytes(
            status_bytes
                .try_into()
                .map_err(|_| MokuError::Protocol("Invalid error status format".into()))?,
        );

        let desc_size = i32::from_be_bytes(
            size_bytes
                .try_into()
                .map_err(|_| MokuError::Protocol("Invalid error size format".into()))?,
        ) as usize;

        if desc_size > 0 {
            let message_slice = message_bytes
                .get(..desc_size)
                .ok_or_else(|| MokuError::Protocol("Error message truncated".into()))?;

            let message = std::str::from_utf8(message_slice)
                .map_err(|_| MokuError::Protocol("Invalid UTF-8 in error message".into()))?;

            let trimmed = message.trim();
            if !trimmed.is_empty() {
                return Err(MokuError::InstrumentError {
                    code: status,
                    message: trimmed.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Read an exact byte count from the stream
    pub fn read_exact_bytes<const N: usize>(
        reader: &mut dyn Read,
    ) -> Result<[u8; N], MokuError> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf).map_err(|e| {
            debug!("Failed to read {} bytes: {} (kind: {:?})", N, e, e.kind());
            MokuError::Io {
                source: e,
                context: format!("Failed to read {} bytes from Moku", N),
            }
        })?;
        Ok(buf)
    }

    /// Read a variable-length response body with a size sanity check
    pub fn read_variable_bytes(
        reader: &mut dyn Read,
        size: usize,
    ) -> Result<Vec<u8>, MokuError> {
        if size > MAX_RESPONSE_SIZE {
            return Err(MokuError::Protocol(format!(
                "Response size {} exceeds maximum {}",
                size, MAX_RESPONSE_SIZE
            )));
        }

        let mut body = vec![0u8; size];
        reader.read_exact(&mut body).map_err(|e| {
            debug!(
                "Failed to read {} byte body: {} (kind: {:?})",
                size,
                e,
                e.kind()
            );
            MokuError::Io {
                source: e,
                context: format!("Failed to read {} byte response body", size),
            }
        })?;
        Ok(body)
    }

    /// Validate a response frame header, returning the body size
    pub fn validate_response_header(
        header: &[u8; HEADER_SIZE],
        expected_command: &str,
    ) -> Result<u32, MokuError> {
        let body_size = u32::from_be_bytes([header[32], header[33], header[34], header[35]]);

        let received_command = String::from_utf8_lossy(&header[0..COMMAND_SIZE])
            .trim_end_matches('\0')
            .to_string();

        if received_command == expected_command {
            Ok(body_size)
        } else {
            Err(MokuError::CommandMismatch {
                expected: expected_command.to_string(),
                actual: received_command,
            })
        }
    }
}
