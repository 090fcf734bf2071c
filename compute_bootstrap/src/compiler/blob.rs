/// Shader blobs - immutable byte buffers with an encoding tag

use std::sync::Arc;

/// Text encoding of a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Binary or undetected
    Unknown,
    /// UTF-8 (with or without BOM)
    Utf8,
    /// UTF-16 little endian (BOM `FF FE`)
    Utf16Le,
    /// UTF-16 big endian (BOM `FE FF`)
    Utf16Be,
}

impl Encoding {
    /// Whether the encoding is known to be text
    pub fn is_known(&self) -> bool {
        !matches!(self, Encoding::Unknown)
    }

    /// Detect the encoding of raw bytes
    ///
    /// BOMs win; otherwise NUL-free valid UTF-8 is UTF-8 and anything else is
    /// binary.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            Encoding::Utf8
        } else if bytes.starts_with(&[0xFF, 0xFE]) {
            Encoding::Utf16Le
        } else if bytes.starts_with(&[0xFE, 0xFF]) {
            Encoding::Utf16Be
        } else if !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok() {
            Encoding::Utf8
        } else {
            Encoding::Unknown
        }
    }
}

/// Immutable shader blob
///
/// Produced by file loading or compilation and never mutated afterwards.
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBlob {
    data: Arc<[u8]>,
    encoding: Encoding,
}

impl ShaderBlob {
    pub fn new(data: impl Into<Arc<[u8]>>, encoding: Encoding) -> Self {
        Self {
            data: data.into(),
            encoding,
        }
    }

    /// Binary blob (encoding unknown)
    pub fn from_binary(data: impl Into<Arc<[u8]>>) -> Self {
        Self::new(data, Encoding::Unknown)
    }

    /// UTF-8 text blob
    pub fn from_text(text: &str) -> Self {
        Self::new(text.as_bytes(), Encoding::Utf8)
    }

    /// Blob with auto-detected encoding
    pub fn detect(data: Vec<u8>) -> Self {
        let encoding = Encoding::detect(&data);
        Self::new(data, encoding)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decode as text according to the encoding tag
    ///
    /// BOMs are stripped, invalid sequences are replaced. Unknown encodings
    /// are decoded as lossy UTF-8.
    pub fn to_text(&self) -> String {
        match self.encoding {
            Encoding::Utf8 | Encoding::Unknown => {
                let bytes = self.data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&self.data);
                String::from_utf8_lossy(bytes).into_owned()
            }
            Encoding::Utf16Le => decode_utf16(&self.data[2.min(self.data.len())..], u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16(&self.data[2.min(self.data.len())..], u16::from_be_bytes),
        }
    }

    /// Copy into a mutable buffer (for in-place signing)
    pub fn into_mutable(self) -> MutableBlob {
        MutableBlob {
            data: self.data.to_vec(),
            encoding: self.encoding,
        }
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Mutable blob
///
/// The only way to edit blob bytes. Used by validators that write a digest
/// in place; `freeze` turns it back into an immutable `ShaderBlob`.
#[derive(Debug)]
pub struct MutableBlob {
    data: Vec<u8>,
    encoding: Encoding,
}

impl MutableBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn freeze(self) -> ShaderBlob {
        ShaderBlob::new(self.data, self.encoding)
    }
}

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
