//! `Content-Transfer-Encoding` support for content streams.
//!
//! Some servers send document content base64-encoded. The decoder works
//! chunk by chunk: encoded bytes that do not yet form a complete 4-byte
//! group are carried over to the next read. The encoder does the same with
//! 3-byte groups when building `cmisra:base64` upload payloads.

use std::io::{self, Read};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use cmis_core::CmisResult;

const CHUNK_SIZE: usize = 8192;

/// Accepts the final group with or without padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    #[default]
    Identity,
    Base64,
}

impl TransferEncoding {
    /// Encoding named by a `Content-Transfer-Encoding` header value.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("base64") => Self::Base64,
            _ => Self::Identity,
        }
    }
}

/// Reader decoding a transfer-encoded body on the fly.
pub struct TransferDecoder<R> {
    inner: R,
    encoding: TransferEncoding,
    pending: Vec<u8>,
    decoded: Vec<u8>,
    position: usize,
    eof: bool,
}

impl<R: Read> TransferDecoder<R> {
    pub fn new(inner: R, encoding: TransferEncoding) -> Self {
        Self {
            inner,
            encoding,
            pending: Vec::new(),
            decoded: Vec::new(),
            position: 0,
            eof: false,
        }
    }

    fn decode(group: &[u8]) -> io::Result<Vec<u8>> {
        LENIENT
            .decode(group)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Refill the decoded buffer until it has data or the input is over.
    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        while self.position >= self.decoded.len() && !self.eof {
            let read = self.inner.read(&mut chunk)?;
            self.position = 0;
            if read == 0 {
                self.eof = true;
                self.decoded = if self.pending.is_empty() {
                    Vec::new()
                } else {
                    Self::decode(&std::mem::take(&mut self.pending))?
                };
                continue;
            }

            self.pending
                .extend(chunk[..read].iter().filter(|b| !b.is_ascii_whitespace()));
            let complete = self.pending.len() / 4 * 4;
            let group: Vec<u8> = self.pending.drain(..complete).collect();
            self.decoded = Self::decode(&group)?;
        }
        Ok(())
    }
}

impl<R: Read> Read for TransferDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.encoding == TransferEncoding::Identity {
            return self.inner.read(buf);
        }
        self.fill()?;
        let available = &self.decoded[self.position..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position += count;
        Ok(count)
    }
}

/// Incremental base64 encoder.
#[derive(Debug, Default)]
pub struct Base64Encoder {
    pending: Vec<u8>,
    encoded: String,
}

impl Base64Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
        let complete = self.pending.len() / 3 * 3;
        STANDARD.encode_string(&self.pending[..complete], &mut self.encoded);
        self.pending.drain(..complete);
    }

    /// Encode the trailing partial group, padded.
    pub fn finish(mut self) -> String {
        STANDARD.encode_string(&self.pending, &mut self.encoded);
        self.encoded
    }

    /// Encode a whole stream.
    pub fn encode_stream(stream: &mut dyn Read) -> CmisResult<String> {
        let mut encoder = Self::new();
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            let read = stream.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            encoder.push(&chunk[..read]);
        }
        Ok(encoder.finish())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
