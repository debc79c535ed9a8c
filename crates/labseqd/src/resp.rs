//! RESP2 codec
//!
//! Clients send commands as arrays of bulk strings; replies use simple
//! strings, errors, integers, bulk strings and arrays.

use bytes::{Buf, BytesMut};

/// Longest accepted bulk string (1 MB); commands here carry short arguments
const MAX_BULK_LEN: usize = 1024 * 1024;

/// Most elements accepted in one array
const MAX_ARRAY_LEN: usize = 1024;

/// Longest accepted type line (headers and simple strings)
const MAX_LINE_LEN: usize = 1024;

/// RESP data types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// `+OK\r\n`
    SimpleString(String),
    /// `-ERR message\r\n`
    Error(String),
    /// `:1000\r\n`
    Integer(i64),
    /// `$6\r\nfoobar\r\n`, `$-1\r\n` for null
    BulkString(Option<Vec<u8>>),
    /// `*2\r\n...`, `*-1\r\n` for null
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// Bulk string reply holding UTF-8 text
    pub fn bulk(text: impl Into<String>) -> Self {
        RespValue::BulkString(Some(text.into().into_bytes()))
    }

    /// Serialize to wire format
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => push_line(out, b'+', s.as_bytes()),
            RespValue::Error(e) => push_line(out, b'-', e.as_bytes()),
            RespValue::Integer(i) => push_line(out, b':', i.to_string().as_bytes()),
            RespValue::BulkString(None) => out.extend_from_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => {
                push_line(out, b'$', data.len().to_string().as_bytes());
                out.extend_from_slice(data);
                out.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => out.extend_from_slice(b"*-1\r\n"),
            RespValue::Array(Some(items)) => {
                push_line(out, b'*', items.len().to_string().as_bytes());
                for item in items {
                    item.write_to(out);
                }
            }
        }
    }

    /// Parse one value from the front of `buf`
    ///
    /// Consumes the frame on success. `Ok(None)` means the frame is not
    /// complete yet and `buf` is left untouched.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, String> {
        let mut reader = Reader { buf: &buf[..], pos: 0 };
        match reader.value()? {
            Some(value) => {
                let consumed = reader.pos;
                buf.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Text of a bulk or simple string argument
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RespValue::BulkString(Some(data)) => std::str::from_utf8(data).ok(),
            RespValue::SimpleString(s) => Some(s),
            _ => None,
        }
    }
}

fn push_line(out: &mut Vec<u8>, prefix: u8, body: &[u8]) {
    out.push(prefix);
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n");
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn value(&mut self) -> Result<Option<RespValue>, String> {
        let Some(&kind) = self.buf.get(self.pos) else {
            return Ok(None);
        };
        if !matches!(kind, b'+' | b'-' | b':' | b'$' | b'*') {
            return Err(format!("unknown RESP type: {}", kind as char));
        }
        self.pos += 1;

        let Some(line) = self.line()? else {
            return Ok(None);
        };

        match kind {
            b'+' => Ok(Some(RespValue::SimpleString(utf8(line)?))),
            b'-' => Ok(Some(RespValue::Error(utf8(line)?))),
            b':' => Ok(Some(RespValue::Integer(number(line)?))),
            b'$' => self.bulk_string(number(line)?),
            _ => self.array(number(line)?),
        }
    }

    fn bulk_string(&mut self, len: i64) -> Result<Option<RespValue>, String> {
        if len == -1 {
            return Ok(Some(RespValue::BulkString(None)));
        }
        let len = checked_len(len, MAX_BULK_LEN, "bulk string")?;

        let end = self.pos + len;
        if self.buf.len() < end + 2 {
            return Ok(None);
        }
        if &self.buf[end..end + 2] != b"\r\n" {
            return Err("expected \\r\\n after bulk string".to_string());
        }

        let data = self.buf[self.pos..end].to_vec();
        self.pos = end + 2;
        Ok(Some(RespValue::BulkString(Some(data))))
    }

    fn array(&mut self, len: i64) -> Result<Option<RespValue>, String> {
        if len == -1 {
            return Ok(Some(RespValue::Array(None)));
        }
        let len = checked_len(len, MAX_ARRAY_LEN, "array")?;

        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            match self.value()? {
                Some(item) => items.push(item),
                None => return Ok(None),
            }
        }
        Ok(Some(RespValue::Array(Some(items))))
    }

    /// Bytes up to the next `\r\n`, which is consumed
    fn line(&mut self) -> Result<Option<&'a [u8]>, String> {
        let rest = &self.buf[self.pos..];
        match rest.windows(2).position(|w| w == b"\r\n") {
            Some(end) if end <= MAX_LINE_LEN => {
                self.pos += end + 2;
                Ok(Some(&rest[..end]))
            }
            Some(end) => Err(format!("line too long: {} bytes (max {})", end, MAX_LINE_LEN)),
            None if rest.len() > MAX_LINE_LEN + 1 => Err(format!(
                "unterminated line over {} bytes",
                MAX_LINE_LEN
            )),
            None => Ok(None),
        }
    }
}

fn utf8(line: &[u8]) -> Result<String, String> {
    String::from_utf8(line.to_vec()).map_err(|e| e.to_string())
}

fn number(line: &[u8]) -> Result<i64, String> {
    std::str::from_utf8(line)
        .map_err(|e| e.to_string())?
        .parse::<i64>()
        .map_err(|e| e.to_string())
}

fn checked_len(len: i64, max: usize, what: &str) -> Result<usize, String> {
    match usize::try_from(len) {
        Ok(len) if len <= max => Ok(len),
        _ => Err(format!("invalid {} length: {} (max {})", what, len, max)),
    }
}
