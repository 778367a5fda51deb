//! Decoding of secrets the device prints in obfuscated form.
//!
//! The device stores secrets (shared keys, community strings) with its
//! reversible `$9$` obfuscation. [`Type9Decoder`] reverses it locally;
//! [`PlainDecoder`] leaves values untouched for setups that keep secrets
//! encoded in state.

/// Decodes secret values found in a dump.
pub trait SecretDecoder: Send + Sync {
    /// Returns the clear-text value, or a reason why it could not be decoded.
    fn decode(&self, encoded: &str) -> Result<String, String>;
}

/// Returns values unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDecoder;

impl SecretDecoder for PlainDecoder {
    fn decode(&self, encoded: &str) -> Result<String, String> {
        Ok(encoded.to_string())
    }
}

/// Marker of the `$9$` obfuscation scheme.
pub const TYPE9_PREFIX: &str = "$9$";

const FAMILY: [&str; 4] = [
    "QzF3n6/9CAtpu0O",
    "B1IREhcSyrleKvMW8LXx",
    "7N-dVbwsY2g4oaJZGUDj",
    "iHkq.mPf5T",
];

const ENCODING: [&[u32]; 7] = [
    &[1, 4, 32],
    &[1, 16, 32],
    &[1, 8, 32],
    &[1, 64],
    &[1, 32],
    &[1, 4, 16, 128],
    &[1, 32, 64],
];

fn alphabet() -> Vec<char> {
    FAMILY.iter().flat_map(|f| f.chars()).collect()
}

/// Number of random characters following the salt.
fn extra(c: char) -> Option<usize> {
    FAMILY
        .iter()
        .position(|family| family.contains(c))
        .map(|index| 3 - index)
}

/// Decoder for `$9$` values. Values without the prefix pass through.
#[derive(Debug, Clone)]
pub struct Type9Decoder {
    alphabet: Vec<char>,
}

impl Default for Type9Decoder {
    fn default() -> Self {
        Self {
            alphabet: alphabet(),
        }
    }
}

impl Type9Decoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, c: char) -> Result<i64, String> {
        self.alphabet
            .iter()
            .position(|a| *a == c)
            .map(|p| p as i64)
            .ok_or_else(|| format!("invalid character '{c}'"))
    }

    /// Obfuscates `plain` with a deterministic salt chosen by `seed`.
    ///
    /// The scheme works on bytes, so non-ASCII text is encoded as its UTF-8
    /// bytes. The device picks a random salt; a fixed one keeps simulated
    /// devices and tests reproducible.
    pub fn encode_with_seed(&self, plain: &str, seed: usize) -> String {
        self.encode_bytes(plain.as_bytes(), seed)
    }

    fn encode_bytes(&self, plain: &[u8], seed: usize) -> String {
        let len = self.alphabet.len();
        let salt = self.alphabet[seed % len];
        let padding = extra(salt).unwrap_or(0);

        let mut out = String::from(TYPE9_PREFIX);
        out.push(salt);
        for offset in 1..=padding {
            out.push(self.alphabet[(seed + offset) % len]);
        }

        let mut prev = salt;
        for (index, byte) in plain.iter().enumerate() {
            let encoding = ENCODING[index % ENCODING.len()];
            let mut value = u32::from(*byte);
            let mut gaps = vec![0u32; encoding.len()];
            for (slot, modulus) in encoding.iter().enumerate().rev() {
                gaps[slot] = value / modulus;
                value %= modulus;
            }
            for gap in gaps {
                let prev_pos = self.alphabet.iter().position(|a| *a == prev).unwrap_or(0);
                let next = self.alphabet[(gap as usize + prev_pos + 1) % len];
                out.push(next);
                prev = next;
            }
        }
        out
    }
}

impl SecretDecoder for Type9Decoder {
    fn decode(&self, encoded: &str) -> Result<String, String> {
        let Some(body) = encoded.strip_prefix(TYPE9_PREFIX) else {
            return Ok(encoded.to_string());
        };
        let chars: Vec<char> = body.chars().collect();
        let salt = *chars.first().ok_or("missing salt")?;
        let padding = extra(salt).ok_or_else(|| format!("invalid salt '{salt}'"))?;

        let len = self.alphabet.len() as i64;
        let mut cursor = 1 + padding;
        if cursor > chars.len() {
            return Err("value shorter than its salt".to_string());
        }

        let mut prev = self.position(salt)?;
        let mut decoded = Vec::new();
        let mut count = 0usize;
        while cursor < chars.len() {
            let encoding = ENCODING[count % ENCODING.len()];
            let end = cursor + encoding.len();
            let nibble = chars
                .get(cursor..end)
                .ok_or("truncated value")?;
            cursor = end;

            let mut value: i64 = 0;
            for (c, multiplier) in nibble.iter().zip(encoding) {
                let pos = self.position(*c)?;
                let gap = (pos - prev).rem_euclid(len) - 1;
                prev = pos;
                value += gap * i64::from(*multiplier);
            }
            let byte = u8::try_from(value.rem_euclid(256)).map_err(|e| e.to_string())?;
            decoded.push(byte);
            count += 1;
        }

        String::from_utf8(decoded).map_err(|e| format!("decoded value is not UTF-8: {e}"))
    }
}
