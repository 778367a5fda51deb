//! Rendering objects into statements and parsing dumps back into objects.

use tracing::trace;

use crate::block::Validator;
use crate::dump;
use crate::error::{CodecError, CodecResult};
use crate::secret::SecretDecoder;
use crate::statement::{Statement, StatementWriter};
use crate::tokenize::{tokenize, Words};

/// A configuration object that can be rendered to and parsed from lines.
///
/// Implementations visit their attributes in a fixed declared order in
/// [`write`](ConfigObject::write); that order is the wire order.
pub trait ConfigObject {
    /// Records every problem that must prevent rendering.
    fn validate(&self, validator: &mut Validator);

    /// Writes `set` statements relative to the writer's prefix.
    fn write(&self, writer: &mut StatementWriter);

    /// Applies one dump line (without the `set ` prefix) to the object.
    ///
    /// Lines the object does not recognise are ignored.
    fn read_line(&mut self, words: Words<'_>, ctx: &ReadContext<'_>) -> CodecResult<()>;
}

/// Collaborators available while parsing.
pub struct ReadContext<'a> {
    decoder: &'a dyn SecretDecoder,
}

impl<'a> ReadContext<'a> {
    /// Creates a context using `decoder` for secret fields.
    pub fn new(decoder: &'a dyn SecretDecoder) -> Self {
        Self { decoder }
    }

    /// Decodes the secret in `words`, naming `field` on failure.
    pub fn secret(&self, field: &str, words: Words<'_>) -> CodecResult<String> {
        self.decoder
            .decode(&words.text())
            .map_err(|reason| CodecError::decode(field, reason))
    }
}

/// Validates `object` and renders it under `prefix`.
///
/// Validation covers the whole object first; if anything is wrong no
/// statement is produced.
pub fn render<O, S>(object: &O, prefix: &[S]) -> CodecResult<Vec<Statement>>
where
    O: ConfigObject,
    S: AsRef<str>,
{
    let mut validator = Validator::new();
    object.validate(&mut validator);
    validator.finish()?;

    let mut writer = StatementWriter::new(prefix.iter().map(|p| p.as_ref().to_string()));
    object.write(&mut writer);
    Ok(writer.finish())
}

/// Parses `dump` into `seed`, which usually carries only the identity.
///
/// Any decode or parse failure aborts; no partial object is returned.
pub fn parse_into<O: ConfigObject>(
    mut seed: O,
    dump: &str,
    decoder: &dyn SecretDecoder,
) -> CodecResult<O> {
    let ctx = ReadContext::new(decoder);
    for line in dump::set_lines(dump) {
        let words = tokenize(line);
        trace!(line, "parsing dump line");
        seed.read_line(Words::new(line, &words), &ctx)?;
    }
    Ok(seed)
}

/// Parses `dump` into a default object.
pub fn parse<O: ConfigObject + Default>(dump: &str, decoder: &dyn SecretDecoder) -> CodecResult<O> {
    parse_into(O::default(), dump, decoder)
}

/// Renders statements as dump text, one `set` line each.
///
/// Useful to feed rendered output straight back into [`parse`].
pub fn to_dump(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|s| format!("{s}\n"))
        .collect()
}
