//! Pull-based decoding of a document into records.

use either::Either::{Left, Right};
use tracing::{debug, trace};

use crate::{
    error::{Error, ErrorKind},
    sans::{
        cursor::{ByteCursor, Source},
        data::{self, DecodedRecord},
        definition::{DefinitionTable, MessageDefinition},
        developer::DeveloperRegistry,
        header::{Header, parse_record_header},
        profile::ProfileTable,
        resolve::Session,
    },
};

/// Tolerance of fields the decoder cannot type, and of headers with no
/// checksum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Leniency {
    /// Fail on unknown base types, misaligned field sizes, and a zero header
    /// checksum that does not match.
    #[default]
    Strict,
    /// Decode such fields as opaque bytes, and accept a zero header checksum.
    Opaque,
}

/// Configuration of a [`RecordStream`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    pub profile: ProfileTable,
    pub leniency: Leniency,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a profile table for scaling and accumulation.
    pub fn profile(mut self, profile: ProfileTable) -> Self {
        self.profile = profile;
        self
    }

    pub fn leniency(mut self, leniency: Leniency) -> Self {
        self.leniency = leniency;
        self
    }
}

/// The state of a [`RecordStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// The document header has not been read.
    AwaitingHeader,
    /// Records remain in the record section.
    Streaming,
    /// Every record was read and the checksum matched.
    Finished,
    /// Decoding failed. The stream yields nothing further.
    Failed(ErrorKind),
}

/// A lazy sequence of the data records of one document.
///
/// Each call to [`next`](Iterator::next) decodes records until one data record
/// is produced; definition records are consumed silently. Once the declared
/// record section is exhausted, the trailing checksum is verified and the
/// stream ends. The first error ends the stream.
///
/// A stream owns all state of its decode, so documents may be decoded
/// concurrently by independent streams.
///
/// ```
/// use freewheel::{Leniency, Options, RecordStream};
///
/// let options = Options::new().leniency(Leniency::Opaque);
/// let records = RecordStream::with_options(data.as_slice(), options)
///     .filter_map(Result::ok)
///     .filter(|r| r.global == 20)
///     .count();
/// ```
#[derive(Debug)]
pub struct RecordStream<S> {
    cursor: ByteCursor<S>,
    options: Options,
    state: StreamState,
    header: Option<Header>,
    definitions: DefinitionTable,
    session: Session,
}

impl<S: Source> RecordStream<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, Options::default())
    }

    pub fn with_options(source: S, options: Options) -> Self {
        Self {
            cursor: ByteCursor::new(source),
            options,
            state: StreamState::AwaitingHeader,
            header: None,
            definitions: DefinitionTable::new(),
            session: Session::default(),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The document header, once read.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Bytes consumed from the source so far.
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    pub fn definitions(&self) -> &DefinitionTable {
        &self.definitions
    }

    pub fn developer(&self) -> &DeveloperRegistry {
        &self.session.developer
    }

    /// Read the document header, if not yet read.
    ///
    /// Returns `None` if the stream failed before a header was read.
    pub fn read_header(&mut self) -> Result<Option<Header>, Error> {
        if self.state != StreamState::AwaitingHeader {
            return Ok(self.header);
        }

        let header = Header::parse(&mut self.cursor, self.options.leniency)
            .map_err(|e| self.fail(e))?;

        let end = self.cursor.offset() + header.data_size as usize;
        self.cursor.set_limit(end);

        self.header = Some(header);
        self.state = StreamState::Streaming;

        Ok(Some(header))
    }

    /// Decode up to the next data record.
    ///
    /// Returns `None` once the document has been fully and successfully read,
    /// or after a previous error.
    pub fn next_record(&mut self) -> Result<Option<DecodedRecord>, Error> {
        loop {
            match self.state {
                StreamState::AwaitingHeader => {
                    self.read_header()?;
                }
                StreamState::Streaming if self.cursor.remaining() == 0 => {
                    self.finish().map_err(|e| self.fail(e))?;
                    return Ok(None);
                }
                StreamState::Streaming => {
                    if let Some(record) = self.step().map_err(|e| self.fail(e))? {
                        return Ok(Some(record));
                    }
                }
                StreamState::Finished | StreamState::Failed(_) => return Ok(None),
            }
        }
    }

    /// Recover the source, positioned after the last byte consumed.
    ///
    /// After a finished stream, this is the start of any following document.
    pub fn into_inner(self) -> S {
        self.cursor.into_inner()
    }

    /// Decode one record, returning it if it is a data record.
    fn step(&mut self) -> Result<Option<DecodedRecord>, Error> {
        let offset = self.cursor.offset();
        let [r] = self.cursor.take()?;

        let (local, kind) = parse_record_header(r);

        match kind {
            Left(definition) => {
                let definition = MessageDefinition::decode(
                    &mut self.cursor,
                    offset,
                    local,
                    definition.has_developer_fields,
                    &self.options.profile,
                    self.options.leniency,
                )?;

                self.definitions.install(definition);

                Ok(None)
            }
            Right(header) => {
                let definition = self
                    .definitions
                    .get(local)
                    .ok_or(Error::DefinitionNotBound { offset, local })?;

                let record = data::decode(
                    &mut self.cursor,
                    offset,
                    definition,
                    header.time_offset,
                    &mut self.session,
                    self.options.leniency,
                )?;

                self.session.developer.observe(&record);

                trace!(
                    offset,
                    local,
                    global = record.global,
                    message_name = self.options.profile.message_name(record.global),
                    timestamp = record.timestamp,
                    "Decoded record."
                );

                Ok(Some(record))
            }
        }
    }

    /// Verify the trailing checksum against the bytes consumed.
    fn finish(&mut self) -> Result<(), Error> {
        let calculated = self.cursor.crc();

        self.cursor.set_limit(usize::MAX);
        let found = u16::from_le_bytes(self.cursor.take_unchecked()?);

        if found != calculated {
            Err(Error::ChecksumMismatch { found, calculated })?;
        }

        debug!(offset = self.cursor.offset(), "Verified checksum.");
        self.state = StreamState::Finished;

        Ok(())
    }

    fn fail(&mut self, err: Error) -> Error {
        debug!(offset = self.cursor.offset(), error = %err, "Decoding failed.");
        self.state = StreamState::Failed(err.kind());
        err
    }
}

impl<S: Source> Iterator for RecordStream<S> {
    type Item = Result<DecodedRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
