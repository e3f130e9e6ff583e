use thiserror::Error;

/// Reasons a line cannot be read as a single CSV record.
///
/// Positions are 1-based: `field` counts values from the start of the line,
/// `offset` counts characters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unclosed quoted field in field {field}")]
    UnclosedQuote { field: usize },

    #[error("Illegal quoting in field {field} at offset {offset}")]
    IllegalQuote { field: usize, offset: usize },

    #[error("Unexpected character {found:?} after quoted field {field} at offset {offset}")]
    TrailingAfterQuote {
        field: usize,
        offset: usize,
        found: char,
    },

    #[error("Unquoted line break in field {field} at offset {offset}")]
    UnquotedLineBreak { field: usize, offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Splits one line of text into raw values.
///
/// The decoder honors RFC 4180 quoting with a configurable separator and
/// quote character: a quoted value may contain the separator and line
/// breaks, and a doubled quote stands for one literal quote. A single
/// trailing line terminator (`\n`, `\r\n` or `\r`) is accepted and dropped.
///
/// Decoding is strict. Unlike the `csv` crate's reader, which recovers
/// silently from stray quotes, every malformed line is reported as a
/// [`DecodeError`].
///
/// # Examples
///
/// ```
/// use csv_event_filter::item::csv::line_decoder::LineDecoder;
///
/// let decoder = LineDecoder::new(';', '\'');
/// let values = decoder.decode("a;'b;c';'it''s'").unwrap();
///
/// assert_eq!(values, vec!["a", "b;c", "it's"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDecoder {
    separator: char,
    quote: char,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self {
            separator: ',',
            quote: '"',
        }
    }
}

impl LineDecoder {
    /// Creates a decoder. Separator and quote are not checked here, the
    /// filter builder rejects unusable pairs before a decoder is made.
    pub fn new(separator: char, quote: char) -> Self {
        Self { separator, quote }
    }

    /// Decodes `line` into its values, in order.
    ///
    /// An empty line (or one holding only a terminator) yields no values at
    /// all, while a line made of separators yields empty strings:
    /// `","` decodes to `["", ""]`.
    pub fn decode(&self, line: &str) -> Result<Vec<String>, DecodeError> {
        if is_terminator(line) {
            return Ok(Vec::new());
        }

        let mut values = Vec::new();
        let mut current = String::new();
        let mut state = State::FieldStart;

        for (offset, (idx, c)) in line.char_indices().enumerate() {
            let field = values.len() + 1;
            let offset = offset + 1;

            if state != State::Quoted && (c == '\n' || c == '\r') {
                if is_terminator(&line[idx..]) {
                    break;
                }
                return Err(DecodeError::UnquotedLineBreak { field, offset });
            }

            state = match state {
                State::FieldStart if c == self.separator => {
                    values.push(String::new());
                    State::FieldStart
                }
                State::FieldStart if c == self.quote => State::Quoted,
                State::FieldStart => {
                    current.push(c);
                    State::Unquoted
                }
                State::Unquoted if c == self.separator => {
                    values.push(std::mem::take(&mut current));
                    State::FieldStart
                }
                State::Unquoted if c == self.quote => {
                    return Err(DecodeError::IllegalQuote { field, offset });
                }
                State::Unquoted => {
                    current.push(c);
                    State::Unquoted
                }
                State::Quoted if c == self.quote => State::QuoteInQuoted,
                State::Quoted => {
                    current.push(c);
                    State::Quoted
                }
                State::QuoteInQuoted if c == self.quote => {
                    current.push(c);
                    State::Quoted
                }
                State::QuoteInQuoted if c == self.separator => {
                    values.push(std::mem::take(&mut current));
                    State::FieldStart
                }
                State::QuoteInQuoted => {
                    return Err(DecodeError::TrailingAfterQuote {
                        field,
                        offset,
                        found: c,
                    });
                }
            };
        }

        match state {
            State::Quoted => Err(DecodeError::UnclosedQuote {
                field: values.len() + 1,
            }),
            // FieldStart here means the line ended on a separator
            State::FieldStart | State::Unquoted | State::QuoteInQuoted => {
                values.push(current);
                Ok(values)
            }
        }
    }
}

fn is_terminator(rest: &str) -> bool {
    matches!(rest, "" | "\n" | "\r\n" | "\r")
}
