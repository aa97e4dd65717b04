/*! Longest-match tokenization.

[`lex`] splits text into tokens using a single DFA. [`Lexer`] holds one DFA
per lexer state (also known as start condition) and switches between them
as tokens are recognized, which allows context-sensitive tokenization, like
using a different set of rules inside a quoted string.

Text that is not matched by any rule is not an error: it's returned as
one-character tokens without accept code, and tokenization continues after
them.
*/

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::{BufWriter, Read, Write};
use std::ops::Range;
#[cfg(feature = "logging")]
use std::time::Instant;

use bincode::Options;
#[cfg(feature = "logging")]
use log::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::compiler::{Error, SerializationError};
use crate::dfa::Dfa;


/// Header that identifies a serialized [`Lexer`].
const MAGIC: &[u8] = b"LEXGEN";

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<A> {
    /// The text of the token.
    pub text: String,
    /// Accept code of the rule that matched the token, or `None` if no rule
    /// matched the character in `text`.
    pub accept_code: Option<A>,
    /// Position of the token in the input, in characters.
    pub span: Range<usize>,
}

/// Splits `input` into tokens using `dfa`, starting at character offset
/// `start_pos`.
pub fn lex<A: Clone>(
    dfa: &Dfa<char, A>,
    input: &str,
    start_pos: usize,
) -> Vec<Token<A>> {
    let input: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = start_pos;

    while pos < input.len() {
        let token = next_token(dfa, &input, pos);
        pos = token.span.end;
        tokens.push(token);
    }

    tokens
}

/// Recognizes the token that starts at `pos`. If no rule matches, the token
/// is the single character at `pos`.
fn next_token<A: Clone>(
    dfa: &Dfa<char, A>,
    input: &[char],
    pos: usize,
) -> Token<A> {
    let (len, accept_code) = match dfa.longest_match(&input[pos..]) {
        Some((len, code)) => (len, Some(code.clone())),
        None => (1, None),
    };
    Token {
        text: input[pos..pos + len].iter().collect(),
        accept_code,
        span: pos..pos + len,
    }
}

/// A lexer with multiple lexer states, each one with its own DFA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, A: Serialize",
    deserialize = "S: Ord + Deserialize<'de>, A: Deserialize<'de>"
))]
pub struct Lexer<S, A> {
    dfas: BTreeMap<S, Dfa<char, A>>,
}

impl<S: Ord + Debug, A: Clone> Lexer<S, A> {
    /// Creates a lexer from the DFAs for each lexer state.
    pub fn new(dfas: BTreeMap<S, Dfa<char, A>>) -> Self {
        Self { dfas }
    }

    /// Returns the DFA for a lexer state.
    pub fn dfa(&self, state: &S) -> Option<&Dfa<char, A>> {
        self.dfas.get(state)
    }

    /// Returns the lexer states, in ascending order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.dfas.keys()
    }

    /// Splits `input` into tokens starting at character offset `start_pos`
    /// and in the lexer state `initial_state`.
    ///
    /// After each recognized token, `next_state` receives the token's accept
    /// code and returns the lexer state for the next token. Unrecognized
    /// characters don't change the lexer state.
    ///
    /// Returns the tokens and the lexer state at the end of the input, or
    /// [`Error::UnknownLexerState`] if the lexer is asked to use a state
    /// that it doesn't have.
    pub fn lex<F>(
        &self,
        initial_state: S,
        input: &str,
        start_pos: usize,
        mut next_state: F,
    ) -> Result<(Vec<Token<A>>, S), Error>
    where
        F: FnMut(&A) -> S,
    {
        let input: Vec<char> = input.chars().collect();
        let mut tokens = Vec::new();
        let mut state = initial_state;
        let mut pos = start_pos;

        while pos < input.len() {
            let dfa = self.dfas.get(&state).ok_or_else(|| {
                Error::UnknownLexerState { state: format!("{:?}", state) }
            })?;

            let token = next_token(dfa, &input, pos);
            if let Some(code) = &token.accept_code {
                state = next_state(code);
            }
            pos = token.span.end;
            tokens.push(token);
        }

        Ok((tokens, state))
    }
}

impl<S, A> Lexer<S, A>
where
    S: Ord + Serialize + DeserializeOwned,
    A: Serialize + DeserializeOwned,
{
    /// Serializes the lexer as a sequence of bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = Vec::new();
        self.serialize_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Deserializes the lexer from a sequence of bytes produced by
    /// [`Lexer::serialize`].
    ///
    /// Returns [`SerializationError::InvalidFormat`] if some DFA in the
    /// lexer refers to states that don't exist or has overlapping
    /// transitions.
    pub fn deserialize<B>(bytes: B) -> Result<Self, SerializationError>
    where
        B: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();

        if bytes.len() < MAGIC.len() || &bytes[0..MAGIC.len()] != MAGIC {
            return Err(SerializationError::InvalidFormat);
        }

        #[cfg(feature = "logging")]
        let start = Instant::now();

        // Skip the magic and deserialize the remaining data.
        let lexer = bincode::DefaultOptions::new()
            .with_varint_encoding()
            .deserialize::<Self>(&bytes[MAGIC.len()..])?;

        if !lexer.dfas.values().all(Dfa::is_well_formed) {
            return Err(SerializationError::InvalidFormat);
        }

        #[cfg(feature = "logging")]
        debug!("Deserialization time: {:?}", Instant::elapsed(&start));

        Ok(lexer)
    }

    /// Serializes the lexer into a `writer`.
    pub fn serialize_into<W>(&self, writer: W) -> Result<(), SerializationError>
    where
        W: Write,
    {
        let mut writer = BufWriter::new(writer);

        // Write file header.
        writer.write_all(MAGIC)?;

        bincode::DefaultOptions::new()
            .with_varint_encoding()
            .serialize_into(&mut writer, self)?;

        writer.flush()?;

        Ok(())
    }

    /// Deserializes the lexer from a `reader`.
    pub fn deserialize_from<R>(mut reader: R) -> Result<Self, SerializationError>
    where
        R: Read,
    {
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes)?;
        Self::deserialize(bytes)
    }
}
