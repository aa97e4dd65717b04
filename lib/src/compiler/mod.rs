/*! Compiles lexical rules into DFAs.

Each rule is either a literal string or a regular expression, tagged with an
accept code. The rules for a lexer state go through the whole pipeline: the
regular expressions are parsed, every rule is converted into an NFA fragment,
the fragments are joined into a single NFA, the NFA is converted into a DFA
by subset construction, and finally the DFA is minimized.
*/

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::Debug;
#[cfg(feature = "logging")]
use std::time::Instant;

#[cfg(feature = "logging")]
use log::*;
use serde::{Deserialize, Serialize};

use crate::config::{Config, TieBreak};
use crate::dfa::{subset_construction, Dfa};
use crate::lexer::Lexer;
use crate::nfa::{Fragment, Nfa};
use crate::re::RegexParser;

pub use crate::compiler::errors::*;

mod errors;

#[cfg(test)]
mod tests;

/// A lexical rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LexerRule<A> {
    /// Matches the string exactly.
    Literal(String, A),
    /// Matches a regular expression, see [`RegexParser`] for the syntax.
    Regex(String, A),
}

impl<A> LexerRule<A> {
    /// Creates a rule that matches `text` literally.
    pub fn literal<T: Into<String>>(text: T, accept_code: A) -> Self {
        LexerRule::Literal(text.into(), accept_code)
    }

    /// Creates a rule that matches the regular expression `pattern`.
    pub fn regex<T: Into<String>>(pattern: T, accept_code: A) -> Self {
        LexerRule::Regex(pattern.into(), accept_code)
    }

    /// The accept code returned when this rule matches.
    pub fn accept_code(&self) -> &A {
        match self {
            LexerRule::Literal(_, code) | LexerRule::Regex(_, code) => code,
        }
    }
}

/// Compiles a list of rules into a DFA using the default configuration.
///
/// This is a shortcut for creating a [`Compiler`] and calling
/// [`Compiler::compile`]. If you are compiling many rule sets, create a
/// single [`Compiler`] and reuse it.
pub fn compile<A>(rules: &[LexerRule<A>]) -> Result<Dfa<char, A>, Error>
where
    A: Clone + Ord,
{
    Compiler::new().compile(rules)
}

/// Compiles lexical rules into DFAs.
///
/// The compiler holds the regular expression parser, so creating it once and
/// reusing it for many rule sets avoids building the parser over and over.
#[derive(Debug)]
pub struct Compiler {
    parser: RegexParser,
    config: Config,
}

impl Compiler {
    /// Creates a compiler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a compiler with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self { parser: RegexParser::new(), config }
    }

    /// The compiler's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiles the rules for a single lexer state into a DFA.
    ///
    /// When more than one rule matches the same longest prefix, the winner
    /// is decided by [`Config::tie_break`].
    pub fn compile<A>(&self, rules: &[LexerRule<A>]) -> Result<Dfa<char, A>, Error>
    where
        A: Clone + Ord,
    {
        #[cfg(feature = "logging")]
        let start = Instant::now();

        let fragments = rules
            .iter()
            .map(|rule| self.fragment(rule))
            .collect::<Result<Vec<_>, _>>()?;

        let dfa = match self.config.tie_break {
            TieBreak::HighestCode => determinize(
                fragments
                    .into_iter()
                    .zip(rules.iter().map(|rule| rule.accept_code().clone())),
            ),
            // The rule index is the most significant part of the label, and
            // it is reversed so that the greatest label belongs to the rule
            // declared first.
            TieBreak::FirstDeclared => determinize(fragments.into_iter().zip(
                rules.iter().enumerate().map(|(index, rule)| {
                    (Reverse(index), rule.accept_code().clone())
                }),
            ))
            .map_accept_codes(|(_, code)| code),
        };

        #[cfg(feature = "logging")]
        let dfa_states = dfa.state_count();

        let dfa = if self.config.minimize { dfa.minimize() } else { dfa };

        #[cfg(feature = "logging")]
        info!(
            "Compiled {} rules: {} DFA states ({} before minimization) in {:?}",
            rules.len(),
            dfa.state_count(),
            dfa_states,
            Instant::elapsed(&start)
        );

        Ok(dfa)
    }

    /// Compiles the rules for every lexer state. Each state is compiled
    /// independently of the others.
    pub fn compile_states<S, A>(
        &self,
        rules: &BTreeMap<S, Vec<LexerRule<A>>>,
    ) -> Result<BTreeMap<S, Dfa<char, A>>, Error>
    where
        S: Ord + Clone + Debug,
        A: Clone + Ord,
    {
        rules
            .iter()
            .map(|(state, rules)| -> Result<_, Error> {
                #[cfg(feature = "logging")]
                debug!("Compiling lexer state {:?}", state);
                Ok((state.clone(), self.compile(rules)?))
            })
            .collect()
    }

    /// Compiles the rules for every lexer state and returns a [`Lexer`].
    pub fn build_lexer<S, A>(
        &self,
        rules: &BTreeMap<S, Vec<LexerRule<A>>>,
    ) -> Result<Lexer<S, A>, Error>
    where
        S: Ord + Clone + Debug,
        A: Clone + Ord,
    {
        Ok(Lexer::new(self.compile_states(rules)?))
    }

    /// Converts a rule into an NFA fragment.
    fn fragment<A>(&self, rule: &LexerRule<A>) -> Result<Fragment<char>, Error> {
        match rule {
            LexerRule::Literal(text, _) => Ok(Fragment::literal(text)),
            LexerRule::Regex(pattern, _) => {
                self.parser.parse(pattern)?.to_fragment()
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the NFA for the labeled fragments and converts it into a DFA.
fn determinize<L, I>(rules: I) -> Dfa<char, L>
where
    L: Clone + Ord,
    I: IntoIterator<Item = (Fragment<char>, L)>,
{
    let nfa = Nfa::from_rules(rules);

    #[cfg(feature = "logging")]
    debug!(
        "NFA with {} states ({} reachable)",
        nfa.state_count(),
        nfa.reachable_states().len()
    );

    subset_construction(&nfa).dfa
}
