//! Placeholder translation between parameter conventions
//!
//! Positional `?` queries are rewritten to use synthetic named parameters in
//! the dialect's spelling, and queries written with an alternate named
//! spelling (for example `:name` or `:name:` against an `@` dialect) are
//! rebuilt into the canonical one.

use super::dialect::DialectSetting;
use super::error::{DatabaseError, Result};
use super::parameter::{CommandDescription, CommandParameter};
use super::value::DatabaseValue;
use std::collections::HashSet;

/// Letter between the prefix and the index of a synthetic name
const SYNTHETIC_LETTER: char = 'p';

/// A rewritten query and the synthetic names it now refers to, in
/// placeholder order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedQuery {
    pub query: String,
    pub parameter_names: Vec<String>,
}

/// Rewrite `?` placeholders into synthetic named parameters
///
/// Every `?` is a placeholder; the query is split on it naively. Synthetic
/// names look like `<prefix>p<index>` and never collide with literal text
/// anywhere in the query, nor with each other (no generated name is a
/// substring of another). Dialects that bind by position keep their `?`
/// placeholders; the names are still generated for the parameter objects.
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidArgument`] when the query is blank.
pub fn translate_positional_query(query: &str, dialect: &DialectSetting) -> Result<TranslatedQuery> {
    translate_with_prefix(
        query,
        dialect.parameter_prefix(),
        dialect.parameter_suffix(),
        dialect.is_positional(),
    )
}

pub(crate) fn translate_with_prefix(
    query: &str,
    prefix: &str,
    suffix: &str,
    keep_positional: bool,
) -> Result<TranslatedQuery> {
    if query.trim().is_empty() {
        return Err(DatabaseError::invalid_argument("query text must not be blank"));
    }

    let segments: Vec<&str> = query.split('?').collect();
    let placeholders = segments.len() - 1;
    if placeholders == 0 {
        return Ok(TranslatedQuery {
            query: query.to_string(),
            parameter_names: Vec::new(),
        });
    }

    let stem = format!("{prefix}{SYNTHETIC_LETTER}");
    let mut names = SyntheticNames::new(query, &stem, placeholders);
    let mut rewritten = String::with_capacity(query.len() + placeholders * (stem.len() + 4));
    let mut parameter_names = Vec::with_capacity(placeholders);

    for (i, segment) in segments.iter().enumerate() {
        rewritten.push_str(segment);
        if i == placeholders {
            break;
        }
        let name = format!("{stem}{}{suffix}", names.next_index());
        if keep_positional {
            rewritten.push('?');
        } else {
            rewritten.push_str(&name);
        }
        parameter_names.push(name);
    }

    Ok(TranslatedQuery {
        query: rewritten,
        parameter_names,
    })
}

/// Index generator for collision-free synthetic names
///
/// All names share one stem, so one name contains another exactly when the
/// other's digits are a prefix of its own. Literal text is indexed once up
/// front, which keeps generation linear in the placeholder count.
struct SyntheticNames {
    width: usize,
    next: u64,
    /// Digit prefixes that follow the stem somewhere in the query text
    literal: HashSet<String>,
    generated: HashSet<String>,
    /// Proper digit prefixes of generated names
    generated_prefixes: HashSet<String>,
}

impl SyntheticNames {
    fn new(query: &str, stem: &str, count: usize) -> Self {
        let mut literal = HashSet::new();
        for (pos, _) in query.match_indices(stem) {
            let rest = &query[pos + stem.len()..];
            let run = rest.bytes().take_while(u8::is_ascii_digit).count();
            for n in 1..=run {
                literal.insert(rest[..n].to_string());
            }
        }

        Self {
            width: (count - 1).to_string().len(),
            next: 0,
            literal,
            generated: HashSet::with_capacity(count),
            generated_prefixes: HashSet::new(),
        }
    }

    fn next_index(&mut self) -> String {
        loop {
            let digits = format!("{:0width$}", self.next, width = self.width);
            self.next += 1;

            if self.literal.contains(&digits) || self.generated_prefixes.contains(&digits) {
                continue;
            }
            if (1..=digits.len()).any(|n| self.generated.contains(&digits[..n])) {
                continue;
            }

            for n in 1..digits.len() {
                self.generated_prefixes.insert(digits[..n].to_string());
            }
            self.generated.insert(digits.clone());
            return digits;
        }
    }
}

/// Rewrite alternate named-parameter spellings into the canonical one
///
/// For each parameter whose canonical spelling (`prefix` + bare name) does
/// not already occur in the query, occurrences of `<alt>name<alt>` and of
/// `<alt>name` (as a whole token) are replaced by it. Applying this twice
/// gives the same result as applying it once.
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidArgument`] when the query is blank.
pub fn rebuild_named_query<S: AsRef<str>>(
    query: &str,
    parameter_names: &[S],
    prefix: &str,
    alt_prefix: char,
) -> Result<String> {
    if query.trim().is_empty() {
        return Err(DatabaseError::invalid_argument("query text must not be blank"));
    }
    if prefix.starts_with(alt_prefix) {
        return Ok(query.to_string());
    }

    let mut rebuilt = query.to_string();
    for name in parameter_names {
        let bare = bare_name(name.as_ref(), prefix, alt_prefix);
        if bare.is_empty() {
            continue;
        }
        let canonical = format!("{prefix}{bare}");
        if find_token(&rebuilt, &canonical, None).is_some() {
            continue;
        }

        let quoted = format!("{alt_prefix}{bare}{alt_prefix}");
        rebuilt = replace_tokens(&rebuilt, &quoted, &canonical, Some(alt_prefix));
        let plain = format!("{alt_prefix}{bare}");
        rebuilt = replace_tokens(&rebuilt, &plain, &canonical, Some(alt_prefix));
    }
    Ok(rebuilt)
}

/// Zip positional values against a `?` query into a command description
///
/// More values than placeholders is always an error. Fewer values is an
/// error unless `allow_unbound_outputs` is set, in which case the remaining
/// placeholders become null output parameters.
pub fn bind_positional(
    query: &str,
    values: Vec<DatabaseValue>,
    dialect: &DialectSetting,
    allow_unbound_outputs: bool,
) -> Result<CommandDescription> {
    bind_with_prefix(
        query,
        values,
        dialect.parameter_prefix(),
        dialect,
        allow_unbound_outputs,
    )
}

/// [`bind_positional`] with the parameter prefix overridden
pub(crate) fn bind_with_prefix(
    query: &str,
    values: Vec<DatabaseValue>,
    prefix: &str,
    dialect: &DialectSetting,
    allow_unbound_outputs: bool,
) -> Result<CommandDescription> {
    let translated = translate_with_prefix(
        query,
        prefix,
        dialect.parameter_suffix(),
        dialect.is_positional(),
    )?;
    let placeholders = translated.parameter_names.len();
    let supplied = values.len();
    if supplied > placeholders || (supplied < placeholders && !allow_unbound_outputs) {
        return Err(DatabaseError::parameter_count_mismatch(placeholders, supplied));
    }

    let mut description = CommandDescription::new(translated.query);
    let mut values = values.into_iter();
    for name in translated.parameter_names {
        let parameter = match values.next() {
            Some(value) => CommandParameter::new(name, value),
            None => CommandParameter::output(name),
        };
        description.add_parameter(parameter);
    }
    Ok(description)
}

fn bare_name<'a>(name: &'a str, prefix: &str, alt_prefix: char) -> &'a str {
    let name = name.trim();
    let name = if prefix.is_empty() {
        name
    } else {
        name.strip_prefix(prefix).unwrap_or(name)
    };
    name.trim_matches(alt_prefix)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset of the first whole-token occurrence of `needle`
fn find_token(haystack: &str, needle: &str, alt_prefix: Option<char>) -> Option<usize> {
    haystack
        .match_indices(needle)
        .map(|(pos, _)| pos)
        .find(|&pos| is_token_at(haystack, pos, needle, alt_prefix))
}

/// `needle` at `pos` is not part of a longer name
///
/// A quoted needle (one ending in the alternate prefix) also must not be
/// followed by another alternate prefix, so `:a::int` is never read as the
/// quoted `:a:`.
fn is_token_at(haystack: &str, pos: usize, needle: &str, alt_prefix: Option<char>) -> bool {
    let before = haystack[..pos].chars().next_back();
    if before.is_some_and(|c| is_ident_char(c) || Some(c) == alt_prefix) {
        return false;
    }
    let quoted = alt_prefix.is_some_and(|alt| needle.len() > 1 && needle.ends_with(alt));
    let after = haystack[pos + needle.len()..].chars().next();
    !after.is_some_and(|c| is_ident_char(c) || (quoted && Some(c) == alt_prefix))
}

fn replace_tokens(
    haystack: &str,
    needle: &str,
    replacement: &str,
    alt_prefix: Option<char>,
) -> String {
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (pos, _) in haystack.match_indices(needle) {
        if pos < last || !is_token_at(haystack, pos, needle, alt_prefix) {
            continue;
        }
        out.push_str(&haystack[last..pos]);
        out.push_str(replacement);
        last = pos + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}
