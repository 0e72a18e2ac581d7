// src/resolve.rs
//
// Airport codes the history page could not name ("Near Kansas City, MO")
// are handed to an injected resolver. A GUI can ask the user; the CLI can
// prompt on stdin; tests use closures.

use crate::config::consts::UNKNOWN_AIRPORT;
use crate::normalize::airport_code;

pub trait AirportResolver {
    /// Code for the origin (`is_origin`) or destination of the leg at `reference_locator`.
    /// `None` means "declined"; the caller falls back to `UNKNOWN`.
    fn resolve(&mut self, reference_locator: &str, is_origin: bool) -> Option<String>;
}

impl<F> AirportResolver for F
where
    F: FnMut(&str, bool) -> Option<String>,
{
    fn resolve(&mut self, reference_locator: &str, is_origin: bool) -> Option<String> {
        self(reference_locator, is_origin)
    }
}

/// Always declines.
pub struct SentinelResolver;

impl AirportResolver for SentinelResolver {
    fn resolve(&mut self, _reference_locator: &str, _is_origin: bool) -> Option<String> {
        None
    }
}

/// Reads the code from the locator path:
/// `/live/flight/{TAIL}/history/{YYYYMMDD}/{HHMM}Z/{ORIG}/{DEST}`.
/// Declines when the segment is not a plain airport identifier.
pub struct LocatorResolver;

impl AirportResolver for LocatorResolver {
    fn resolve(&mut self, reference_locator: &str, is_origin: bool) -> Option<String> {
        let segs: Vec<&str> = reference_locator
            .split(['/', '?', '#'])
            .filter(|s| !s.is_empty())
            .collect();
        let history = segs.iter().position(|s| s.eq_ignore_ascii_case("history"))?;
        let seg = segs.get(history + if is_origin { 3 } else { 4 })?;
        let code_like = (3..=4).contains(&seg.len()) && seg.chars().all(|c| c.is_ascii_alphanumeric());
        code_like.then(|| seg.to_ascii_uppercase())
    }
}

/// Try `first`, then `second`.
pub struct Chain<A, B>(pub A, pub B);

impl<A: AirportResolver, B: AirportResolver> AirportResolver for Chain<A, B> {
    fn resolve(&mut self, reference_locator: &str, is_origin: bool) -> Option<String> {
        self.0
            .resolve(reference_locator, is_origin)
            .or_else(|| self.1.resolve(reference_locator, is_origin))
    }
}

/// Resolve or fall back to the `UNKNOWN` sentinel. Answers that are not a
/// plain letters-and-digits code count as declined.
pub fn resolve_or_unknown(
    resolver: &mut dyn AirportResolver,
    reference_locator: &str,
    is_origin: bool,
) -> String {
    match resolver.resolve(reference_locator, is_origin).as_deref().and_then(airport_code) {
        Some(code) => code,
        None => {
            logw!(
                "No {} code for {}, using {}",
                if is_origin { "origin" } else { "destination" },
                reference_locator,
                UNKNOWN_AIRPORT
            );
            s!(UNKNOWN_AIRPORT)
        }
    }
}
