//! Ordered-attempt combinator used by unions, alternates and base64 decoding.

/// Run `attempt` on each candidate in order and return the first success.
///
/// When every candidate fails, all failure causes are returned in the
/// order the candidates were tried. An empty candidate list yields
/// `Err(vec![])`.
pub fn try_in_order<C, T, E, I, F>(candidates: I, mut attempt: F) -> Result<T, Vec<E>>
where
    I: IntoIterator<Item = C>,
    F: FnMut(C) -> Result<T, E>,
{
    let mut failures = Vec::new();
    for candidate in candidates {
        match attempt(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => failures.push(e),
        }
    }
    Err(failures)
}
